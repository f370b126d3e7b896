use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;

/// Coarse quality of a resolved location, from the most specific address tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum GeocodeConfidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for GeocodeConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodeConfidence::High => write!(f, "HIGH"),
            GeocodeConfidence::Medium => write!(f, "MEDIUM"),
            GeocodeConfidence::Low => write!(f, "LOW"),
        }
    }
}

/// Administrative tags attached to a place search result
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AddressTags {
    pub house_number: Option<String>,
    pub building: Option<String>,
    pub shop: Option<String>,
    pub amenity: Option<String>,
    pub road: Option<String>,
    pub hamlet: Option<String>,
    pub village: Option<String>,
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub city_district: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
}

fn filled(tag: &Option<String>) -> bool {
    tag.as_deref().is_some_and(|v| !v.is_empty())
}

fn lowered(tag: &Option<String>) -> String {
    tag.as_deref().unwrap_or_default().to_lowercase()
}

impl AddressTags {
    pub fn has_village_level(&self) -> bool {
        filled(&self.village) || filled(&self.hamlet)
    }

    pub fn has_suburb_level(&self) -> bool {
        filled(&self.suburb) || filled(&self.neighbourhood)
    }

    pub fn has_district_level(&self) -> bool {
        filled(&self.city_district) || filled(&self.district)
    }

    pub fn has_city_level(&self) -> bool {
        filled(&self.city) || filled(&self.town)
    }

    pub fn has_county(&self) -> bool {
        filled(&self.county)
    }

    pub fn has_state(&self) -> bool {
        filled(&self.state)
    }

    pub fn state_name(&self) -> String {
        lowered(&self.state)
    }

    /// City, falling back to town
    pub fn city_name(&self) -> String {
        let city = lowered(&self.city);
        if city.is_empty() {
            lowered(&self.town)
        } else {
            city
        }
    }

    pub fn county_name(&self) -> String {
        lowered(&self.county)
    }

    pub fn city_district_name(&self) -> String {
        lowered(&self.city_district)
    }

    /// Village, falling back to suburb
    pub fn village_name(&self) -> String {
        let village = lowered(&self.village);
        if village.is_empty() {
            lowered(&self.suburb)
        } else {
            village
        }
    }

    /// HIGH for a premises-level tag, MEDIUM for road/village level, else LOW
    pub fn confidence(&self) -> GeocodeConfidence {
        if self.house_number.is_some()
            || self.building.is_some()
            || self.shop.is_some()
            || self.amenity.is_some()
        {
            GeocodeConfidence::High
        } else if self.road.is_some()
            || self.village.is_some()
            || self.suburb.is_some()
            || self.hamlet.is_some()
        {
            GeocodeConfidence::Medium
        } else {
            GeocodeConfidence::Low
        }
    }
}

/// One place search result before ranking
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Provider ranking signal in [0, 1]
    pub importance: f64,
    pub address: AddressTags,
}

/// A location accepted by the resolver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: GeocodeConfidence,
}
