use crate::features::geocoding::models::GeocodeCandidate;
use crate::shared::validation::ADDRESS_SEPARATOR_REGEX;

const COUNTRY_BONUS: f64 = 30.0;
const TOKEN_MATCH_BONUS: f64 = 20.0;
const MANY_TOKENS_BONUS: f64 = 30.0;
const TWO_TOKENS_BONUS: f64 = 15.0;
const IMPORTANCE_WEIGHT: f64 = 25.0;

const VILLAGE_TIER_BONUS: f64 = 40.0;
const SUBURB_TIER_BONUS: f64 = 35.0;
const DISTRICT_TIER_BONUS: f64 = 30.0;
const CITY_TIER_BONUS: f64 = 20.0;
const COUNTY_TIER_BONUS: f64 = 15.0;
const STATE_TIER_BONUS: f64 = 10.0;

const EXACT_REGION_BONUS: f64 = 25.0;
const EXACT_DISTRICT_BONUS: f64 = 30.0;
const EXACT_VILLAGE_BONUS: f64 = 35.0;

/// Lower-cased words of the user's address, longer than two characters
pub fn tokenize(original_address: &str) -> Vec<String> {
    ADDRESS_SEPARATOR_REGEX
        .split(&original_address.to_lowercase())
        .filter(|word| word.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

fn specificity_bonus(candidate: &GeocodeCandidate) -> f64 {
    let tags = &candidate.address;
    if tags.has_village_level() {
        VILLAGE_TIER_BONUS
    } else if tags.has_suburb_level() {
        SUBURB_TIER_BONUS
    } else if tags.has_district_level() {
        DISTRICT_TIER_BONUS
    } else if tags.has_city_level() {
        CITY_TIER_BONUS
    } else if tags.has_county() {
        COUNTY_TIER_BONUS
    } else if tags.has_state() {
        STATE_TIER_BONUS
    } else {
        0.0
    }
}

/// Score one candidate against the tokens of the original address.
///
/// A token can earn both the substring bonus and an exact tag bonus; existing
/// reports were ranked this way so the double counting stays.
pub fn score(candidate: &GeocodeCandidate, tokens: &[String]) -> f64 {
    let display_name = candidate.display_name.to_lowercase();
    let mut score = 0.0;

    if display_name.contains("indonesia") {
        score += COUNTRY_BONUS;
    }

    let mut matched = 0;
    for token in tokens {
        if display_name.contains(token.as_str()) {
            matched += 1;
            score += TOKEN_MATCH_BONUS;
        }
    }

    if matched >= 3 {
        score += MANY_TOKENS_BONUS;
    } else if matched >= 2 {
        score += TWO_TOKENS_BONUS;
    }

    score += specificity_bonus(candidate);
    score += candidate.importance * IMPORTANCE_WEIGHT;

    let tags = &candidate.address;
    let state = tags.state_name();
    let city = tags.city_name();
    let county = tags.county_name();
    let district = tags.city_district_name();
    let village = tags.village_name();

    for token in tokens {
        let token = token.as_str();
        if token == state || token == city || token == county {
            score += EXACT_REGION_BONUS;
        }
        if token == district {
            score += EXACT_DISTRICT_BONUS;
        }
        if token == village {
            score += EXACT_VILLAGE_BONUS;
        }
    }

    score
}

/// Pick the best candidate for the original (pre-normalization) address.
///
/// Highest score wins; ties keep the provider's order.
pub fn select(candidates: Vec<GeocodeCandidate>, original_address: &str) -> Option<GeocodeCandidate> {
    let tokens = tokenize(original_address);

    let mut scored: Vec<(f64, GeocodeCandidate)> = candidates
        .into_iter()
        .map(|candidate| (score(&candidate, &tokens), candidate))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    if let Some((best, candidate)) = scored.first() {
        tracing::debug!(
            "Best geocode candidate scored {:.2}: {}",
            best,
            candidate.display_name
        );
    }

    scored.into_iter().next().map(|(_, candidate)| candidate)
}
