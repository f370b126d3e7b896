/// Approximate envelope of Indonesia, inclusive on every edge
pub const MIN_LATITUDE: f64 = -11.0;
pub const MAX_LATITUDE: f64 = 6.0;
pub const MIN_LONGITUDE: f64 = 95.0;
pub const MAX_LONGITUDE: f64 = 141.0;

pub fn is_valid(lat: f64, lon: f64) -> bool {
    (MIN_LATITUDE..=MAX_LATITUDE).contains(&lat) && (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&lon)
}
