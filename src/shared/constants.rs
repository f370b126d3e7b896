/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// SUBMISSION CONSTANTS
// =============================================================================

/// Cookie carrying the browser session a form token is bound to
pub const SESSION_COOKIE_NAME: &str = "flood_session";

/// Response header carrying the freshly minted form token after a POST
pub const FORM_TOKEN_HEADER: &str = "x-form-token";

/// Placeholder option of the flood height select box
pub const FLOOD_HEIGHT_PLACEHOLDER: &str = "Pilih tinggi banjir";

/// Photo file extensions accepted by the report form
pub const ALLOWED_PHOTO_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Maximum address length accepted by the report form
pub const MAX_ADDRESS_LENGTH: usize = 500;

// =============================================================================
// GEOCODING CONSTANTS
// =============================================================================

/// ISO country code passed to the place search provider
pub const GEOCODE_COUNTRY_CODE: &str = "id";

/// Number of candidates requested per search
pub const GEOCODE_CANDIDATE_LIMIT: u8 = 5;

/// Minimum trimmed address length worth sending to the provider
pub const MIN_GEOCODE_QUERY_LENGTH: usize = 5;
