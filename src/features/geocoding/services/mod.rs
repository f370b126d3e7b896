pub mod address_normalizer;
pub mod bounds_validator;
pub mod candidate_ranker;
mod geocode_resolver;
mod place_search_client;

pub use geocode_resolver::GeocodeResolver;
pub use place_search_client::{NominatimClient, PlaceSearch};
