mod candidate;
mod geocode_error;

pub use candidate::{AddressTags, GeocodeCandidate, GeocodeConfidence, ResolvedLocation};
pub use geocode_error::{GeocodeError, GeocodeFailureReason};
