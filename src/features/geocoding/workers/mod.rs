mod geocode_backfill;

pub use geocode_backfill::GeocodeBackfill;
