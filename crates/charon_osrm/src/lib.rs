pub mod cache;
pub mod client;
pub mod clock;
pub mod store;

pub use cache::{CachedLegFetcher, LegCacheOptions};
pub use client::{
    DEFAULT_OSRM_URL, OsrmClient, OsrmClientParams, OsrmError, OsrmProfile, RouteProvider,
};
pub use clock::{Clock, SystemClock};
pub use store::{FileLegStore, LegStore, MemoryLegStore, StoredLeg};
