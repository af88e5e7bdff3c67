use fxhash::FxHashMap;
use jiff::{SignedDuration, Timestamp};
use parking_lot::Mutex;
use tracing::{debug, warn};

use charon_routing::{GeoPoint, LegSource};

use crate::client::RouteProvider;
use crate::clock::{Clock, SystemClock};
use crate::store::{LegStore, StoredLeg};

#[derive(Debug, Clone)]
pub struct LegCacheOptions {
    /// How long a fetched leg stays valid. Roads change rarely; a week
    /// keeps repeat visits cheap without growing stale. Default 7 days.
    pub ttl: SignedDuration,

    /// Cap on durable entries; the oldest entry is evicted first.
    /// Default 300.
    pub max_entries: usize,
}

impl Default for LegCacheOptions {
    fn default() -> Self {
        LegCacheOptions {
            ttl: SignedDuration::from_hours(7 * 24),
            max_entries: 300,
        }
    }
}

fn coordinate_e5(value: f64) -> i64 {
    (value * 1e5).round() as i64
}

/// Cache key with both endpoints at five decimal places, about a meter
/// of precision. Positions that differ by less collapse to one entry.
fn leg_key(from: &GeoPoint, to: &GeoPoint) -> String {
    format!(
        "{},{}|{},{}",
        coordinate_e5(from.lat),
        coordinate_e5(from.lng),
        coordinate_e5(to.lat),
        coordinate_e5(to.lng)
    )
}

struct CacheEntry {
    expires_at: Timestamp,
    points: Vec<GeoPoint>,
}

/// Two-tier TTL cache in front of a route provider.
///
/// Lookups try the in-memory tier, then the durable store (promoting
/// hits back into memory), then the provider. Provider failures degrade
/// to a straight two-point leg and are never cached, so the next
/// request retries.
pub struct CachedLegFetcher<P, S, C = SystemClock> {
    provider: P,
    store: S,
    clock: C,
    options: LegCacheOptions,
    memory: Mutex<FxHashMap<String, CacheEntry>>,
}

impl<P: RouteProvider, S: LegStore> CachedLegFetcher<P, S> {
    pub fn new(provider: P, store: S, options: LegCacheOptions) -> Self {
        Self::with_clock(provider, store, SystemClock, options)
    }
}

impl<P: RouteProvider, S: LegStore, C: Clock> CachedLegFetcher<P, S, C> {
    pub fn with_clock(provider: P, store: S, clock: C, options: LegCacheOptions) -> Self {
        CachedLegFetcher {
            provider,
            store,
            clock,
            options,
            memory: Mutex::new(FxHashMap::default()),
        }
    }

    fn lookup(&self, key: &str, now: Timestamp) -> Option<Vec<GeoPoint>> {
        {
            let mut memory = self.memory.lock();
            if let Some(entry) = memory.get(key) {
                if entry.expires_at > now {
                    return Some(entry.points.clone());
                }
                memory.remove(key);
            }
        }

        let legs = match self.store.load() {
            Ok(legs) => legs,
            Err(error) => {
                warn!(%error, "Failed to load the leg cache");
                return None;
            }
        };

        let leg = legs.iter().find(|leg| leg.key == key && leg.expires_at > now)?;
        self.memory.lock().insert(
            key.to_string(),
            CacheEntry {
                expires_at: leg.expires_at,
                points: leg.points.clone(),
            },
        );

        Some(leg.points.clone())
    }

    fn insert(&self, key: String, now: Timestamp, points: Vec<GeoPoint>) {
        let expires_at = now
            .saturating_add(self.options.ttl)
            .expect("adding a SignedDuration to a Timestamp saturates instead of failing");

        self.memory.lock().insert(
            key.clone(),
            CacheEntry {
                expires_at,
                points: points.clone(),
            },
        );

        if self.options.max_entries == 0 {
            return;
        }

        let mut legs = match self.store.load() {
            Ok(legs) => legs,
            Err(error) => {
                warn!(%error, "Failed to load the leg cache, rewriting it");
                Vec::new()
            }
        };

        legs.retain(|leg| leg.expires_at > now && leg.key != key);
        while legs.len() >= self.options.max_entries {
            legs.remove(0);
        }
        legs.push(StoredLeg {
            key,
            expires_at,
            points,
        });

        if let Err(error) = self.store.save(&legs) {
            warn!(%error, "Failed to persist the leg cache");
        }
    }
}

impl<P: RouteProvider, S: LegStore, C: Clock> LegSource for CachedLegFetcher<P, S, C> {
    async fn fetch_leg(&self, from: &GeoPoint, to: &GeoPoint) -> Vec<GeoPoint> {
        let key = leg_key(from, to);

        // Endpoints that collapse at key precision are close enough
        // that the provider has nothing to add
        if coordinate_e5(from.lat) == coordinate_e5(to.lat)
            && coordinate_e5(from.lng) == coordinate_e5(to.lng)
        {
            return vec![*from, *to];
        }

        let now = self.clock.now();
        if let Some(points) = self.lookup(&key, now) {
            debug!(%key, "Leg cache hit");
            return points;
        }

        match self.provider.route(from, to).await {
            Ok(points) if points.len() >= 2 => {
                self.insert(key, now, points.clone());
                points
            }
            Ok(_) => {
                warn!(%key, "Provider returned a degenerate leg, using a straight segment");
                vec![*from, *to]
            }
            Err(error) => {
                warn!(%key, %error, "Provider leg fetch failed, using a straight segment");
                vec![*from, *to]
            }
        }
    }
}
