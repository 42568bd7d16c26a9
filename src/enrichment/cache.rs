//! Coordinate-keyed memoising store shared by the enrichment sources.
//!
//! Keys are `(latitude, longitude)` rounded to a fixed number of decimal
//! places, so listings inside the same rounding bucket share one lookup.
//! Backed by an unbounded [`moka`] cache: entries are never evicted and
//! never expire, the cache lives for exactly one pipeline run.
//!
//! The cache is internally synchronised. Concurrent first access to the
//! same key is coalesced: one caller runs the compute future, the others
//! wait for it and receive the same value.

use std::fmt;
use std::future::Future;

use moka::future::Cache;

use crate::models::Coordinate;

/// Rounded coordinate used as the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    lat_units: i64,
    lon_units: i64,
    precision: u32,
}

impl CoordinateKey {
    /// Round `coordinate` to `precision` decimal places.
    pub fn new(coordinate: Coordinate, precision: u32) -> Self {
        let scale = 10f64.powi(precision as i32);
        Self {
            lat_units: (coordinate.latitude * scale).round() as i64,
            lon_units: (coordinate.longitude * scale).round() as i64,
            precision,
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10f64.powi(self.precision as i32);
        let p = self.precision as usize;
        write!(
            f,
            "{:.*},{:.*}",
            p,
            self.lat_units as f64 / scale,
            p,
            self.lon_units as f64 / scale
        )
    }
}

/// Append-only, single-flight map from [`CoordinateKey`] to a signal value.
pub struct EnrichmentCache<V> {
    precision: u32,
    entries: Cache<CoordinateKey, V>,
}

impl<V> EnrichmentCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(precision: u32) -> Self {
        Self {
            precision,
            entries: Cache::builder().build(),
        }
    }

    pub fn key_for(&self, coordinate: Coordinate) -> CoordinateKey {
        CoordinateKey::new(coordinate, self.precision)
    }

    /// Return the cached value for `coordinate`'s bucket, computing it with
    /// `compute` on first access.
    ///
    /// `compute` runs at most once per key for the lifetime of the cache,
    /// including when several callers race on a key that is still being
    /// computed.
    pub async fn get_or_compute<F, Fut>(&self, coordinate: Coordinate, compute: F) -> V
    where
        F: FnOnce(Coordinate) -> Fut,
        Fut: Future<Output = V>,
    {
        let key = self.key_for(coordinate);
        self.entries
            .get_with(key, async move { compute(coordinate).await })
            .await
    }

    pub async fn get(&self, coordinate: Coordinate) -> Option<V> {
        self.entries.get(&self.key_for(coordinate)).await
    }

    pub fn contains(&self, coordinate: Coordinate) -> bool {
        self.entries.contains_key(&self.key_for(coordinate))
    }
}
