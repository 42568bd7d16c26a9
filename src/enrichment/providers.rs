use crate::error::Result;
use crate::models::{Coordinate, SignalKind};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

/// External source of a single location-quality signal
///
/// Implementations talk to crime, school or places APIs. Failures are
/// returned as errors; the enrichment layer substitutes a neutral value.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    /// Raw signal value for a coordinate
    async fn query(&self, coordinate: Coordinate) -> Result<f64>;

    /// Name used in log events
    fn provider_name(&self) -> &'static str;
}

/// Placeholder provider drawing uniform values from a fixed range.
///
/// Stands in for a real data source. Seed it for reproducible runs.
pub struct SimulatedSignalProvider {
    low: f64,
    high: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedSignalProvider {
    pub fn new(low: f64, high: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            low,
            high,
            rng: Mutex::new(rng),
        }
    }

    /// Typical ranges observed for each signal
    pub fn for_kind(kind: SignalKind, seed: Option<u64>) -> Self {
        match kind {
            SignalKind::Crime => Self::new(2.0, 8.0, seed),
            SignalKind::School => Self::new(4.0, 9.5, seed),
            SignalKind::MarketProximity => Self::new(0.3, 3.5, seed),
        }
    }
}

#[async_trait]
impl SignalProvider for SimulatedSignalProvider {
    async fn query(&self, _coordinate: Coordinate) -> Result<f64> {
        // A poisoned lock only means another query panicked mid-draw
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rng.gen_range(self.low..=self.high))
    }

    fn provider_name(&self) -> &'static str {
        "simulated"
    }
}

/// One provider per signal kind, injected into the pipeline
#[derive(Clone)]
pub struct SignalProviders {
    pub crime: Arc<dyn SignalProvider>,
    pub school: Arc<dyn SignalProvider>,
    pub market: Arc<dyn SignalProvider>,
}

impl SignalProviders {
    /// Simulated providers for every signal. Each gets its own stream when seeded.
    pub fn simulated(seed: Option<u64>) -> Self {
        let seeded = |offset: u64| seed.map(|s| s.wrapping_add(offset));
        Self {
            crime: Arc::new(SimulatedSignalProvider::for_kind(SignalKind::Crime, seeded(0))),
            school: Arc::new(SimulatedSignalProvider::for_kind(SignalKind::School, seeded(1))),
            market: Arc::new(SimulatedSignalProvider::for_kind(
                SignalKind::MarketProximity,
                seeded(2),
            )),
        }
    }

    pub fn get(&self, kind: SignalKind) -> Arc<dyn SignalProvider> {
        match kind {
            SignalKind::Crime => Arc::clone(&self.crime),
            SignalKind::School => Arc::clone(&self.school),
            SignalKind::MarketProximity => Arc::clone(&self.market),
        }
    }
}
