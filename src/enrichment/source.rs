use super::cache::EnrichmentCache;
use super::providers::SignalProvider;
use super::throttle::Throttle;
use crate::models::{Coordinate, SignalKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A signal value and whether it is a neutral stand-in for a failed query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalReading {
    pub value: f64,
    pub degraded: bool,
}

/// One enrichment signal (crime, school or market proximity) for a coordinate.
///
/// Wraps a [`SignalProvider`] with the coordinate cache, a polite delay
/// between provider calls and a per-call timeout. Provider failures never
/// escape: the source answers with its neutral value and marks the reading
/// degraded. Degraded readings are cached like any other, so a failing
/// bucket is queried only once.
pub struct EnrichmentSource {
    kind: SignalKind,
    provider: Arc<dyn SignalProvider>,
    cache: EnrichmentCache<SignalReading>,
    neutral: f64,
    timeout: Duration,
    throttle: Throttle,
}

impl EnrichmentSource {
    pub fn new(kind: SignalKind, provider: Arc<dyn SignalProvider>, precision: u32) -> Self {
        Self {
            kind,
            provider,
            cache: EnrichmentCache::new(precision),
            neutral: default_neutral(kind),
            timeout: Duration::from_secs(10),
            throttle: Throttle::new(Duration::ZERO),
        }
    }

    /// Value substituted when the provider fails. Clamped to the signal's bounds.
    pub fn with_neutral(mut self, neutral: f64) -> Self {
        self.neutral = self.kind.clamp(neutral);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.throttle = Throttle::new(delay);
        self
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn neutral(&self) -> f64 {
        self.neutral
    }

    pub fn cache(&self) -> &EnrichmentCache<SignalReading> {
        &self.cache
    }

    /// Signal for a coordinate, bounded to the kind's range.
    pub async fn score(&self, latitude: f64, longitude: f64) -> SignalReading {
        let coordinate = Coordinate::new(latitude, longitude);
        self.cache
            .get_or_compute(coordinate, |coordinate| self.query_provider(coordinate))
            .await
    }

    async fn query_provider(&self, coordinate: Coordinate) -> SignalReading {
        let key = self.cache.key_for(coordinate);
        self.throttle.wait().await;

        let outcome = tokio::time::timeout(self.timeout, self.provider.query(coordinate)).await;
        match outcome {
            Ok(Ok(value)) if value.is_finite() => {
                let value = self.kind.clamp(value);
                debug!(signal = %self.kind, key = %key, value, "signal computed");
                SignalReading {
                    value,
                    degraded: false,
                }
            }
            Ok(Ok(value)) => {
                warn!(
                    signal = %self.kind,
                    provider = self.provider.provider_name(),
                    key = %key,
                    value,
                    neutral = self.neutral,
                    "provider returned a non-finite value, using neutral default"
                );
                self.degraded()
            }
            Ok(Err(err)) => {
                warn!(
                    signal = %self.kind,
                    provider = self.provider.provider_name(),
                    key = %key,
                    error = %err,
                    neutral = self.neutral,
                    "signal provider failed, using neutral default"
                );
                self.degraded()
            }
            Err(_) => {
                warn!(
                    signal = %self.kind,
                    provider = self.provider.provider_name(),
                    key = %key,
                    timeout_ms = self.timeout.as_millis() as u64,
                    neutral = self.neutral,
                    "signal provider timed out, using neutral default"
                );
                self.degraded()
            }
        }
    }

    fn degraded(&self) -> SignalReading {
        SignalReading {
            value: self.neutral,
            degraded: true,
        }
    }
}

/// Midpoint of each scale. Market proximity defaults to half the standard
/// four-mile horizon.
fn default_neutral(kind: SignalKind) -> f64 {
    match kind {
        SignalKind::Crime | SignalKind::School => 5.0,
        SignalKind::MarketProximity => 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ScoutError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        value: f64,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SignalProvider for CountingProvider {
        async fn query(&self, _coordinate: Coordinate) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value)
        }

        fn provider_name(&self) -> &'static str {
            "counting"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl SignalProvider for FailingProvider {
        async fn query(&self, _coordinate: Coordinate) -> Result<f64> {
            Err(ScoutError::Provider("upstream unavailable".into()))
        }

        fn provider_name(&self) -> &'static str {
            "failing"
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl SignalProvider for SlowProvider {
        async fn query(&self, _coordinate: Coordinate) -> Result<f64> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1.0)
        }

        fn provider_name(&self) -> &'static str {
            "slow"
        }
    }

    fn counting(value: f64) -> Arc<CountingProvider> {
        Arc::new(CountingProvider {
            value,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn same_bucket_queries_provider_once() {
        let provider = counting(3.5);
        let source = EnrichmentSource::new(SignalKind::Crime, provider.clone(), 4);

        let a = source.score(30.26721, -97.74311).await;
        let b = source.score(30.26719, -97.74309).await;
        let c = source.score(30.2672, -97.7431).await;

        assert_eq!(a.value, 3.5);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn values_are_clamped_to_signal_bounds() {
        let source = EnrichmentSource::new(SignalKind::School, counting(14.0), 4);
        let reading = source.score(1.0, 1.0).await;
        assert_eq!(reading.value, 10.0);
        assert!(!reading.degraded);
    }

    #[tokio::test]
    async fn failure_yields_degraded_neutral_value() {
        let source = EnrichmentSource::new(SignalKind::Crime, Arc::new(FailingProvider), 4);
        let reading = source.score(30.0, -97.0).await;
        assert_eq!(reading.value, 5.0);
        assert!(reading.degraded);
    }

    #[tokio::test]
    async fn non_finite_value_is_degraded() {
        let source = EnrichmentSource::new(SignalKind::School, counting(f64::NAN), 4);
        let reading = source.score(30.0, -97.0).await;
        assert!(reading.degraded);
        assert_eq!(reading.value, 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_yields_degraded_value() {
        let source = EnrichmentSource::new(SignalKind::MarketProximity, Arc::new(SlowProvider), 4)
            .with_timeout(Duration::from_secs(1))
            .with_neutral(2.5);
        let reading = source.score(30.0, -97.0).await;
        assert!(reading.degraded);
        assert_eq!(reading.value, 2.5);
    }

    #[test]
    fn neutral_is_clamped() {
        let source = EnrichmentSource::new(SignalKind::Crime, Arc::new(FailingProvider), 4)
            .with_neutral(42.0);
        assert_eq!(source.neutral(), 10.0);
    }
}
