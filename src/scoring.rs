//! Weighted scoring of enriched listings.
//!
//! Each signal is normalised into `[0, 1]` (higher is better), weighted,
//! summed and scaled back to a `0-10` score:
//!
//! ```text
//! crime   = clamp((10 - crime_score) / 10, 0, 1)
//! school  = clamp(school_score / 10, 0, 1)
//! market  = clamp((D - market_distance) / D, 0, 1)      D = horizon in miles
//! overall = round2(10 * (w_crime * crime + w_school * school + w_market * market))
//! ```

use crate::error::{Result, ScoutError};

/// Tolerance when checking that weights sum to 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Relative weight of each signal in the overall score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub crime: f64,
    pub school: f64,
    pub market: f64,
}

impl ScoringWeights {
    pub fn new(crime: f64, school: f64, market: f64) -> Self {
        Self {
            crime,
            school,
            market,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let parts = [self.crime, self.school, self.market];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ScoutError::Configuration(
                "scoring weights must be finite and non-negative".into(),
            ));
        }
        let sum: f64 = parts.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoutError::Configuration(format!(
                "scoring weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    /// School quality weighted highest.
    fn default() -> Self {
        Self::new(0.3, 0.4, 0.3)
    }
}

/// The raw signal values a score is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalValues {
    pub crime_score: f64,
    pub school_score: f64,
    pub market_distance: f64,
}

/// Deterministic, side-effect-free scorer.
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    weights: ScoringWeights,
    horizon_miles: f64,
}

impl ScoringEngine {
    /// # Errors
    ///
    /// [`ScoutError::Configuration`] if the weights are invalid or the
    /// horizon is not a positive number.
    pub fn new(weights: ScoringWeights, horizon_miles: f64) -> Result<Self> {
        weights.validate()?;
        if !horizon_miles.is_finite() || horizon_miles <= 0.0 {
            return Err(ScoutError::Configuration(
                "distance horizon must be a positive number".into(),
            ));
        }
        Ok(Self {
            weights,
            horizon_miles,
        })
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    pub fn horizon_miles(&self) -> f64 {
        self.horizon_miles
    }

    /// Overall score in `[0, 10]`, rounded to two decimal places.
    pub fn score(&self, signals: &SignalValues) -> f64 {
        let weighted = self.weights.crime * normalize_crime(signals.crime_score)
            + self.weights.school * normalize_school(signals.school_score)
            + self.weights.market * normalize_market(signals.market_distance, self.horizon_miles);
        round2((weighted * 10.0).clamp(0.0, 10.0))
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            horizon_miles: 4.0,
        }
    }
}

/// Lower crime yields a higher contribution.
pub fn normalize_crime(crime_score: f64) -> f64 {
    ((10.0 - crime_score) / 10.0).clamp(0.0, 1.0)
}

pub fn normalize_school(school_score: f64) -> f64 {
    (school_score / 10.0).clamp(0.0, 1.0)
}

/// Distances at or beyond the horizon contribute nothing.
pub fn normalize_market(market_distance: f64, horizon_miles: f64) -> f64 {
    ((horizon_miles - market_distance) / horizon_miles).clamp(0.0, 1.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
