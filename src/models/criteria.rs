use crate::error::{Result, ScoutError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Property types accepted when the caller does not name any
pub const DEFAULT_PROPERTY_TYPES: [&str; 3] = ["house", "condo", "townhouse"];

/// A buyer's search request. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchCriteria {
    city: String,
    state: String,
    min_price: u64,
    max_price: u64,
    min_beds: u32,
    max_beds: u32,
    min_baths: f64,
    max_baths: f64,
    property_types: BTreeSet<String>,
}

impl SearchCriteria {
    pub fn builder(city: impl Into<String>, state: impl Into<String>) -> SearchCriteriaBuilder {
        SearchCriteriaBuilder::new(city, state)
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn price_range(&self) -> (u64, u64) {
        (self.min_price, self.max_price)
    }

    pub fn bed_range(&self) -> (u32, u32) {
        (self.min_beds, self.max_beds)
    }

    pub fn bath_range(&self) -> (f64, f64) {
        (self.min_baths, self.max_baths)
    }

    pub fn property_types(&self) -> &BTreeSet<String> {
        &self.property_types
    }

    /// "Austin, TX"
    pub fn location_label(&self) -> String {
        format!("{}, {}", self.city, self.state)
    }
}

/// Builder for [`SearchCriteria`]; defaults follow a broad residential search.
#[derive(Debug, Clone)]
pub struct SearchCriteriaBuilder {
    city: String,
    state: String,
    min_price: u64,
    max_price: u64,
    min_beds: u32,
    max_beds: u32,
    min_baths: f64,
    max_baths: f64,
    property_types: Option<Vec<String>>,
}

impl SearchCriteriaBuilder {
    fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
            min_price: 0,
            max_price: 5_000_000,
            min_beds: 1,
            max_beds: 10,
            min_baths: 1.0,
            max_baths: 10.0,
            property_types: None,
        }
    }

    pub fn price(mut self, min: u64, max: u64) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn beds(mut self, min: u32, max: u32) -> Self {
        self.min_beds = min;
        self.max_beds = max;
        self
    }

    pub fn baths(mut self, min: f64, max: f64) -> Self {
        self.min_baths = min;
        self.max_baths = max;
        self
    }

    pub fn property_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.property_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Validates and freezes the criteria.
    ///
    /// # Errors
    ///
    /// [`ScoutError::Configuration`] when a required field is blank, any
    /// range is inverted, or the property-type set ends up empty.
    pub fn build(self) -> Result<SearchCriteria> {
        let city = self.city.trim().to_string();
        let state = self.state.trim().to_string();
        if city.is_empty() {
            return Err(ScoutError::Configuration("city must not be empty".into()));
        }
        if state.is_empty() {
            return Err(ScoutError::Configuration("state must not be empty".into()));
        }
        if self.min_price > self.max_price {
            return Err(ScoutError::Configuration(format!(
                "min_price {} exceeds max_price {}",
                self.min_price, self.max_price
            )));
        }
        if self.min_beds > self.max_beds {
            return Err(ScoutError::Configuration(format!(
                "min_beds {} exceeds max_beds {}",
                self.min_beds, self.max_beds
            )));
        }
        if !self.min_baths.is_finite() || !self.max_baths.is_finite() || self.min_baths < 0.0 {
            return Err(ScoutError::Configuration(
                "bath bounds must be finite and non-negative".into(),
            ));
        }
        if self.min_baths > self.max_baths {
            return Err(ScoutError::Configuration(format!(
                "min_baths {} exceeds max_baths {}",
                self.min_baths, self.max_baths
            )));
        }

        let property_types: BTreeSet<String> = match self.property_types {
            Some(types) => types
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            None => DEFAULT_PROPERTY_TYPES.iter().map(|t| t.to_string()).collect(),
        };
        if property_types.is_empty() {
            return Err(ScoutError::Configuration(
                "at least one property type is required".into(),
            ));
        }

        Ok(SearchCriteria {
            city,
            state,
            min_price: self.min_price,
            max_price: self.max_price,
            min_beds: self.min_beds,
            max_beds: self.max_beds,
            min_baths: self.min_baths,
            max_baths: self.max_baths,
            property_types,
        })
    }
}
