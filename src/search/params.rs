use crate::models::SearchCriteria;
use serde::Serialize;

/// Provider-neutral listing query derived from [`SearchCriteria`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParams {
    pub min_price: u64,
    pub max_price: u64,
    pub min_beds: u32,
    pub max_beds: u32,
    pub min_baths: f64,
    pub max_baths: f64,
    /// Sorted, lowercase property-type tags
    pub property_types: Vec<String>,
    /// Listings requested per page
    pub page_size: usize,
    /// Zero-based page index
    pub page: usize,
}

impl QueryParams {
    pub fn from_criteria(criteria: &SearchCriteria, page_size: usize) -> Self {
        let (min_price, max_price) = criteria.price_range();
        let (min_beds, max_beds) = criteria.bed_range();
        let (min_baths, max_baths) = criteria.bath_range();
        Self {
            min_price,
            max_price,
            min_beds,
            max_beds,
            min_baths,
            max_baths,
            property_types: criteria.property_types().iter().cloned().collect(),
            page_size,
            page: 0,
        }
    }

    pub fn for_page(&self, page: usize) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}
