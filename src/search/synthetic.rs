use crate::models::{Coordinate, ListingRecord, SearchCriteria, Source};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Every synthetic listing's external id starts with this
pub const SYNTHETIC_ID_PREFIX: &str = "SAMPLE";

const STREETS: [(u32, &str); 10] = [
    (123, "Main St"),
    (456, "Oak Ave"),
    (789, "Pine Dr"),
    (321, "Elm St"),
    (654, "Cedar Ln"),
    (987, "Maple Rd"),
    (147, "Birch Way"),
    (258, "Willow St"),
    (369, "Ash Blvd"),
    (741, "Hickory Ave"),
];

const BATH_CHOICES: [f64; 6] = [1.0, 1.5, 2.0, 2.5, 3.0, 3.5];

/// Max offset in degrees from the anchor
const SCATTER_DEGREES: f64 = 0.1;

/// Placeholder listings used when no real strategy produced results.
///
/// The shape is fixed (addresses, id scheme, value ranges); the values
/// are random within the criteria's bounds. Not for production decisions.
#[derive(Debug, Clone)]
pub struct SyntheticListings {
    count: usize,
    anchor: Coordinate,
    seed: Option<u64>,
}

impl SyntheticListings {
    pub fn new(count: usize, anchor: Coordinate, seed: Option<u64>) -> Self {
        Self {
            count,
            anchor,
            seed,
        }
    }

    pub fn generate(&self, criteria: &SearchCriteria) -> Vec<ListingRecord> {
        info!(
            "Generating sample data for {}, {}",
            criteria.city(),
            criteria.state()
        );

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (min_price, max_price) = criteria.price_range();
        let (min_beds, max_beds) = criteria.bed_range();
        let (min_baths, max_baths) = criteria.bath_range();
        let baths_in_range: Vec<f64> = BATH_CHOICES
            .iter()
            .copied()
            .filter(|b| (min_baths..=max_baths).contains(b))
            .collect();
        let property_types: Vec<&String> = criteria.property_types().iter().collect();
        let city_slug = criteria.city().to_lowercase().replace(' ', "-");

        let listings: Vec<ListingRecord> = (0..self.count)
            .map(|i| {
                let (number, street) = STREETS[i % STREETS.len()];
                let number = number + 1000 * (i / STREETS.len()) as u32;
                let address = format!(
                    "{} {}, {}, {}",
                    number,
                    street,
                    criteria.city(),
                    criteria.state()
                );
                let location = Coordinate::new(
                    self.anchor.latitude + rng.gen_range(-SCATTER_DEGREES..=SCATTER_DEGREES),
                    self.anchor.longitude + rng.gen_range(-SCATTER_DEGREES..=SCATTER_DEGREES),
                );
                let baths = baths_in_range
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(min_baths);
                let property_type = property_types
                    .choose(&mut rng)
                    .map(|t| t.as_str())
                    .unwrap_or("house");
                let lot_size = (rng.gen_range(0.1..=0.5_f64) * 100.0).round() / 100.0;

                ListingRecord::new(address, rng.gen_range(min_price..=max_price), location)
                    .with_id(format!("{}{}", SYNTHETIC_ID_PREFIX, 1000 + i))
                    .with_source(Source::Synthetic)
                    .with_rooms(rng.gen_range(min_beds..=max_beds), baths)
                    .with_details(
                        Some(rng.gen_range(1200..=3500)),
                        Some(lot_size),
                        Some(rng.gen_range(1980..=2020)),
                    )
                    .with_property_type(property_type)
                    .with_url(format!(
                        "https://www.redfin.com/{}/{}/sample-{}",
                        criteria.state(),
                        city_slug,
                        i + 1
                    ))
            })
            .collect();

        info!("Generated {} sample properties", listings.len());
        listings
    }
}

/// True when an external id marks a synthetic listing.
pub fn is_synthetic_id(id: &str) -> bool {
    id.starts_with(SYNTHETIC_ID_PREFIX)
}
