use crate::error::{Result, ScoutError};
use crate::models::SearchCriteria;
use url::Url;

/// `<base>/city/<city-slug>/<STATE>/filter?min-price=…&max-price=…&beds=…&baths=…`
pub fn filter_url(base: &Url, criteria: &SearchCriteria) -> Result<Url> {
    let slug = slugify(criteria.city());
    let path = format!("city/{}/{}/filter", slug, criteria.state().to_uppercase());
    let mut url = base
        .join(&path)
        .map_err(|e| ScoutError::Configuration(format!("cannot build search URL: {e}")))?;

    let (min_price, max_price) = criteria.price_range();
    let (min_beds, max_beds) = criteria.bed_range();
    let (min_baths, max_baths) = criteria.bath_range();
    url.query_pairs_mut()
        .append_pair("min-price", &min_price.to_string())
        .append_pair("max-price", &max_price.to_string())
        .append_pair("beds", &format!("{min_beds}-{max_beds}"))
        .append_pair("baths", &format!("{min_baths}-{max_baths}"));
    Ok(url)
}

fn slugify(city: &str) -> String {
    city.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
