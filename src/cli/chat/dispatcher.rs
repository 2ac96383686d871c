use std::fmt;

use futures::future::try_join_all;
use secrecy::SecretString;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::serp_client::{OrganicResult, SiteSearch};

/// Maximum listings taken from each retailer per query.
pub const RESULTS_PER_RETAILER: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Retailer {
    #[serde(rename = "flipkart.com")]
    Flipkart,
    #[serde(rename = "amazon.in")]
    AmazonIn,
}

impl Retailer {
    /// Search order; listings are returned grouped in this order.
    pub const ALL: [Retailer; 2] = [Retailer::Flipkart, Retailer::AmazonIn];

    pub fn domain(&self) -> &'static str {
        match self {
            Retailer::Flipkart => "flipkart.com",
            Retailer::AmazonIn => "amazon.in",
        }
    }
}

impl fmt::Display for Retailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.domain())
    }
}

/// A product search hit, normalized across retailers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub source: Retailer,
}

impl Listing {
    fn from_result(result: OrganicResult, source: Retailer) -> Self {
        Self {
            title: result.title.unwrap_or_default(),
            link: result.link.unwrap_or_default(),
            snippet: result.snippet.unwrap_or_default(),
            source,
        }
    }
}

pub fn site_query(retailer: Retailer, query: &str) -> String {
    format!("site:{} {}", retailer.domain(), query)
}

/// Searches every retailer for `query` and returns at most
/// `RESULTS_PER_RETAILER` listings from each, retailer order first and
/// search rank second.
///
/// The per-retailer requests run concurrently. Any failed request fails the
/// whole search.
pub async fn search_products(
    search: &dyn SiteSearch,
    api_key: &SecretString,
    query: &str,
) -> Result<Vec<Listing>> {
    let lookups = Retailer::ALL
        .iter()
        .map(|&retailer| search_retailer(search, api_key, retailer, query));

    let per_retailer = try_join_all(lookups).await?;

    Ok(per_retailer.into_iter().flatten().collect())
}

async fn search_retailer(
    search: &dyn SiteSearch,
    api_key: &SecretString,
    retailer: Retailer,
    query: &str,
) -> Result<Vec<Listing>> {
    let results = search
        .search(api_key, &site_query(retailer, query), RESULTS_PER_RETAILER)
        .await?;

    info!("{} returned {} results", retailer, results.len());

    Ok(results
        .into_iter()
        .take(RESULTS_PER_RETAILER)
        .map(|result| Listing::from_result(result, retailer))
        .collect())
}
