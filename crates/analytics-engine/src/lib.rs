//! Sales-document analytics for the dispatch platform.
//!
//! Takes the raw, possibly-duplicated document batch from the store and
//! produces overall metrics, per-city rollups and a period time series:
//! deduplication, product-tier revenue categorization, tiered geographic
//! resolution with a process-wide lookup cache, then aggregation.

pub mod aggregator;
pub mod dedup;
pub mod error;
pub mod extractors;
pub mod geo;
pub mod period;
pub mod products;
pub mod text;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared_types::{SaleDocument, SalesMetrics};

pub use error::LookupError;
pub use extractors::money::{parse_brl, SaleValueExt};
pub use geo::cache::{GeoCache, GeoCacheEntry};
pub use geo::clients::{BrasilApiClient, ViaCepClient};
pub use geo::lookup::{CepLookup, CnpjLookup};
pub use geo::{GeoResolver, ResolvedLocation, ResolverConfig};
pub use period::Period;
pub use products::{categorize, ProductCategory};

/// AnalyticsEngine entry point: owns the resolver (and through it the
/// process-wide cache) and runs whole-batch aggregations.
pub struct AnalyticsEngine<C, J> {
    resolver: GeoResolver<C, J>,
}

impl<C: CepLookup, J: CnpjLookup> AnalyticsEngine<C, J> {
    pub fn new(resolver: GeoResolver<C, J>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &GeoResolver<C, J> {
        &self.resolver
    }

    /// Aggregate a batch for the period ending now.
    pub async fn aggregate(&self, records: &[SaleDocument], period: Period) -> SalesMetrics {
        self.aggregate_at(records, period, Utc::now()).await
    }

    /// Aggregate with an explicit "now", for reproducible runs and tests.
    pub async fn aggregate_at(
        &self,
        records: &[SaleDocument],
        period: Period,
        now: DateTime<Utc>,
    ) -> SalesMetrics {
        aggregator::aggregate(&self.resolver, records, period, now).await
    }
}

impl AnalyticsEngine<ViaCepClient, BrasilApiClient> {
    /// Engine wired to the public ViaCEP and BrasilAPI services with
    /// default pacing. One instance per process keeps the cache shared.
    pub fn with_public_services() -> Self {
        let resolver = GeoResolver::new(
            ViaCepClient::new(),
            BrasilApiClient::new(),
            Arc::new(GeoCache::new()),
            ResolverConfig::default(),
        );
        Self::new(resolver)
    }
}
