//! Tiered geographic resolution of a sale document to a city.
//!
//! Tier 1 asks the CNPJ registry about the selling company, tier 2 asks
//! the postal-code service about the buyer's CEP, tier 3 falls back to the
//! free-text municipality typed on the form. Every external outcome,
//! positive or negative, is memoized in the shared [`GeoCache`], and each
//! external call is preceded by a fixed delay so the public services never
//! see bursts.

pub mod cache;
pub mod cities;
pub mod clients;
pub mod lookup;

use std::sync::Arc;
use std::time::Duration;

use shared_types::SaleDocument;
use tracing::{debug, warn};

use crate::text::digits;
use cache::{GeoCache, GeoCacheEntry};
use cities::{coordinates_for, normalize_city, validate_cep, REGION_CENTROID, TARGET_STATE};
use lookup::{CepLookup, CnpjLookup};

/// Resolver tuning. The delay applies before every external call and is
/// deliberately not parallelized; resolution is one record at a time.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub call_delay: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            call_delay: Duration::from_millis(300),
        }
    }
}

/// A resolved location. Coordinates and state are present for the two
/// external tiers; the free-text fallback guarantees neither.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: String,
    pub state: Option<String>,
}

pub struct GeoResolver<C, J> {
    cep_lookup: C,
    cnpj_lookup: J,
    cache: Arc<GeoCache>,
    config: ResolverConfig,
}

impl<C: CepLookup, J: CnpjLookup> GeoResolver<C, J> {
    pub fn new(cep_lookup: C, cnpj_lookup: J, cache: Arc<GeoCache>, config: ResolverConfig) -> Self {
        Self {
            cep_lookup,
            cnpj_lookup,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }

    /// Resolve one document. First tier to succeed wins; `None` only when
    /// even the free-text municipality is blank.
    pub async fn resolve(&self, doc: &SaleDocument) -> Option<ResolvedLocation> {
        if let Some(location) = self.resolve_by_cnpj(&doc.company_tax_id).await {
            return Some(location);
        }
        if let Some(location) = self.resolve_by_cep(&doc.buyer_cep).await {
            return Some(location);
        }

        let city = normalize_city(&doc.buyer_city);
        if city.is_empty() {
            None
        } else {
            Some(ResolvedLocation {
                latitude: None,
                longitude: None,
                city,
                state: None,
            })
        }
    }

    async fn resolve_by_cnpj(&self, raw: &str) -> Option<ResolvedLocation> {
        let cnpj = digits(raw);
        if cnpj.len() != 14 {
            return None;
        }
        if let Some(entry) = self.cache.get(&cnpj) {
            debug!(key = %cnpj, "geo cache hit");
            return into_location(entry);
        }

        self.pace().await;
        let entry = match self.cnpj_lookup.lookup(&cnpj).await {
            Ok(Some(info)) => accept(info.city.as_deref(), info.state.as_deref()),
            Ok(None) => GeoCacheEntry::Unresolvable,
            Err(err) => {
                warn!(cnpj = %cnpj, error = %err, "CNPJ lookup failed");
                GeoCacheEntry::Unresolvable
            }
        };
        self.cache.put(&cnpj, entry.clone());
        into_location(entry)
    }

    async fn resolve_by_cep(&self, raw: &str) -> Option<ResolvedLocation> {
        let cep = validate_cep(raw)?;
        if let Some(entry) = self.cache.get(&cep) {
            debug!(key = %cep, "geo cache hit");
            return into_location(entry);
        }

        self.pace().await;
        let entry = match self.cep_lookup.lookup(&cep).await {
            Ok(Some(address)) => accept(Some(&address.city), Some(&address.state)),
            Ok(None) => GeoCacheEntry::Unresolvable,
            Err(err) => {
                warn!(cep = %cep, error = %err, "CEP lookup failed");
                GeoCacheEntry::Unresolvable
            }
        };
        self.cache.put(&cep, entry.clone());
        into_location(entry)
    }

    async fn pace(&self) {
        if !self.config.call_delay.is_zero() {
            tokio::time::sleep(self.config.call_delay).await;
        }
    }
}

/// Acceptance rule shared by both external tiers: the returned state must
/// be the target region and the city must be recognizable. Cities without
/// precise coordinates on file pin to the regional centroid.
fn accept(city: Option<&str>, state: Option<&str>) -> GeoCacheEntry {
    let state = state.unwrap_or("").trim().to_uppercase();
    let city = normalize_city(city.unwrap_or(""));
    if state != TARGET_STATE || city.is_empty() {
        return GeoCacheEntry::Unresolvable;
    }
    let (latitude, longitude) = coordinates_for(&city).unwrap_or(REGION_CENTROID);
    GeoCacheEntry::Resolved {
        latitude,
        longitude,
        city,
        state,
    }
}

fn into_location(entry: GeoCacheEntry) -> Option<ResolvedLocation> {
    match entry {
        GeoCacheEntry::Resolved {
            latitude,
            longitude,
            city,
            state,
        } => Some(ResolvedLocation {
            latitude: Some(latitude),
            longitude: Some(longitude),
            city,
            state: Some(state),
        }),
        GeoCacheEntry::Unresolvable => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use async_trait::async_trait;
    use lookup::{CepAddress, CnpjInfo};
    use shared_types::ProductSelection;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct FakeCep {
        answer: Option<CepAddress>,
        fail: bool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CepLookup for FakeCep {
        async fn lookup(&self, _cep: &str) -> Result<Option<CepAddress>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LookupError::Transport("connection reset".into()));
            }
            Ok(self.answer.clone())
        }
    }

    #[derive(Default)]
    struct FakeCnpj {
        answer: Option<CnpjInfo>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CnpjLookup for FakeCnpj {
        async fn lookup(&self, _cnpj: &str) -> Result<Option<CnpjInfo>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    fn doc(cnpj: &str, cep: &str, city: &str) -> SaleDocument {
        SaleDocument {
            id: "doc".into(),
            buyer_name: "JOAO".into(),
            buyer_tax_id: String::new(),
            buyer_cep: cep.into(),
            buyer_city: city.into(),
            company_name: String::new(),
            company_tax_id: cnpj.into(),
            plate: String::new(),
            renavam: String::new(),
            sale_value: String::new(),
            products: ProductSelection::default(),
            created_at: String::new(),
        }
    }

    fn instant_config() -> ResolverConfig {
        ResolverConfig {
            call_delay: Duration::ZERO,
        }
    }

    fn rs_address(city: &str) -> CepAddress {
        CepAddress {
            street: String::new(),
            neighborhood: String::new(),
            city: city.into(),
            state: "RS".into(),
        }
    }

    #[tokio::test]
    async fn cnpj_tier_wins_over_cep_tier() {
        let cep = FakeCep {
            answer: Some(rs_address("Pelotas")),
            ..Default::default()
        };
        let cnpj = FakeCnpj {
            answer: Some(CnpjInfo {
                city: Some("Caxias do Sul".into()),
                state: Some("RS".into()),
            }),
            ..Default::default()
        };
        let resolver = GeoResolver::new(cep, cnpj, Arc::new(GeoCache::new()), instant_config());

        let location = resolver
            .resolve(&doc("12.345.678/0001-95", "90010-150", ""))
            .await
            .unwrap();
        assert_eq!(location.city, "CAXIAS DO SUL");
        assert_eq!(location.state.as_deref(), Some("RS"));
        assert_eq!(location.latitude, Some(-29.1678));
        assert_eq!(resolver.cep_lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn short_cnpj_skips_straight_to_cep_tier() {
        let cep = FakeCep {
            answer: Some(rs_address("Porto Alegre")),
            ..Default::default()
        };
        let resolver = GeoResolver::new(
            cep,
            FakeCnpj::default(),
            Arc::new(GeoCache::new()),
            instant_config(),
        );

        let location = resolver.resolve(&doc("123", "90010150", "")).await.unwrap();
        assert_eq!(location.city, "PORTO ALEGRE");
        assert_eq!(resolver.cnpj_lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_cep_falls_through_to_free_text() {
        let cep = FakeCep {
            answer: Some(rs_address("Porto Alegre")),
            ..Default::default()
        };
        let resolver = GeoResolver::new(
            cep,
            FakeCnpj::default(),
            Arc::new(GeoCache::new()),
            instant_config(),
        );

        // "00123456" fails validation, so the collaborator is never called.
        let location = resolver
            .resolve(&doc("", "00123456", "Santa Maria"))
            .await
            .unwrap();
        assert_eq!(location.city, "SANTA MARIA");
        assert_eq!(location.latitude, None);
        assert_eq!(location.state, None);
        assert_eq!(resolver.cep_lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_state_is_rejected_and_cached_negative() {
        let cep = FakeCep {
            answer: Some(CepAddress {
                street: String::new(),
                neighborhood: String::new(),
                city: "Florianópolis".into(),
                state: "SC".into(),
            }),
            ..Default::default()
        };
        let cache = Arc::new(GeoCache::new());
        let resolver = GeoResolver::new(cep, FakeCnpj::default(), cache.clone(), instant_config());

        // RS-range CEP answered with an out-of-region address.
        let location = resolver.resolve(&doc("", "90010150", "Viamão")).await.unwrap();
        assert_eq!(location.city, "VIAMAO");
        assert_eq!(cache.get("90010150"), Some(GeoCacheEntry::Unresolvable));
    }

    #[tokio::test]
    async fn failed_lookup_is_never_retried() {
        let cep = FakeCep {
            fail: true,
            ..Default::default()
        };
        let resolver = GeoResolver::new(
            cep,
            FakeCnpj::default(),
            Arc::new(GeoCache::new()),
            instant_config(),
        );

        let record = doc("", "90010150", "Canoas");
        let first = resolver.resolve(&record).await.unwrap();
        let second = resolver.resolve(&record).await.unwrap();
        assert_eq!(first.city, "CANOAS");
        assert_eq!(second.city, "CANOAS");
        assert_eq!(resolver.cep_lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_city_pins_to_regional_centroid() {
        let cep = FakeCep {
            answer: Some(rs_address("Tapes")),
            ..Default::default()
        };
        let resolver = GeoResolver::new(
            cep,
            FakeCnpj::default(),
            Arc::new(GeoCache::new()),
            instant_config(),
        );

        let location = resolver.resolve(&doc("", "96760000", "")).await.unwrap();
        assert_eq!(location.city, "TAPES");
        assert_eq!(location.latitude, Some(REGION_CENTROID.0));
        assert_eq!(location.longitude, Some(REGION_CENTROID.1));
    }

    #[tokio::test]
    async fn blank_document_resolves_to_none() {
        let resolver = GeoResolver::new(
            FakeCep::default(),
            FakeCnpj::default(),
            Arc::new(GeoCache::new()),
            instant_config(),
        );
        assert_eq!(resolver.resolve(&doc("", "", "")).await, None);
    }
}
