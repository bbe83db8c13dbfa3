//! Seams for the two external lookup collaborators.

use async_trait::async_trait;

use crate::error::LookupError;

/// Address data returned by a postal-code lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CepAddress {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// Registration data returned by a tax-id lookup. Either field may be
/// missing when the registry has no address block on file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CnpjInfo {
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Postal-code lookup collaborator. Input is already normalized to exactly
/// eight digits; `Ok(None)` means "code unknown to the service".
#[async_trait]
pub trait CepLookup: Send + Sync {
    async fn lookup(&self, cep: &str) -> Result<Option<CepAddress>, LookupError>;
}

/// Tax-id lookup collaborator. Input is already normalized to exactly
/// fourteen digits; `Ok(None)` means "registration not found".
#[async_trait]
pub trait CnpjLookup: Send + Sync {
    async fn lookup(&self, cnpj: &str) -> Result<Option<CnpjInfo>, LookupError>;
}
