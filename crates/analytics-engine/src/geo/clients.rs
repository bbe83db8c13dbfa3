//! HTTP clients for the public lookup services.
//!
//! ViaCEP answers postal codes, BrasilAPI answers CNPJ registrations. Both
//! are free services with no auth; the resolver paces calls to stay inside
//! their informal rate limits.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::error::LookupError;
use crate::geo::lookup::{CepAddress, CepLookup, CnpjInfo, CnpjLookup};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for https://viacep.com.br.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    // ViaCEP answers 200 with {"erro": true} for unknown codes.
    #[serde(default)]
    erro: bool,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

impl ViaCepClient {
    pub fn new() -> Self {
        Self::with_base_url("https://viacep.com.br")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for ViaCepClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CepLookup for ViaCepClient {
    async fn lookup(&self, cep: &str) -> Result<Option<CepAddress>, LookupError> {
        let url = format!("{}/ws/{}/json/", self.base_url, cep);
        let response = self.client.get(&url).send().await?;

        // ViaCEP returns 400 for malformed codes; treat as "not found"
        // rather than an error since validation upstream should prevent it.
        if response.status() == StatusCode::BAD_REQUEST {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LookupError::Transport(format!(
                "viacep status {}",
                response.status()
            )));
        }

        let body: ViaCepResponse = response.json().await?;
        if body.erro {
            return Ok(None);
        }
        Ok(Some(CepAddress {
            street: body.logradouro,
            neighborhood: body.bairro,
            city: body.localidade,
            state: body.uf,
        }))
    }
}

/// Client for https://brasilapi.com.br CNPJ registrations.
#[derive(Debug, Clone)]
pub struct BrasilApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct BrasilApiCnpjResponse {
    #[serde(default)]
    municipio: Option<String>,
    #[serde(default)]
    uf: Option<String>,
}

impl BrasilApiClient {
    pub fn new() -> Self {
        Self::with_base_url("https://brasilapi.com.br")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for BrasilApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CnpjLookup for BrasilApiClient {
    async fn lookup(&self, cnpj: &str) -> Result<Option<CnpjInfo>, LookupError> {
        let url = format!("{}/api/cnpj/v1/{}", self.base_url, cnpj);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND
            || response.status() == StatusCode::BAD_REQUEST
        {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LookupError::Transport(format!(
                "brasilapi status {}",
                response.status()
            )));
        }

        let body: BrasilApiCnpjResponse = response.json().await?;
        Ok(Some(CnpjInfo {
            city: body.municipio,
            state: body.uf,
        }))
    }
}
