use serde::{Deserialize, Serialize};

/// The stored "produtosSelecionados" field, which shows up in three shapes:
/// newer documents carry a list of product names, older ones a free-text
/// description, and the oldest a single legacy code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductSelection {
    List(Vec<String>),
    Text(String),
    // Never produced by deserialization (indistinguishable from Text on the
    // wire); constructed by callers migrating pre-2022 records.
    LegacyCode(String),
}

impl ProductSelection {
    /// Collapse the selection into a single string for keyword analysis.
    pub fn flatten(&self) -> String {
        match self {
            ProductSelection::Text(s) => s.clone(),
            ProductSelection::List(items) => items.join(" "),
            ProductSelection::LegacyCode(code) => code.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ProductSelection::Text(s) | ProductSelection::LegacyCode(s) => s.trim().is_empty(),
            ProductSelection::List(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }
}

impl Default for ProductSelection {
    fn default() -> Self {
        ProductSelection::Text(String::new())
    }
}

/// One submitted sale document as stored in the document store.
///
/// Every field except `id` may be blank on real submissions; the analytics
/// pipeline treats blanks as "absent" rather than rejecting the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDocument {
    pub id: String,
    #[serde(rename = "nomeComprador", default)]
    pub buyer_name: String,
    /// CPF or CNPJ of the buyer, punctuation included as typed.
    #[serde(rename = "cpfCnpjComprador", default)]
    pub buyer_tax_id: String,
    #[serde(rename = "cepComprador", default)]
    pub buyer_cep: String,
    /// Free-text municipality, straight from the form.
    #[serde(rename = "municipioComprador", default)]
    pub buyer_city: String,
    #[serde(rename = "nomeEmpresa", default)]
    pub company_name: String,
    #[serde(rename = "cnpjEmpresa", default)]
    pub company_tax_id: String,
    #[serde(rename = "placa", default)]
    pub plate: String,
    #[serde(rename = "renavam", default)]
    pub renavam: String,
    /// Locale-formatted text, e.g. "1.234,56".
    #[serde(rename = "valorVenda", default)]
    pub sale_value: String,
    #[serde(rename = "produtosSelecionados", default)]
    pub products: ProductSelection,
    /// Creation timestamp as stored; parsed best effort downstream.
    #[serde(rename = "criadoEm", default)]
    pub created_at: String,
}

/// Overall numbers across the whole deduplicated batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    #[serde(rename = "totalDocumentos")]
    pub total_documents: u64,
    #[serde(rename = "receitaTotal")]
    pub revenue: u64,
    #[serde(rename = "ticketMedio")]
    pub average_ticket: f64,
    #[serde(rename = "crescimento")]
    pub growth_pct: f64,
    #[serde(rename = "compradoresUnicos")]
    pub distinct_buyers: u64,
    #[serde(rename = "cidadesAtendidas")]
    pub distinct_cities: u64,
}

/// Month-over-month direction of a city's document volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityMetric {
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "documentos")]
    pub document_count: u64,
    #[serde(rename = "receita")]
    pub revenue: u64,
    /// Most frequent hour-of-day among the city's documents.
    #[serde(rename = "horaPico")]
    pub peak_hour: u32,
    #[serde(rename = "tendencia")]
    pub trend: Trend,
    #[serde(rename = "crescimento")]
    pub growth_pct: f64,
    #[serde(rename = "potencialMarketing")]
    pub marketing_potential: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendBucket {
    #[serde(rename = "periodo")]
    pub label: String,
    #[serde(rename = "documentos")]
    pub document_count: u64,
    #[serde(rename = "receita")]
    pub revenue: u64,
}

/// Full output of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesMetrics {
    #[serde(rename = "resumo")]
    pub overall: OverallMetrics,
    #[serde(rename = "porCidade")]
    pub per_city: Vec<CityMetric>,
    #[serde(rename = "tendencias")]
    pub trends: Vec<TrendBucket>,
}
