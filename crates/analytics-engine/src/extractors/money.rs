// Locale money parsing for the stored sale value ("R$ 1.234,56" forms).
use lazy_static::lazy_static;
use regex::Regex;
use shared_types::SaleDocument;

lazy_static! {
    static ref AMOUNT: Regex = Regex::new(r"\d[\d.,]*").unwrap();
}

/// Parse a Brazilian-formatted amount out of free text.
///
/// Thousands use dots and decimals a comma ("1.234,56"); plain decimal-dot
/// input ("1234.56") is also accepted since some imports stored it that way.
pub fn parse_brl(raw: &str) -> Option<f64> {
    let token = AMOUNT.find(raw)?.as_str().trim_end_matches(['.', ',']);

    let normalized = if token.contains(',') {
        token.replace('.', "").replace(',', ".")
    } else if token.matches('.').count() > 1 {
        // Dots only and more than one: all thousands separators.
        token.replace('.', "")
    } else {
        token.to_string()
    };

    normalized.parse().ok()
}

/// Parsed access to the declared sale value of a stored document.
pub trait SaleValueExt {
    /// Declared sale value in BRL, `None` when the stored text carries no
    /// parseable amount. Reporting only; revenue always comes from the
    /// service-tier table, never from this field.
    fn sale_value_brl(&self) -> Option<f64>;
}

impl SaleValueExt for SaleDocument {
    fn sale_value_brl(&self) -> Option<f64> {
        parse_brl(&self.sale_value)
    }
}
