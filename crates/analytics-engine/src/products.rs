//! Revenue categorization of the "produtosSelecionados" field.
//!
//! The field is free-form: a list on newer documents, prose on older ones,
//! a single code on the oldest. Whatever the shape, it boils down to three
//! keyword flags (ATPV transfer, digital signature, sale communication),
//! and the flag combination picks one of four fixed-price service tiers.

use crate::text::normalize;
use shared_types::ProductSelection;

/// The four service tiers, cheapest first. Prices are the fixed table
/// values in BRL; revenue aggregation sums these, never the sale value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCategory {
    Atpv,
    AtpvAssinatura,
    AtpvComunicacao,
    Completo,
}

impl ProductCategory {
    pub fn price(self) -> u64 {
        match self {
            ProductCategory::Atpv => 150,
            ProductCategory::AtpvAssinatura => 200,
            ProductCategory::AtpvComunicacao => 230,
            ProductCategory::Completo => 280,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProductCategory::Atpv => "ATPV",
            ProductCategory::AtpvAssinatura => "ATPV + Assinatura",
            ProductCategory::AtpvComunicacao => "ATPV + Comunicação",
            ProductCategory::Completo => "Completo",
        }
    }
}

/// Common misspellings seen in submitted forms, applied after
/// normalization (so accents are already folded).
const SPELLING_FIXES: &[(&str, &str)] = &[
    ("COMUNICASSAO", "COMUNICACAO"),
    ("CUMUNICACAO", "COMUNICACAO"),
    ("COMUNICAO", "COMUNICACAO"),
    ("ASINATURA", "ASSINATURA"),
    ("ASS DIGITAL", "ASSINATURA"),
    ("ATPV-E", "ATPV"),
    ("ATPVE", "ATPV"),
];

/// Single-code values used before the products field became a list.
const LEGACY_CODES: &[(&str, &str)] = &[
    ("1", "ATPV"),
    ("2", "ATPV ASSINATURA"),
    ("3", "ATPV COMUNICACAO"),
    ("4", "ATPV ASSINATURA COMUNICACAO"),
    ("ATPV_ASS", "ATPV ASSINATURA"),
    ("ATPV_COM", "ATPV COMUNICACAO"),
    ("ATPV_COMPLETO", "ATPV ASSINATURA COMUNICACAO"),
];

/// Categorize a product selection. Total: unrecognized input lands on the
/// cheapest tier, never an error.
pub fn categorize(selection: &ProductSelection) -> ProductCategory {
    let mut text = normalize(&selection.flatten());

    if let Some(expansion) = legacy_expansion(&text) {
        text = expansion.to_string();
    }
    for (wrong, right) in SPELLING_FIXES {
        text = text.replace(wrong, right);
    }

    let has_base = text.contains("ATPV");
    let has_signature = text.contains("ASSINATURA");
    let has_communication = text.contains("COMUNICACAO");

    match (has_base, has_signature, has_communication) {
        (true, true, true) => ProductCategory::Completo,
        (true, true, false) => ProductCategory::AtpvAssinatura,
        (true, false, true) => ProductCategory::AtpvComunicacao,
        _ => ProductCategory::Atpv,
    }
}

fn legacy_expansion(normalized: &str) -> Option<&'static str> {
    LEGACY_CODES
        .iter()
        .find(|(code, _)| *code == normalized)
        .map(|(_, expansion)| *expansion)
}
