//! Target-region knowledge: CEP validation, city-name normalization and
//! the coordinate table used to pin resolved cities on the map.
//!
//! The resolver targets Rio Grande do Sul only; anything outside the RS
//! postal range or registered in another state is treated as unresolvable.

use std::ops::RangeInclusive;

use crate::text::{digits, normalize};

pub const TARGET_STATE: &str = "RS";

/// Porto Alegre, used for recognized cities missing from the table.
pub const REGION_CENTROID: (f64, f64) = (-30.0346, -51.2177);

/// CEP block reserved for Rio Grande do Sul.
const CEP_RANGE: RangeInclusive<u32> = 90_000_000..=99_999_999;

/// Lookup services return the numeral form of this municipality; IBGE and
/// our map tiles spell it out.
const NUMERIC_CITY_FIXES: &[(&str, &str)] = &[("15 DE NOVEMBRO", "QUINZE DE NOVEMBRO")];

const CITY_COORDINATES: &[(&str, f64, f64)] = &[
    ("PORTO ALEGRE", -30.0346, -51.2177),
    ("CAXIAS DO SUL", -29.1678, -51.1794),
    ("PELOTAS", -31.7654, -52.3376),
    ("CANOAS", -29.9177, -51.1844),
    ("SANTA MARIA", -29.6842, -53.8069),
    ("GRAVATAI", -29.9444, -50.9919),
    ("VIAMAO", -30.0811, -51.0233),
    ("NOVO HAMBURGO", -29.6875, -51.1328),
    ("SAO LEOPOLDO", -29.7603, -51.1472),
    ("RIO GRANDE", -32.0350, -52.0986),
    ("ALVORADA", -29.9914, -51.0809),
    ("PASSO FUNDO", -28.2576, -52.4091),
    ("SAPUCAIA DO SUL", -29.8276, -51.1454),
    ("URUGUAIANA", -29.7614, -57.0853),
    ("SANTA CRUZ DO SUL", -29.7175, -52.4258),
    ("BENTO GONCALVES", -29.1662, -51.5165),
    ("ERECHIM", -27.6364, -52.2697),
    ("QUINZE DE NOVEMBRO", -28.7464, -53.1003),
];

/// Normalize a city name for grouping: uppercase, deaccented, single
/// spaces, numeral prefixes spelled out.
pub fn normalize_city(raw: &str) -> String {
    let mut city = normalize(raw);
    for (numeral, spelled) in NUMERIC_CITY_FIXES {
        if city == *numeral {
            city = (*spelled).to_string();
        }
    }
    city
}

/// Coordinates for a normalized city name, if on file.
pub fn coordinates_for(city: &str) -> Option<(f64, f64)> {
    CITY_COORDINATES
        .iter()
        .find(|(name, _, _)| *name == city)
        .map(|(_, lat, lon)| (*lat, *lon))
}

/// Validate a raw CEP and return its normalized eight-digit form.
///
/// Rejected: anything other than exactly eight digits, all-identical
/// digits (test input), codes starting with "00", and codes outside the
/// RS numeric block.
pub fn validate_cep(raw: &str) -> Option<String> {
    let cep = digits(raw);
    if cep.len() != 8 {
        return None;
    }
    let first = cep.chars().next()?;
    if cep.chars().all(|c| c == first) {
        return None;
    }
    if cep.starts_with("00") {
        return None;
    }
    let numeric: u32 = cep.parse().ok()?;
    if !CEP_RANGE.contains(&numeric) {
        return None;
    }
    Some(cep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_rs_ceps_with_or_without_dash() {
        assert_eq!(validate_cep("90010-150"), Some("90010150".to_string()));
        assert_eq!(validate_cep("95020972"), Some("95020972".to_string()));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(validate_cep("9001015"), None);
        assert_eq!(validate_cep("900101500"), None);
        assert_eq!(validate_cep(""), None);
    }

    #[test]
    fn rejects_all_identical_digits() {
        assert_eq!(validate_cep("99999999"), None);
        assert_eq!(validate_cep("11111111"), None);
    }

    #[test]
    fn rejects_leading_double_zero() {
        assert_eq!(validate_cep("00123456"), None);
    }

    #[test]
    fn rejects_out_of_region_codes() {
        // São Paulo capital
        assert_eq!(validate_cep("01310100"), None);
        // Paraná
        assert_eq!(validate_cep("80010000"), None);
    }

    #[test]
    fn normalize_city_rewrites_numeral_prefix() {
        assert_eq!(normalize_city("15 de Novembro"), "QUINZE DE NOVEMBRO");
        assert_eq!(normalize_city("Porto  Alegre"), "PORTO ALEGRE");
    }

    #[test]
    fn coordinates_cover_the_numeral_city() {
        assert!(coordinates_for("QUINZE DE NOVEMBRO").is_some());
        assert!(coordinates_for("CIDADE INEXISTENTE").is_none());
    }
}
