//! Text normalization shared by the categorizer, deduplicator and resolver.
//!
//! Form input arrives in mixed case with Portuguese diacritics and stray
//! whitespace; every comparison in the pipeline happens on the normalized
//! form produced here.

/// Uppercase, fold diacritics and collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    let folded: String = text.to_uppercase().chars().map(fold_accent).collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep only ASCII digits, e.g. "123.456.789-00" -> "12345678900".
pub fn digits(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'Ç' => 'C',
        'Ñ' => 'N',
        _ => c,
    }
}
