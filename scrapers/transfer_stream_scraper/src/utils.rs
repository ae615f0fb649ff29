use scraper::ElementRef;

use crate::error::ParseError;

/// Name tokens that mark a youth or reserve side of a parent club.
pub const ACADEMY_QUALIFIERS: &[&str] = &[
    "Primavera",
    "Castilla",
    "Juvenil",
    "Youth",
    "Academy",
    "Reserves",
    "Jong",
];

pub fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

pub fn parse_count(text: &str, index: usize) -> Result<u32, ParseError> {
    text.trim().parse::<u32>().map_err(|_| ParseError::InvalidCount {
        index,
        text: text.to_string(),
    })
}

/// Normalizes a displayed fee ("€1.50m", "€500Th.") to millions.
///
/// Unrecognized or unparseable amounts ("-", "?", "free transfer") are 0.
/// A leading minus is kept, so "-€35.50m" is -35.5 rather than 35.5.
pub fn parse_money(text: &str) -> f64 {
    let text = text.trim();
    let in_thousands = if text.contains('m') {
        false
    } else if text.contains("Th") {
        true
    } else {
        return 0.0;
    };

    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value = match digits.parse::<f64>() {
        Ok(value) => value,
        Err(_) => return 0.0,
    };

    let value = if in_thousands {
        round_to_cents(value / 1000.0)
    } else {
        value
    };

    if text.starts_with('-') {
        -value
    } else {
        value
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn significant_tokens(name: &str) -> Vec<&str> {
    name.split_whitespace()
        .filter(|token| token.chars().count() > 3)
        .collect()
}

/// Whether `origin` looks like the youth or reserve side of `destination`.
///
/// Short tokens (club prefixes such as "FC", "SL", "U19") are ignored on both
/// sides. Names that then match exactly count as the same side; otherwise
/// academy qualifiers are dropped from the origin and the remaining words
/// must match. Best-effort: it only knows the qualifiers above.
pub fn is_academy(destination: &str, origin: &str) -> bool {
    let destination = significant_tokens(destination);
    if destination.is_empty() {
        return false;
    }

    let origin = significant_tokens(origin);
    if origin == destination {
        return true;
    }

    let origin: Vec<&str> = origin
        .into_iter()
        .filter(|token| !ACADEMY_QUALIFIERS.contains(token))
        .collect();

    origin == destination
}
