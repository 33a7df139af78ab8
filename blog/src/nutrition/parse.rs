//! Free-text ingredient measurement parsing.
//!
//! Queries look like `[<quantity>[<unit>]] <food name>`, e.g. "75g Butter",
//! "1/2 cup Flour", or just "Egg". A slash can also separate alternative
//! measurements ("50g/2oz sultanas"), in which case only the first one
//! counts.

/// A query resolved into a positive quantity, a lowercase unit token, and a
/// non-empty food name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuantity {
    pub quantity: f64,
    pub unit: String,
    pub food_name: String,
}

impl ParsedQuantity {
    /// The quantity converted to a grams basis via the unit table.
    pub fn total_grams(&self) -> f64 {
        self.quantity * grams_per_unit(&self.unit)
    }
}

/// Grams per one unit. Volumes assume a density of water. Unrecognized
/// units fall through to 1.0 (treated as already-grams) rather than
/// failing; this is a known precision gap kept for leniency.
pub fn grams_per_unit(unit: &str) -> f64 {
    match unit {
        "g" => 1.0,
        "kg" => 1000.0,
        "mg" => 0.001,
        "ml" => 1.0,
        "l" => 1000.0,
        "oz" => 28.3495,
        "lb" => 453.592,
        "tsp" => 5.0,
        "tbsp" => 15.0,
        "cup" => 240.0,
        _ => 1.0,
    }
}

/// Parses a query into quantity, unit, and food name. Returns `None` for
/// every input that should be treated as "nothing to look up": empty input,
/// a measurement with no food name after it, a malformed or non-positive
/// quantity.
pub fn parse_query(query: &str) -> Option<ParsedQuantity> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    // No leading number means no measurement: the whole query is the food
    // name, defaulting to 1 gram.
    if !leads_with_number(query) {
        return Some(ParsedQuantity {
            quantity: 1.0,
            unit: "g".to_string(),
            food_name: query.to_string(),
        });
    }

    // The food name is the text after the last space; everything before it
    // is the measurement prefix.
    let (measurement, food_name) = query.rsplit_once(' ')?;
    let food_name = food_name.trim();
    if food_name.is_empty() {
        return None;
    }

    let (quantity, unit) = parse_measurement(measurement.trim())?;
    if quantity <= 0.0 {
        return None;
    }

    Some(ParsedQuantity {
        quantity,
        unit,
        food_name: food_name.to_string(),
    })
}

/// Parses the leading measurement of a prefix like "75g", "1/2 cup", or
/// "50g/2oz". `a/b` is read as a fraction only when the first number has no
/// unit attached; a unit directly on the number ("50g/...") marks the slash
/// as separating alternative measurements, of which only the first is used.
fn parse_measurement(measurement: &str) -> Option<(f64, String)> {
    let (quantity, rest) = scan_number(measurement)?;

    let attached = leading_unit(rest);
    if !attached.is_empty() {
        return Some((quantity, attached.to_lowercase()));
    }

    if let Some(after_slash) = rest.strip_prefix('/') {
        let (denominator, rest) = scan_number(after_slash)?;
        if denominator == 0.0 {
            return None;
        }
        let unit = leading_unit(rest.trim_start());
        return Some((quantity / denominator, unit_or_grams(unit)));
    }

    let unit = leading_unit(rest.trim_start());
    Some((quantity, unit_or_grams(unit)))
}

/// A numeric token starts with a digit, or with a decimal point directly
/// followed by one (".5g Butter").
fn leads_with_number(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

fn unit_or_grams(unit: &str) -> String {
    if unit.is_empty() {
        "g".to_string()
    } else {
        unit.to_lowercase()
    }
}

/// Splits off a leading integer or decimal token. `None` if the token is
/// missing or does not parse as a number.
fn scan_number(s: &str) -> Option<(f64, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let token = &s[..end];
    token.parse::<f64>().ok().map(|value| (value, &s[end..]))
}

fn leading_unit(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_alphabetic()).unwrap_or(s.len());
    &s[..end]
}
