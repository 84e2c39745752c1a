use serde_json::Value;

/// Tolerant money parsing for roster fields.
///
/// Accepts JSON numbers and numeric strings with thousands separators or
/// surrounding whitespace. Anything else (null, absent, `""`, `"none"`,
/// garbage, booleans, containers, non-finite numbers) falls back to `default`.
pub fn coerce_amount(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(default),
        Some(Value::String(s)) => coerce_str(s, default),
        _ => default,
    }
}

pub fn coerce_str(raw: &str, default: f64) -> f64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("none") {
        return default;
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .unwrap_or(default)
}
