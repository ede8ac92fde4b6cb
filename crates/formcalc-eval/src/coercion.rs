//! Lenient conversions between raw field text and engine values.
//!
//! Nothing in here returns an error: unparsable numbers become `0`, unparsable
//! dates become `None`. Form fields are half-typed most of the time and a
//! computed total must not blow up because `qty` currently reads `"1,"`.

use chrono::NaiveDate;
use formcalc_common::{EvalError, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

static NUMERIC_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*\(?\s*[-+−]?\s*(?:(?i:rp\.?|idr|usd|eur)\s*|[$€£¥]\s*)?[-+−]?\s*(?:\d[\d.,]*\d|\d|[.,]\d+)\s*(?:(?i:idr|rp)|%)?\s*\)?\s*$",
    )
    .expect("numeric shape pattern is valid")
});

static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Parse locale-formatted numeric text.
///
/// - currency symbols, unit words and whitespace are ignored
/// - both `1.234,56` and `1,234.56` are understood: when both separators are
///   present the last one is the decimal separator; a lone separator followed
///   by exactly three digits (`20.000`) or a repeated separator (`1.000.000`)
///   is digit grouping; anything else is a decimal separator
/// - a leading minus or surrounding parentheses make the value negative
/// - a `%` marker divides by 100
/// - empty or digit-free input is `0`
pub fn to_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let percent = trimmed.contains('%');
    let mut negative = false;
    let mut open_paren = false;
    let mut seen_digit = false;
    let mut body = String::with_capacity(trimmed.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '0'..='9' => {
                seen_digit = true;
                body.push(c);
            }
            '.' | ',' if seen_digit => body.push(c),
            // `.5` is a number, the dot in `Rp.5` is not.
            '.' | ',' => {
                let next_is_digit = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
                let prev_is_letter = i > 0 && chars[i - 1].is_alphabetic();
                if next_is_digit && !prev_is_letter {
                    body.push('0');
                    body.push(c);
                }
            }
            '-' | '−' if !seen_digit => negative = true,
            '(' if !seen_digit => open_paren = true,
            ')' if open_paren && seen_digit => negative = true,
            _ => {}
        }
    }
    if !seen_digit {
        return 0.0;
    }

    let body = body.trim_end_matches(|c| c == '.' || c == ',');
    let normalized = normalize_separators(body);
    let mut n = normalized.parse::<f64>().unwrap_or(0.0);
    if negative {
        n = -n;
    }
    if percent {
        n /= 100.0;
    }
    n
}

fn normalize_separators(body: &str) -> String {
    let dots = body.matches('.').count();
    let commas = body.matches(',').count();
    match (dots, commas) {
        (0, 0) => body.to_string(),
        (_, 0) => resolve_single_separator(body, '.'),
        (0, _) => resolve_single_separator(body, ','),
        _ => {
            let last_dot = body.rfind('.').unwrap_or(0);
            let last_comma = body.rfind(',').unwrap_or(0);
            let decimal_at = last_dot.max(last_comma);
            body.char_indices()
                .filter_map(|(i, c)| match c {
                    '.' | ',' if i == decimal_at => Some('.'),
                    '.' | ',' => None,
                    other => Some(other),
                })
                .collect()
        }
    }
}

fn resolve_single_separator(body: &str, sep: char) -> String {
    if body.matches(sep).count() > 1 {
        return body.replace(sep, "");
    }
    let Some((before, after)) = body.split_once(sep) else {
        return body.to_string();
    };
    let is_grouping = after.len() == 3 && before.bytes().any(|b| b != b'0');
    if is_grouping {
        format!("{before}{after}")
    } else {
        format!("{before}.{after}")
    }
}

/// Whether text reads as a number (possibly with currency, grouping or a
/// percent sign) rather than as free text or a date.
pub fn looks_numeric(raw: &str) -> bool {
    NUMERIC_SHAPE.is_match(raw)
}

/// Classify raw field text into a [`Value`].
pub fn classify_input(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Empty;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    // `31.01.2024` has a numeric shape but is a date.
    if looks_numeric(trimmed) && parse_date(trimmed).is_none() {
        return Value::Number(to_number(trimmed));
    }
    Value::Text(raw.to_string())
}

/// Numeric view of any value. Text goes through [`to_number`].
pub fn value_to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Text(s) => to_number(s),
        Value::Empty => 0.0,
    }
}

/// Whether a value compares numerically. Empty counts as numeric so that an
/// unfilled quantity compares like `0`.
pub fn is_numeric_like(value: &Value) -> bool {
    match value {
        Value::Number(_) | Value::Boolean(_) | Value::Empty => true,
        Value::Text(s) => looks_numeric(s),
    }
}

/// Order two values: numerically when both sides read as numbers, otherwise
/// as case-insensitive text.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    if is_numeric_like(a) && is_numeric_like(b) {
        value_to_number(a)
            .partial_cmp(&value_to_number(b))
            .unwrap_or(Ordering::Equal)
    } else {
        let left = a.to_string().trim().to_lowercase();
        let right = b.to_string().trim().to_lowercase();
        left.cmp(&right)
    }
}

pub fn value_to_text(value: &Value) -> String {
    value.to_string()
}

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::Boolean(b) => *b,
        Value::Text(s) => {
            let t = s.trim();
            !(t.is_empty() || t == "0" || t.eq_ignore_ascii_case("false"))
        }
        Value::Empty => false,
    }
}

/// Round to a fixed number of decimal places. Keeps `1.99998`-style float
/// artifacts out of displayed values.
pub fn round_to(n: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let scaled = n * factor;
    if !scaled.is_finite() {
        return n;
    }
    let r = scaled.round() / factor;
    if r == 0.0 { 0.0 } else { r }
}

pub fn sanitize_numeric(n: f64) -> Result<f64, EvalError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(EvalError::NonFinite)
    }
}

/// Parse a date in one of the formats form widgets commonly produce:
/// ISO (`2024-01-31`, optionally with a time part), `2024/01/31`,
/// `31/01/2024`, `31-01-2024`, `31.01.2024`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    let (date_part, _) = s.split_once(|c| c == 'T' || c == ' ')?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

pub fn value_to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Text(s) => parse_date(s),
        _ => None,
    }
}
