use crate::coercion::{looks_numeric, to_number};
use crate::locale::Locale;
use formcalc_common::Value;
use std::fmt::{self, Display};
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Display format attached to an output node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Currency,
    Number,
    Decimal,
    Percent,
    Days,
    Weeks,
    Months,
    Years,
    Plain,
}

impl FormatKind {
    pub fn name(self) -> &'static str {
        match self {
            FormatKind::Currency => "currency",
            FormatKind::Number => "number",
            FormatKind::Decimal => "decimal",
            FormatKind::Percent => "percent",
            FormatKind::Days => "days",
            FormatKind::Weeks => "weeks",
            FormatKind::Months => "months",
            FormatKind::Years => "years",
            FormatKind::Plain => "plain",
        }
    }

    /// Parse a format attribute. Unknown names return `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let kind = match raw.trim().to_ascii_lowercase().as_str() {
            "currency" | "rupiah" | "idr" | "money" => FormatKind::Currency,
            "number" | "numeric" | "integer" => FormatKind::Number,
            "decimal" | "fixed" => FormatKind::Decimal,
            "percent" | "percentage" | "%" => FormatKind::Percent,
            "day" | "days" | "hari" => FormatKind::Days,
            "week" | "weeks" | "minggu" => FormatKind::Weeks,
            "month" | "months" | "bulan" => FormatKind::Months,
            "year" | "years" | "tahun" => FormatKind::Years,
            "plain" | "text" | "" => FormatKind::Plain,
            _ => return None,
        };
        Some(kind)
    }

    /// Like [`FormatKind::parse`], but an unknown name logs a warning and
    /// falls back to plain output.
    pub fn parse_or_plain(raw: &str) -> Self {
        FormatKind::parse(raw).unwrap_or_else(|| {
            warn!(format = raw, "unknown format kind, using plain output");
            FormatKind::Plain
        })
    }
}

impl Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Render a value for display. `None` means plain string form.
pub fn format_value(value: &Value, kind: Option<FormatKind>, locale: &Locale) -> String {
    let kind = kind.unwrap_or(FormatKind::Plain);
    if kind == FormatKind::Plain || value.is_empty() {
        return value.to_string();
    }
    let n = match value {
        Value::Number(n) => *n,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Text(s) if looks_numeric(s) => to_number(s),
        // Free text is shown as-is whatever the format says.
        Value::Text(s) => return s.clone(),
        Value::Empty => return String::new(),
    };
    format_number(n, kind, locale)
}

pub fn format_number(n: f64, kind: FormatKind, locale: &Locale) -> String {
    if !n.is_finite() {
        return String::new();
    }
    let grouping = Some(locale.thousands_separator);
    let dec = locale.decimal_separator;
    match kind {
        FormatKind::Currency => {
            let cents = (n * 100.0).round();
            let decimals = if cents % 100.0 == 0.0 { 0 } else { 2 };
            let body = render(n.abs(), decimals, false, grouping, dec);
            let sign = if n < 0.0 && body.bytes().any(|b| matches!(b, b'1'..=b'9')) {
                "-"
            } else {
                ""
            };
            format!("{sign}{}{body}", locale.currency_prefix)
        }
        FormatKind::Number => render(n, 2, true, grouping, dec),
        FormatKind::Decimal => render(n, 2, false, None, dec),
        FormatKind::Percent => format!("{}%", render(n * 100.0, 2, true, None, dec)),
        FormatKind::Days => unit(n, &locale.day),
        FormatKind::Weeks => unit(n, &locale.week),
        FormatKind::Months => unit(n, &locale.month),
        FormatKind::Years => unit(n, &locale.year),
        FormatKind::Plain => Value::Number(n).to_string(),
    }
}

fn unit(n: f64, label: &crate::locale::UnitLabel) -> String {
    let count = n.round() as i64;
    format!("{count} {}", label.for_count(count))
}

fn render(n: f64, decimals: usize, trim: bool, grouping: Option<char>, dec: char) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = if trim {
        frac_part.trim_end_matches('0')
    } else {
        frac_part
    };

    let mut out = String::with_capacity(fixed.len() + 4);
    if n < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    match grouping {
        Some(sep) => out.push_str(&group_digits(int_part, sep)),
        None => out.push_str(int_part),
    }
    if !frac_part.is_empty() {
        out.push(dec);
        out.push_str(frac_part);
    }
    out
}

fn group_digits(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}
