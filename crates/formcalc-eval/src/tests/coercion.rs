use crate::coercion::{classify_input, looks_numeric, parse_date, round_to, to_number};
use crate::format::{FormatKind, format_number};
use crate::locale::Locale;
use crate::Value;
use chrono::NaiveDate;
use proptest::prelude::*;

#[test]
fn test_grouping_and_decimal_separators() {
    assert_eq!(to_number("20.000"), 20000.0);
    assert_eq!(to_number("1.234.567"), 1234567.0);
    assert_eq!(to_number("1.234,56"), 1234.56);
    assert_eq!(to_number("1,234.56"), 1234.56);
    assert_eq!(to_number("1,5"), 1.5);
    assert_eq!(to_number("0.125"), 0.125);
    assert_eq!(to_number(".5"), 0.5);
    assert_eq!(to_number("12"), 12.0);
}

#[test]
fn test_currency_sign_and_percent() {
    assert_eq!(to_number("Rp 20.000"), 20000.0);
    assert_eq!(to_number("Rp. 1.500,50"), 1500.5);
    assert_eq!(to_number("$1,200"), 1200.0);
    assert_eq!(to_number("-Rp 3.000"), -3000.0);
    assert_eq!(to_number("(1.000)"), -1000.0);
    assert_eq!(to_number("12,5%"), 0.125);
}

#[test]
fn test_unparsable_is_zero() {
    assert_eq!(to_number(""), 0.0);
    assert_eq!(to_number("   "), 0.0);
    assert_eq!(to_number("abc"), 0.0);
    assert_eq!(to_number("Rp"), 0.0);
}

#[test]
fn test_classification() {
    assert_eq!(classify_input(""), Value::Empty);
    assert_eq!(classify_input("Rp 20.000"), Value::Number(20000.0));
    assert_eq!(classify_input("true"), Value::Boolean(true));
    assert_eq!(classify_input("paid"), Value::Text("paid".into()));
    assert_eq!(
        classify_input("2024-01-31"),
        Value::Text("2024-01-31".into())
    );
    assert_eq!(
        classify_input("31.01.2024"),
        Value::Text("31.01.2024".into())
    );
    assert_eq!(classify_input("1.234.567"), Value::Number(1234567.0));
    assert!(looks_numeric("1.234,56"));
    assert!(looks_numeric("15%"));
    assert!(!looks_numeric("31/01/2024"));
    assert!(!looks_numeric("12 apples"));
}

#[test]
fn test_date_formats() {
    let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31);
    assert_eq!(parse_date("2024-01-31"), jan31);
    assert_eq!(parse_date("2024/01/31"), jan31);
    assert_eq!(parse_date("31/01/2024"), jan31);
    assert_eq!(parse_date("31-01-2024"), jan31);
    assert_eq!(parse_date("2024-01-31T08:30:00"), jan31);
    assert_eq!(parse_date("2024-02-30"), None);
    assert_eq!(parse_date("soon"), None);
    assert_eq!(parse_date(""), None);
}

#[test]
fn test_round_to_handles_edges() {
    assert_eq!(round_to(1.234567, 5), 1.23457);
    assert_eq!(round_to(-0.000001, 5), 0.0);
    assert!(round_to(-0.000001, 5).is_sign_positive());
    assert_eq!(round_to(f64::MAX, 5), f64::MAX);
}

proptest! {
    #[test]
    fn prop_round_trip_through_formatting(cents in -10_000_000_000i64..10_000_000_000i64) {
        let x = cents as f64 / 100.0;
        for locale in [Locale::indonesian(), Locale::english()] {
            for kind in [FormatKind::Currency, FormatKind::Decimal] {
                let text = format_number(x, kind, &locale);
                let back = to_number(&text);
                prop_assert!((back - x).abs() < 1e-6, "{kind} {text} -> {back}, expected {x}");
            }
        }
    }

    #[test]
    fn prop_percent_round_trip(basis in -100_000i64..100_000i64) {
        // Two decimals of percent are four decimals of the value.
        let x = basis as f64 / 10_000.0;
        let text = format_number(x, FormatKind::Percent, &Locale::indonesian());
        prop_assert!((to_number(&text) - x).abs() < 1e-9, "{text}");
    }

    #[test]
    fn prop_to_number_is_total_and_deterministic(s in ".{0,24}") {
        let a = to_number(&s);
        let b = to_number(&s);
        prop_assert!(a == b || (a.is_nan() && b.is_nan()));
    }
}
