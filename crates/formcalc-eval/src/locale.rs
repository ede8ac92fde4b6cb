#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Singular/plural label for a unit suffix.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnitLabel {
    pub singular: String,
    pub plural: String,
}

impl UnitLabel {
    pub fn new(singular: &str, plural: &str) -> Self {
        UnitLabel {
            singular: singular.to_string(),
            plural: plural.to_string(),
        }
    }

    /// Languages without plural inflection use the same word for both.
    pub fn invariant(word: &str) -> Self {
        UnitLabel::new(word, word)
    }

    pub fn for_count(&self, n: i64) -> &str {
        if n.abs() == 1 {
            &self.singular
        } else {
            &self.plural
        }
    }
}

/// Locale contract for formatting.
///
/// Parsing never consults the locale: `coercion::to_number` recognizes both
/// `1.234,56` and `1,234.56` by their shape, so a value written under one
/// locale is still read back correctly after the host switches to another.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Locale {
    pub thousands_separator: char,
    pub decimal_separator: char,
    /// Prepended to currency values, including any trailing space.
    pub currency_prefix: String,
    pub day: UnitLabel,
    pub week: UnitLabel,
    pub month: UnitLabel,
    pub year: UnitLabel,
}

impl Locale {
    /// Indonesian conventions: `Rp 1.234.567,89`, `5 hari`.
    pub fn indonesian() -> Self {
        Locale {
            thousands_separator: '.',
            decimal_separator: ',',
            currency_prefix: "Rp ".to_string(),
            day: UnitLabel::invariant("hari"),
            week: UnitLabel::invariant("minggu"),
            month: UnitLabel::invariant("bulan"),
            year: UnitLabel::invariant("tahun"),
        }
    }

    /// English conventions: `$1,234,567.89`, `5 days`.
    pub fn english() -> Self {
        Locale {
            thousands_separator: ',',
            decimal_separator: '.',
            currency_prefix: "$".to_string(),
            day: UnitLabel::new("day", "days"),
            week: UnitLabel::new("week", "weeks"),
            month: UnitLabel::new("month", "months"),
            year: UnitLabel::new("year", "years"),
        }
    }

    pub fn with_currency_prefix(mut self, prefix: &str) -> Self {
        self.currency_prefix = prefix.to_string();
        self
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::indonesian()
    }
}
