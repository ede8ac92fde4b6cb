use crate::coercion::value_to_date;
use chrono::{Datelike, NaiveDate};
use formcalc_common::{Builtin, Value};

/// Whole calendar months from `start` to `end`, counting a month only once
/// its day-of-month has been reached.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut months = (end.year() as i64 - start.year() as i64) * 12 + end.month() as i64
        - start.month() as i64;
    if months > 0 && end.day() < start.day() {
        months -= 1;
    } else if months < 0 && end.day() > start.day() {
        months += 1;
    }
    months
}

/// Date-range functions. A missing or malformed date yields `0`.
pub fn date_range(builtin: Builtin, start: &Value, end: &Value) -> Value {
    let (Some(start), Some(end)) = (value_to_date(start), value_to_date(end)) else {
        return Value::Number(0.0);
    };
    let days = (end - start).num_days();
    let n = match builtin {
        Builtin::DaysBetween => days,
        Builtin::WeeksBetween => days / 7,
        Builtin::MonthsBetween => months_between(start, end),
        Builtin::YearsBetween => months_between(start, end) / 12,
        _ => 0,
    };
    Value::Number(n as f64)
}
