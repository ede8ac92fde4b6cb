/// The fixed function library. Expressions cannot define or import anything
/// outside of this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    SumIf,
    DaysBetween,
    WeeksBetween,
    MonthsBetween,
    YearsBetween,
    If,
    Round,
    Abs,
    Floor,
    Ceil,
}

impl Builtin {
    pub const ALL: &'static [Builtin] = &[
        Builtin::Sum,
        Builtin::Avg,
        Builtin::Min,
        Builtin::Max,
        Builtin::Count,
        Builtin::SumIf,
        Builtin::DaysBetween,
        Builtin::WeeksBetween,
        Builtin::MonthsBetween,
        Builtin::YearsBetween,
        Builtin::If,
        Builtin::Round,
        Builtin::Abs,
        Builtin::Floor,
        Builtin::Ceil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Sum => "sum",
            Builtin::Avg => "avg",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Count => "count",
            Builtin::SumIf => "sumif",
            Builtin::DaysBetween => "days_between",
            Builtin::WeeksBetween => "weeks_between",
            Builtin::MonthsBetween => "months_between",
            Builtin::YearsBetween => "years_between",
            Builtin::If => "if",
            Builtin::Round => "round",
            Builtin::Abs => "abs",
            Builtin::Floor => "floor",
            Builtin::Ceil => "ceil",
        }
    }

    /// Case-insensitive lookup. `average` is accepted as an alias of `avg`.
    pub fn lookup(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower == "average" {
            return Some(Builtin::Avg);
        }
        Builtin::ALL.iter().copied().find(|b| b.name() == lower)
    }

    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            Builtin::Sum
                | Builtin::Avg
                | Builtin::Min
                | Builtin::Max
                | Builtin::Count
                | Builtin::SumIf
        )
    }

    pub fn is_date_range(self) -> bool {
        matches!(
            self,
            Builtin::DaysBetween
                | Builtin::WeeksBetween
                | Builtin::MonthsBetween
                | Builtin::YearsBetween
        )
    }

    /// `(min, max)` argument counts; `None` means variadic.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Builtin::Sum | Builtin::Avg | Builtin::Min | Builtin::Max | Builtin::Count => {
                (1, None)
            }
            Builtin::SumIf => (2, Some(3)),
            Builtin::DaysBetween
            | Builtin::WeeksBetween
            | Builtin::MonthsBetween
            | Builtin::YearsBetween => (2, Some(2)),
            Builtin::If => (3, Some(3)),
            Builtin::Round => (1, Some(2)),
            Builtin::Abs | Builtin::Floor | Builtin::Ceil => (1, Some(1)),
        }
    }

    pub fn arity_label(self) -> &'static str {
        match self.arity() {
            (1, None) => "at least 1",
            (2, Some(3)) => "2 or 3",
            (1, Some(2)) => "1 or 2",
            (1, Some(1)) => "1",
            (2, Some(2)) => "2",
            (3, Some(3)) => "3",
            _ => "a different number of",
        }
    }
}

pub fn is_library_function(name: &str) -> bool {
    Builtin::lookup(name).is_some()
}
