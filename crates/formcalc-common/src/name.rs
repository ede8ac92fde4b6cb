//! Binding names and indexed families.
//!
//! Repeated form rows show up under several spellings (`rows[0][amount]`,
//! `rows.0.amount`, `rows_0_amount`). All of them normalize to the same
//! expression variable, `rows_0_amount`. Aggregates address the whole family
//! with a `?` wildcard in the index position: `rows_?_amount`.

pub const WILDCARD: char = '?';

/// Normalize a host binding name into the identifier form used by expressions.
pub fn normalize_binding_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        match c {
            '[' | '.' | '-' | ' ' => {
                if !out.is_empty() && !out.ends_with('_') {
                    out.push('_');
                }
            }
            ']' => {}
            '_' => {
                if !out.ends_with('_') {
                    out.push('_');
                }
            }
            other => out.push(other),
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// A concrete member of an indexed family, e.g. `rows_3_amount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedName<'a> {
    pub family: &'a str,
    pub index: u32,
    pub field: &'a str,
}

/// Split `rows_3_amount` into family `rows`, index `3` and field `amount`.
/// The first purely numeric segment that has something on both sides is the
/// row index.
pub fn split_indexed(name: &str) -> Option<IndexedName<'_>> {
    let (family, index, field) = split_on_segment(name, |seg| {
        !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit())
    })?;
    Some(IndexedName {
        family,
        index: index.parse().ok()?,
        field,
    })
}

pub fn is_wildcard(name: &str) -> bool {
    split_wildcard(name).is_some()
}

/// Split a pattern such as `rows_?_amount` into `(family, field)`.
pub fn split_wildcard(pattern: &str) -> Option<(&str, &str)> {
    split_on_segment(pattern, |seg| seg.len() == 1 && seg.starts_with(WILDCARD))
        .map(|(family, _, field)| (family, field))
}

/// The wildcard pattern a concrete indexed name belongs to:
/// `rows_3_amount` becomes `rows_?_amount`.
pub fn wildcard_of(name: &str) -> Option<String> {
    let indexed = split_indexed(name)?;
    Some(format!("{}_{WILDCARD}_{}", indexed.family, indexed.field))
}

/// Substitute a row index into a wildcard pattern.
pub fn expand_wildcard(pattern: &str, index: u32) -> String {
    match split_wildcard(pattern) {
        Some((family, field)) => format!("{family}_{index}_{field}"),
        None => pattern.to_string(),
    }
}

fn split_on_segment(name: &str, is_index: impl Fn(&str) -> bool) -> Option<(&str, &str, &str)> {
    let mut start = 0;
    for (pos, seg) in name.split('_').enumerate() {
        let end = start + seg.len();
        if pos > 0 && end < name.len() && is_index(seg) {
            // `start - 1` is the separator before the segment, `end` the one after.
            return Some((&name[..start - 1], seg, &name[end + 1..]));
        }
        start = end + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_bracket_and_dotted_rows() {
        assert_eq!(normalize_binding_name("rows[0][amount]"), "rows_0_amount");
        assert_eq!(normalize_binding_name("rows.12.amount"), "rows_12_amount");
        assert_eq!(
            normalize_binding_name("order[items][2][qty]"),
            "order_items_2_qty"
        );
        assert_eq!(normalize_binding_name(" harga "), "harga");
    }

    #[test]
    fn splits_indexed_names() {
        let n = split_indexed("rows_3_unit_price").unwrap();
        assert_eq!(n.family, "rows");
        assert_eq!(n.index, 3);
        assert_eq!(n.field, "unit_price");
        assert!(split_indexed("harga").is_none());
        assert!(split_indexed("total_2").is_none());
        assert!(split_indexed("2_total").is_none());
    }

    #[test]
    fn wildcard_helpers_agree() {
        assert_eq!(split_wildcard("rows_?_amount"), Some(("rows", "amount")));
        assert_eq!(wildcard_of("rows_7_amount").as_deref(), Some("rows_?_amount"));
        assert_eq!(expand_wildcard("rows_?_amount", 4), "rows_4_amount");
        assert!(!is_wildcard("rows_0_amount"));
    }
}
