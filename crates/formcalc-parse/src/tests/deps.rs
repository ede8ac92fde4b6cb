use crate::deps::{collect_variables, extract_dependencies};
use crate::parser::parse;
use std::collections::BTreeSet;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_plain_variables() {
    assert_eq!(extract_dependencies("harga * qty"), set(&["harga", "qty"]));
}

#[test]
fn test_duplicates_collapse() {
    assert_eq!(extract_dependencies("a + a * a"), set(&["a"]));
}

#[test]
fn test_literals_keywords_and_functions_are_excluded() {
    assert_eq!(
        extract_dependencies("round(total * 1.1, 2) + (flag == true ? 1 : 0)"),
        set(&["flag", "total"])
    );
    assert_eq!(
        extract_dependencies("sumif(rows_?_status, \"paid\", rows_?_amount)"),
        set(&["rows_?_amount", "rows_?_status"])
    );
}

#[test]
fn test_unknown_call_names_are_not_variables() {
    assert_eq!(extract_dependencies("foo(a)"), set(&["a"]));
}

#[test]
fn test_library_names_are_never_variables() {
    assert_eq!(extract_dependencies("sum + count"), set(&[]));
}

#[test]
fn test_identifiers_inside_strings_are_ignored() {
    assert_eq!(extract_dependencies("a == 'b c'"), set(&["a"]));
}

#[test]
fn test_unterminated_string_falls_back_to_scan() {
    assert_eq!(
        extract_dependencies("harga * qty + \"oops"),
        set(&["harga", "qty"])
    );
}

#[test]
fn test_incomplete_expression_still_reports_fields() {
    assert_eq!(extract_dependencies("harga * (qty"), set(&["harga", "qty"]));
    assert_eq!(extract_dependencies("foo("), set(&[]));
}

#[test]
fn test_collect_variables_matches_extraction_for_valid_input() {
    let src = "if(a > b, sum(rows_?_x), c / d)";
    let ast = parse(src).unwrap();
    assert_eq!(collect_variables(&ast), extract_dependencies(src));
}
