use crate::parser::{ASTNodeType, BinaryOp, MAX_NESTING_DEPTH, UnaryOp, parse};

#[test]
fn test_precedence_of_arithmetic() {
    let ast = parse("a + b * c").unwrap();
    assert_eq!(ast.to_string(), "(a + (b * c))");

    let ast = parse("(a + b) * c").unwrap();
    assert_eq!(ast.to_string(), "((a + b) * c)");
}

#[test]
fn test_left_associativity() {
    assert_eq!(parse("a - b - c").unwrap().to_string(), "((a - b) - c)");
    assert_eq!(parse("a / b / c").unwrap().to_string(), "((a / b) / c)");
}

#[test]
fn test_power_is_right_associative_and_binds_tighter_than_negation() {
    assert_eq!(parse("2 ^ 3 ^ 2").unwrap().to_string(), "(2 ^ (3 ^ 2))");
    let ast = parse("-2 ^ 2").unwrap();
    match ast.node_type {
        ASTNodeType::UnaryOp { op, expr } => {
            assert_eq!(op, UnaryOp::Neg);
            assert!(matches!(
                expr.node_type,
                ASTNodeType::BinaryOp {
                    op: BinaryOp::Pow,
                    ..
                }
            ));
        }
        other => panic!("expected unary op, got {other:?}"),
    }
}

#[test]
fn test_comparison_and_logic() {
    let ast = parse("a > 1 && b <> 'x' || c").unwrap();
    assert_eq!(ast.to_string(), "(((a > 1) && (b != \"x\")) || c)");
}

#[test]
fn test_ternary_nests_to_the_right() {
    let ast = parse("a ? 1 : b ? 2 : 3").unwrap();
    assert_eq!(ast.to_string(), "(a ? 1 : (b ? 2 : 3))");
}

#[test]
fn test_function_calls() {
    let ast = parse("sumif(rows_?_status, \"paid\", rows_?_amount)").unwrap();
    match &ast.node_type {
        ASTNodeType::Function { name, args } => {
            assert_eq!(name, "sumif");
            assert_eq!(args.len(), 3);
            assert_eq!(args[0].as_variable(), Some("rows_?_status"));
            assert_eq!(args[1].node_type, ASTNodeType::Text("paid".into()));
        }
        other => panic!("expected function, got {other:?}"),
    }
    let ast = parse("max(a, b, c, d, e, round(f, 2))").unwrap();
    match &ast.node_type {
        ASTNodeType::Function { args, .. } => {
            assert_eq!(args.len(), 6);
            assert_eq!(args[5].to_string(), "round(f, 2)");
        }
        other => panic!("expected function, got {other:?}"),
    }
    // Semicolons separate arguments too.
    assert!(parse("round(a; 2)").is_ok());
    assert!(parse("count()").is_ok());
}

#[test]
fn test_booleans_are_literals() {
    assert_eq!(parse("TRUE").unwrap().node_type, ASTNodeType::Boolean(true));
    assert_eq!(parse("false").unwrap().node_type, ASTNodeType::Boolean(false));
}

#[test]
fn test_malformed_expressions_report_positions() {
    let err = parse("foo(").unwrap_err();
    assert_eq!(err.position, 4);

    let err = parse("a +").unwrap_err();
    assert!(err.message.contains("end of expression"));

    let err = parse("a b").unwrap_err();
    assert_eq!(err.position, 2);

    assert!(parse("").is_err());
    assert!(parse("   ").is_err());
    assert!(parse("(a").is_err());
    assert!(parse("a ? b").is_err());
}

#[test]
fn test_nesting_depth_is_bounded() {
    let shallow = format!("{}a{}", "(".repeat(100), ")".repeat(100));
    assert_eq!(parse(&shallow).unwrap().to_string(), "a");

    let deep = format!("{}a{}", "(".repeat(10_000), ")".repeat(10_000));
    let err = parse(&deep).unwrap_err();
    assert!(err.message.contains(&MAX_NESTING_DEPTH.to_string()));

    assert!(parse(&format!("{}1", "- ".repeat(10_000))).is_err());
    assert!(parse(&format!("{}1", "2^".repeat(10_000))).is_err());
    assert!(parse(&format!("{}1{}", "abs(".repeat(10_000), ")".repeat(10_000))).is_err());
}
