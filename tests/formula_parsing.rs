use formula_discovery::engines::formula::{parse_and_bind, parse_formula, BinaryOp, Node};
use formula_discovery::engines::metrics::calculate_complexity;
use formula_discovery::{ParseError, TrainingInputs};
use std::collections::HashMap;

fn vars(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn eval(text: &str, pairs: &[(&str, f64)]) -> f64 {
    parse_formula(text).unwrap().evaluate(&vars(pairs))
}

#[test]
fn test_weighted_sum_evaluates() {
    let value = eval(
        "cagr * 0.3 + stability * 0.2",
        &[("cagr", 0.10), ("stability", 0.5)],
    );
    assert!((value - 0.13).abs() < 1e-12);
}

#[test]
fn test_unrecognized_feature_only_fails_strict_binding() {
    let result = parse_and_bind("cagr * 0.3 + stability * 0.2");
    assert_eq!(
        result.err(),
        Some(ParseError::UnknownVariable {
            name: "stability".to_string()
        })
    );

    let bound = parse_and_bind("cagr * 0.3 + volatility * 0.2").unwrap();
    let inputs = TrainingInputs {
        cagr: 0.10,
        volatility: 0.5,
        ..Default::default()
    };
    assert!((bound.evaluate_inputs(&inputs) - 0.13).abs() < 1e-12);
}

#[test]
fn test_copy_is_independent() {
    let original = parse_formula("max(cagr, 0.5) - volatility / 2").unwrap();
    let mut copy = original.copy();
    assert_eq!(copy.to_string(), original.to_string());

    let last = copy.node_count() - 1;
    *copy.node_at_mut(last).unwrap() = Node::variable("rsi");

    assert_ne!(copy.to_string(), original.to_string());
    assert_eq!(original.to_string(), "(max(cagr, 0.5) - (volatility / 2))");
}

#[test]
fn test_numeric_safety_policies() {
    for den in [0.0, 1e-11, -1e-11, 9.9e-11] {
        assert_eq!(eval("a / b", &[("a", 42.0), ("b", den)]), 1.0);
    }
    assert_eq!(eval("sqrt(x)", &[("x", -4.0)]), 0.0);
    assert_eq!(eval("log(x)", &[("x", 0.0)]), 0.0);
    assert_eq!(eval("log(x)", &[("x", -1.0)]), 0.0);
    assert_eq!(eval("exp(x)", &[("x", 500.0)]), 10f64.exp());
    assert_eq!(eval("pow(x, 0.5)", &[("x", -2.0)]), 0.0);
    assert_eq!(eval("pow(x, 2)", &[("x", -2.0)]), 4.0);
}

#[test]
fn test_missing_variable_drops_term() {
    assert_eq!(eval("cagr + sharpe", &[("cagr", 0.2)]), 0.2);
}

fn recursive_complexity(node: &Node) -> usize {
    match node {
        Node::Constant(_) | Node::Variable(_) => 1,
        Node::Unary { operand, .. } => 1 + recursive_complexity(operand),
        Node::Binary { left, right, .. } => 1 + recursive_complexity(left) + recursive_complexity(right),
    }
}

#[test]
fn test_complexity_counts_every_node() {
    for text in [
        "cagr",
        "-cagr",
        "cagr * 0.3 + volatility",
        "max(sqrt(abs(rsi)), log(1 + sharpe)) ** 2",
        "exp(-(total_score - 0.5) / 0.1)",
    ] {
        let formula = parse_formula(text).unwrap();
        assert_eq!(calculate_complexity(&formula), recursive_complexity(&formula), "{}", text);
    }
}

#[test]
fn test_canonical_text_reparses_to_same_tree() {
    for text in [
        "cagr * 0.3 + volatility",
        "2 ** 3 ** 2",
        "-0.5 * min(rsi, 70) / max(sharpe, 1e-3)",
        "exp(-cagr) - pow(volatility, 2)",
    ] {
        let formula = parse_formula(text).unwrap();
        let reparsed = parse_formula(&formula.to_string()).unwrap();
        assert_eq!(reparsed, formula, "{}", text);
    }
}

#[test]
fn test_operator_precedence_and_associativity() {
    assert_eq!(eval("1 + 2 * 3", &[]), 7.0);
    assert_eq!(eval("2 ** 3 ** 2", &[]), 512.0);
    assert_eq!(eval("10 - 4 - 3", &[]), 3.0);
    assert_eq!(eval("-2 ** 2", &[]), 4.0);

    let formula = parse_formula("a - b * c").unwrap();
    assert!(matches!(formula, Node::Binary { op: BinaryOp::Sub, .. }));
}

#[test]
fn test_unknown_characters_are_ignored() {
    assert_eq!(
        parse_formula("cagr $+ 1").unwrap(),
        parse_formula("cagr + 1").unwrap()
    );
}

#[test]
fn test_each_failure_has_its_own_kind() {
    assert_eq!(parse_formula("   "), Err(ParseError::EmptyInput));
    assert!(matches!(parse_formula("1.2.3"), Err(ParseError::InvalidNumber { .. })));
    assert!(matches!(parse_formula("1e999"), Err(ParseError::InvalidNumber { .. })));
    assert!(matches!(parse_formula("(cagr + 1"), Err(ParseError::UnmatchedParen { .. })));
    assert!(matches!(parse_formula("cagr + 1)"), Err(ParseError::UnmatchedParen { .. })));
    assert!(matches!(
        parse_formula("sqrt(1, 2)"),
        Err(ParseError::WrongArgumentCount { expected: 1, found: 2, .. })
    ));
    assert!(matches!(
        parse_formula("max(1)"),
        Err(ParseError::WrongArgumentCount { expected: 2, found: 1, .. })
    ));
    assert!(matches!(parse_formula("tanh(cagr)"), Err(ParseError::UnknownFunction { .. })));
    assert!(matches!(parse_formula("cagr volatility"), Err(ParseError::TrailingTokens { .. })));
}

#[test]
fn test_large_finite_literal_round_trips() {
    let formula = parse_formula("cagr * 1e300").unwrap();
    let reparsed = parse_formula(&formula.to_string()).unwrap();
    assert_eq!(reparsed, formula);
}
