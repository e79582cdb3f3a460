use crate::engines::formula::{BinaryOp, Node, UnaryOp};
use rand::seq::SliceRandom;
use rand::Rng;

/// Base probability of stopping at a terminal; grows by `TERMINAL_PROBABILITY_STEP` per level.
pub const BASE_TERMINAL_PROBABILITY: f64 = 0.3;
pub const TERMINAL_PROBABILITY_STEP: f64 = 0.1;
/// Share of operator nodes that are unary when both arities fit.
pub const UNARY_PROBABILITY: f64 = 0.3;

/// Builds a random formula over `variables`.
///
/// A node becomes a terminal with probability `0.3 + 0.1 * depth`, and always
/// once `max_depth` is reached or the tree has no room left under `max_nodes`.
pub fn random_formula<R: Rng + ?Sized>(
    variables: &[String],
    max_depth: usize,
    max_nodes: usize,
    rng: &mut R,
) -> Node {
    // Counts the root plus every child slot already committed.
    let mut committed = 1;
    build(variables, 0, max_depth, max_nodes, &mut committed, rng)
}

fn build<R: Rng + ?Sized>(
    variables: &[String],
    depth: usize,
    max_depth: usize,
    max_nodes: usize,
    committed: &mut usize,
    rng: &mut R,
) -> Node {
    let room = max_nodes.saturating_sub(*committed);
    let terminal_probability =
        BASE_TERMINAL_PROBABILITY + TERMINAL_PROBABILITY_STEP * depth as f64;

    if depth >= max_depth || room == 0 || rng.gen::<f64>() < terminal_probability {
        return random_terminal(variables, rng);
    }

    if room < 2 || rng.gen::<f64>() < UNARY_PROBABILITY {
        *committed += 1;
        let operand = build(variables, depth + 1, max_depth, max_nodes, committed, rng);
        Node::unary(random_unary_op(rng), operand)
    } else {
        *committed += 2;
        let left = build(variables, depth + 1, max_depth, max_nodes, committed, rng);
        let right = build(variables, depth + 1, max_depth, max_nodes, committed, rng);
        Node::binary(random_binary_op(rng), left, right)
    }
}

/// Variable or constant with equal odds; constants are uniform in [-1, 1].
pub fn random_terminal<R: Rng + ?Sized>(variables: &[String], rng: &mut R) -> Node {
    if !variables.is_empty() && rng.gen_bool(0.5) {
        if let Some(name) = variables.choose(rng) {
            return Node::Variable(name.clone());
        }
    }
    Node::Constant(rng.gen_range(-1.0..=1.0))
}

pub fn random_binary_op<R: Rng + ?Sized>(rng: &mut R) -> BinaryOp {
    BinaryOp::ALL[rng.gen_range(0..BinaryOp::ALL.len())]
}

pub fn random_unary_op<R: Rng + ?Sized>(rng: &mut R) -> UnaryOp {
    UnaryOp::ALL[rng.gen_range(0..UnaryOp::ALL.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn variables() -> Vec<String> {
        vec!["cagr".to_string(), "volatility".to_string()]
    }

    #[test]
    fn test_respects_depth_and_node_limits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let formula = random_formula(&variables(), 4, 12, &mut rng);
            assert!(formula.depth() <= 4);
            assert!(formula.node_count() <= 12);
        }
    }

    #[test]
    fn test_zero_depth_yields_terminal() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert!(random_formula(&variables(), 0, 10, &mut rng).is_terminal());
        }
    }

    #[test]
    fn test_terminals_use_supplied_variables() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            match random_terminal(&variables(), &mut rng) {
                Node::Variable(name) => assert!(variables().contains(&name)),
                Node::Constant(value) => assert!((-1.0..=1.0).contains(&value)),
                other => panic!("not a terminal: {}", other),
            }
        }
    }

    #[test]
    fn test_no_variables_gives_constants() {
        let mut rng = StdRng::seed_from_u64(9);
        let formula = random_formula(&[], 3, 10, &mut rng);
        assert!(formula.variables().is_empty());
    }

    #[test]
    fn test_same_seed_same_tree() {
        let a = random_formula(&variables(), 5, 20, &mut StdRng::seed_from_u64(42));
        let b = random_formula(&variables(), 5, 20, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
