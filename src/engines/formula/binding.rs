use super::ast::{BinaryOp, Node, UnaryOp};
use super::parser::parse_formula;
use crate::error::ParseError;
use crate::types::{Feature, TrainingInputs, FEATURE_COUNT};

/// Formula whose variable references are resolved to feature indices.
///
/// Evaluation goes through the same operator policies as `Node::evaluate`
/// but reads a dense feature vector instead of hashing names.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundFormula {
    root: BoundNode,
}

#[derive(Debug, Clone, PartialEq)]
enum BoundNode {
    Constant(f64),
    Feature(usize),
    Unary {
        op: UnaryOp,
        operand: Box<BoundNode>,
    },
    Binary {
        op: BinaryOp,
        left: Box<BoundNode>,
        right: Box<BoundNode>,
    },
}

impl BoundFormula {
    /// Binds every variable to a recognized feature. Unknown names fail.
    pub fn bind(node: &Node) -> Result<Self, ParseError> {
        Ok(Self {
            root: bind_node(node, true)?,
        })
    }

    /// Binds leniently: unknown names become the constant 0.0, matching what
    /// map-based evaluation would read for them.
    pub fn bind_lenient(node: &Node) -> Self {
        let root = match bind_node(node, false) {
            Ok(root) => root,
            Err(_) => BoundNode::Constant(0.0),
        };
        Self { root }
    }

    pub fn evaluate(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        eval_bound(&self.root, features)
    }

    pub fn evaluate_inputs(&self, inputs: &TrainingInputs) -> f64 {
        self.evaluate(&inputs.to_vector())
    }
}

fn bind_node(node: &Node, strict: bool) -> Result<BoundNode, ParseError> {
    Ok(match node {
        Node::Constant(value) => BoundNode::Constant(*value),
        Node::Variable(name) => match Feature::from_name(name) {
            Some(feature) => BoundNode::Feature(feature.index()),
            None if strict => {
                return Err(ParseError::UnknownVariable { name: name.clone() });
            }
            None => BoundNode::Constant(0.0),
        },
        Node::Unary { op, operand } => BoundNode::Unary {
            op: *op,
            operand: Box::new(bind_node(operand, strict)?),
        },
        Node::Binary { op, left, right } => BoundNode::Binary {
            op: *op,
            left: Box::new(bind_node(left, strict)?),
            right: Box::new(bind_node(right, strict)?),
        },
    })
}

fn eval_bound(node: &BoundNode, features: &[f64; FEATURE_COUNT]) -> f64 {
    match node {
        BoundNode::Constant(value) => *value,
        BoundNode::Feature(index) => features[*index],
        BoundNode::Unary { op, operand } => op.apply(eval_bound(operand, features)),
        BoundNode::Binary { op, left, right } => {
            op.apply(eval_bound(left, features), eval_bound(right, features))
        }
    }
}

/// Parses formula text and binds it against the recognized feature set.
pub fn parse_and_bind(input: &str) -> Result<BoundFormula, ParseError> {
    let node = parse_formula(input)?;
    BoundFormula::bind(&node)
}

/// Turns a formula into a scoring function over `TrainingInputs`.
pub fn formula_to_function(
    node: &Node,
) -> Result<impl Fn(&TrainingInputs) -> f64 + Send + Sync, ParseError> {
    let bound = BoundFormula::bind(node)?;
    Ok(move |inputs: &TrainingInputs| bound.evaluate_inputs(inputs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_matches_map_evaluation() {
        let node = parse_formula("sqrt(cagr) * 2 + max(rsi / 100, volatility) - log(sharpe)").unwrap();
        let inputs = TrainingInputs {
            cagr: 0.16,
            volatility: 0.3,
            rsi: Some(45.0),
            sharpe: None,
            ..Default::default()
        };

        let bound = BoundFormula::bind(&node).unwrap();
        let expected = node.evaluate(&inputs.to_variable_map());
        assert!((bound.evaluate_inputs(&inputs) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_variable_rejected_at_bind_time() {
        let err = parse_and_bind("cagr * 0.3 + stability * 0.2").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownVariable {
                name: "stability".to_string()
            }
        );
    }

    #[test]
    fn test_lenient_binding_reads_unknown_as_zero() {
        let node = parse_formula("cagr + stability").unwrap();
        let bound = BoundFormula::bind_lenient(&node);
        let inputs = TrainingInputs {
            cagr: 0.07,
            ..Default::default()
        };
        assert_eq!(bound.evaluate_inputs(&inputs), 0.07);
    }

    #[test]
    fn test_formula_to_function() {
        let node = parse_formula("total_score * 0.5 + regime").unwrap();
        let score = formula_to_function(&node).unwrap();
        let inputs = TrainingInputs {
            total_score: 0.8,
            regime_score: -0.2,
            ..Default::default()
        };
        assert!((score(&inputs) - 0.2).abs() < 1e-12);
    }
}
