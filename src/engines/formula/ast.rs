use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Denominators smaller than this in magnitude make a division return 1.0.
pub const DIVISION_EPSILON: f64 = 1e-10;
/// `exp` operands are clamped to +/- this bound.
pub const EXP_OPERAND_LIMIT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Max,
    Min,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 7] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Pow,
        BinaryOp::Max,
        BinaryOp::Min,
    ];

    /// Applies the operator with the engine's numeric-safety policies.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Self::Add => left + right,
            Self::Sub => left - right,
            Self::Mul => left * right,
            Self::Div => {
                if right.abs() < DIVISION_EPSILON {
                    1.0
                } else {
                    left / right
                }
            }
            Self::Pow => {
                if left < 0.0 && right.fract() != 0.0 {
                    0.0
                } else {
                    left.powf(right)
                }
            }
            Self::Max => left.max(right),
            Self::Min => left.min(right),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "**",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    /// Operators written as `name(a, b)` rather than infix.
    pub fn is_function(self) -> bool {
        matches!(self, Self::Max | Self::Min)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnaryOp {
    Sqrt,
    Log,
    Exp,
    Abs,
    Negate,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 5] = [
        UnaryOp::Sqrt,
        UnaryOp::Log,
        UnaryOp::Exp,
        UnaryOp::Abs,
        UnaryOp::Negate,
    ];

    pub fn apply(self, operand: f64) -> f64 {
        match self {
            Self::Sqrt => {
                if operand < 0.0 {
                    0.0
                } else {
                    operand.sqrt()
                }
            }
            Self::Log => {
                if operand <= 0.0 {
                    0.0
                } else {
                    operand.ln()
                }
            }
            Self::Exp => operand.clamp(-EXP_OPERAND_LIMIT, EXP_OPERAND_LIMIT).exp(),
            Self::Abs => operand.abs(),
            Self::Negate => -operand,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sqrt => "sqrt",
            Self::Log => "log",
            Self::Exp => "exp",
            Self::Abs => "abs",
            Self::Negate => "-",
        }
    }
}

/// Formula expression tree.
///
/// Arity lives in the variant, so a binary operation always owns both
/// children and a unary one owns exactly one. Every child is uniquely owned:
/// cloning a `Node` produces a fully independent tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Constant(f64),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn constant(value: f64) -> Self {
        Node::Constant(value)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Node::Variable(name.into())
    }

    pub fn unary(op: UnaryOp, operand: Node) -> Self {
        Node::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Deep copy. Shares nothing with `self`.
    pub fn copy(&self) -> Node {
        self.clone()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Constant(_) | Node::Variable(_))
    }

    /// Evaluates against a name-keyed variable map.
    ///
    /// Never fails: a variable missing from the map reads as 0.0 and every
    /// numeric edge case resolves to the operator's sentinel value.
    pub fn evaluate(&self, variables: &HashMap<String, f64>) -> f64 {
        match self {
            Node::Constant(value) => *value,
            Node::Variable(name) => variables.get(name).copied().unwrap_or(0.0),
            Node::Unary { op, operand } => op.apply(operand.evaluate(variables)),
            Node::Binary { op, left, right } => {
                op.apply(left.evaluate(variables), right.evaluate(variables))
            }
        }
    }

    /// Total node count.
    pub fn node_count(&self) -> usize {
        match self {
            Node::Constant(_) | Node::Variable(_) => 1,
            Node::Unary { operand, .. } => 1 + operand.node_count(),
            Node::Binary { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }

    /// Depth in edges; a lone terminal has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            Node::Constant(_) | Node::Variable(_) => 0,
            Node::Unary { operand, .. } => 1 + operand.depth(),
            Node::Binary { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Distinct variable names referenced by the tree.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut BTreeSet<String>) {
        match self {
            Node::Constant(_) => {}
            Node::Variable(name) => {
                names.insert(name.clone());
            }
            Node::Unary { operand, .. } => operand.collect_variables(names),
            Node::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
        }
    }

    /// All nodes in pre-order; index 0 is the root.
    pub fn nodes(&self) -> Vec<&Node> {
        let mut out = Vec::with_capacity(self.node_count());
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            match node {
                Node::Unary { operand, .. } => stack.push(operand),
                Node::Binary { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
                _ => {}
            }
        }
        out
    }

    /// Mutable access to the node at a pre-order index.
    pub fn node_at_mut(&mut self, index: usize) -> Option<&mut Node> {
        let mut seen = 0;
        find_nth_mut(self, index, &mut seen)
    }
}

fn find_nth_mut<'a>(node: &'a mut Node, target: usize, seen: &mut usize) -> Option<&'a mut Node> {
    if *seen == target {
        return Some(node);
    }
    *seen += 1;
    match node {
        Node::Constant(_) | Node::Variable(_) => None,
        Node::Unary { operand, .. } => find_nth_mut(operand, target, seen),
        Node::Binary { left, right, .. } => {
            if let Some(found) = find_nth_mut(left, target, seen) {
                return Some(found);
            }
            find_nth_mut(right, target, seen)
        }
    }
}

/// Canonical text form. Re-parses to a semantically equivalent tree.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Constant(value) if *value < 0.0 => write!(f, "({})", value),
            Node::Constant(value) => write!(f, "{}", value),
            Node::Variable(name) => f.write_str(name),
            Node::Unary {
                op: UnaryOp::Negate,
                operand,
            } => write!(f, "(-{})", operand),
            Node::Unary { op, operand } => write!(f, "{}({})", op.name(), operand),
            Node::Binary { op, left, right } if op.is_function() => {
                write!(f, "{}({}, {})", op.symbol(), left, right)
            }
            Node::Binary { op, left, right } => write!(f, "({} {} {})", left, op.symbol(), right),
        }
    }
}
