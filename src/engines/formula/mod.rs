pub mod ast;
pub mod binding;
pub mod parser;

pub use ast::{BinaryOp, Node, UnaryOp};
pub use binding::{formula_to_function, parse_and_bind, BoundFormula};
pub use parser::{parse_formula, tokenize, Token};
