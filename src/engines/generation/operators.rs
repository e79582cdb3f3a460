use crate::engines::formula::Node;
use crate::engines::generation::generator::{
    random_binary_op, random_formula, random_terminal, random_unary_op,
};
use crate::engines::generation::individual::FormulaWithFitness;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Depth of subtrees grown by the regrow mutation.
pub const REGROW_MAX_DEPTH: usize = 2;
/// Node cap of subtrees grown by the regrow mutation.
pub const REGROW_MAX_NODES: usize = 5;
/// Largest additive step applied by constant perturbation.
pub const PERTURBATION_SCALE: f64 = 0.1;

/// Which children a mutation pass visits below a node that did not mutate.
///
/// `LeftOnly` reproduces the behaviour formulas were historically discovered
/// with: the right child of a binary node is carried over untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationRecursion {
    #[default]
    LeftOnly,
    BothChildren,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationKind {
    ReplaceWithTerminal,
    PerturbConstant,
    ReplaceOperator,
    RegrowSubtree,
}

impl MutationKind {
    const ALL: [MutationKind; 4] = [
        MutationKind::ReplaceWithTerminal,
        MutationKind::PerturbConstant,
        MutationKind::ReplaceOperator,
        MutationKind::RegrowSubtree,
    ];
}

/// Tournament selection: `count` independent tournaments, each drawing
/// `tournament_size` individuals with replacement and keeping the lowest fitness.
pub fn tournament_selection<'a, R: Rng + ?Sized>(
    population: &'a [FormulaWithFitness],
    tournament_size: usize,
    count: usize,
    rng: &mut R,
) -> Vec<&'a FormulaWithFitness> {
    if population.is_empty() {
        return Vec::new();
    }

    (0..count)
        .map(|_| {
            let mut best = &population[rng.gen_range(0..population.len())];
            for _ in 1..tournament_size.max(1) {
                let candidate = &population[rng.gen_range(0..population.len())];
                if candidate.fitness < best.fitness {
                    best = candidate;
                }
            }
            best
        })
        .collect()
}

/// Subtree crossover.
///
/// Picks one node uniformly from each parent and swaps copies of the chosen
/// subtrees. When either pick is a root, both parents come back unchanged.
pub fn crossover<R: Rng + ?Sized>(parent1: &Node, parent2: &Node, rng: &mut R) -> (Node, Node) {
    let nodes1 = parent1.nodes();
    let nodes2 = parent2.nodes();
    let point1 = rng.gen_range(0..nodes1.len());
    let point2 = rng.gen_range(0..nodes2.len());

    if point1 == 0 || point2 == 0 {
        return (parent1.clone(), parent2.clone());
    }

    let donor1 = nodes1[point1].clone();
    let donor2 = nodes2[point2].clone();

    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();
    if let Some(slot) = child1.node_at_mut(point1) {
        *slot = donor2;
    }
    if let Some(slot) = child2.node_at_mut(point2) {
        *slot = donor1;
    }

    (child1, child2)
}

/// Point mutation with the historical left-only recursion.
pub fn mutate<R: Rng + ?Sized>(
    formula: &Node,
    variables: &[String],
    rate: f64,
    rng: &mut R,
) -> Node {
    mutate_with_recursion(formula, variables, rate, MutationRecursion::LeftOnly, rng)
}

/// Returns a mutated copy of `formula`; the input is never modified.
///
/// With probability `1 - rate` the copy is returned as is. Otherwise nodes are
/// visited from the root and each one mutates with probability `rate`.
pub fn mutate_with_recursion<R: Rng + ?Sized>(
    formula: &Node,
    variables: &[String],
    rate: f64,
    recursion: MutationRecursion,
    rng: &mut R,
) -> Node {
    let mut mutated = formula.clone();
    if rng.gen::<f64>() >= rate {
        return mutated;
    }
    mutate_node(&mut mutated, variables, rate, recursion, rng);
    mutated
}

fn mutate_node<R: Rng + ?Sized>(
    node: &mut Node,
    variables: &[String],
    rate: f64,
    recursion: MutationRecursion,
    rng: &mut R,
) {
    if rng.gen::<f64>() < rate {
        let kind = MutationKind::ALL[rng.gen_range(0..MutationKind::ALL.len())];
        apply_mutation(node, kind, variables, rng);
        return;
    }

    match node {
        Node::Constant(_) | Node::Variable(_) => {}
        Node::Unary { operand, .. } => mutate_node(operand, variables, rate, recursion, rng),
        Node::Binary { left, right, .. } => {
            mutate_node(left, variables, rate, recursion, rng);
            if recursion == MutationRecursion::BothChildren {
                mutate_node(right, variables, rate, recursion, rng);
            }
        }
    }
}

fn apply_mutation<R: Rng + ?Sized>(
    node: &mut Node,
    kind: MutationKind,
    variables: &[String],
    rng: &mut R,
) {
    match kind {
        MutationKind::ReplaceWithTerminal => *node = random_terminal(variables, rng),
        MutationKind::PerturbConstant => {
            // Only constants carry a value to nudge.
            if let Node::Constant(value) = node {
                *value += rng.gen_range(-1.0..=1.0) * PERTURBATION_SCALE;
            }
        }
        MutationKind::ReplaceOperator => match node {
            Node::Unary { op, .. } => *op = random_unary_op(rng),
            Node::Binary { op, .. } => *op = random_binary_op(rng),
            Node::Constant(_) | Node::Variable(_) => {}
        },
        MutationKind::RegrowSubtree => {
            *node = random_formula(variables, REGROW_MAX_DEPTH, REGROW_MAX_NODES, rng);
        }
    }
}
