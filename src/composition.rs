// Copyright 2025 Cowboy AI, LLC.

//! Composition trees and their bottom-up evaluation
//!
//! A candidate composition is a binary tree of `Sequence` and `Parallel`
//! combinators over leaf service invocations. Evaluation walks the tree
//! left before right and produces one [`EvaluationResult`] per node; results
//! are moved into their parent and combined by value, so no two subtrees ever
//! share mutable state.
//!
//! ```mermaid
//! graph TD
//!     S[Sequence] --> A[Leaf A]
//!     S --> P[Parallel]
//!     P --> B[Leaf B]
//!     P --> C[Leaf C]
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::catalog::Service;
use crate::errors::{CompositionError, CompositionResult};
use crate::qos::QosVector;
use crate::taxonomy::TaxonomyGraph;

/// A node of a composition tree.
///
/// Evaluation, the shape helpers and drop walk the tree with an explicit
/// stack, so depth is bounded by memory rather than by the call stack.
/// `Clone`, `PartialEq`, `Debug` and `Display` recurse and assume the
/// shallow trees a search loop produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositionNode {
    /// Invoke one service
    Leaf(Arc<Service>),
    /// Run `left`, then `right` with access to `left`'s outputs
    Sequence(Box<CompositionNode>, Box<CompositionNode>),
    /// Run both subtrees independently
    Parallel(Box<CompositionNode>, Box<CompositionNode>),
}

impl CompositionNode {
    /// Leaf for a service
    pub fn leaf(service: Arc<Service>) -> Self {
        CompositionNode::Leaf(service)
    }

    /// `left` followed by `right`
    pub fn sequence(left: CompositionNode, right: CompositionNode) -> Self {
        CompositionNode::Sequence(Box::new(left), Box::new(right))
    }

    /// `left` alongside `right`
    pub fn parallel(left: CompositionNode, right: CompositionNode) -> Self {
        CompositionNode::Parallel(Box::new(left), Box::new(right))
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.services().len()
    }

    /// Height of the tree; a single leaf has depth 1
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, level)) = stack.pop() {
            match node {
                CompositionNode::Leaf(_) => deepest = deepest.max(level),
                CompositionNode::Sequence(l, r) | CompositionNode::Parallel(l, r) => {
                    stack.push((&**r, level + 1));
                    stack.push((&**l, level + 1));
                }
            }
        }
        deepest
    }

    /// Services at the leaves, left to right
    pub fn services(&self) -> Vec<&Arc<Service>> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                CompositionNode::Leaf(s) => out.push(s),
                CompositionNode::Sequence(l, r) | CompositionNode::Parallel(l, r) => {
                    stack.push(&**r);
                    stack.push(&**l);
                }
            }
        }
        out
    }

    fn has_nested_combinator(&self) -> bool {
        match self {
            CompositionNode::Leaf(_) => false,
            CompositionNode::Sequence(l, r) | CompositionNode::Parallel(l, r) => {
                !matches!(**l, CompositionNode::Leaf(_)) || !matches!(**r, CompositionNode::Leaf(_))
            }
        }
    }

    fn first_service(&self) -> Arc<Service> {
        let mut node = self;
        loop {
            match node {
                CompositionNode::Leaf(s) => return Arc::clone(s),
                CompositionNode::Sequence(l, _) | CompositionNode::Parallel(l, _) => node = &**l,
            }
        }
    }

    /// Move combinator children onto `stack`, leaving `filler` leaves behind
    fn detach_combinators(&mut self, filler: &Arc<Service>, stack: &mut Vec<CompositionNode>) {
        if let CompositionNode::Sequence(l, r) | CompositionNode::Parallel(l, r) = self {
            for child in [l, r] {
                if !matches!(**child, CompositionNode::Leaf(_)) {
                    let leaf = CompositionNode::Leaf(Arc::clone(filler));
                    stack.push(std::mem::replace(&mut **child, leaf));
                }
            }
        }
    }
}

impl Drop for CompositionNode {
    fn drop(&mut self) {
        if !self.has_nested_combinator() {
            return;
        }
        let filler = self.first_service();
        let mut stack = Vec::new();
        self.detach_combinators(&filler, &mut stack);
        // Each popped node only has leaf children left when it is dropped.
        while let Some(mut node) = stack.pop() {
            node.detach_combinators(&filler, &mut stack);
        }
    }
}

impl fmt::Display for CompositionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositionNode::Leaf(s) => f.write_str(s.name()),
            CompositionNode::Sequence(l, r) => write!(f, "Sequence({l}, {r})"),
            CompositionNode::Parallel(l, r) => write!(f, "Parallel({l}, {r})"),
        }
    }
}

/// Aggregated QoS and semantic bookkeeping for one evaluated subtree
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    /// Aggregated QoS
    pub qos: QosVector,
    /// Concepts this subtree still requires from outside
    pub inputs: BTreeSet<String>,
    /// Concepts this subtree produces
    pub outputs: BTreeSet<String>,
    /// Inputs satisfied inside the subtree
    pub satisfied_inputs: usize,
    /// Inputs the subtree required in total
    pub total_inputs: usize,
}

impl EvaluationResult {
    /// Result of invoking a single service.
    ///
    /// A leaf's own inputs count as satisfied; satisfaction accounting
    /// measures consistency between composed services.
    pub fn of_service(service: &Service) -> Self {
        let n = service.inputs().len();
        Self {
            qos: service.qos(),
            inputs: service.inputs().clone(),
            outputs: service.outputs().clone(),
            satisfied_inputs: n,
            total_inputs: n,
        }
    }

    /// Combine two independently running subtrees
    pub fn parallel(left: EvaluationResult, right: EvaluationResult) -> Self {
        let mut inputs = left.inputs;
        inputs.extend(right.inputs);
        let mut outputs = left.outputs;
        outputs.extend(right.outputs);
        Self {
            qos: left.qos.alongside(right.qos),
            inputs,
            outputs,
            satisfied_inputs: left.satisfied_inputs + right.satisfied_inputs,
            total_inputs: left.total_inputs + right.total_inputs,
        }
    }

    /// Combine `left` followed by `right`.
    ///
    /// `bridged` is the number of `right`'s inputs satisfiable from `left`'s
    /// outputs. Only `left`'s inputs stay exposed. The left total is counted
    /// twice.
    pub fn sequence(left: EvaluationResult, right: EvaluationResult, bridged: usize) -> Self {
        let mut outputs = left.outputs;
        outputs.extend(right.outputs);
        Self {
            qos: left.qos.then(right.qos),
            inputs: left.inputs,
            outputs,
            satisfied_inputs: left.satisfied_inputs + right.satisfied_inputs + bridged,
            total_inputs: 2 * left.total_inputs + right.total_inputs,
        }
    }
}

/// Evaluates composition trees against a sealed taxonomy
#[derive(Debug, Clone, Copy)]
pub struct CompositionEvaluator<'a> {
    taxonomy: &'a TaxonomyGraph,
}

impl<'a> CompositionEvaluator<'a> {
    /// Create an evaluator
    pub fn new(taxonomy: &'a TaxonomyGraph) -> Self {
        Self { taxonomy }
    }

    /// Evaluate a tree bottom-up, left before right
    pub fn evaluate(&self, root: &CompositionNode) -> CompositionResult<EvaluationResult> {
        let mut pending = vec![Step::Visit(root)];
        let mut results: Vec<EvaluationResult> = Vec::new();

        while let Some(step) = pending.pop() {
            match step {
                Step::Visit(node) => match node {
                    CompositionNode::Leaf(service) => {
                        results.push(EvaluationResult::of_service(service))
                    }
                    CompositionNode::Sequence(l, r) | CompositionNode::Parallel(l, r) => {
                        pending.push(Step::Combine(node));
                        pending.push(Step::Visit(&**r));
                        pending.push(Step::Visit(&**l));
                    }
                },
                Step::Combine(node) => {
                    let right = results.pop().ok_or_else(unbalanced)?;
                    let left = results.pop().ok_or_else(unbalanced)?;
                    let combined = match node {
                        CompositionNode::Parallel(..) => EvaluationResult::parallel(left, right),
                        CompositionNode::Sequence(..) => {
                            let bridged =
                                self.taxonomy.count_satisfied(&left.outputs, &right.inputs)?;
                            EvaluationResult::sequence(left, right, bridged)
                        }
                        CompositionNode::Leaf(_) => return Err(unbalanced()),
                    };
                    results.push(combined);
                }
            }
        }

        match (results.pop(), results.is_empty()) {
            (Some(result), true) => Ok(result),
            _ => Err(unbalanced()),
        }
    }
}

enum Step<'n> {
    Visit(&'n CompositionNode),
    Combine(&'n CompositionNode),
}

fn unbalanced() -> CompositionError {
    CompositionError::DegenerateComposition("unbalanced evaluation stack".to_string())
}
