// Copyright 2025 Cowboy AI, LLC.

//! Concept taxonomy and semantic subsumption
//!
//! The taxonomy is a directed acyclic graph of concepts. A node may have
//! several parents; the first one listed is its canonical generalization and
//! is what an instance is replaced by when services and tasks are lifted to
//! the concept level.
//!
//! Each node carries a `reachable_outputs` set. It is filled once, when the
//! service catalog is built:
//!
//! 1. every concept is registered as reachable from itself and from all of
//!    its ancestors (a required concept is satisfied by itself or by anything
//!    more specific);
//! 2. for every service, the full output set is unioned into each output
//!    concept and each of its ancestors.
//!
//! Matching is then a pure intersection test against that set.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::errors::{CompositionError, CompositionResult};

/// Whether a taxonomy node is an abstract concept or a concrete instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConceptKind {
    /// Ontological class
    Concept,
    /// Concrete value typed by its first parent
    Instance,
}

/// A parsed taxonomy entry, as supplied by a loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyRecord {
    /// Node identifier
    pub id: String,
    /// Concept or instance
    pub kind: ConceptKind,
    /// Parents in declaration order
    pub parents: Vec<String>,
}

impl TaxonomyRecord {
    /// A concept record without parents
    pub fn concept(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ConceptKind::Concept,
            parents: Vec::new(),
        }
    }

    /// An instance record without parents
    pub fn instance(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ConceptKind::Instance,
            parents: Vec::new(),
        }
    }

    /// Append a parent
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }
}

/// A node of the taxonomy graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptNode {
    id: String,
    kind: ConceptKind,
    parents: Vec<String>,
    children: BTreeSet<String>,
    reachable_outputs: BTreeSet<String>,
}

impl ConceptNode {
    fn new(id: String, kind: ConceptKind) -> Self {
        Self {
            id,
            kind,
            parents: Vec::new(),
            children: BTreeSet::new(),
            reachable_outputs: BTreeSet::new(),
        }
    }

    /// Node identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Concept or instance
    pub fn kind(&self) -> ConceptKind {
        self.kind
    }

    /// Parents in declaration order
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// Canonical generalization (first parent)
    pub fn primary_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    /// Direct children
    pub fn children(&self) -> &BTreeSet<String> {
        &self.children
    }

    /// Concepts that satisfy this node when available
    pub fn reachable_outputs(&self) -> &BTreeSet<String> {
        &self.reachable_outputs
    }
}

/// In-memory concept taxonomy
#[derive(Debug, Default, Clone)]
pub struct TaxonomyGraph {
    nodes: BTreeMap<String, ConceptNode>,
}

impl TaxonomyGraph {
    /// Create an empty taxonomy
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// Build a taxonomy from parsed records.
    ///
    /// All nodes are inserted before any edge so records may reference
    /// parents declared later.
    pub fn from_records(
        records: impl IntoIterator<Item = TaxonomyRecord>,
    ) -> CompositionResult<Self> {
        let records: Vec<TaxonomyRecord> = records.into_iter().collect();
        let mut graph = Self::new();
        for r in &records {
            graph.insert_concept(r.id.clone(), r.kind);
        }
        for r in &records {
            for p in &r.parents {
                graph.relate(p.clone(), r.id.clone())?;
            }
        }
        Ok(graph)
    }

    /// Insert a node, or update the kind of an existing one
    pub fn insert_concept(&mut self, id: impl Into<String>, kind: ConceptKind) {
        let id = id.into();
        self.nodes
            .entry(id.clone())
            .and_modify(|n| n.kind = kind)
            .or_insert_with(|| ConceptNode::new(id, kind));
    }

    /// Add a parent → child edge. Repeated edges are ignored.
    pub fn relate(
        &mut self,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> CompositionResult<()> {
        let parent = parent.into();
        let child = child.into();
        if !self.nodes.contains_key(&parent) {
            return Err(CompositionError::UnknownConcept(parent));
        }
        let child_node = self
            .nodes
            .get_mut(&child)
            .ok_or_else(|| CompositionError::UnknownConcept(child.clone()))?;
        if !child_node.parents.contains(&parent) {
            child_node.parents.push(parent.clone());
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.insert(child);
        }
        Ok(())
    }

    /// Get a node by id
    pub fn concept(&self, id: &str) -> Option<&ConceptNode> {
        self.nodes.get(id)
    }

    /// Get a node by id, failing on a lookup miss
    pub fn node(&self, id: &str) -> CompositionResult<&ConceptNode> {
        self.nodes
            .get(id)
            .ok_or_else(|| CompositionError::UnknownConcept(id.to_string()))
    }

    /// True when the taxonomy knows `id`
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the taxonomy has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lift an identifier to the concept level.
    ///
    /// Instances map to their first parent; concepts map to themselves.
    pub fn generalize(&self, id: &str) -> CompositionResult<String> {
        let node = self.node(id)?;
        match node.kind {
            ConceptKind::Concept => Ok(node.id.clone()),
            ConceptKind::Instance => node
                .primary_parent()
                .map(str::to_string)
                .ok_or_else(|| CompositionError::OrphanInstance(id.to_string())),
        }
    }

    /// Lift a collection of identifiers to the concept level
    pub fn generalize_all<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a String>,
    ) -> CompositionResult<BTreeSet<String>> {
        ids.into_iter().map(|id| self.generalize(id)).collect()
    }

    /// Proper ancestors of `id`, breadth-first, each listed once
    pub fn ancestors(&self, id: &str) -> CompositionResult<Vec<String>> {
        let mut closure = self.upward_closure(std::iter::once(id))?;
        closure.retain(|c| c != id);
        Ok(closure)
    }

    /// `starts` and every ancestor of them, breadth-first, each visited once
    fn upward_closure<'a>(
        &self,
        starts: impl IntoIterator<Item = &'a str>,
    ) -> CompositionResult<Vec<String>> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut order = Vec::new();
        let mut q: VecDeque<&str> = VecDeque::new();
        for s in starts {
            let node = self.node(s)?;
            if seen.insert(node.id.as_str()) {
                q.push_back(node.id.as_str());
            }
        }
        while let Some(cur) = q.pop_front() {
            order.push(cur.to_string());
            for p in &self.node(cur)?.parents {
                let parent = self.node(p)?;
                if seen.insert(parent.id.as_str()) {
                    q.push_back(parent.id.as_str());
                }
            }
        }
        Ok(order)
    }

    /// Register every concept as reachable from itself and all its ancestors
    pub(crate) fn seed_subsumption(&mut self) -> CompositionResult<()> {
        let ids: Vec<String> = self.nodes.keys().cloned().collect();
        for id in ids {
            for target in self.upward_closure(std::iter::once(id.as_str()))? {
                if let Some(n) = self.nodes.get_mut(&target) {
                    n.reachable_outputs.insert(id.clone());
                }
            }
        }
        Ok(())
    }

    /// Union one service's outputs into each output concept and its ancestors.
    ///
    /// A single seen-set is shared across all outputs of the service.
    pub(crate) fn propagate_outputs(&mut self, outputs: &BTreeSet<String>) -> CompositionResult<()> {
        let targets = self.upward_closure(outputs.iter().map(String::as_str))?;
        for target in targets {
            if let Some(n) = self.nodes.get_mut(&target) {
                n.reachable_outputs.extend(outputs.iter().cloned());
            }
        }
        Ok(())
    }

    /// True when `available` can satisfy the single concept `required`
    pub fn is_satisfiable(
        &self,
        required: &str,
        available: &BTreeSet<String>,
    ) -> CompositionResult<bool> {
        let reachable = &self.node(required)?.reachable_outputs;
        Ok(available.iter().any(|c| reachable.contains(c)))
    }

    /// True iff every concept in `required` is satisfiable from `available`.
    ///
    /// Stops at the first unsatisfiable concept. An empty requirement is
    /// always subsumed.
    pub fn subsumes(
        &self,
        required: &BTreeSet<String>,
        available: &BTreeSet<String>,
    ) -> CompositionResult<bool> {
        for r in required {
            if !self.is_satisfiable(r, available)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Number of concepts in `required` satisfiable from `produced`.
    ///
    /// Each required concept counts at most once.
    pub fn count_satisfied(
        &self,
        produced: &BTreeSet<String>,
        required: &BTreeSet<String>,
    ) -> CompositionResult<usize> {
        let mut satisfied = 0;
        for r in required {
            if self.is_satisfiable(r, produced)? {
                satisfied += 1;
            }
        }
        Ok(satisfied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// thing ─┬─ vehicle ─┬─ car ── my_car (instance)
    ///        │           └─ bike
    ///        └─ place ── city
    fn sample() -> TaxonomyGraph {
        let mut g = TaxonomyGraph::from_records(vec![
            TaxonomyRecord::concept("thing"),
            TaxonomyRecord::concept("vehicle").with_parent("thing"),
            TaxonomyRecord::concept("car").with_parent("vehicle"),
            TaxonomyRecord::concept("bike").with_parent("vehicle"),
            TaxonomyRecord::instance("my_car").with_parent("car"),
            TaxonomyRecord::concept("place").with_parent("thing"),
            TaxonomyRecord::concept("city").with_parent("place"),
        ])
        .unwrap();
        g.seed_subsumption().unwrap();
        g
    }

    #[test]
    fn records_build_edges_in_both_directions() {
        let g = sample();
        assert_eq!(g.len(), 7);
        assert_eq!(g.node("car").unwrap().parents(), &["vehicle".to_string()]);
        assert!(g.node("vehicle").unwrap().children().contains("bike"));
        assert_eq!(g.node("thing").unwrap().primary_parent(), None);
    }

    #[test]
    fn relate_rejects_unknown_nodes() {
        let mut g = TaxonomyGraph::new();
        g.insert_concept("a", ConceptKind::Concept);
        let err = g.relate("a", "missing").unwrap_err();
        assert!(matches!(err, CompositionError::UnknownConcept(ref c) if c == "missing"));
        let err = g.relate("missing", "a").unwrap_err();
        assert!(matches!(err, CompositionError::UnknownConcept(ref c) if c == "missing"));
    }

    #[test]
    fn first_parent_is_canonical() {
        let g = TaxonomyGraph::from_records(vec![
            TaxonomyRecord::concept("a"),
            TaxonomyRecord::concept("b"),
            TaxonomyRecord::instance("x").with_parent("b").with_parent("a"),
        ])
        .unwrap();
        assert_eq!(g.generalize("x").unwrap(), "b");
        assert_eq!(g.generalize("a").unwrap(), "a");
    }

    #[test]
    fn orphan_instance_cannot_generalize() {
        let g = TaxonomyGraph::from_records(vec![TaxonomyRecord::instance("lonely")]).unwrap();
        assert!(matches!(
            g.generalize("lonely"),
            Err(CompositionError::OrphanInstance(_))
        ));
        assert!(matches!(
            g.generalize("nowhere"),
            Err(CompositionError::UnknownConcept(_))
        ));
    }

    #[test]
    fn ancestors_are_breadth_first_and_unique() {
        let g = TaxonomyGraph::from_records(vec![
            TaxonomyRecord::concept("root"),
            TaxonomyRecord::concept("left").with_parent("root"),
            TaxonomyRecord::concept("right").with_parent("root"),
            TaxonomyRecord::concept("leaf").with_parent("left").with_parent("right"),
        ])
        .unwrap();
        assert_eq!(g.ancestors("leaf").unwrap(), vec!["left", "right", "root"]);
    }

    #[test]
    fn seeding_makes_descendants_satisfy_ancestors() {
        let g = sample();
        assert!(g.is_satisfiable("vehicle", &set(&["car"])).unwrap());
        assert!(g.is_satisfiable("car", &set(&["car"])).unwrap());
        assert!(!g.is_satisfiable("car", &set(&["vehicle"])).unwrap());
        assert!(!g.is_satisfiable("city", &set(&["car"])).unwrap());
    }

    #[test]
    fn propagation_reaches_every_ancestor_with_full_output_set() {
        let mut g = sample();
        g.propagate_outputs(&set(&["car", "city"])).unwrap();

        // `thing` is an ancestor of both outputs, `vehicle` only of `car`,
        // yet each receives the whole output set.
        assert!(g.node("vehicle").unwrap().reachable_outputs().contains("city"));
        assert!(g.node("thing").unwrap().reachable_outputs().contains("car"));
        assert!(g.node("car").unwrap().reachable_outputs().contains("city"));
        // Siblings are untouched.
        assert!(!g.node("bike").unwrap().reachable_outputs().contains("city"));
    }

    #[test]
    fn subsumes_requires_every_concept() {
        let g = sample();
        assert!(g.subsumes(&set(&[]), &set(&[])).unwrap());
        assert!(g.subsumes(&set(&["vehicle", "place"]), &set(&["car", "city"])).unwrap());
        assert!(!g.subsumes(&set(&["vehicle", "place"]), &set(&["car"])).unwrap());
    }

    #[test]
    fn subsumes_fails_on_unknown_required_concept() {
        let g = sample();
        let err = g.subsumes(&set(&["ghost"]), &set(&["car"])).unwrap_err();
        assert!(matches!(err, CompositionError::UnknownConcept(ref c) if c == "ghost"));
    }

    #[test]
    fn count_satisfied_counts_each_input_once() {
        let g = sample();
        // Both `car` and `bike` satisfy `vehicle`; it still counts once.
        let produced = set(&["car", "bike"]);
        assert_eq!(g.count_satisfied(&produced, &set(&["vehicle"])).unwrap(), 1);
        assert_eq!(
            g.count_satisfied(&produced, &set(&["vehicle", "car", "city"])).unwrap(),
            2
        );
        assert_eq!(g.count_satisfied(&produced, &set(&[])).unwrap(), 0);
    }
}
