// Copyright 2025 Cowboy AI, LLC.

//! Relevant-service discovery
//!
//! Forward chaining from the task inputs: every round collects the services
//! whose whole input set is subsumed by the concepts reached so far, adds
//! their outputs to the frontier and removes them from the candidate pool.
//! The pool shrinks every productive round, so the loop runs at most
//! `|catalog|` rounds. If the final frontier cannot satisfy the task outputs
//! no composition exists and the session fails.

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{Service, ServiceCatalog};
use crate::errors::{CompositionError, CompositionResult};
use crate::task::CompositionTask;
use crate::taxonomy::TaxonomyGraph;

/// Per-dimension bounds used to normalise QoS values.
///
/// Time and cost maxima are scaled by the size of the relevant set, bounding
/// a composition that chains every relevant service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationBounds {
    /// Lowest availability
    pub min_availability: f64,
    /// Highest availability
    pub max_availability: f64,
    /// Lowest reliability
    pub min_reliability: f64,
    /// Highest reliability
    pub max_reliability: f64,
    /// Lowest time
    pub min_time: f64,
    /// Highest time, times the set size
    pub max_time: f64,
    /// Lowest cost
    pub min_cost: f64,
    /// Highest cost, times the set size
    pub max_cost: f64,
}

impl NormalizationBounds {
    /// Compute bounds over a set of services. An empty set yields all zeros.
    pub fn from_services<'a>(services: impl IntoIterator<Item = &'a Arc<Service>>) -> Self {
        let mut count = 0usize;
        let mut b = Self {
            min_availability: f64::MAX,
            max_availability: f64::MIN,
            min_reliability: f64::MAX,
            max_reliability: f64::MIN,
            min_time: f64::MAX,
            max_time: f64::MIN,
            min_cost: f64::MAX,
            max_cost: f64::MIN,
        };
        for s in services {
            let q = s.qos();
            b.min_availability = b.min_availability.min(q.availability);
            b.max_availability = b.max_availability.max(q.availability);
            b.min_reliability = b.min_reliability.min(q.reliability);
            b.max_reliability = b.max_reliability.max(q.reliability);
            b.min_time = b.min_time.min(q.time);
            b.max_time = b.max_time.max(q.time);
            b.min_cost = b.min_cost.min(q.cost);
            b.max_cost = b.max_cost.max(q.cost);
            count += 1;
        }
        if count == 0 {
            return Self::zero();
        }
        b.max_time *= count as f64;
        b.max_cost *= count as f64;
        b
    }

    /// All bounds at zero (every dimension normalises to 1.0)
    pub fn zero() -> Self {
        Self {
            min_availability: 0.0,
            max_availability: 0.0,
            min_reliability: 0.0,
            max_reliability: 0.0,
            min_time: 0.0,
            max_time: 0.0,
            min_cost: 0.0,
            max_cost: 0.0,
        }
    }
}

/// Services that can take part in some composition for one task
#[derive(Debug, Clone)]
pub struct RelevantServiceSet {
    services: IndexMap<String, Arc<Service>>,
    bounds: NormalizationBounds,
}

impl RelevantServiceSet {
    /// Build a set and its normalisation bounds
    pub fn new(services: impl IntoIterator<Item = Arc<Service>>) -> Self {
        let services: IndexMap<String, Arc<Service>> = services
            .into_iter()
            .map(|s| (s.name().to_string(), s))
            .collect();
        let bounds = NormalizationBounds::from_services(services.values());
        Self { services, bounds }
    }

    /// Normalisation bounds over this set
    pub fn bounds(&self) -> &NormalizationBounds {
        &self.bounds
    }

    /// Iterate services in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Service>> {
        self.services.values()
    }

    /// Service names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Number of relevant services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// True when no service is relevant
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// True when `name` is relevant
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Look up a relevant service by name
    pub fn get(&self, name: &str) -> Option<&Arc<Service>> {
        self.services.get(name)
    }

    /// Position of a service in the set
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.services.get_index_of(name)
    }

    /// Select a service from a caller-supplied uniform draw.
    ///
    /// The draw is reduced modulo the set size, so any `usize` is accepted.
    pub fn pick(&self, draw: usize) -> CompositionResult<&Arc<Service>> {
        if self.services.is_empty() {
            return Err(CompositionError::EmptyRelevantSet);
        }
        self.services
            .get_index(draw % self.services.len())
            .map(|(_, s)| s)
            .ok_or(CompositionError::EmptyRelevantSet)
    }
}

/// Select a relevant service for a new leaf from a uniform draw
pub fn pick_random_relevant_service(
    relevant: &RelevantServiceSet,
    draw: usize,
) -> CompositionResult<&Arc<Service>> {
    relevant.pick(draw)
}

/// Forward-chain from the task inputs to the services that can take part in
/// a composition.
pub fn discover_relevant_services(
    catalog: &ServiceCatalog,
    taxonomy: &TaxonomyGraph,
    task: &CompositionTask,
) -> CompositionResult<RelevantServiceSet> {
    let mut frontier: BTreeSet<String> = task.inputs().clone();
    let mut remaining: Vec<Arc<Service>> = catalog.iter().cloned().collect();
    let mut discovered: BTreeSet<String> = BTreeSet::new();
    let mut round = 0usize;

    loop {
        let mut found = Vec::new();
        let mut rest = Vec::with_capacity(remaining.len());
        for s in remaining {
            if taxonomy.subsumes(s.inputs(), &frontier)? {
                found.push(s);
            } else {
                rest.push(s);
            }
        }
        remaining = rest;
        if found.is_empty() {
            break;
        }

        round += 1;
        for s in &found {
            frontier.extend(s.outputs().iter().cloned());
            discovered.insert(s.name().to_string());
        }
        debug!(
            round,
            found = found.len(),
            frontier = frontier.len(),
            remaining = remaining.len(),
            "Discovery round"
        );
    }

    let mut unreachable = Vec::new();
    for o in task.outputs() {
        if !taxonomy.is_satisfiable(o, &frontier)? {
            unreachable.push(o.clone());
        }
    }
    if !unreachable.is_empty() {
        warn!(
            rounds = round,
            unreachable = ?unreachable,
            "Task outputs unreachable from task inputs"
        );
        return Err(CompositionError::InfeasibleTask { unreachable });
    }

    let relevant = RelevantServiceSet::new(
        catalog
            .iter()
            .filter(|s| discovered.contains(s.name()))
            .cloned(),
    );
    info!(
        rounds = round,
        relevant = relevant.len(),
        catalog = catalog.len(),
        "Relevant services discovered"
    );
    Ok(relevant)
}
