// Copyright 2025 Cowboy AI, LLC.

//! Composition problem sessions
//!
//! A [`CompositionProblem`] owns everything one optimisation run needs: the
//! sealed taxonomy and catalog, the task, its relevant service set and the
//! fitness weights. All of it sits behind `Arc`s and is never mutated after
//! construction, so a problem can be cloned into any number of threads or
//! tasks that evaluate candidates concurrently.

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{build_catalog, Service, ServiceCatalog};
use crate::composition::{CompositionEvaluator, CompositionNode};
use crate::config::CompositionConfig;
use crate::discovery::{discover_relevant_services, RelevantServiceSet};
use crate::errors::CompositionResult;
use crate::fitness::{FitnessBreakdown, FitnessScorer, FitnessWeights};
use crate::task::CompositionTask;
use crate::taxonomy::{TaxonomyGraph, TaxonomyRecord};
use crate::wsc;

/// Evaluate one composition tree and return its fitness.
///
/// Deterministic: identical inputs produce bit-identical results.
pub fn evaluate(
    tree: &CompositionNode,
    relevant: &RelevantServiceSet,
    taxonomy: &TaxonomyGraph,
    task: &CompositionTask,
    weights: &FitnessWeights,
) -> CompositionResult<f64> {
    let result = CompositionEvaluator::new(taxonomy).evaluate(tree)?;
    FitnessScorer::new(taxonomy, task, relevant.bounds(), weights).score(&result)
}

/// One composition session: sealed repository, task, relevant set and weights
#[derive(Debug, Clone)]
pub struct CompositionProblem {
    taxonomy: Arc<TaxonomyGraph>,
    catalog: Arc<ServiceCatalog>,
    task: Arc<CompositionTask>,
    relevant: Arc<RelevantServiceSet>,
    weights: FitnessWeights,
}

impl CompositionProblem {
    /// Set up a session from a built catalog.
    ///
    /// Fails when the weights are invalid or the task is infeasible.
    pub fn new(
        catalog: ServiceCatalog,
        taxonomy: TaxonomyGraph,
        task: CompositionTask,
        weights: FitnessWeights,
    ) -> CompositionResult<Self> {
        weights.validate()?;
        let relevant = discover_relevant_services(&catalog, &taxonomy, &task)?;
        info!(
            task_inputs = task.inputs().len(),
            task_outputs = task.outputs().len(),
            relevant = relevant.len(),
            "Composition problem ready"
        );
        Ok(Self {
            taxonomy: Arc::new(taxonomy),
            catalog: Arc::new(catalog),
            task: Arc::new(task),
            relevant: Arc::new(relevant),
            weights,
        })
    }

    /// Load the WSC description files named in a configuration and set up a session
    pub fn from_config(config: &CompositionConfig) -> CompositionResult<Self> {
        let taxonomy_records: Vec<TaxonomyRecord> = wsc::load_taxonomy(&config.taxonomy)?;
        let taxonomy = TaxonomyGraph::from_records(taxonomy_records)?;
        let services = wsc::load_services(&config.services)?;
        let task_record = wsc::load_task(&config.task)?;

        let (catalog, taxonomy) = build_catalog(services, taxonomy)?;
        let task = CompositionTask::from_record(&task_record, &taxonomy)?;
        Self::new(catalog, taxonomy, task, config.weights)
    }

    /// Sealed taxonomy
    pub fn taxonomy(&self) -> &TaxonomyGraph {
        &self.taxonomy
    }

    /// Full service catalog
    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Concept-level task
    pub fn task(&self) -> &CompositionTask {
        &self.task
    }

    /// Relevant services for the task
    pub fn relevant(&self) -> &RelevantServiceSet {
        &self.relevant
    }

    /// Fitness weights
    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Select a relevant service for a new leaf from a uniform draw
    pub fn random_service(&self, draw: usize) -> CompositionResult<Arc<Service>> {
        self.relevant.pick(draw).map(Arc::clone)
    }

    /// Fitness of a composition tree
    pub fn evaluate(&self, tree: &CompositionNode) -> CompositionResult<f64> {
        evaluate(tree, &self.relevant, &self.taxonomy, &self.task, &self.weights)
    }

    /// Every fitness term of a composition tree
    pub fn breakdown(&self, tree: &CompositionNode) -> CompositionResult<FitnessBreakdown> {
        let result = CompositionEvaluator::new(&self.taxonomy).evaluate(tree)?;
        let breakdown =
            FitnessScorer::new(&self.taxonomy, &self.task, self.relevant.bounds(), &self.weights)
                .breakdown(&result)?;
        debug!(
            tree = %tree,
            fitness = breakdown.fitness,
            "Composition evaluated"
        );
        Ok(breakdown)
    }
}
