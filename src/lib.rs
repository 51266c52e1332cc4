// Copyright 2025 Cowboy AI, LLC.

//! # CIM Service Composition
//!
//! Semantic web-service composition for the Composable Information Machine.
//!
//! Given a repository of services (typed inputs and outputs plus four QoS
//! attributes) and a task (provided and wanted concepts), this crate:
//! - **Taxonomy**: lifts instances to concepts and answers subsumption queries
//! - **Catalog**: holds the services at the concept level
//! - **Discovery**: forward-chains from the task inputs to the relevant services
//! - **Composition**: evaluates Sequence/Parallel trees of service invocations
//! - **Fitness**: normalises QoS and semantic ratios into one weighted score
//!
//! Generating candidate trees is left to the caller's search loop; the crate
//! evaluates one tree at a time and never owns randomness.
//!
//! ## Design Principles
//!
//! 1. **Build once, share read-only**: taxonomy, catalog and relevant set are
//!    sealed before evaluation starts and shared through `Arc`
//! 2. **Value semantics**: every evaluated subtree owns its result
//! 3. **Closed combinators**: an enum with exhaustive matching, no dynamic dispatch
//! 4. **Errors, not exits**: malformed repositories and infeasible tasks are
//!    `Err` values the caller decides how to handle
//!
//! ```no_run
//! use cim_service_composition::{CompositionConfig, CompositionNode, CompositionProblem};
//!
//! # fn main() -> Result<(), cim_service_composition::CompositionError> {
//! let config = CompositionConfig::from_json_file("wsc/problem.json")?;
//! let problem = CompositionProblem::from_config(&config)?;
//! let tree = CompositionNode::sequence(
//!     CompositionNode::leaf(problem.random_service(0)?),
//!     CompositionNode::leaf(problem.random_service(1)?),
//! );
//! let fitness = problem.evaluate(&tree)?;
//! # let _ = fitness;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod catalog;
mod composition;
mod config;
mod discovery;
mod errors;
mod fitness;
mod problem;
mod qos;
mod task;
mod taxonomy;
pub mod wsc;

pub use catalog::{build_catalog, Service, ServiceCatalog, ServiceRecord};
pub use composition::{CompositionEvaluator, CompositionNode, EvaluationResult};
pub use config::CompositionConfig;
pub use discovery::{
    discover_relevant_services, pick_random_relevant_service, NormalizationBounds,
    RelevantServiceSet,
};
pub use errors::{CompositionError, CompositionResult};
pub use fitness::{
    normalise_benefit, normalise_penalty, FitnessBreakdown, FitnessScorer, FitnessWeights,
    SemanticRatios,
};
pub use problem::{evaluate, CompositionProblem};
pub use qos::{QosDimension, QosVector};
pub use task::{CompositionTask, TaskRecord};
pub use taxonomy::{ConceptKind, ConceptNode, TaxonomyGraph, TaxonomyRecord};
