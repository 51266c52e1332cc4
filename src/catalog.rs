// Copyright 2025 Cowboy AI, LLC.

//! Service catalog
//!
//! Services arrive as [`ServiceRecord`]s referencing taxonomy instances. When
//! the catalog is built every input and output is lifted to its concept, the
//! QoS vector is validated, and the outputs are propagated through the
//! taxonomy so later subsumption queries are plain set intersections.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{CompositionError, CompositionResult};
use crate::qos::QosVector;
use crate::taxonomy::TaxonomyGraph;

/// A parsed service description, before generalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Service name
    pub name: String,
    /// QoS attributes
    pub qos: QosVector,
    /// Input identifiers (instances or concepts)
    pub inputs: Vec<String>,
    /// Output identifiers (instances or concepts)
    pub outputs: Vec<String>,
}

impl ServiceRecord {
    /// Create a record
    pub fn new(
        name: impl Into<String>,
        qos: QosVector,
        inputs: impl IntoIterator<Item = impl Into<String>>,
        outputs: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            qos,
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }
}

/// A web service at the concept level.
///
/// Equality and hashing use the name only.
#[derive(Debug, Clone)]
pub struct Service {
    name: String,
    qos: QosVector,
    inputs: BTreeSet<String>,
    outputs: BTreeSet<String>,
}

impl Service {
    /// Create a service from concept-level sets
    pub fn new(
        name: impl Into<String>,
        qos: QosVector,
        inputs: BTreeSet<String>,
        outputs: BTreeSet<String>,
    ) -> Self {
        Self {
            name: name.into(),
            qos,
            inputs,
            outputs,
        }
    }

    /// Service name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// QoS vector
    pub fn qos(&self) -> QosVector {
        self.qos
    }

    /// Input concepts
    pub fn inputs(&self) -> &BTreeSet<String> {
        &self.inputs
    }

    /// Output concepts
    pub fn outputs(&self) -> &BTreeSet<String> {
        &self.outputs
    }
}

impl PartialEq for Service {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Service {}

impl Hash for Service {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// All known services, in insertion order
#[derive(Debug, Default, Clone)]
pub struct ServiceCatalog {
    services: IndexMap<String, Arc<Service>>,
}

impl ServiceCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            services: IndexMap::new(),
        }
    }

    /// Add a concept-level service. Names must be unique.
    pub fn insert(&mut self, service: Service) -> CompositionResult<Arc<Service>> {
        if self.services.contains_key(service.name()) {
            return Err(CompositionError::DuplicateService(service.name.clone()));
        }
        let service = Arc::new(service);
        self.services
            .insert(service.name.clone(), Arc::clone(&service));
        Ok(service)
    }

    /// Look up a service by name
    pub fn get(&self, name: &str) -> Option<&Arc<Service>> {
        self.services.get(name)
    }

    /// Iterate services in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Service>> {
        self.services.values()
    }

    /// Number of services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// True when the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Services whose whole input set is subsumed by `available`
    pub fn executable_with(
        &self,
        taxonomy: &TaxonomyGraph,
        available: &BTreeSet<String>,
    ) -> CompositionResult<Vec<Arc<Service>>> {
        let mut found = Vec::new();
        for s in self.iter() {
            if taxonomy.subsumes(s.inputs(), available)? {
                found.push(Arc::clone(s));
            }
        }
        Ok(found)
    }

    /// Services producing at least one output that satisfies `required`
    pub fn producers_of(
        &self,
        taxonomy: &TaxonomyGraph,
        required: &str,
    ) -> CompositionResult<Vec<Arc<Service>>> {
        let mut found = Vec::new();
        for s in self.iter() {
            if taxonomy.is_satisfiable(required, s.outputs())? {
                found.push(Arc::clone(s));
            }
        }
        Ok(found)
    }
}

/// Lift service records to the concept level and register their outputs in
/// the taxonomy.
///
/// Consumes the taxonomy and returns it with `reachable_outputs` populated;
/// neither structure is mutated afterwards.
pub fn build_catalog(
    services: impl IntoIterator<Item = ServiceRecord>,
    mut taxonomy: TaxonomyGraph,
) -> CompositionResult<(ServiceCatalog, TaxonomyGraph)> {
    let mut catalog = ServiceCatalog::new();
    for record in services {
        record.qos.validate(&record.name)?;
        let inputs = taxonomy.generalize_all(&record.inputs)?;
        let outputs = taxonomy.generalize_all(&record.outputs)?;
        catalog.insert(Service::new(record.name, record.qos, inputs, outputs))?;
    }

    taxonomy.seed_subsumption()?;
    for s in catalog.iter() {
        taxonomy.propagate_outputs(s.outputs())?;
    }

    info!(
        services = catalog.len(),
        concepts = taxonomy.len(),
        "Service catalog built"
    );
    Ok((catalog, taxonomy))
}
