// Copyright 2025 Cowboy AI, LLC.

//! Composition tasks

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::CompositionResult;
use crate::taxonomy::TaxonomyGraph;

/// A parsed task description: what the user provides and what they want
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Provided identifiers
    pub provided: Vec<String>,
    /// Wanted identifiers
    pub wanted: Vec<String>,
}

impl TaskRecord {
    /// Create a task record
    pub fn new(
        provided: impl IntoIterator<Item = impl Into<String>>,
        wanted: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            provided: provided.into_iter().map(Into::into).collect(),
            wanted: wanted.into_iter().map(Into::into).collect(),
        }
    }
}

/// A composition task at the concept level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionTask {
    inputs: BTreeSet<String>,
    outputs: BTreeSet<String>,
}

impl CompositionTask {
    /// Create a task from concept-level sets
    pub fn new(inputs: BTreeSet<String>, outputs: BTreeSet<String>) -> Self {
        Self { inputs, outputs }
    }

    /// Lift a parsed task to the concept level
    pub fn from_record(record: &TaskRecord, taxonomy: &TaxonomyGraph) -> CompositionResult<Self> {
        Ok(Self {
            inputs: taxonomy.generalize_all(&record.provided)?,
            outputs: taxonomy.generalize_all(&record.wanted)?,
        })
    }

    /// Concepts the task provides
    pub fn inputs(&self) -> &BTreeSet<String> {
        &self.inputs
    }

    /// Concepts the task wants
    pub fn outputs(&self) -> &BTreeSet<String> {
        &self.outputs
    }
}
