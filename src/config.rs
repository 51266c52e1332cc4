// Copyright 2025 Cowboy AI, LLC.

//! Problem configuration
//!
//! A configuration names the three WSC description files and the fitness
//! weights:
//!
//! ```json
//! {
//!   "services": "services.xml",
//!   "task": "problem.xml",
//!   "taxonomy": "taxonomy.xml",
//!   "weights": {
//!     "availability": 0.25, "reliability": 0.25, "time": 0.25, "cost": 0.25,
//!     "input_satisfaction": 0.0, "output_satisfaction": 0.0, "internal_satisfaction": 0.0
//!   }
//! }
//! ```
//!
//! Relative paths are resolved against the directory of the configuration
//! file.

use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CompositionResult;
use crate::fitness::FitnessWeights;

/// Configuration of one composition problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompositionConfig {
    /// WSC services file
    pub services: PathBuf,
    /// WSC task file
    pub task: PathBuf,
    /// WSC taxonomy file
    pub taxonomy: PathBuf,
    /// Fitness weights; equal weights when omitted
    #[serde(default)]
    pub weights: FitnessWeights,
}

impl CompositionConfig {
    /// Parse a configuration from JSON text. Paths are kept as written.
    pub fn from_json_str(json: &str) -> CompositionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration file, resolving relative paths against its directory
    pub fn from_json_file(path: impl AsRef<Path>) -> CompositionResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        Ok(match path.parent() {
            Some(base) => config.resolve_against(base),
            None => config,
        })
    }

    /// Make relative paths relative to `base`
    pub fn resolve_against(mut self, base: &Path) -> Self {
        for p in [&mut self.services, &mut self.task, &mut self.taxonomy] {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
        self
    }

    /// JSON Schema describing the configuration format
    pub fn json_schema() -> CompositionResult<serde_json::Value> {
        Ok(serde_json::to_value(schemars::schema_for!(CompositionConfig))?)
    }
}
