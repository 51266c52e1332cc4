// Copyright 2025 Cowboy AI, LLC.

//! Fitness scoring
//!
//! A composition's fitness is a weighted sum of seven terms, each in `[0, 1]`:
//! four normalised QoS dimensions and three semantic ratios. Weights are
//! applied as given; callers wanting a bounded score supply weights summing
//! to one.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::composition::EvaluationResult;
use crate::discovery::NormalizationBounds;
use crate::errors::{CompositionError, CompositionResult};
use crate::task::CompositionTask;
use crate::taxonomy::TaxonomyGraph;

/// The seven fitness weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FitnessWeights {
    /// Weight of normalised availability
    pub availability: f64,
    /// Weight of normalised reliability
    pub reliability: f64,
    /// Weight of normalised time
    pub time: f64,
    /// Weight of normalised cost
    pub cost: f64,
    /// Weight of the task-input satisfaction ratio
    pub input_satisfaction: f64,
    /// Weight of the task-output satisfaction ratio
    pub output_satisfaction: f64,
    /// Weight of the internal input satisfaction ratio
    pub internal_satisfaction: f64,
}

impl FitnessWeights {
    /// Weights in order: availability, reliability, time, cost, input, output, internal
    pub fn from_array(w: [f64; 7]) -> Self {
        Self {
            availability: w[0],
            reliability: w[1],
            time: w[2],
            cost: w[3],
            input_satisfaction: w[4],
            output_satisfaction: w[5],
            internal_satisfaction: w[6],
        }
    }

    /// Weights in the same order as [`FitnessWeights::from_array`]
    pub fn to_array(self) -> [f64; 7] {
        [
            self.availability,
            self.reliability,
            self.time,
            self.cost,
            self.input_satisfaction,
            self.output_satisfaction,
            self.internal_satisfaction,
        ]
    }

    /// Check every weight is finite and non-negative
    pub fn validate(&self) -> CompositionResult<()> {
        const NAMES: [&str; 7] = [
            "availability",
            "reliability",
            "time",
            "cost",
            "input_satisfaction",
            "output_satisfaction",
            "internal_satisfaction",
        ];
        for (name, w) in NAMES.iter().zip(self.to_array()) {
            if !w.is_finite() || w < 0.0 {
                return Err(CompositionError::InvalidWeights(format!(
                    "{name} weight must be finite and non-negative, got {w}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self::from_array([1.0 / 7.0; 7])
    }
}

/// Semantic satisfaction ratios of one composition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemanticRatios {
    /// Task inputs satisfying the composition's exposed inputs
    pub input: f64,
    /// Task outputs produced by the composition
    pub output: f64,
    /// Inputs satisfied inside the composition
    pub internal: f64,
}

/// Every term of a fitness computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessBreakdown {
    /// Normalised availability
    pub availability: f64,
    /// Normalised reliability
    pub reliability: f64,
    /// Normalised time
    pub time: f64,
    /// Normalised cost
    pub cost: f64,
    /// Semantic ratios
    pub semantics: SemanticRatios,
    /// Weighted sum
    pub fitness: f64,
}

fn ratio(numerator: usize, denominator: usize, what: &str) -> CompositionResult<f64> {
    if denominator == 0 {
        return Err(CompositionError::DegenerateComposition(format!(
            "{what} ratio has a zero denominator"
        )));
    }
    Ok(numerator as f64 / denominator as f64)
}

/// Normalise a higher-is-better value; zero width scores 1.0
pub fn normalise_benefit(value: f64, min: f64, max: f64) -> f64 {
    if max - min == 0.0 {
        1.0
    } else {
        (value - min) / (max - min)
    }
}

/// Normalise a lower-is-better value, clamping it to `max` first; zero width scores 1.0
pub fn normalise_penalty(value: f64, min: f64, max: f64) -> f64 {
    let value = if value > max { max } else { value };
    if max - min == 0.0 {
        1.0
    } else {
        (max - value) / (max - min)
    }
}

/// Scores evaluated compositions against one task and its relevant set
#[derive(Debug, Clone, Copy)]
pub struct FitnessScorer<'a> {
    taxonomy: &'a TaxonomyGraph,
    task: &'a CompositionTask,
    bounds: &'a NormalizationBounds,
    weights: &'a FitnessWeights,
}

impl<'a> FitnessScorer<'a> {
    /// Create a scorer
    pub fn new(
        taxonomy: &'a TaxonomyGraph,
        task: &'a CompositionTask,
        bounds: &'a NormalizationBounds,
        weights: &'a FitnessWeights,
    ) -> Self {
        Self {
            taxonomy,
            task,
            bounds,
            weights,
        }
    }

    /// Compute the three semantic ratios
    pub fn semantic_ratios(&self, result: &EvaluationResult) -> CompositionResult<SemanticRatios> {
        let satisfied_inputs = self
            .taxonomy
            .count_satisfied(self.task.inputs(), &result.inputs)?;
        let satisfied_outputs = self
            .taxonomy
            .count_satisfied(&result.outputs, self.task.outputs())?;
        Ok(SemanticRatios {
            input: ratio(satisfied_inputs, result.inputs.len(), "input")?,
            output: ratio(satisfied_outputs, self.task.outputs().len(), "output")?,
            internal: ratio(result.satisfied_inputs, result.total_inputs, "internal")?,
        })
    }

    /// Compute every term and the weighted sum.
    ///
    /// Fails with `InvalidWeights` before scoring when any weight is negative
    /// or not finite.
    pub fn breakdown(&self, result: &EvaluationResult) -> CompositionResult<FitnessBreakdown> {
        self.weights.validate()?;
        let semantics = self.semantic_ratios(result)?;
        let b = self.bounds;
        let q = result.qos;
        let availability = normalise_benefit(q.availability, b.min_availability, b.max_availability);
        let reliability = normalise_benefit(q.reliability, b.min_reliability, b.max_reliability);
        let time = normalise_penalty(q.time, b.min_time, b.max_time);
        let cost = normalise_penalty(q.cost, b.min_cost, b.max_cost);

        let w = self.weights;
        let fitness = (w.availability * availability
            + w.reliability * reliability
            + w.time * time
            + w.cost * cost)
            + (w.input_satisfaction * semantics.input
                + w.output_satisfaction * semantics.output
                + w.internal_satisfaction * semantics.internal);

        Ok(FitnessBreakdown {
            availability,
            reliability,
            time,
            cost,
            semantics,
            fitness,
        })
    }

    /// Weighted fitness of an evaluated composition
    pub fn score(&self, result: &EvaluationResult) -> CompositionResult<f64> {
        Ok(self.breakdown(result)?.fitness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qos::QosVector;
    use crate::taxonomy::TaxonomyRecord;
    use std::collections::BTreeSet;
    use test_case::test_case;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn taxonomy() -> TaxonomyGraph {
        let mut g =
            TaxonomyGraph::from_records(["X", "Y", "Z"].into_iter().map(TaxonomyRecord::concept))
                .unwrap();
        g.seed_subsumption().unwrap();
        g
    }

    fn result(inputs: &[&str], outputs: &[&str], satisfied: usize, total: usize) -> EvaluationResult {
        EvaluationResult {
            qos: QosVector::new(3.0, 3.0, 0.72, 0.72),
            inputs: set(inputs),
            outputs: set(outputs),
            satisfied_inputs: satisfied,
            total_inputs: total,
        }
    }

    #[test_case(0.5, 0.0, 1.0 => 0.5 ; "midpoint")]
    #[test_case(0.7, 0.7, 0.7 => 1.0 ; "zero width")]
    #[test_case(0.0, 0.0, 1.0 => 0.0 ; "at minimum")]
    fn benefit_normalisation(value: f64, min: f64, max: f64) -> f64 {
        normalise_benefit(value, min, max)
    }

    #[test_case(1.0, 1.0, 5.0 => 1.0 ; "at minimum is best")]
    #[test_case(5.0, 1.0, 5.0 => 0.0 ; "at maximum is worst")]
    #[test_case(9.0, 1.0, 5.0 => 0.0 ; "beyond maximum is clamped")]
    #[test_case(3.0, 2.0, 2.0 => 1.0 ; "zero width")]
    fn penalty_normalisation(value: f64, min: f64, max: f64) -> f64 {
        normalise_penalty(value, min, max)
    }

    #[test]
    fn ratios_follow_task_and_internal_counts() {
        let tax = taxonomy();
        let task = CompositionTask::new(set(&["X"]), set(&["Z"]));
        let bounds = NormalizationBounds::zero();
        let weights = FitnessWeights::default();
        let scorer = FitnessScorer::new(&tax, &task, &bounds, &weights);

        let r = scorer
            .semantic_ratios(&result(&["X", "Y"], &["Y"], 3, 4))
            .unwrap();
        assert_eq!(r.input, 0.5);
        assert_eq!(r.output, 0.0);
        assert_eq!(r.internal, 0.75);
    }

    #[test]
    fn zero_denominators_are_degenerate() {
        let tax = taxonomy();
        let bounds = NormalizationBounds::zero();
        let weights = FitnessWeights::default();

        let task = CompositionTask::new(set(&["X"]), set(&["Z"]));
        let scorer = FitnessScorer::new(&tax, &task, &bounds, &weights);
        let err = scorer.score(&result(&[], &["Z"], 0, 1)).unwrap_err();
        assert!(matches!(err, CompositionError::DegenerateComposition(ref m) if m.contains("input")));
        let err = scorer.score(&result(&["X"], &["Z"], 0, 0)).unwrap_err();
        assert!(matches!(err, CompositionError::DegenerateComposition(ref m) if m.contains("internal")));

        let no_outputs = CompositionTask::new(set(&["X"]), set(&[]));
        let scorer = FitnessScorer::new(&tax, &no_outputs, &bounds, &weights);
        let err = scorer.score(&result(&["X"], &["Z"], 1, 1)).unwrap_err();
        assert!(matches!(err, CompositionError::DegenerateComposition(ref m) if m.contains("output")));
    }

    #[test]
    fn weights_are_applied_without_renormalisation() {
        let tax = taxonomy();
        let task = CompositionTask::new(set(&["X"]), set(&["Z"]));
        let bounds = NormalizationBounds::zero();
        let weights = FitnessWeights::from_array([1.0; 7]);
        let scorer = FitnessScorer::new(&tax, &task, &bounds, &weights);
        // Zero-width bounds score every QoS term 1.0; semantics are all 1.0.
        let fitness = scorer.score(&result(&["X"], &["Z"], 1, 1)).unwrap();
        assert_eq!(fitness, 7.0);
    }

    #[test]
    fn scorer_rejects_invalid_weights() {
        let tax = taxonomy();
        let task = CompositionTask::new(set(&["X"]), set(&["Z"]));
        let bounds = NormalizationBounds::zero();
        let mut weights = FitnessWeights::default();
        weights.reliability = f64::NAN;
        let scorer = FitnessScorer::new(&tax, &task, &bounds, &weights);
        let err = scorer.score(&result(&["X"], &["Z"], 1, 1)).unwrap_err();
        assert!(matches!(err, CompositionError::InvalidWeights(ref m) if m.contains("reliability")));
    }

    #[test]
    fn weight_validation() {
        assert!(FitnessWeights::default().validate().is_ok());
        let mut w = FitnessWeights::default();
        w.cost = -0.1;
        let err = w.validate().unwrap_err();
        assert!(err.to_string().contains("cost weight"));
        w.cost = f64::INFINITY;
        assert!(w.validate().is_err());
    }

    #[test]
    fn weights_round_trip_through_arrays() {
        let arr = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7];
        assert_eq!(FitnessWeights::from_array(arr).to_array(), arr);
    }
}
