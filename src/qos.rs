// Copyright 2025 Cowboy AI, LLC.

//! Quality-of-Service vectors and their aggregation algebra
//!
//! Every service carries four QoS attributes in a fixed order: response
//! time, cost, availability and reliability. Two sub-compositions combine
//! differently depending on how they run:
//!
//! | Dimension    | Sequence | Parallel |
//! |--------------|----------|----------|
//! | time         | sum      | max      |
//! | cost         | sum      | sum      |
//! | availability | product  | product  |
//! | reliability  | product  | product  |
//!
//! `QosVector` is `Copy`, so combining never aliases an operand.

use serde::{Deserialize, Serialize};

use crate::errors::{CompositionError, CompositionResult};

/// The four QoS dimensions, in their canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QosDimension {
    /// Response time (lower is better)
    Time,
    /// Invocation cost (lower is better)
    Cost,
    /// Probability the service is reachable (higher is better)
    Availability,
    /// Probability the service answers correctly (higher is better)
    Reliability,
}

impl QosDimension {
    /// All dimensions in canonical order
    pub const ALL: [QosDimension; 4] = [
        QosDimension::Time,
        QosDimension::Cost,
        QosDimension::Availability,
        QosDimension::Reliability,
    ];

    /// True for dimensions where a larger value is worse
    pub fn is_cost_like(self) -> bool {
        matches!(self, QosDimension::Time | QosDimension::Cost)
    }
}

/// A QoS vector for a service or an evaluated sub-composition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QosVector {
    /// Response time
    pub time: f64,
    /// Cost
    pub cost: f64,
    /// Availability in `[0, 1]`
    pub availability: f64,
    /// Reliability in `[0, 1]`
    pub reliability: f64,
}

impl QosVector {
    /// Create a vector in canonical order
    pub fn new(time: f64, cost: f64, availability: f64, reliability: f64) -> Self {
        Self {
            time,
            cost,
            availability,
            reliability,
        }
    }

    /// Neutral element of both combinators (zero time/cost, certain availability/reliability)
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Read one dimension
    pub fn get(&self, dim: QosDimension) -> f64 {
        match dim {
            QosDimension::Time => self.time,
            QosDimension::Cost => self.cost,
            QosDimension::Availability => self.availability,
            QosDimension::Reliability => self.reliability,
        }
    }

    /// The vector as an array in canonical order
    pub fn to_array(self) -> [f64; 4] {
        [self.time, self.cost, self.availability, self.reliability]
    }

    /// Aggregate `self` followed by `next`
    pub fn then(self, next: QosVector) -> QosVector {
        QosVector {
            time: self.time + next.time,
            cost: self.cost + next.cost,
            availability: self.availability * next.availability,
            reliability: self.reliability * next.reliability,
        }
    }

    /// Aggregate `self` running alongside `other`
    pub fn alongside(self, other: QosVector) -> QosVector {
        QosVector {
            time: self.time.max(other.time),
            cost: self.cost + other.cost,
            availability: self.availability * other.availability,
            reliability: self.reliability * other.reliability,
        }
    }

    /// Check every attribute lies in its domain.
    ///
    /// Time and cost must be finite and non-negative; availability and
    /// reliability must lie in `[0, 1]`.
    pub fn validate(&self, service: &str) -> CompositionResult<()> {
        for dim in QosDimension::ALL {
            let value = self.get(dim);
            let ok = if dim.is_cost_like() {
                value.is_finite() && value >= 0.0
            } else {
                (0.0..=1.0).contains(&value)
            };
            if !ok {
                let domain = if dim.is_cost_like() { "[0, inf)" } else { "[0, 1]" };
                return Err(CompositionError::InvalidQos {
                    service: service.to_string(),
                    reason: format!("{dim:?} {value} outside {domain}").to_lowercase(),
                });
            }
        }
        Ok(())
    }
}

impl Default for QosVector {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a() -> QosVector {
        QosVector::new(1.0, 1.0, 0.9, 0.9)
    }

    fn b() -> QosVector {
        QosVector::new(2.0, 2.0, 0.8, 0.8)
    }

    #[test]
    fn sequence_adds_time_and_cost() {
        let q = a().then(b());
        assert_eq!(q.time, 3.0);
        assert_eq!(q.cost, 3.0);
        assert!((q.availability - 0.72).abs() < 1e-12);
        assert!((q.reliability - 0.72).abs() < 1e-12);
    }

    #[test]
    fn parallel_takes_critical_path() {
        let q = a().alongside(b());
        assert_eq!(q.time, 2.0);
        assert_eq!(q.cost, 3.0);
        assert!((q.availability - 0.72).abs() < 1e-12);
    }

    #[test]
    fn identity_is_neutral() {
        assert_eq!(a().then(QosVector::identity()), a());
        assert_eq!(QosVector::identity().alongside(b()), b());
    }

    #[test]
    fn validate_rejects_out_of_domain() {
        assert!(a().validate("a").is_ok());

        let err = QosVector::new(1.0, 1.0, 1.5, 0.9).validate("bad").unwrap_err();
        assert!(matches!(err, CompositionError::InvalidQos { ref service, .. } if service == "bad"));
        assert!(err.to_string().contains("availability 1.5"));

        assert!(QosVector::new(-1.0, 1.0, 0.5, 0.5).validate("t").is_err());
        assert!(QosVector::new(1.0, f64::NAN, 0.5, 0.5).validate("c").is_err());
        assert!(QosVector::new(1.0, 1.0, 0.5, f64::NAN).validate("r").is_err());
    }

    #[test]
    fn dimension_accessors_follow_canonical_order() {
        let q = QosVector::new(4.0, 3.0, 0.2, 0.1);
        let by_dim: Vec<f64> = QosDimension::ALL.iter().map(|d| q.get(*d)).collect();
        assert_eq!(by_dim, q.to_array().to_vec());
    }
}
