//! Feature importance vectors and the seam to the models that produce them.

use crate::error::{AuditError, DataError};
use serde::{Deserialize, Serialize};

/// Per-feature importances of one trained model, index-aligned with names.
///
/// Upstream models are expected to emit a simplex point (non-negative
/// values summing to 1.0). Nothing is re-normalized here; [`validate`]
/// reports violations instead.
///
/// [`validate`]: ImportanceVector::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl ImportanceVector {
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Self {
        Self { names, values }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (names, values) = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .unzip();
        Self { names, values }
    }

    /// Build a vector whose features are named `feature_0`, `feature_1`, ...
    pub fn unnamed(values: Vec<f64>) -> Self {
        let names = (0..values.len()).map(|i| format!("feature_{i}")).collect();
        Self { names, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Features ordered by importance, largest first. Equal values keep
    /// their input order.
    pub fn sorted_desc(&self) -> Vec<(&str, f64)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        pairs
    }

    /// Check the audit preconditions, reporting the first one violated.
    pub fn validate(&self, sum_tolerance: f64) -> Result<(), DataError> {
        if self.values.is_empty() {
            return Err(DataError::EmptyVector);
        }
        if self.names.len() != self.values.len() {
            return Err(DataError::LengthMismatch {
                names: self.names.len(),
                values: self.values.len(),
            });
        }
        for (index, (name, value)) in self.iter().enumerate() {
            if !value.is_finite() {
                return Err(DataError::NonFinite {
                    index,
                    name: name.to_string(),
                });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(DataError::OutOfRange {
                    name: name.to_string(),
                    value,
                });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > sum_tolerance {
            return Err(DataError::SumOutOfTolerance {
                sum,
                tolerance: sum_tolerance,
            });
        }
        Ok(())
    }
}

/// Anything that can hand over the importance vector of a fitted model.
///
/// Model adapters (a RandomForest binding, a precomputed artifact reader,
/// ...) implement this so the auditor never depends on a training stack.
pub trait ImportanceSource {
    fn feature_importances(&self) -> Result<ImportanceVector, AuditError>;
}

impl ImportanceSource for ImportanceVector {
    fn feature_importances(&self) -> Result<ImportanceVector, AuditError> {
        Ok(self.clone())
    }
}
