//! Balance audit over a model's feature importances.
//!
//! Four independent rules decide whether the decision signal of a fitted
//! classifier is spread across its features or concentrated in a few of
//! them. A rule failing is a normal outcome carried in [`AuditReport`];
//! only malformed input is an error.

use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::importance::{ImportanceSource, ImportanceVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A balance rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Largest single importance.
    MaxShare,
    /// Sum of the two largest importances.
    Top2Share,
    /// Smallest importance.
    MinShare,
    /// Population standard deviation of the importances.
    StddevRange,
}

impl Rule {
    pub const ALL: [Rule; 4] = [
        Rule::MaxShare,
        Rule::Top2Share,
        Rule::MinShare,
        Rule::StddevRange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::MaxShare => "max_share",
            Rule::Top2Share => "top2_share",
            Rule::MinShare => "min_share",
            Rule::StddevRange => "stddev_range",
        }
    }

    fn describe_failure(&self, observed: f64) -> String {
        let pct = observed * 100.0;
        match self {
            Rule::MaxShare => format!(
                "the most important feature carries {pct:.2}% of the signal; the model leans on a single feature"
            ),
            Rule::Top2Share => format!(
                "the top two features carry {pct:.2}% of the signal; the model leans on too few features"
            ),
            Rule::MinShare => format!(
                "the least important feature carries only {pct:.2}%; it may be removable"
            ),
            Rule::StddevRange => format!(
                "importance standard deviation {pct:.2}% is outside the allowed range"
            ),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exclusive range a statistic must fall in. A missing end is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Bounds {
    pub fn below(upper: f64) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
        }
    }

    pub fn above(lower: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    pub fn between(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower.is_none_or(|lo| lo < value) && self.upper.is_none_or(|hi| value < hi)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) => write!(f, "({lo}, {hi})"),
            (None, Some(hi)) => write!(f, "< {hi}"),
            (Some(lo), None) => write!(f, "> {lo}"),
            (None, None) => f.write_str("unbounded"),
        }
    }
}

/// Outcome of one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: Rule,
    pub passed: bool,
    pub observed: f64,
    pub bounds: Bounds,
    pub message: String,
}

impl CheckResult {
    fn evaluate(name: Rule, observed: f64, bounds: Bounds) -> Self {
        let passed = bounds.contains(observed);
        let message = if passed {
            "PASS".into()
        } else {
            format!("FAIL: {}", name.describe_failure(observed))
        };
        Self {
            name,
            passed,
            observed,
            bounds,
            message,
        }
    }
}

/// All rule outcomes for one importance vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub results: Vec<CheckResult>,
    pub passed: bool,
    pub feature_count: usize,
}

impl AuditReport {
    pub fn get(&self, rule: Rule) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.name == rule)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    /// Results ordered by observed value, largest first.
    pub fn sorted_by_observed(&self) -> Vec<&CheckResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| b.observed.total_cmp(&a.observed));
        sorted
    }
}

/// Summary statistics the rules are computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ImportanceStats {
    max: f64,
    top2: f64,
    min: f64,
    stddev: f64,
}

impl ImportanceStats {
    /// Callers guarantee `values` is non-empty and finite.
    fn compute(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mut first = f64::NEG_INFINITY;
        let mut second = 0.0;
        let mut min = f64::INFINITY;
        for &v in values {
            if v > first {
                second = first.max(0.0);
                first = v;
            } else if v > second {
                second = v;
            }
            min = min.min(v);
        }
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            max: first,
            top2: first + second,
            min,
            stddev: variance.sqrt(),
        }
    }
}

/// Audit an importance vector against the configured thresholds.
///
/// Fails only with a data error for vectors that break the input contract
/// (empty, misaligned names, non-finite or out-of-range values, sum away
/// from 1.0). The config is used as given; see [`Auditor::new`] for a
/// validated entry point.
pub fn audit(vector: &ImportanceVector, config: &AuditConfig) -> Result<AuditReport, AuditError> {
    vector.validate(config.sum_tolerance)?;
    let stats = ImportanceStats::compute(vector.values());

    let results = vec![
        CheckResult::evaluate(
            Rule::MaxShare,
            stats.max,
            Bounds::below(config.max_share_upper),
        ),
        CheckResult::evaluate(
            Rule::Top2Share,
            stats.top2,
            Bounds::below(config.top2_share_upper),
        ),
        CheckResult::evaluate(
            Rule::MinShare,
            stats.min,
            Bounds::above(config.min_share_lower),
        ),
        CheckResult::evaluate(
            Rule::StddevRange,
            stats.stddev,
            Bounds::between(config.stddev_lower, config.stddev_upper),
        ),
    ];

    for result in &results {
        tracing::debug!(
            rule = %result.name,
            observed = result.observed,
            bounds = %result.bounds,
            passed = result.passed,
            "Evaluated balance rule"
        );
        if !result.passed {
            tracing::warn!(rule = %result.name, "{}", result.message);
        }
    }

    let passed = results.iter().all(|r| r.passed);
    tracing::info!(
        features = vector.len(),
        passed,
        failed_rules = results.iter().filter(|r| !r.passed).count(),
        "Feature importance audit complete"
    );

    Ok(AuditReport {
        results,
        passed,
        feature_count: vector.len(),
    })
}

/// Fetch the importances from a model adapter and audit them.
pub fn audit_source(
    source: &dyn ImportanceSource,
    config: &AuditConfig,
) -> Result<AuditReport, AuditError> {
    let vector = source.feature_importances()?;
    audit(&vector, config)
}

/// An auditor bound to a validated configuration.
#[derive(Debug, Clone, Default)]
pub struct Auditor {
    config: AuditConfig,
}

impl Auditor {
    pub fn new(config: AuditConfig) -> Result<Self, AuditError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn audit(&self, vector: &ImportanceVector) -> Result<AuditReport, AuditError> {
        audit(vector, &self.config)
    }

    pub fn audit_source(&self, source: &dyn ImportanceSource) -> Result<AuditReport, AuditError> {
        audit_source(source, &self.config)
    }
}
