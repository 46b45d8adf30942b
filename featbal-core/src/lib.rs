//! # featbal-core — Feature-Importance Balance Auditing
//!
//! Decides whether a trained classifier's feature importances are spread
//! across its features or dominated by a few of them. Four rules are
//! checked against configurable exclusive bounds:
//!
//! 1. **max_share** — the largest importance
//! 2. **top2_share** — the sum of the two largest importances
//! 3. **min_share** — the smallest importance
//! 4. **stddev_range** — the population standard deviation
//!
//! ```
//! use featbal_core::{AuditConfig, ImportanceVector, audit};
//!
//! let importances = ImportanceVector::from_pairs([
//!     ("Sex", 0.35), ("Age", 0.25), ("Fare", 0.15),
//!     ("Pclass", 0.10), ("SibSp", 0.08), ("Parch", 0.07),
//! ]);
//! let report = audit(&importances, &AuditConfig::default()).unwrap();
//! assert!(report.passed);
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod importance;
pub mod report;

// Re-exports
pub use audit::{AuditReport, Auditor, Bounds, CheckResult, Rule, audit, audit_source};
pub use config::{
    AuditConfig, AuditOverrides, ConfigOverrides, FeatbalConfig, ReportConfig, ReportOverrides,
    load_config,
};
pub use error::{AuditError, DataError};
pub use importance::{ImportanceSource, ImportanceVector};
pub use report::{render_report, report_json};
