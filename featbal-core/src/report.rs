//! Human-readable and JSON rendering of audit reports.

use crate::audit::AuditReport;
use crate::config::ReportConfig;
use crate::error::AuditError;
use crate::importance::ImportanceVector;
use std::fmt::Write;

/// Render a report for terminals and CI logs.
///
/// Checks are listed by observed value, largest first. When `vector` is
/// given and the config allows it, the per-feature importances follow,
/// also largest first.
pub fn render_report(
    report: &AuditReport,
    vector: Option<&ImportanceVector>,
    config: &ReportConfig,
) -> String {
    let precision = config.precision;
    let mut out = String::new();
    let verdict = if report.passed { "PASS" } else { "FAIL" };
    let failed = report.failures().count();
    let _ = writeln!(
        out,
        "Feature importance audit: {verdict} ({} features, {failed} of {} checks failed)",
        report.feature_count,
        report.results.len()
    );

    let width = report
        .results
        .iter()
        .map(|r| r.name.as_str().len())
        .max()
        .unwrap_or(0);
    for result in report.sorted_by_observed() {
        let status = if result.passed { "PASS" } else { "FAIL" };
        let _ = writeln!(
            out,
            "  {:<width$}  {:>10.precision$}  {:<14}  {status}",
            result.name.as_str(),
            result.observed,
            result.bounds.to_string(),
        );
        if !result.passed {
            let _ = writeln!(out, "    {}", result.message);
        }
    }

    if config.show_importances
        && let Some(vector) = vector
    {
        let _ = writeln!(out);
        let _ = writeln!(out, "Feature importances:");
        for (name, value) in vector.sorted_desc() {
            let _ = writeln!(out, "  {name}: {value:.precision$}");
        }
    }

    out
}

/// Serialize a report as pretty-printed JSON.
pub fn report_json(report: &AuditReport) -> Result<String, AuditError> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::audit;
    use crate::config::AuditConfig;

    fn sample() -> (ImportanceVector, AuditReport) {
        let v = ImportanceVector::from_pairs([
            ("Pclass", 0.10),
            ("Sex", 0.35),
            ("Age", 0.25),
            ("Fare", 0.15),
            ("SibSp", 0.08),
            ("Parch", 0.07),
        ]);
        let report = audit(&v, &AuditConfig::default()).unwrap();
        (v, report)
    }

    #[test]
    fn test_render_passing_report() {
        let (v, report) = sample();
        let text = render_report(&report, Some(&v), &ReportConfig::default());
        assert!(text.starts_with("Feature importance audit: PASS (6 features, 0 of 4 checks failed)"));
        assert!(text.contains("Sex: 0.3500"));
        let sex = text.find("Sex:").unwrap();
        let age = text.find("Age:").unwrap();
        let parch = text.find("Parch:").unwrap();
        assert!(sex < age && age < parch);
    }

    #[test]
    fn test_checks_sorted_by_observed() {
        let (_, report) = sample();
        let text = render_report(&report, None, &ReportConfig::default());
        let top2 = text.find("top2_share").unwrap();
        let max = text.find("max_share").unwrap();
        let min = text.find("min_share").unwrap();
        assert!(top2 < max && max < min);
        assert!(!text.contains("Feature importances:"));
    }

    #[test]
    fn test_render_failure_includes_message() {
        let v = ImportanceVector::unnamed(vec![1.0]);
        let report = audit(&v, &AuditConfig::default()).unwrap();
        let text = render_report(&report, Some(&v), &ReportConfig::default());
        assert!(text.contains("FAIL (1 features, 3 of 4 checks failed)"));
        assert!(text.contains("FAIL: the most important feature carries 100.00%"));
    }

    #[test]
    fn test_precision_and_hidden_table() {
        let (v, report) = sample();
        let config = ReportConfig {
            precision: 2,
            show_importances: false,
        };
        let text = render_report(&report, Some(&v), &config);
        assert!(text.contains("0.35"));
        assert!(!text.contains("0.3500"));
        assert!(!text.contains("Sex:"));
    }

    #[test]
    fn test_report_json() {
        let (_, report) = sample();
        let json = report_json(&report).unwrap();
        let parsed: AuditReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.passed, report.passed);
        assert_eq!(parsed.feature_count, 6);
        assert_eq!(parsed.results.len(), 4);
        assert!(json.contains("\"top2_share\""));
    }
}
