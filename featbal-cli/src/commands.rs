//! CLI subcommand handlers.

use crate::AuditArgs;
use crate::Commands;
use crate::ConfigAction;
use crate::OutputFormat;
use anyhow::Context;
use featbal_core::{AuditOverrides, Auditor, ConfigOverrides, FeatbalConfig, ImportanceVector};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Exit status for runs that never reached a verdict.
pub const EXIT_ERROR: u8 = 2;

/// Result of a command run that reached a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Passed,
    Failed,
}

impl GateOutcome {
    pub fn code(self) -> u8 {
        match self {
            GateOutcome::Passed => 0,
            GateOutcome::Failed => 1,
        }
    }
}

/// Map a command result to the process exit status.
pub fn exit_status(result: &anyhow::Result<GateOutcome>) -> u8 {
    match result {
        Ok(outcome) => outcome.code(),
        Err(_) => EXIT_ERROR,
    }
}

/// Accepted shapes of an importance file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportanceFile {
    Aligned(ImportanceVector),
    Named { importances: BTreeMap<String, f64> },
}

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    config_path: Option<&Path>,
    out: &mut impl Write,
) -> anyhow::Result<GateOutcome> {
    match command {
        Commands::Audit(args) => {
            let config = featbal_core::load_config(config_path, Some(&audit_overrides(&args)))
                .context("failed to load configuration")?;
            handle_audit(&args, config, out)
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => {
            let config = featbal_core::load_config(config_path, None)
                .context("failed to load configuration")?;
            write!(out, "{}", config.to_toml()?)?;
            Ok(GateOutcome::Passed)
        }
        // Writes built-in defaults without resolving the current config.
        Commands::Config {
            action: ConfigAction::Init { path },
        } => init_config(&path, out),
    }
}

/// Threshold flags as the top configuration layer.
fn audit_overrides(args: &AuditArgs) -> ConfigOverrides {
    ConfigOverrides {
        audit: AuditOverrides {
            max_share_upper: args.max_share,
            top2_share_upper: args.top2_share,
            min_share_lower: args.min_share,
            stddev_lower: args.stddev_lower,
            stddev_upper: args.stddev_upper,
            ..AuditOverrides::default()
        },
        ..ConfigOverrides::default()
    }
}

/// Read an importance vector from a JSON file.
pub fn load_importances(path: &Path) -> anyhow::Result<ImportanceVector> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: ImportanceFile = serde_json::from_str(&content).with_context(|| {
        format!(
            "{} is neither {{\"names\", \"values\"}} nor {{\"importances\": {{...}}}}",
            path.display()
        )
    })?;
    Ok(match parsed {
        ImportanceFile::Aligned(vector) => vector,
        ImportanceFile::Named { importances } => ImportanceVector::from_pairs(importances),
    })
}

fn handle_audit(
    args: &AuditArgs,
    config: FeatbalConfig,
    out: &mut impl Write,
) -> anyhow::Result<GateOutcome> {
    let auditor = Auditor::new(config.audit.clone())?;
    let vector = load_importances(&args.file)?;
    tracing::debug!(file = %args.file.display(), features = vector.len(), "Loaded importances");

    let report = auditor
        .audit(&vector)
        .with_context(|| format!("cannot audit {}", args.file.display()))?;

    match args.format {
        OutputFormat::Text => {
            let text = featbal_core::render_report(&report, Some(&vector), &config.report);
            write!(out, "{text}")?;
        }
        OutputFormat::Json => {
            writeln!(out, "{}", featbal_core::report_json(&report)?)?;
        }
    }

    Ok(if report.passed {
        GateOutcome::Passed
    } else {
        GateOutcome::Failed
    })
}

fn init_config(path: &Path, out: &mut impl Write) -> anyhow::Result<GateOutcome> {
    if path.exists() {
        writeln!(
            out,
            "Configuration file already exists at: {}",
            path.display()
        )?;
        return Ok(GateOutcome::Passed);
    }
    let toml_str = FeatbalConfig::default().to_toml()?;
    std::fs::write(path, &toml_str)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writeln!(out, "Created default configuration at: {}", path.display())?;
    Ok(GateOutcome::Passed)
}
