//! Configuration for featbal.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! explicit config file -> environment -> programmatic overrides. The user
//! config lives at `~/.config/featbal/config.toml` (platform equivalent).

use crate::error::AuditError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatbalConfig {
    /// Rule thresholds.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Human-readable report rendering.
    #[serde(default)]
    pub report: ReportConfig,
}

impl FeatbalConfig {
    /// Render as TOML, the format `load_config` reads.
    pub fn to_toml(&self) -> Result<String, AuditError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Thresholds for the balance rules. All bounds are exclusive.
///
/// The defaults were calibrated on an 8-feature RandomForest trained on the
/// Titanic survival data. They are not scaled with the feature count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// The largest importance must stay below this.
    #[serde(default = "default_max_share_upper")]
    pub max_share_upper: f64,
    /// The two largest importances together must stay below this.
    #[serde(default = "default_top2_share_upper")]
    pub top2_share_upper: f64,
    /// The smallest importance must stay above this.
    #[serde(default = "default_min_share_lower")]
    pub min_share_lower: f64,
    /// Lower end of the allowed population standard deviation.
    #[serde(default = "default_stddev_lower")]
    pub stddev_lower: f64,
    /// Upper end of the allowed population standard deviation.
    #[serde(default = "default_stddev_upper")]
    pub stddev_upper: f64,
    /// Allowed distance of the importance sum from 1.0.
    #[serde(default = "default_sum_tolerance")]
    pub sum_tolerance: f64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_share_upper: default_max_share_upper(),
            top2_share_upper: default_top2_share_upper(),
            min_share_lower: default_min_share_lower(),
            stddev_lower: default_stddev_lower(),
            stddev_upper: default_stddev_upper(),
            sum_tolerance: default_sum_tolerance(),
        }
    }
}

impl AuditConfig {
    /// Reject thresholds that cannot describe a usable gate.
    pub fn validate(&self) -> Result<(), AuditError> {
        let shares = [
            ("max_share_upper", self.max_share_upper),
            ("top2_share_upper", self.top2_share_upper),
            ("min_share_lower", self.min_share_lower),
        ];
        for (name, value) in shares {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(AuditError::config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        for (name, value) in [
            ("stddev_lower", self.stddev_lower),
            ("stddev_upper", self.stddev_upper),
            ("sum_tolerance", self.sum_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AuditError::config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.stddev_lower >= self.stddev_upper {
            return Err(AuditError::config(format!(
                "stddev_lower ({}) must be below stddev_upper ({})",
                self.stddev_lower, self.stddev_upper
            )));
        }
        Ok(())
    }
}

fn default_max_share_upper() -> f64 {
    0.5
}

fn default_top2_share_upper() -> f64 {
    0.8
}

fn default_min_share_lower() -> f64 {
    0.01
}

fn default_stddev_lower() -> f64 {
    0.03
}

fn default_stddev_upper() -> f64 {
    0.2
}

fn default_sum_tolerance() -> f64 {
    1e-6
}

/// Rendering options for the text report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Decimal places for observed values and importances.
    #[serde(default = "default_precision")]
    pub precision: usize,
    /// Append the per-feature importance table.
    #[serde(default = "default_true")]
    pub show_importances: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            show_importances: true,
        }
    }
}

fn default_precision() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// Partial configuration merged on top of every other layer. Only the
/// fields that are set take part in the merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigOverrides {
    pub audit: AuditOverrides,
    pub report: ReportOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_share_upper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top2_share_upper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_share_lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stddev_lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stddev_upper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_tolerance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_importances: Option<bool>,
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `FEATBAL_`, e.g. `FEATBAL_AUDIT__MAX_SHARE_UPPER`)
/// 3. Explicit config file
/// 4. User config (`~/.config/featbal/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    config_file: Option<&Path>,
    overrides: Option<&ConfigOverrides>,
) -> Result<FeatbalConfig, AuditError> {
    let mut figment = Figment::from(Serialized::defaults(FeatbalConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "featbal", "featbal") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(AuditError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("FEATBAL_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: FeatbalConfig = figment.extract().map_err(Box::new)?;
    config.audit.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_audit_config() {
        let config = AuditConfig::default();
        assert_eq!(config.max_share_upper, 0.5);
        assert_eq!(config.top2_share_upper, 0.8);
        assert_eq!(config.min_share_lower, 0.01);
        assert_eq!(config.stddev_lower, 0.03);
        assert_eq!(config.stddev_upper, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let parsed: FeatbalConfig = toml::from_str("[audit]\nmax_share_upper = 0.6\n").unwrap();
        assert_eq!(parsed.audit.max_share_upper, 0.6);
        assert_eq!(parsed.audit.top2_share_upper, 0.8);
        assert_eq!(parsed.report, ReportConfig::default());
    }

    #[test]
    fn test_to_toml_reads_back() {
        let config = FeatbalConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[audit]"));
        let parsed: FeatbalConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_inverted_stddev_range() {
        let config = AuditConfig {
            stddev_lower: 0.2,
            stddev_upper: 0.1,
            ..AuditConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stddev_lower"));
    }

    #[test]
    fn test_validate_rejects_share_above_one() {
        let config = AuditConfig {
            top2_share_upper: 1.5,
            ..AuditConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let config = AuditConfig {
            sum_tolerance: f64::NAN,
            ..AuditConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "featbal.toml",
                "[audit]\nmin_share_lower = 0.005\n\n[report]\nprecision = 2\n",
            )?;
            let config = load_config(Some(Path::new("featbal.toml")), None).unwrap();
            assert_eq!(config.audit.min_share_lower, 0.005);
            assert_eq!(config.report.precision, 2);
            Ok(())
        });
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/featbal.toml")), None).unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[test]
    fn test_load_config_overrides_win() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FEATBAL_AUDIT__MAX_SHARE_UPPER", "0.4");
            let overrides = ConfigOverrides {
                audit: AuditOverrides {
                    max_share_upper: Some(0.45),
                    ..AuditOverrides::default()
                },
                ..ConfigOverrides::default()
            };
            let config = load_config(None, Some(&overrides)).unwrap();
            assert_eq!(config.audit.max_share_upper, 0.45);
            Ok(())
        });
    }

    #[test]
    fn test_override_keeps_unrelated_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "featbal.toml",
                "[audit]\nmin_share_lower = 0.005\n\n[report]\nshow_importances = false\n",
            )?;
            let overrides = ConfigOverrides {
                audit: AuditOverrides {
                    max_share_upper: Some(0.45),
                    ..AuditOverrides::default()
                },
                ..ConfigOverrides::default()
            };
            let config = load_config(Some(Path::new("featbal.toml")), Some(&overrides)).unwrap();
            assert_eq!(config.audit.max_share_upper, 0.45);
            assert_eq!(config.audit.min_share_lower, 0.005);
            assert!(!config.report.show_importances);
            Ok(())
        });
    }

    #[test]
    fn test_env_layer_beats_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "featbal.toml",
                "[audit]\nmax_share_upper = 0.6\nmin_share_lower = 0.005\n",
            )?;
            jail.set_env("FEATBAL_AUDIT__MAX_SHARE_UPPER", "0.4");
            jail.set_env("FEATBAL_REPORT__PRECISION", "3");
            let config = load_config(Some(Path::new("featbal.toml")), None).unwrap();
            assert_eq!(config.audit.max_share_upper, 0.4);
            assert_eq!(config.audit.min_share_lower, 0.005);
            assert_eq!(config.report.precision, 3);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_env_value_is_config_error() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FEATBAL_AUDIT__STDDEV_LOWER", "0.5");
            assert!(matches!(load_config(None, None), Err(AuditError::Config(_))));
            Ok(())
        });
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "featbal.toml",
                "[audit]\nstddev_lower = 0.5\nstddev_upper = 0.1\n",
            )?;
            assert!(matches!(
                load_config(Some(Path::new("featbal.toml")), None),
                Err(AuditError::Config(_))
            ));
            Ok(())
        });
    }
}
