use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::error::ReportError;

/// Report that is rendered when neither the CLI nor the config names one.
pub const DEFAULT_REPORT: &str = "tennis-wind";

// ---------------------------------------------------------------------------
// OutputFormat
// ---------------------------------------------------------------------------

/// File format written by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Docx,
    Xlsx,
    Csv,
    Md,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Md => "md",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" | "word" => Ok(Self::Docx),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            "md" | "markdown" => Ok(Self::Md),
            other => Err(ReportError::Config(format!(
                "unsupported output format '{other}' (expected docx, xlsx, csv or md)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ReportConfig
// ---------------------------------------------------------------------------

/// Generator configuration stored at `~/.emigration/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory generated files land in. `None` means the user's documents
    /// folder (or `~/.emigration/reports/` when there is none).
    pub output_dir: Option<PathBuf>,
    pub default_report: String,
    pub default_format: OutputFormat,
    pub log_level: String,

    // Page layout
    pub margin_cm: f32,
    pub font_family: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            default_report: DEFAULT_REPORT.into(),
            default_format: OutputFormat::Docx,
            log_level: "info".into(),
            margin_cm: 1.5,
            font_family: "Calibri".into(),
        }
    }
}

impl ReportConfig {
    /// Returns the base config directory: `~/.emigration/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".emigration"))
    }

    /// Returns the config file path: `~/.emigration/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.emigration/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        let dirs = [Self::base_dir()?, Self::logs_dir()?];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk, or creates default if missing.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            config.validate()?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Rejects values the renderer cannot honour.
    pub fn validate(&self) -> Result<(), ReportError> {
        if !self.margin_cm.is_finite() || self.margin_cm <= 0.0 || self.margin_cm > 10.0 {
            return Err(ReportError::Config(format!(
                "margin_cm must be between 0 and 10, got {}",
                self.margin_cm
            )));
        }
        if self.font_family.trim().is_empty() {
            return Err(ReportError::Config("font_family must not be empty".into()));
        }
        if self.default_report.trim().is_empty() {
            return Err(ReportError::Config("default_report must not be empty".into()));
        }
        Ok(())
    }

    /// Directory generated files are written to when no explicit path is given.
    pub fn resolved_output_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.output_dir {
            return Ok(dir.clone());
        }
        match dirs::document_dir() {
            Some(dir) => Ok(dir),
            None => Ok(Self::base_dir()?.join("reports")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = ReportConfig::default();
        assert_eq!(config.default_report, "tennis-wind");
        assert_eq!(config.default_format, OutputFormat::Docx);
        assert_eq!(config.log_level, "info");
        assert!((config.margin_cm - 1.5).abs() < f32::EPSILON);
        assert_eq!(config.font_family, "Calibri");
        assert!(config.output_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_creates_default() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let config = ReportConfig::load_from_path(&path).unwrap();
        assert_eq!(config, ReportConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let config = ReportConfig {
            output_dir: Some(tmp.path().join("out")),
            default_report: "corona".into(),
            default_format: OutputFormat::Xlsx,
            margin_cm: 2.0,
            ..ReportConfig::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = ReportConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.resolved_output_dir().unwrap(), tmp.path().join("out"));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "default_format": "csv" }"#).unwrap();

        let loaded = ReportConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.default_format, OutputFormat::Csv);
        assert_eq!(loaded.default_report, "tennis-wind");
        assert_eq!(loaded.font_family, "Calibri");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = ReportConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn invalid_margin_is_rejected_on_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "margin_cm": -1.0 }"#).unwrap();

        assert!(ReportConfig::load_from_path(&path).is_err());
    }

    #[test]
    fn empty_font_is_rejected() {
        let config = ReportConfig {
            font_family: "  ".into(),
            ..ReportConfig::default()
        };
        assert!(matches!(config.validate(), Err(ReportError::Config(_))));
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("docx".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert_eq!("Word".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert_eq!("XLSX".parse::<OutputFormat>().unwrap(), OutputFormat::Xlsx);
        assert_eq!("markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Md);
        assert_eq!(" csv ".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_serializes_lowercase() {
        let json = serde_json::to_string(&OutputFormat::Xlsx).unwrap();
        assert_eq!(json, "\"xlsx\"");
        assert_eq!(OutputFormat::Md.to_string(), "md");
    }
}
