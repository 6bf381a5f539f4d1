//! Error types for the audit harness

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Audit plan error: {0}")]
    InvalidPlan(String),

    #[error("Unsupported CSS value for {property}: '{value}'")]
    CssValue { property: String, value: String },

    #[error("Unexpected browser event '{event}' while {state}")]
    Protocol { event: String, state: String },

    #[error("Site at {url} unreachable after {attempts} attempts")]
    SiteUnreachable { url: String, attempts: usize },

    #[error("Baseline not found: {0}")]
    BaselineNotFound(String),

    #[error("Visual regression: {0}")]
    VisualRegression(String),

    #[error("Failed to write report to {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type AuditResult<T> = Result<T, AuditError>;
