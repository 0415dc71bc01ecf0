//! Command payloads and their renderings.
//!
//! Every command produces a serializable report. JSON goes to stdout as a
//! single pretty-printed document; text is a short human summary.

use hmm_config::{ModelSnapshot, PresetInfo};
use hmm_core::{ForwardMode, StochasticViolation};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::exit_codes::ExitCode;

/// Schema version of CLI output documents.
pub const OUTPUT_SCHEMA_VERSION: &str = "1.0.0";

/// Supported output formats.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured JSON (default)
    #[default]
    Json,
    /// Human-readable text
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

/// Text rendering of a report.
pub trait RenderText {
    fn render_text(&self) -> String;
}

/// Common header carried by every report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportHeader {
    pub schema_version: String,
    pub generated_at: String,
    pub command: String,
}

impl ReportHeader {
    pub fn new(command: &str) -> Self {
        Self {
            schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            command: command.to_string(),
        }
    }
}

/// One decoded time step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedStep {
    pub observation: usize,
    pub observation_label: String,
    pub state: usize,
    pub state_label: String,
    /// `exp(score)` of the chosen state; not a normalized posterior.
    pub confidence: f64,
}

/// Output of `decode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeReport {
    #[serde(flatten)]
    pub header: ReportHeader,
    pub model: ModelSnapshot,
    pub states: Vec<usize>,
    pub steps: Vec<DecodedStep>,
    /// Log-probability of the best path; `null` when no path is possible.
    pub log_probability: f64,
    /// Full log-domain score table, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<Vec<f64>>>,
}

impl RenderText for DecodeReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", model_line(&self.model));
        let _ = writeln!(out, "{:>5}  {:<12} {:<12} {:>12}", "step", "observed", "state", "confidence");
        for (t, step) in self.steps.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>5}  {:<12} {:<12} {:>12.6e}",
                t, step.observation_label, step.state_label, step.confidence
            );
        }
        let _ = writeln!(out, "log-probability: {}", self.log_probability);
        out
    }
}

/// Output of `evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateReport {
    #[serde(flatten)]
    pub header: ReportHeader,
    pub model: ModelSnapshot,
    pub observations: Vec<usize>,
    pub mode: ForwardMode,
    pub probability: f64,
    pub log_probability: f64,
}

impl RenderText for EvaluateReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", model_line(&self.model));
        let _ = writeln!(out, "steps: {}", self.observations.len());
        let _ = writeln!(out, "mode: {}", self.mode);
        let _ = writeln!(out, "probability: {:e}", self.probability);
        let _ = writeln!(out, "log-probability: {}", self.log_probability);
        out
    }
}

/// Output of `check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    #[serde(flatten)]
    pub header: ReportHeader,
    pub model: ModelSnapshot,
    pub valid: bool,
    pub tolerance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<StochasticViolation>,
}

impl RenderText for CheckReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", model_line(&self.model));
        match self.violation {
            None => {
                let _ = writeln!(
                    out,
                    "ok: every distribution sums to 1 (tolerance {:e})",
                    self.tolerance
                );
            }
            Some(v) => {
                let _ = writeln!(
                    out,
                    "FAILED: {} distribution {} sums to {} ({:?})",
                    v.parameter, v.index, v.sum, v.reason
                );
            }
        }
        out
    }
}

/// Output of `presets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetsReport {
    #[serde(flatten)]
    pub header: ReportHeader,
    pub presets: Vec<PresetInfo>,
}

impl RenderText for PresetsReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        for p in &self.presets {
            let _ = writeln!(
                out,
                "{:<10} {} states, {} symbols  {}",
                p.name, p.num_states, p.num_symbols, p.description
            );
        }
        out
    }
}

/// Error payload for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,
    pub exit_code: i32,
    pub message: String,
}

impl ErrorReport {
    pub fn new(code: ExitCode, message: impl Into<String>) -> Self {
        Self {
            error: code.code_name().to_string(),
            exit_code: code.as_i32(),
            message: message.into(),
        }
    }
}

impl RenderText for ErrorReport {
    fn render_text(&self) -> String {
        format!("error: {}\n", self.message)
    }
}

/// Render a report in the requested format.
pub fn render<R: Serialize + RenderText>(
    format: OutputFormat,
    report: &R,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report).map(|s| s + "\n"),
        OutputFormat::Text => Ok(report.render_text()),
    }
}

fn model_line(snapshot: &ModelSnapshot) -> String {
    format!(
        "model: {} ({}, {} states, {} symbols, {})",
        snapshot.model_name.as_deref().unwrap_or("unnamed"),
        snapshot.source,
        snapshot.num_states,
        snapshot.num_symbols,
        snapshot.short_id()
    )
}
