//! hmm-infer command line support.
//!
//! The binary in `main.rs` is a thin clap front end; model loading, exit code
//! mapping, logging setup and report rendering live here.

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod output;

pub use config::{load_model, ConfigError, LoadOptions, LoadedModel};
pub use error::CliError;
pub use exit_codes::ExitCode;
pub use output::{OutputFormat, RenderText};
