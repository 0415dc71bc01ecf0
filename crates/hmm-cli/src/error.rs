//! Top-level CLI error.

use hmm_core::HmmError;
use thiserror::Error;

use crate::config::{core_exit_code, ConfigError};
use crate::exit_codes::ExitCode;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Inference(#[from] HmmError),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Config(e) => e.exit_code(),
            CliError::Inference(e) => core_exit_code(e),
            CliError::Output(_) => ExitCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_errors_map_to_symbol_code() {
        let err = CliError::from(HmmError::OutOfRangeSymbol {
            position: 3,
            symbol: 9,
            num_symbols: 2,
        });
        assert_eq!(err.exit_code(), ExitCode::SymbolError);
        assert!(err.to_string().contains("position 3"));
    }
}
