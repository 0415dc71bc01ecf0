//! Model loading for the CLI.
//!
//! Combines path resolution, preset fallback, validation and provenance into a
//! single [`LoadedModel`].

use hmm_config::{
    get_preset, resolve_model_path, validate_model, ModelFile, ModelSnapshot, ModelSource,
    PresetName, ResolvedPath, ValidationError,
};
use hmm_core::{HmmError, HmmParameters};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::exit_codes::ExitCode;

/// Errors that can occur while loading a model or its inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Model file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model: {0}")]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    /// Exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ConfigError::NotFound { .. } | ConfigError::IoError { .. } => ExitCode::IoError,
            ConfigError::Validation(e) => match e {
                ValidationError::IoError(_) => ExitCode::IoError,
                ValidationError::Shape(core) => core_exit_code(core),
                ValidationError::UnknownSymbol { .. } => ExitCode::SymbolError,
                ValidationError::NotStochastic { .. } => ExitCode::NotStochastic,
                _ => ExitCode::ModelError,
            },
        }
    }
}

/// Exit code for a core inference or construction error.
pub fn core_exit_code(err: &HmmError) -> ExitCode {
    match err {
        HmmError::ShapeMismatch { .. } | HmmError::EmptyParameter { .. } => ExitCode::ShapeError,
        HmmError::OutOfRangeSymbol { .. } => ExitCode::SymbolError,
        HmmError::EmptyObservations => ExitCode::ArgsError,
    }
}

/// Options controlling where the model comes from.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit model path (`--model`).
    pub model_path: Option<PathBuf>,
    /// Preset used when no file resolves (`--preset`).
    pub preset: Option<PresetName>,
    /// Enforce stochasticity regardless of the file's setting.
    pub strict: bool,
    /// Skip stochasticity enforcement entirely; `check` reports instead.
    pub lenient: bool,
}

/// A validated model with its parameters and provenance.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: ModelFile,
    pub params: HmmParameters,
    pub snapshot: ModelSnapshot,
}

/// Preset used when nothing else is configured.
pub const DEFAULT_PRESET: PresetName = PresetName::Weather;

/// Load a model following the standard resolution order.
///
/// An explicit `--preset` wins over environment and XDG discovery but not
/// over an explicit `--model`.
pub fn load_model(options: &LoadOptions) -> Result<LoadedModel, ConfigError> {
    let resolved = match (&options.model_path, options.preset) {
        (Some(path), _) => resolve_model_path(Some(path.as_path())),
        (None, Some(_)) => ResolvedPath::default(),
        (None, None) => resolve_model_path(None),
    };

    let (model, snapshot) = match resolved.path {
        Some(ref path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound { path: path.clone() });
            }
            let (model, raw) = ModelFile::from_file_with_raw(path)?;
            let snapshot = ModelSnapshot::new(&model, &resolved, Some(&raw));
            (model, snapshot)
        }
        None => {
            let name = options.preset.unwrap_or(DEFAULT_PRESET);
            let model = get_preset(name);
            let snapshot = ModelSnapshot::for_preset(&model);
            (model, snapshot)
        }
    };

    let params = if options.lenient {
        let mut relaxed = model.clone();
        relaxed.validation.strict = false;
        validate_model(&relaxed, false)?
    } else {
        validate_model(&model, options.strict)?
    };

    info!(
        model = model.display_name(),
        source = %resolved.source,
        num_states = params.num_states(),
        num_symbols = params.num_symbols(),
        hash = snapshot.short_id(),
        "model loaded"
    );
    if resolved.source == ModelSource::BuiltinPreset {
        debug!("no model file found; using built-in preset");
    }

    Ok(LoadedModel {
        model,
        params,
        snapshot,
    })
}

/// Read observation tokens from a file.
///
/// Tokens are separated by whitespace or commas; `#` starts a comment.
pub fn read_observation_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::IoError {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    Ok(split_tokens(&content))
}

/// Split observation text into tokens.
pub fn split_tokens(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| line.split(|c: char| c.is_whitespace() || c == ','))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmm_core::{Dims, ParameterKind};

    #[test]
    fn split_tokens_handles_commas_and_comments() {
        let tokens = split_tokens("walk, shop\n# comment\nclean  walk # trailing\n\n");
        assert_eq!(tokens, vec!["walk", "shop", "clean", "walk"]);
    }

    #[test]
    fn missing_observation_file_is_not_found() {
        let err = read_observation_file(Path::new("/nonexistent/obs.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn explicit_preset_loads() {
        let loaded = load_model(&LoadOptions {
            preset: Some(PresetName::Casino),
            ..LoadOptions::default()
        })
        .unwrap();
        assert_eq!(loaded.model.display_name(), "casino");
        assert_eq!(loaded.params.num_symbols(), 6);
        assert_eq!(loaded.snapshot.source, "builtin preset");
    }

    #[test]
    fn strict_rejects_scenario_preset() {
        let err = load_model(&LoadOptions {
            preset: Some(PresetName::Scenario),
            strict: true,
            ..LoadOptions::default()
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::NotStochastic);

        let loaded = load_model(&LoadOptions {
            preset: Some(PresetName::Scenario),
            strict: true,
            lenient: true,
            ..LoadOptions::default()
        })
        .unwrap();
        assert!(!loaded.params.validate_stochastic().valid);
    }

    #[test]
    fn missing_model_file_is_io_error() {
        let err = load_model(&LoadOptions {
            model_path: Some(PathBuf::from("/nonexistent/hmm/model.json")),
            ..LoadOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert_eq!(err.exit_code(), ExitCode::IoError);
    }

    #[test]
    fn model_file_loads_with_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        std::fs::write(
            &path,
            r#"{"schema_version":"1.0.0","transition":[[1.0]],"emission":[[0.5],[0.5]],"initial":[1.0]}"#,
        )
        .unwrap();

        let loaded = load_model(&LoadOptions {
            model_path: Some(path.clone()),
            preset: Some(PresetName::Casino),
            ..LoadOptions::default()
        })
        .unwrap();
        assert_eq!(loaded.params.num_states(), 1);
        assert_eq!(loaded.snapshot.source, "CLI argument");
        let (_, raw) = ModelFile::from_file_with_raw(&path).unwrap();
        let resolved = resolve_model_path(Some(path.as_path()));
        assert!(loaded
            .snapshot
            .matches(&ModelSnapshot::new(&loaded.model, &resolved, Some(&raw))));
        assert_eq!(
            loaded.snapshot.model_path.as_deref(),
            Some(path.display().to_string().as_str())
        );
    }

    #[test]
    fn exit_codes_for_core_errors() {
        let shape = HmmError::ShapeMismatch {
            parameter: ParameterKind::Transition,
            expected: Dims::matrix(3, 3),
            actual: Dims::matrix(3, 2),
        };
        assert_eq!(core_exit_code(&shape), ExitCode::ShapeError);
        assert_eq!(
            ConfigError::from(ValidationError::from(shape)).exit_code(),
            ExitCode::ShapeError
        );
        assert_eq!(
            core_exit_code(&HmmError::EmptyObservations),
            ExitCode::ArgsError
        );
        assert_eq!(
            ConfigError::from(ValidationError::ParseError("x".into())).exit_code(),
            ExitCode::ModelError
        );
    }
}
