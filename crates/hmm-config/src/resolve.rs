//! Model file discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG path → built-in preset.

use std::path::{Path, PathBuf};

/// Where a model file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelSource {
    /// Explicitly provided via `--model`.
    CliArgument,

    /// Set via `HMM_INFER_MODEL`.
    Environment,

    /// Found under `HMM_INFER_CONFIG_DIR`.
    ConfigDir,

    /// Found in the XDG config directory.
    XdgConfig,

    /// No file; a built-in preset is used.
    #[default]
    BuiltinPreset,
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::CliArgument => write!(f, "CLI argument"),
            ModelSource::Environment => write!(f, "environment variable"),
            ModelSource::ConfigDir => write!(f, "config dir"),
            ModelSource::XdgConfig => write!(f, "XDG config"),
            ModelSource::BuiltinPreset => write!(f, "builtin preset"),
        }
    }
}

/// Outcome of model path resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Path to the model file, or None when a preset should be used.
    pub path: Option<PathBuf>,
    pub source: ModelSource,
}

/// Environment variable names.
pub const ENV_MODEL_PATH: &str = "HMM_INFER_MODEL";
pub const ENV_CONFIG_DIR: &str = "HMM_INFER_CONFIG_DIR";

/// Standard model file name.
pub const MODEL_FILENAME: &str = "model.json";

/// Application name for XDG directories.
const APP_NAME: &str = "hmm-infer";

/// Resolve the model file path.
///
/// 1. Explicit CLI path
/// 2. `HMM_INFER_MODEL`
/// 3. `HMM_INFER_CONFIG_DIR` + `model.json`
/// 4. XDG config directory (`~/.config/hmm-infer/model.json`)
/// 5. None (built-in preset)
///
/// Explicit paths from steps 1 and 2 are returned even if missing, so the
/// caller reports the I/O error instead of silently falling back.
pub fn resolve_model_path(cli_path: Option<&Path>) -> ResolvedPath {
    resolve_with(
        cli_path,
        |name| std::env::var(name).ok(),
        dirs::config_dir(),
    )
}

/// Resolution with injectable environment and config root.
pub fn resolve_with<F>(
    cli_path: Option<&Path>,
    env: F,
    config_root: Option<PathBuf>,
) -> ResolvedPath
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = cli_path {
        return ResolvedPath {
            path: Some(path.to_path_buf()),
            source: ModelSource::CliArgument,
        };
    }

    if let Some(env_path) = env(ENV_MODEL_PATH).filter(|p| !p.is_empty()) {
        return ResolvedPath {
            path: Some(PathBuf::from(env_path)),
            source: ModelSource::Environment,
        };
    }

    if let Some(config_dir) = env(ENV_CONFIG_DIR).filter(|p| !p.is_empty()) {
        let path = PathBuf::from(config_dir).join(MODEL_FILENAME);
        if path.exists() {
            return ResolvedPath {
                path: Some(path),
                source: ModelSource::ConfigDir,
            };
        }
    }

    if let Some(root) = config_root {
        let path = root.join(APP_NAME).join(MODEL_FILENAME);
        if path.exists() {
            return ResolvedPath {
                path: Some(path),
                source: ModelSource::XdgConfig,
            };
        }
    }

    ResolvedPath::default()
}

/// Get the XDG config directory for hmm-infer.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}
