//! TOML configuration for Tether.
//!
//! Every section and field is optional. Missing values take the defaults of
//! [`DispatchSettings`]; invalid ones are logged and replaced by them.

use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;
use tether_tools::{DispatchSettings, WorkspaceRoot};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "TETHER_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct TetherConfig {
    pub workspace: Option<WorkspaceConfig>,
    pub policy: Option<PolicyConfig>,
    pub limits: Option<LimitsConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkspaceConfig {
    /// Absolute workspace root in the sandbox. Supports `${VAR}` expansion.
    pub root: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PolicyConfig {
    /// Mutating tool calls accepted per agent turn. Default: 20.
    pub max_mutating_calls_per_turn: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitsConfig {
    /// Default: 50000.
    pub max_read_chars: Option<usize>,
    /// Default: 262144.
    pub max_tool_args_bytes: Option<usize>,
    /// Default: 16. Zero disables `undo_edit`.
    pub max_undo_depth: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Expand `${VAR}` references from the environment. Unset variables expand to
/// the empty string; an unclosed `${` is kept verbatim.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + len];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + len + 1..];
    }
    out.push_str(rest);
    out
}

/// `$TETHER_CONFIG` if set, otherwise `<config_dir>/tether/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("tether").join("config.toml"))
}

impl TetherConfig {
    /// Load from [`config_path`]. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %path.display(), "Failed to read config: {err}");
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!(path = %path.display(), "Failed to parse config: {err}");
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// Dispatcher settings with defaults filled in.
    #[must_use]
    pub fn dispatch_settings(&self) -> DispatchSettings {
        let mut settings = DispatchSettings::default();

        if let Some(root) = self.workspace.as_ref().and_then(|w| w.root.as_deref()) {
            let expanded = expand_env_vars(root);
            match WorkspaceRoot::new(&expanded) {
                Ok(root) => settings.workspace_root = root,
                Err(err) => tracing::warn!(
                    root = %expanded,
                    fallback = %settings.workspace_root,
                    "Invalid workspace.root, using default: {err}"
                ),
            }
        }

        if let Some(max) = self
            .policy
            .as_ref()
            .and_then(|p| p.max_mutating_calls_per_turn)
        {
            settings.max_mutating_calls_per_turn = max;
        }

        if let Some(limits) = &self.limits {
            if let Some(chars) = positive("limits.max_read_chars", limits.max_read_chars) {
                settings.max_read_chars = chars;
            }
            if let Some(bytes) = positive("limits.max_tool_args_bytes", limits.max_tool_args_bytes)
            {
                settings.max_tool_args_bytes = bytes;
            }
            if let Some(depth) = limits.max_undo_depth {
                settings.max_undo_depth = depth;
            }
        }
        settings
    }
}

fn positive(key: &str, value: Option<usize>) -> Option<usize> {
    match value {
        Some(0) => {
            tracing::warn!(key, "Config limit must be positive, using default");
            None
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> TetherConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn expand_env_vars_no_vars() {
        assert_eq!(expand_env_vars("hello world"), "hello world");
    }

    #[test]
    fn expand_env_vars_single_var() {
        unsafe {
            std::env::set_var("TETHER_TEST_ROOT_VAR", "replaced");
        }
        assert_eq!(
            expand_env_vars("prefix ${TETHER_TEST_ROOT_VAR} suffix"),
            "prefix replaced suffix"
        );
        unsafe {
            std::env::remove_var("TETHER_TEST_ROOT_VAR");
        }
    }

    #[test]
    fn expand_env_vars_missing_var_becomes_empty() {
        unsafe {
            std::env::remove_var("TETHER_MISSING_VAR_FOR_TEST");
        }
        assert_eq!(
            expand_env_vars("before ${TETHER_MISSING_VAR_FOR_TEST} after"),
            "before  after"
        );
    }

    #[test]
    fn expand_env_vars_unclosed_brace_preserved() {
        assert_eq!(expand_env_vars("test ${UNCLOSED"), "test ${UNCLOSED");
        assert_eq!(expand_env_vars("test ${} more"), "test  more");
    }

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(parse("").dispatch_settings(), DispatchSettings::default());
    }

    #[test]
    fn sections_override_defaults() {
        let settings = parse(
            r#"
            [workspace]
            root = "/srv/project"

            [policy]
            max_mutating_calls_per_turn = 5

            [limits]
            max_read_chars = 1000
            max_tool_args_bytes = 2048
            max_undo_depth = 0
            "#,
        )
        .dispatch_settings();
        assert_eq!(settings.workspace_root.path(), Path::new("/srv/project"));
        assert_eq!(settings.max_mutating_calls_per_turn, 5);
        assert_eq!(settings.max_read_chars, 1000);
        assert_eq!(settings.max_tool_args_bytes, 2048);
        assert_eq!(settings.max_undo_depth, 0);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let settings = parse(
            r#"
            [workspace]
            root = "relative/path"

            [limits]
            max_read_chars = 0
            "#,
        )
        .dispatch_settings();
        let defaults = DispatchSettings::default();
        assert_eq!(settings.workspace_root, defaults.workspace_root);
        assert_eq!(settings.max_read_chars, defaults.max_read_chars);
    }

    #[test]
    fn root_supports_env_expansion() {
        unsafe {
            std::env::set_var("TETHER_TEST_WORKSPACE", "/data/ws");
        }
        let settings = parse("[workspace]\nroot = \"${TETHER_TEST_WORKSPACE}/app\"\n")
            .dispatch_settings();
        assert_eq!(settings.workspace_root.path(), Path::new("/data/ws/app"));
        unsafe {
            std::env::remove_var("TETHER_TEST_WORKSPACE");
        }
    }

    #[test]
    fn load_from_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(
            TetherConfig::load_from(&dir.path().join("config.toml"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn load_from_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[policy\nmax = ").unwrap();
        let err = TetherConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn load_from_reads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[policy]\nmax_mutating_calls_per_turn = 3\n").unwrap();
        let config = TetherConfig::load_from(&path).unwrap().unwrap();
        assert_eq!(config.dispatch_settings().max_mutating_calls_per_turn, 3);
    }
}
