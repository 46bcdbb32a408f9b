//! Locating and parsing the service configuration file.

use std::path::{Path, PathBuf};

use super::types::BridgeConfig;

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load the service configuration.
///
/// An explicitly given `path` always wins and must exist. Without one,
/// `.sigbridge.toml` in the working directory is tried first, then
/// `sigbridge/config.toml` under the user config directory; if neither
/// exists the built-in defaults apply.
///
/// # Errors
///
/// Returns `ConfigError::Read` if a chosen file cannot be read and
/// `ConfigError::Parse` if its TOML does not describe a `BridgeConfig`.
pub fn load(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    let found = match path {
        Some(explicit) => Some(explicit.to_path_buf()),
        None => candidate_paths().into_iter().find(|p| p.exists()),
    };

    let Some(path) = found else {
        tracing::debug!("No config file found, using defaults");
        return Ok(BridgeConfig::default());
    };
    parse_file(&path)
}

/// Search locations consulted when no explicit path is given, highest
/// priority first.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".sigbridge.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("sigbridge").join("config.toml"));
    }
    paths
}

fn parse_file(path: &Path) -> Result<BridgeConfig, ConfigError> {
    tracing::debug!(path = %path.display(), "Loading config file");
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sigbridge.toml");
        std::fs::write(&path, "tool_name = \"Custom Verifier\"\ntimeout_ms = 5000\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.tool_name, "Custom Verifier");
        assert_eq!(config.timeout_ms, 5000);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let err = load(Some(Path::new("/nonexistent/sigbridge.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_unset_fields_keep_their_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sigbridge.toml");
        std::fs::write(&path, "tool_name = \"Custom Verifier\"\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.tool_name, "Custom Verifier");
        assert_eq!(config.port, 8080);
        assert_eq!(config.timeout_ms, 120_000);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sigbridge.toml");
        std::fs::write(&path, "tool_name = [broken").unwrap();

        let err = load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_working_directory_file_is_searched_first() {
        let paths = candidate_paths();
        assert_eq!(paths[0], PathBuf::from(".sigbridge.toml"));
        // Any further candidates live under the user config directory.
        assert!(paths.iter().skip(1).all(|p| p.ends_with("sigbridge/config.toml")));
    }
}
