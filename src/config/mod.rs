use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::resolver::{RawStylePolicy, ResolveOptions};

const APP_DIR: &str = "themeforge";
const APP_CONFIG_FILE: &str = "config.json";

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    MissingHomeDirectory,
    #[error("failed to read engine config: {path}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse engine config: {path}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Engine settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    pub raw_style_tokens: RawStylePolicy,
    pub cache_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_filter: None,
            raw_style_tokens: RawStylePolicy::Passthrough,
            cache_enabled: true,
        }
    }
}

impl EngineConfig {
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            raw_style_tokens: self.raw_style_tokens,
        }
    }
}

/// Reads `$XDG_CONFIG_HOME/themeforge/config.json`. Any failure is logged and
/// yields the defaults.
pub fn load_engine_config() -> EngineConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_engine_config_with(xdg_config_home.as_deref(), home.as_deref())
}

pub(crate) fn load_engine_config_with(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> EngineConfig {
    match read_engine_config(xdg_config_home, home) {
        Ok(Some(config)) => config,
        Ok(None) => EngineConfig::default(),
        Err(ConfigError::MissingHomeDirectory) => {
            tracing::debug!("no config directory; using default engine settings");
            EngineConfig::default()
        }
        Err(err) => {
            tracing::warn!(%err, "using default engine settings");
            EngineConfig::default()
        }
    }
}

/// `Ok(None)` when no config file exists.
pub(crate) fn read_engine_config(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> ConfigResult<Option<EngineConfig>> {
    let path = engine_config_path(xdg_config_home, home)?;
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse { path, source })
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn engine_config_path(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> ConfigResult<PathBuf> {
    let root = match xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        Some(xdg) => xdg.to_path_buf(),
        None => home.ok_or(ConfigError::MissingHomeDirectory)?.join(".config"),
    };
    Ok(root.join(APP_DIR).join(APP_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_root() -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let pid = std::process::id();
        path.push(format!("themeforge-config-{pid}-{nanos}"));
        path
    }

    fn with_temp_root<F: FnOnce(&Path)>(f: F) {
        let root = fixture_root();
        fs::create_dir_all(&root).unwrap();
        f(&root);
        let _ = fs::remove_dir_all(&root);
    }

    fn write_config(root: &Path, contents: &str) {
        let dir = root.join(APP_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(APP_CONFIG_FILE), contents).unwrap();
    }

    #[test]
    fn config_path_prefers_xdg_config_home() {
        let path = engine_config_path(Some(Path::new("/tmp/config-root")), Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/themeforge/config.json"));
    }

    #[test]
    fn config_path_falls_back_to_home_dot_config() {
        let path = engine_config_path(Some(Path::new("")), Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/themeforge/config.json"));
    }

    #[test]
    fn missing_home_is_reported_and_defaulted() {
        let error = engine_config_path(None, None).unwrap_err();
        assert!(matches!(error, ConfigError::MissingHomeDirectory));
        assert_eq!(load_engine_config_with(None, None), EngineConfig::default());
    }

    #[test]
    fn missing_file_yields_defaults() {
        with_temp_root(|root| {
            assert!(read_engine_config(Some(root), None).unwrap().is_none());
            let config = load_engine_config_with(Some(root), None);
            assert_eq!(config, EngineConfig::default());
            assert!(config.cache_enabled);
        });
    }

    #[test]
    fn reads_settings_from_file() {
        with_temp_root(|root| {
            write_config(
                root,
                r#"{ "log_filter": "themeforge=debug", "raw_style_tokens": "substitute", "cache_enabled": false }"#,
            );
            let config = load_engine_config_with(Some(root), None);
            assert_eq!(config.log_filter.as_deref(), Some("themeforge=debug"));
            assert_eq!(config.raw_style_tokens, RawStylePolicy::Substitute);
            assert!(!config.cache_enabled);
            assert_eq!(
                config.resolve_options().raw_style_tokens,
                RawStylePolicy::Substitute
            );
        });
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        with_temp_root(|root| {
            write_config(root, r#"{ "raw_style_tokens": "substitute" }"#);
            let config = load_engine_config_with(Some(root), None);
            assert_eq!(config.raw_style_tokens, RawStylePolicy::Substitute);
            assert!(config.cache_enabled);
        });
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        with_temp_root(|root| {
            write_config(root, r#"{ "raw_style_tokens": "sometimes" "#);
            let err = read_engine_config(Some(root), None).unwrap_err();
            assert!(matches!(err, ConfigError::Parse { ref path, .. } if path.ends_with("themeforge/config.json")));
            assert_eq!(load_engine_config_with(Some(root), None), EngineConfig::default());
        });
    }
}
