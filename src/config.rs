//! Configuration loading and defaults.
//!
//! Configuration is resolved in order of precedence (highest wins):
//!
//! 1. **CLI flags** — `--url`, `--password`
//! 2. **Environment variables** — `MOCKCTL_URL`, `MOCKCTL_PASSWORD`
//! 3. **Config file** — path via `--config <path>`, `MOCKCTL_CONFIG`, or
//!    `mockctl.toml` in CWD
//! 4. **Compiled defaults** — see each field's default value below
//!
//! The TOML file mirrors the struct hierarchy:
//!
//! ```toml
//! [server]
//! url = "http://127.0.0.1:80"
//! password = "secret"          # optional, HTTP Basic
//! connect_timeout_secs = 10
//!
//! [logs]
//! endpoint = "/ws/logs"
//!
//! [logging]
//! level = "warn"
//!
//! [editor]
//! command = "vi"               # $VISUAL / $EDITOR take precedence
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_FILE: &str = "mockctl.toml";

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

/// Where the mock server's control UI listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the control endpoints (default `http://127.0.0.1:80`).
    /// `https://` also switches the log socket to `wss://`.
    #[serde(default = "default_url")]
    pub url: String,
    /// Password for servers started with `-p`. Override with `MOCKCTL_PASSWORD`.
    pub password: Option<String>,
    /// TCP connect timeout in seconds (default 10). Requests themselves have
    /// no timeout.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Log stream settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    /// Socket path on the server (default `/ws/logs`).
    #[serde(default = "default_logs_endpoint")]
    pub endpoint: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter level (default `warn`). Overridden by `RUST_LOG` env var.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// External editor used by the shell's `edit` command.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorConfig {
    pub command: Option<String>,
}

fn default_url() -> String {
    "http://127.0.0.1:80".to_string()
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_logs_endpoint() -> String {
    crate::logs::DEFAULT_ENDPOINT.to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            password: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_logs_endpoint(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub url: Option<String>,
    pub password: Option<String>,
}

impl Config {
    /// Load configuration with the precedence chain: CLI > env > file > defaults.
    pub fn load(overrides: &Overrides) -> Result<Self, String> {
        Self::load_with(overrides, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with an injectable environment lookup.
    pub fn load_with(
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let mut config = if let Some(path) = &overrides.config {
            Self::from_file(&expand_tilde(path))?
        } else if let Some(path) = env("MOCKCTL_CONFIG") {
            Self::from_file(&expand_tilde(&PathBuf::from(path)))?
        } else if Path::new(DEFAULT_FILE).exists() {
            Self::from_file(Path::new(DEFAULT_FILE))?
        } else {
            Config::default()
        };

        // Env var overrides
        if let Some(url) = env("MOCKCTL_URL") {
            config.server.url = url;
        }
        if let Some(password) = env("MOCKCTL_PASSWORD") {
            config.server.password = Some(password);
        }

        // CLI overrides
        if let Some(url) = &overrides.url {
            config.server.url.clone_from(url);
        }
        if let Some(password) = &overrides.password {
            config.server.password = Some(password.clone());
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))
    }

    pub fn validate(&self) -> Result<(), String> {
        let url = &self.server.url;
        if url.is_empty() {
            return Err("server.url is empty".into());
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!(
                "server.url must start with http:// or https://, got '{url}'"
            ));
        }
        if !self.logs.endpoint.starts_with('/') {
            return Err(format!(
                "logs.endpoint must start with '/', got '{}'",
                self.logs.endpoint
            ));
        }
        if self.server.password.as_deref() == Some("") {
            return Err("server.password is empty".into());
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.server.connect_timeout_secs)
    }

    /// `$VISUAL`, then `$EDITOR`, then `[editor] command`, then `vi`.
    pub fn editor_command(&self) -> String {
        std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .ok()
            .filter(|cmd| !cmd.is_empty())
            .or_else(|| self.editor.command.clone())
            .unwrap_or_else(|| "vi".to_string())
    }
}

/// Expand a leading `~` to `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("mockctl-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_without_file_or_env() {
        let overrides = Overrides {
            config: Some(write_temp("empty.toml", "")),
            ..Overrides::default()
        };
        let config = Config::load_with(&overrides, env_of(&[])).unwrap();
        assert_eq!(config.server.url, "http://127.0.0.1:80");
        assert_eq!(config.server.password, None);
        assert_eq!(config.logs.endpoint, "/ws/logs");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn file_values_are_read() {
        let path = write_temp(
            "full.toml",
            r#"
            [server]
            url = "https://mock.internal:8443"
            password = "hunter2"
            connect_timeout_secs = 3

            [logging]
            level = "debug"
            "#,
        );
        let overrides = Overrides {
            config: Some(path),
            ..Overrides::default()
        };
        let config = Config::load_with(&overrides, env_of(&[])).unwrap();
        assert_eq!(config.server.url, "https://mock.internal:8443");
        assert_eq!(config.server.password.as_deref(), Some("hunter2"));
        assert_eq!(config.server.connect_timeout_secs, 3);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logs.endpoint, "/ws/logs");
    }

    #[test]
    fn env_beats_file_and_cli_beats_env() {
        let path = write_temp("prec.toml", "[server]\nurl = \"http://file:1\"\n");
        let env = env_of(&[("MOCKCTL_URL", "http://env:2"), ("MOCKCTL_PASSWORD", "envpw")]);

        let from_env = Config::load_with(
            &Overrides {
                config: Some(path.clone()),
                ..Overrides::default()
            },
            &env,
        )
        .unwrap();
        assert_eq!(from_env.server.url, "http://env:2");
        assert_eq!(from_env.server.password.as_deref(), Some("envpw"));

        let from_cli = Config::load_with(
            &Overrides {
                config: Some(path),
                url: Some("http://cli:3".into()),
                password: None,
            },
            &env,
        )
        .unwrap();
        assert_eq!(from_cli.server.url, "http://cli:3");
        assert_eq!(from_cli.server.password.as_deref(), Some("envpw"));
    }

    #[test]
    fn config_path_from_env() {
        let path = write_temp("envpath.toml", "[logs]\nendpoint = \"/ws/other\"\n");
        let env = env_of(&[("MOCKCTL_CONFIG", path.to_str().unwrap())]);
        let config = Config::load_with(&Overrides::default(), env).unwrap();
        assert_eq!(config.logs.endpoint, "/ws/other");
    }

    #[test]
    fn missing_file_is_an_error() {
        let overrides = Overrides {
            config: Some(PathBuf::from("/nonexistent/mockctl.toml")),
            ..Overrides::default()
        };
        let err = Config::load_with(&overrides, env_of(&[])).unwrap_err();
        assert!(err.starts_with("Failed to read config file"));
    }

    #[test]
    fn bad_scheme_rejected() {
        let mut config = Config::default();
        config.server.url = "ftp://host".into();
        assert!(config.validate().is_err());
        config.server.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn relative_log_endpoint_rejected() {
        let mut config = Config::default();
        config.logs.endpoint = "ws/logs".into();
        assert!(config.validate().is_err());
    }
}
