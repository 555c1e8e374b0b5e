use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

/// Resolved bot settings. The config file provides the base values and
/// environment variables override them field by field.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub channel_ids: Vec<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_sent_file")]
    pub sent_file: PathBuf,
    #[serde(default)]
    pub single_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_ids: Vec::new(),
            poll_interval_secs: default_poll_interval(),
            sent_file: default_sent_file(),
            single_run: false,
        }
    }
}

fn default_poll_interval() -> u64 {
    900
}

fn default_sent_file() -> PathBuf {
    PathBuf::from("sent_games.json")
}

/// Environment values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct EnvOverrides {
    pub bot_token: Option<String>,
    pub channel_ids: Option<String>,
    pub single_run: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            bot_token: std::env::var("BOT_TOKEN").ok(),
            channel_ids: std::env::var("CHANNEL_IDS").ok(),
            single_run: std::env::var("SINGLE_RUN").ok(),
        }
    }
}

impl Config {
    /// Read the config file (if any) and overlay the process
    /// environment. Resolution never fails; missing required fields
    /// are caught at startup where they can be reported properly.
    pub fn resolve(path: &Path) -> Self {
        let mut config = Self::from_file(path);
        config.apply_overrides(EnvOverrides::from_env());
        config
    }

    /// A missing or malformed file yields the default base silently;
    /// the environment may still supply everything that matters.
    fn from_file(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No config file at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Ignoring malformed config file {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    fn apply_overrides(&mut self, env: EnvOverrides) {
        if let Some(token) = env.bot_token {
            self.bot_token = token;
        }
        if let Some(ids) = env.channel_ids {
            self.channel_ids = split_channel_list(&ids);
        }
        if let Some(flag) = env.single_run {
            self.single_run = is_truthy(&flag);
        }
    }
}

/// Comma-separated channel list from the environment: entries are
/// trimmed and empty ones dropped.
fn split_channel_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn file_values_form_the_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            bot_token = "file-token"
            channel_ids = ["@games", "-1001234"]
            poll_interval_secs = 120
            sent_file = "state/sent.json"
            single_run = true
            "#,
        );

        let config = Config::from_file(&path);
        assert_eq!(config.bot_token, "file-token");
        assert_eq!(config.channel_ids, vec!["@games", "-1001234"]);
        assert_eq!(config.poll_interval_secs, 120);
        assert_eq!(config.sent_file, PathBuf::from("state/sent.json"));
        assert!(config.single_run);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::from_file(Path::new("does/not/exist.toml"));
        assert!(config.bot_token.is_empty());
        assert!(config.channel_ids.is_empty());
        assert_eq!(config.poll_interval_secs, 900);
        assert_eq!(config.sent_file, PathBuf::from("sent_games.json"));
        assert!(!config.single_run);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "bot_token = [not, toml");

        let config = Config::from_file(&path);
        assert!(config.bot_token.is_empty());
        assert!(config.channel_ids.is_empty());
    }

    #[test]
    fn env_token_overrides_file_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"bot_token = "A""#);

        let mut config = Config::from_file(&path);
        config.apply_overrides(EnvOverrides {
            bot_token: Some("B".to_string()),
            ..Default::default()
        });

        assert_eq!(config.bot_token, "B");
    }

    #[test]
    fn env_channel_list_is_split_and_cleaned() {
        let mut config = Config {
            channel_ids: vec!["@old".to_string()],
            ..Config::default()
        };

        config.apply_overrides(EnvOverrides {
            channel_ids: Some(" @games , ,-1001234,, @deals ".to_string()),
            ..Default::default()
        });

        assert_eq!(config.channel_ids, vec!["@games", "-1001234", "@deals"]);
    }

    #[test]
    fn fields_override_independently() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            bot_token = "file-token"
            channel_ids = ["@games"]
            "#,
        );

        let mut config = Config::from_file(&path);
        config.apply_overrides(EnvOverrides {
            single_run: Some("true".to_string()),
            ..Default::default()
        });

        assert_eq!(config.bot_token, "file-token");
        assert_eq!(config.channel_ids, vec!["@games"]);
        assert!(config.single_run);
    }

    #[test]
    fn single_run_flag_parsing() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy(" TRUE "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("no"));
        assert!(!is_truthy(""));
    }
}
