//! Configuration loading and persistence.
//!
//! Handles reading and writing the webpush configuration file
//! (`config.json`) and applying `WEBPUSH_*` environment overrides.

// Rust guideline compliant 2026-10

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;
use std::{fs, path::Path, path::PathBuf};

use crate::constants::{DEFAULT_TTL, HTTP_REQUEST_TIMEOUT};
use crate::notifications::push::{DeliveryOptions, Urgency};

/// File name of the configuration inside [`PushConfig::config_dir`].
pub const CONFIG_FILE: &str = "config.json";
/// Default PEM key file name.
pub const DEFAULT_PEM_FILE: &str = "vapid_private.pem";
/// Default JSON key file name.
pub const DEFAULT_JSON_FILE: &str = "vapid.json";

/// Configuration for sending web push messages.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PushConfig {
    /// VAPID `sub` contact (e-mail or `https:` URL).
    pub subscriber: String,
    /// Default message TTL in seconds.
    pub ttl: i64,
    /// Default `Urgency` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    /// Default `Topic` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Deadline for one push request, in seconds.
    pub timeout_secs: u64,
    /// PEM private key path. Relative paths resolve against the config dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pem_path: Option<PathBuf>,
    /// JSON key path. Relative paths resolve against the config dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<PathBuf>,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            subscriber: "example@example.com".to_string(),
            ttl: DEFAULT_TTL,
            urgency: None,
            topic: None,
            timeout_secs: HTTP_REQUEST_TIMEOUT.as_secs(),
            pem_path: None,
            json_path: None,
        }
    }
}

impl PushConfig {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// Directory selection priority:
    /// 1. `WEBPUSH_CONFIG_DIR` env var: explicit override
    /// 2. Default: platform config dir (Linux: `~/.config/webpush`)
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(dir) = std::env::var("WEBPUSH_CONFIG_DIR") {
            PathBuf::from(dir)
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("webpush")
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads configuration from the config dir, with environment overrides.
    ///
    /// A missing or unreadable file falls back to defaults.
    pub fn load() -> Result<Self> {
        let dir = Self::config_dir()?;
        let mut config = Self::load_from(&dir).unwrap_or_else(|e| {
            log::debug!("Using default config: {e:#}");
            Self::default()
        });
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load `config.json` from `dir` without environment overrides.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            anyhow::bail!("Config file not found");
        }
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    /// Apply `WEBPUSH_*` overrides read through `var`.
    ///
    /// Unparseable numeric or urgency values are ignored with a warning.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(subscriber) = var("WEBPUSH_SUBSCRIBER") {
            self.subscriber = subscriber;
        }

        if let Some(ttl) = var("WEBPUSH_TTL") {
            match ttl.parse::<i64>() {
                Ok(ttl) => self.ttl = ttl,
                Err(_) => log::warn!("Ignoring WEBPUSH_TTL={ttl:?}: not an integer"),
            }
        }

        if let Some(urgency) = var("WEBPUSH_URGENCY") {
            match urgency.parse::<Urgency>() {
                Ok(urgency) => self.urgency = Some(urgency),
                Err(e) => log::warn!("Ignoring WEBPUSH_URGENCY: {e}"),
            }
        }

        if let Some(topic) = var("WEBPUSH_TOPIC") {
            self.topic = Some(topic).filter(|t| !t.is_empty());
        }

        if let Some(timeout) = var("WEBPUSH_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => log::warn!("Ignoring WEBPUSH_TIMEOUT_SECS={timeout:?}: not a number"),
            }
        }
    }

    /// Persists the configuration to the config dir.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_dir()?)
    }

    /// Persists the configuration to `dir/config.json`.
    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let config_path = dir.join(CONFIG_FILE);
        fs::write(&config_path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        // Set restrictive permissions (owner read/write only)
        #[cfg(unix)]
        fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }

    /// PEM key path, resolved against `dir`.
    pub fn pem_path(&self, dir: &Path) -> PathBuf {
        resolve(dir, self.pem_path.as_deref(), DEFAULT_PEM_FILE)
    }

    /// JSON key path, resolved against `dir`.
    pub fn json_path(&self, dir: &Path) -> PathBuf {
        resolve(dir, self.json_path.as_deref(), DEFAULT_JSON_FILE)
    }

    /// Request deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delivery options seeded from this configuration.
    pub fn delivery_options(&self) -> DeliveryOptions {
        let mut options = DeliveryOptions::new(self.subscriber.clone()).with_ttl(self.ttl);
        options.urgency = self.urgency;
        options.topic.clone_from(&self.topic);
        options
    }
}

fn resolve(dir: &Path, configured: Option<&Path>, default: &str) -> PathBuf {
    match configured {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => dir.join(path),
        None => dir.join(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = PushConfig::default();
        assert_eq!(config.subscriber, "example@example.com");
        assert_eq!(config.ttl, 30);
        assert_eq!(config.timeout_secs, 10);
        assert!(config.urgency.is_none());
        assert!(config.topic.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().expect("tempdir");
        let config = PushConfig {
            subscriber: "ops@example.com".to_string(),
            ttl: 600,
            urgency: Some(Urgency::Low),
            topic: Some("builds".to_string()),
            ..PushConfig::default()
        };
        config.save_to(dir.path()).expect("save");

        let loaded = PushConfig::load_from(dir.path()).expect("load");
        assert_eq!(loaded, config);

        let json = fs::read_to_string(dir.path().join(CONFIG_FILE)).expect("read");
        assert!(json.contains("\"urgency\": \"low\""));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_config_is_owner_only() {
        let dir = TempDir::new().expect("tempdir");
        PushConfig::default().save_to(dir.path()).expect("save");
        let mode = fs::metadata(dir.path().join(CONFIG_FILE))
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), r#"{"ttl": 120}"#).expect("write");
        let loaded = PushConfig::load_from(dir.path()).expect("load");
        assert_eq!(loaded.ttl, 120);
        assert_eq!(loaded.subscriber, "example@example.com");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        assert!(PushConfig::load_from(dir.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("WEBPUSH_SUBSCRIBER", "https://app.example"),
            ("WEBPUSH_TTL", "3600"),
            ("WEBPUSH_URGENCY", "high"),
            ("WEBPUSH_TOPIC", "alerts"),
            ("WEBPUSH_TIMEOUT_SECS", "3"),
        ]
        .into_iter()
        .collect();

        let mut config = PushConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.subscriber, "https://app.example");
        assert_eq!(config.ttl, 3600);
        assert_eq!(config.urgency, Some(Urgency::High));
        assert_eq!(config.topic.as_deref(), Some("alerts"));
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_env_overrides_are_ignored() {
        let mut config = PushConfig::default();
        config.apply_overrides(|key| match key {
            "WEBPUSH_TTL" => Some("forever".to_string()),
            "WEBPUSH_URGENCY" => Some("asap".to_string()),
            _ => None,
        });
        assert_eq!(config.ttl, DEFAULT_TTL);
        assert!(config.urgency.is_none());
    }

    #[test]
    fn test_key_paths_resolve_against_config_dir() {
        let dir = Path::new("/etc/webpush");
        let mut config = PushConfig::default();
        assert_eq!(config.pem_path(dir), dir.join(DEFAULT_PEM_FILE));
        assert_eq!(config.json_path(dir), dir.join(DEFAULT_JSON_FILE));

        config.pem_path = Some(PathBuf::from("keys/server.pem"));
        config.json_path = Some(PathBuf::from("/var/lib/webpush/keys.json"));
        assert_eq!(config.pem_path(dir), dir.join("keys/server.pem"));
        assert_eq!(
            config.json_path(dir),
            PathBuf::from("/var/lib/webpush/keys.json")
        );
    }

    #[test]
    fn test_delivery_options_from_config() {
        let config = PushConfig {
            urgency: Some(Urgency::VeryLow),
            topic: Some("t".to_string()),
            ttl: 90,
            ..PushConfig::default()
        };
        let options = config.delivery_options();
        assert_eq!(options.subscriber, "example@example.com");
        assert_eq!(options.ttl, 90);
        assert_eq!(options.urgency, Some(Urgency::VeryLow));
        assert_eq!(options.topic.as_deref(), Some("t"));
    }
}
