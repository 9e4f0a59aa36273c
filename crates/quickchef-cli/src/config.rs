//! Configuration file management for quickchef.
//!
//! Provides a TOML-based config file at `~/.config/quickchef/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use quickchef_core::PlannerConfig;
use quickchef_core::generator::gemini::DEFAULT_MODEL;

pub const API_KEY_ENV: &str = "QUICKCHEF_API_KEY";
pub const MODEL_ENV: &str = "QUICKCHEF_MODEL";

const REDACTED: &str = "[redacted]";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub gemini: GeminiSection,
    #[serde(default)]
    pub planner: PlannerConfig,
}

#[derive(Default, Serialize, Deserialize)]
pub struct GeminiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl fmt::Debug for GeminiSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSection")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("model", &self.model)
            .finish()
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the quickchef config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/quickchef` or
/// `~/.config/quickchef`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("quickchef");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("quickchef")
}

/// Return the path to the quickchef config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix, since the file holds an API key.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
pub struct QuickchefConfig {
    pub api_key: String,
    pub model: String,
    pub planner: PlannerConfig,
}

impl fmt::Debug for QuickchefConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuickchefConfig")
            .field("api_key", &REDACTED)
            .field("model", &self.model)
            .field("planner", &self.planner)
            .finish()
    }
}

impl QuickchefConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - API key: `cli_api_key` > `QUICKCHEF_API_KEY` env > `gemini.api_key` > error
    /// - Model: `cli_model` > `QUICKCHEF_MODEL` env > `gemini.model` > `DEFAULT_MODEL`
    /// - Planner: `[planner]` section > defaults
    pub fn resolve(cli_api_key: Option<&str>, cli_model: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();
        let gemini = file_config.as_ref().map(|c| &c.gemini);

        let api_key = if let Some(key) = cli_api_key {
            key.to_string()
        } else if let Some(key) = env_non_empty(API_KEY_ENV) {
            key
        } else if let Some(key) = gemini.and_then(|g| g.api_key.clone()) {
            key
        } else {
            bail!(
                "API key not found; set {API_KEY_ENV}, pass --api-key, or run `quickchef init --api-key <KEY>`"
            );
        };

        let model = cli_model
            .map(str::to_string)
            .or_else(|| env_non_empty(MODEL_ENV))
            .or_else(|| gemini.and_then(|g| g.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let planner = file_config.map(|c| c.planner).unwrap_or_default();

        Ok(Self {
            api_key,
            model,
            planner,
        })
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point XDG_CONFIG_HOME at a temp dir and clear the quickchef env vars.
    /// Returns the temp dir (kept alive by the caller) and the previous XDG value.
    fn isolate() -> (tempfile::TempDir, Option<String>) {
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        unsafe { std::env::remove_var(API_KEY_ENV) };
        unsafe { std::env::remove_var(MODEL_ENV) };
        (tmp, orig_xdg)
    }

    fn restore(orig_xdg: Option<String>) {
        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
        unsafe { std::env::remove_var(API_KEY_ENV) };
        unsafe { std::env::remove_var(MODEL_ENV) };
    }

    fn file_with_key(key: &str) -> ConfigFile {
        ConfigFile {
            gemini: GeminiSection {
                api_key: Some(key.to_string()),
                model: Some("file-model".to_string()),
            },
            planner: PlannerConfig {
                cook_start_hour: 19,
                ..PlannerConfig::default()
            },
        }
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("quickchef").join("config.toml");

        save_config_to(&file_with_key("file-key"), &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.gemini.api_key.as_deref(), Some("file-key"));
        assert_eq!(loaded.gemini.model.as_deref(), Some("file-model"));
        assert_eq!(loaded.planner.cook_start_hour, 19);
        assert_eq!(loaded.planner.generation_timeout_secs, 120);
    }

    #[test]
    fn missing_sections_default() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[gemini]\napi_key = \"k\"\n").unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.gemini.api_key.as_deref(), Some("k"));
        assert!(loaded.gemini.model.is_none());
        assert_eq!(loaded.planner, PlannerConfig::default());
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        save_config_to(&ConfigFile::default(), &path).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        let (_tmp, orig) = isolate();
        save_config(&file_with_key("file-key")).unwrap();
        unsafe { std::env::set_var(API_KEY_ENV, "env-key") };
        unsafe { std::env::set_var(MODEL_ENV, "env-model") };

        let config = QuickchefConfig::resolve(Some("cli-key"), Some("cli-model"));
        restore(orig);

        let config = config.unwrap();
        assert_eq!(config.api_key, "cli-key");
        assert_eq!(config.model, "cli-model");
        assert_eq!(config.planner.cook_start_hour, 19);
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        let (_tmp, orig) = isolate();
        save_config(&file_with_key("file-key")).unwrap();
        unsafe { std::env::set_var(API_KEY_ENV, "env-key") };

        let config = QuickchefConfig::resolve(None, None);
        restore(orig);

        let config = config.unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.model, "file-model");
    }

    #[test]
    fn resolve_falls_back_to_config_file_and_default_model() {
        let _lock = lock_env();
        let (_tmp, orig) = isolate();
        let mut file = file_with_key("file-key");
        file.gemini.model = None;
        save_config(&file).unwrap();

        let config = QuickchefConfig::resolve(None, None);
        restore(orig);

        let config = config.unwrap();
        assert_eq!(config.api_key, "file-key");
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn resolve_errors_when_no_api_key() {
        let _lock = lock_env();
        let (_tmp, orig) = isolate();

        let result = QuickchefConfig::resolve(None, None);
        restore(orig);

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("API key not found"), "unexpected error: {msg}");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = QuickchefConfig {
            api_key: "AIza-very-secret".to_string(),
            model: "gemini-x".to_string(),
            planner: PlannerConfig::default(),
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("AIza-very-secret"), "key leaked: {shown}");
        assert!(shown.contains("gemini-x"));

        let shown = format!("{:?}", file_with_key("AIza-very-secret"));
        assert!(!shown.contains("AIza-very-secret"), "key leaked: {shown}");
        assert!(shown.contains("[redacted]"));
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("quickchef/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
