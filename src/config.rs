//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults (Alfred's `alfred_workflow_*` variables feed some of them)
//! 2. Global config: `$XDG_CONFIG_HOME/alfred-services/config.toml`
//! 3. Environment variables: `ALFRED_SERVICES__*` prefix

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;

/// Services cache maintained by `pbs`.
pub const DEFAULT_SERVICES_CACHE: &str = "${HOME}/Library/Caches/com.apple.nsservicescache.plist";
/// Presentation-mode (enabled/disabled) state of services.
pub const DEFAULT_STATUS_CACHE: &str = "${HOME}/Library/Preferences/pbs.plist";

/// Workflow variable carrying pre-computed pasteboard types.
pub const PBOARD_TYPES_VAR: &str = "PBOARD_TYPES";
/// Workflow variable carrying pre-computed clipboard text.
pub const CLIPBOARD_VAR: &str = "CLIPBOARD";

const ENV_PREFIX: &str = "ALFRED_SERVICES";
const APP_NAME: &str = "alfred-services";

/// Self-update settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UpdateConfig {
    /// GitHub repository publishing releases (`owner/name`)
    pub repo: String,
    /// Hours between background checks
    pub interval_hours: u64,
    /// Whether pre-releases count as updates
    pub prereleases: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            repo: "deanishe/alfred-services".into(),
            interval_hours: 24,
            prereleases: false,
        }
    }
}

impl UpdateConfig {
    /// Saturates at `TimeDelta::MAX`, which effectively disables the check.
    pub fn interval(&self) -> TimeDelta {
        i64::try_from(self.interval_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .unwrap_or(TimeDelta::MAX)
    }

    fn apply(&self, raw: &RawUpdateConfig) -> Self {
        Self {
            repo: raw.repo.clone().unwrap_or_else(|| self.repo.clone()),
            interval_hours: raw.interval_hours.unwrap_or(self.interval_hours),
            prereleases: raw.prereleases.unwrap_or(self.prereleases),
        }
    }
}

/// Raw update config for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawUpdateConfig {
    pub repo: Option<String>,
    pub interval_hours: Option<u64>,
    pub prereleases: Option<bool>,
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub services_cache: Option<PathBuf>,
    pub status_cache: Option<PathBuf>,
    pub track_disabled: Option<bool>,
    pub pasteboard_helper: Option<PathBuf>,
    pub clipboard_command: Option<String>,
    pub clipboard_args: Option<Vec<String>>,
    pub helper_timeout_secs: Option<u64>,
    pub help_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub version: Option<String>,
    #[serde(default)]
    pub update: RawUpdateConfig,
}

/// Unified configuration for alfred-services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Property list describing installed services
    pub services_cache: PathBuf,
    /// Property list with per-service presentation modes
    pub status_cache: PathBuf,
    /// Read `status_cache` and hide disabled services
    pub track_disabled: bool,
    /// Executable printing the pasteboard types as a JSON array
    pub pasteboard_helper: PathBuf,
    /// Command printing the clipboard as plain text
    pub clipboard_command: String,
    pub clipboard_args: Vec<String>,
    /// Upper bound for a helper run
    pub helper_timeout_secs: u64,
    /// Opened by the `workflow:help` query
    pub help_url: String,
    /// Workflow cache directory (update state)
    pub cache_dir: PathBuf,
    /// Installed workflow version
    pub version: String,
    pub update: UpdateConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Alfred exports these to every script filter run
        let cache_dir = std::env::var("alfred_workflow_cache")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(dirs_default_cache_dir);
        let version = std::env::var("alfred_workflow_version")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        Self {
            services_cache: PathBuf::from(DEFAULT_SERVICES_CACHE),
            status_cache: PathBuf::from(DEFAULT_STATUS_CACHE),
            track_disabled: true,
            pasteboard_helper: PathBuf::from("./PasteboardTypes.js"),
            clipboard_command: "/usr/bin/pbpaste".into(),
            clipboard_args: vec!["-Prefer".into(), "txt".into()],
            helper_timeout_secs: 5,
            help_url: "https://github.com/deanishe/alfred-services/issues".into(),
            cache_dir,
            version,
            update: UpdateConfig::default(),
        }
    }
}

/// Get the default cache directory outside Alfred.
fn dirs_default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
}

/// Get the XDG config directory for alfred-services.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    pub fn helper_timeout(&self) -> Duration {
        Duration::from_secs(self.helper_timeout_secs)
    }

    /// Status cache to consult, if disablement tracking is on.
    pub fn status_cache_path(&self) -> Option<&Path> {
        self.track_disabled.then_some(self.status_cache.as_path())
    }

    /// Cache file recording the last update check.
    pub fn update_cache_path(&self) -> PathBuf {
        self.cache_dir.join("update.json")
    }

    /// Pid file of the background update check.
    pub fn update_pid_path(&self) -> PathBuf {
        self.cache_dir.join("update.pid")
    }

    /// Expand shell variables and tilde in path-like fields.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        for path in [
            &mut self.services_cache,
            &mut self.status_cache,
            &mut self.pasteboard_helper,
            &mut self.cache_dir,
        ] {
            let expanded = expand_env_vars(path.to_string_lossy().as_ref());
            *path = PathBuf::from(expanded);
        }
        self.clipboard_command = expand_env_vars(&self.clipboard_command);
    }

    /// Scalars from `raw` win if specified; lists are replaced, not merged.
    fn merge_with(&self, raw: &RawSettings) -> Self {
        Self {
            services_cache: raw
                .services_cache
                .clone()
                .unwrap_or_else(|| self.services_cache.clone()),
            status_cache: raw
                .status_cache
                .clone()
                .unwrap_or_else(|| self.status_cache.clone()),
            track_disabled: raw.track_disabled.unwrap_or(self.track_disabled),
            pasteboard_helper: raw
                .pasteboard_helper
                .clone()
                .unwrap_or_else(|| self.pasteboard_helper.clone()),
            clipboard_command: raw
                .clipboard_command
                .clone()
                .unwrap_or_else(|| self.clipboard_command.clone()),
            clipboard_args: raw
                .clipboard_args
                .clone()
                .unwrap_or_else(|| self.clipboard_args.clone()),
            helper_timeout_secs: raw.helper_timeout_secs.unwrap_or(self.helper_timeout_secs),
            help_url: raw.help_url.clone().unwrap_or_else(|| self.help_url.clone()),
            cache_dir: raw.cache_dir.clone().unwrap_or_else(|| self.cache_dir.clone()),
            version: raw.version.clone().unwrap_or_else(|| self.version.clone()),
            update: self.update.apply(&raw.update),
        }
    }

    /// Load settings with layered precedence, using the XDG global config.
    pub fn load() -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        Self::load_from(global.as_deref())
    }

    /// Load settings with an explicit config file.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. `config_file`, if given
    /// 3. Environment variables: `ALFRED_SERVICES__*` prefix
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;

        // Expand ~ and $VAR in path-like fields
        current.expand_paths();

        Ok(current)
    }

    /// Apply `ALFRED_SERVICES__*` environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("clipboard_args")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        let raw = RawSettings {
            services_cache: config.get_string("services_cache").ok().map(PathBuf::from),
            status_cache: config.get_string("status_cache").ok().map(PathBuf::from),
            track_disabled: config.get_bool("track_disabled").ok(),
            pasteboard_helper: config.get_string("pasteboard_helper").ok().map(PathBuf::from),
            clipboard_command: config.get_string("clipboard_command").ok(),
            clipboard_args: config.get::<Vec<String>>("clipboard_args").ok(),
            helper_timeout_secs: config
                .get_int("helper_timeout_secs")
                .ok()
                .and_then(|v| u64::try_from(v).ok()),
            help_url: config.get_string("help_url").ok(),
            cache_dir: config.get_string("cache_dir").ok().map(PathBuf::from),
            version: config.get_string("version").ok(),
            update: RawUpdateConfig {
                repo: config.get_string("update.repo").ok(),
                interval_hours: config
                    .get_int("update.interval_hours")
                    .ok()
                    .and_then(|v| u64::try_from(v).ok()),
                prereleases: config.get_bool("update.prereleases").ok(),
            },
        };

        Ok(settings.merge_with(&raw))
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# alfred-services configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/alfred-services/config.toml
#   Env:    ALFRED_SERVICES__* environment variables (e.g. ALFRED_SERVICES__UPDATE__REPO)

# Installed services, maintained by macOS
# services_cache = "${HOME}/Library/Caches/com.apple.nsservicescache.plist"

# Enabled/disabled state of services
# status_cache = "${HOME}/Library/Preferences/pbs.plist"
# track_disabled = true

# Helper printing the pasteboard types as a JSON array
# pasteboard_helper = "./PasteboardTypes.js"

# Command printing the clipboard as text
# clipboard_command = "/usr/bin/pbpaste"
# clipboard_args = ["-Prefer", "txt"]

# Seconds before a helper is killed
# helper_timeout_secs = 5

[update]
# repo = "deanishe/alfred-services"
# interval_hours = 24
# prereleases = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Values Alfred hands back from a previous run of the workflow.
///
/// When set they replace the live pasteboard queries entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowVariables {
    pub pboard_types: Option<String>,
    pub clipboard: Option<String>,
}

impl WorkflowVariables {
    /// Read `PBOARD_TYPES` and `CLIPBOARD`; empty values count as unset.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|s| !s.is_empty());
        Self {
            pboard_types: non_empty(PBOARD_TYPES_VAR),
            clipboard: non_empty(CLIPBOARD_VAR),
        }
    }
}
