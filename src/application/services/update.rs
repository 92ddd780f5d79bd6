//! Self-update service
//!
//! Checks the release feed at most once per `update.interval_hours`, in a
//! detached copy of this binary started with `--update`, and remembers the
//! result in the workflow cache so the listing run only reads a small file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::infrastructure::releases::Release;
use crate::infrastructure::traits::{CommandRunner, FileSystem, ReleaseSource};

/// Result of the last update check, persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateState {
    pub checked_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// Parse a release tag or workflow version leniently.
///
/// Accepts a leading `v` and missing minor/patch parts: `v2` is `2.0.0`.
pub fn parse_version(s: &str) -> Option<Version> {
    let s = s.trim();
    let s = s.strip_prefix('v').or_else(|| s.strip_prefix('V')).unwrap_or(s);
    if let Ok(v) = Version::parse(s) {
        return Some(v);
    }
    let (core, rest) = match s.find(|c| c == '-' || c == '+') {
        Some(i) => s.split_at(i),
        None => (s, ""),
    };
    let padded = match core.split('.').count() {
        1 => format!("{core}.0.0{rest}"),
        2 => format!("{core}.0{rest}"),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

/// Checks for, records and installs newer workflow releases.
pub struct UpdateService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    releases: Arc<dyn ReleaseSource>,
    settings: Arc<Settings>,
}

impl UpdateService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        releases: Arc<dyn ReleaseSource>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            fs,
            cmd,
            releases,
            settings,
        }
    }

    /// Last recorded check; a missing or corrupt cache reads as never checked.
    pub fn state(&self) -> Option<UpdateState> {
        let path = self.settings.update_cache_path();
        if !self.fs.exists(&path) {
            return None;
        }
        let content = self.fs.read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("ignoring corrupt update cache {}: {}", path.display(), e);
                None
            }
        }
    }

    /// True if the last check is older than the configured interval.
    pub fn check_due(&self, now: DateTime<Utc>) -> bool {
        match self.state() {
            Some(state) => now - state.checked_at >= self.settings.update.interval(),
            None => true,
        }
    }

    /// True if the last check found a release newer than the installed version.
    pub fn update_available(&self) -> bool {
        let Some(latest) = self
            .state()
            .and_then(|s| s.latest_version)
            .and_then(|v| parse_version(&v))
        else {
            return false;
        };
        match parse_version(&self.settings.version) {
            Some(current) => latest > current,
            None => {
                warn!("cannot parse workflow version {:?}", self.settings.version);
                false
            }
        }
    }

    /// Newest installable release the settings allow.
    fn newest_release<'a>(&self, releases: &'a [Release]) -> Option<(Version, &'a Release)> {
        releases
            .iter()
            .filter(|r| !r.draft)
            .filter(|r| self.settings.update.prereleases || !r.prerelease)
            .filter(|r| r.workflow_asset().is_some())
            .filter_map(|r| parse_version(&r.tag).map(|v| (v, r)))
            .max_by(|(a, _), (b, _)| a.cmp(b))
    }

    /// Query the release feed and record the newest release.
    pub fn check_for_update(&self, now: DateTime<Utc>) -> ApplicationResult<UpdateState> {
        info!("checking for update ...");
        let releases = self
            .releases
            .releases()
            .map_err(|e| ApplicationError::Update {
                message: format!("fetch releases of {}: {}", self.settings.update.repo, e),
            })?;
        debug!("check_for_update: {} release(s)", releases.len());

        let newest = self.newest_release(&releases);
        let state = UpdateState {
            checked_at: now,
            latest_version: newest.as_ref().map(|(v, _)| v.to_string()),
            download_url: newest
                .and_then(|(_, r)| r.workflow_asset())
                .map(|a| a.download_url.clone()),
        };
        self.save_state(&state)?;

        match &state.latest_version {
            Some(v) => info!("latest release: {} (installed: {})", v, self.settings.version),
            None => info!("no installable release found"),
        }
        Ok(state)
    }

    fn save_state(&self, state: &UpdateState) -> ApplicationResult<()> {
        let path = self.settings.update_cache_path();
        let json = serde_json::to_string_pretty(state).map_err(|e| {
            ApplicationError::OperationFailed {
                context: "serialize update state".into(),
                source: Box::new(e),
            }
        })?;
        self.fs
            .ensure_parent(&path)
            .with_path_context("create cache dir", &path)?;
        self.fs
            .write(&path, &json)
            .with_path_context("write update cache", &path)
    }

    /// Whether a background check recorded in the pid file is still running.
    pub fn is_running(&self) -> bool {
        let path = self.settings.update_pid_path();
        if !self.fs.exists(&path) {
            return false;
        }
        let pid = self
            .fs
            .read_to_string(&path)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok());
        match pid {
            Some(pid) if self.cmd.is_alive(pid) => true,
            _ => {
                debug!("removing stale pid file {}", path.display());
                let _ = self.fs.remove_file(&path);
                false
            }
        }
    }

    /// Start `exe --update` detached unless a check is already running.
    ///
    /// Returns whether a job was started.
    pub fn start_background(&self, exe: &Path) -> ApplicationResult<bool> {
        if self.is_running() {
            debug!("update check already running");
            return Ok(false);
        }
        let exe_str = exe.to_string_lossy();
        let pid = self
            .cmd
            .spawn_detached(&exe_str, &["--update"])
            .with_path_context("start background update check", exe)?;

        let pid_path = self.settings.update_pid_path();
        self.fs
            .ensure_parent(&pid_path)
            .with_path_context("create cache dir", &pid_path)?;
        self.fs
            .write(&pid_path, &pid.to_string())
            .with_path_context("write pid file", &pid_path)?;
        info!("started background update check (pid {})", pid);
        Ok(true)
    }

    /// Download the recorded release and hand it to Alfred via `open`.
    pub fn install(&self) -> ApplicationResult<PathBuf> {
        if !self.update_available() {
            return Err(ApplicationError::Update {
                message: "no update available".into(),
            });
        }
        let url = self
            .state()
            .and_then(|s| s.download_url)
            .ok_or_else(|| ApplicationError::Update {
                message: "no download URL recorded".into(),
            })?;

        let file_name = url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("update.alfredworkflow");
        let dest = self.settings.cache_dir.join(file_name);
        self.fs
            .ensure_parent(&dest)
            .with_path_context("create cache dir", &dest)?;

        info!("downloading {} ...", url);
        self.releases
            .download(&url, &dest)
            .map_err(|e| ApplicationError::Update {
                message: format!("download {}: {}", url, e),
            })?;

        let dest_str = dest.to_string_lossy();
        let output = self
            .cmd
            .run("open", &[dest_str.as_ref()])
            .with_path_context("open workflow", &dest)?;
        if !output.status.success() {
            return Err(ApplicationError::Update {
                message: format!(
                    "open {}: {}",
                    dest.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", "1.2.3")]
    #[case("v1.2.3", "1.2.3")]
    #[case("v2", "2.0.0")]
    #[case("1.4", "1.4.0")]
    #[case("1.4-beta.1", "1.4.0-beta.1")]
    fn given_version_string_when_parsing_then_normalized(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parse_version(input), Some(Version::parse(expected).unwrap()));
    }

    #[rstest]
    #[case("")]
    #[case("latest")]
    #[case("1.2.3.4")]
    fn given_invalid_version_when_parsing_then_none(#[case] input: &str) {
        assert_eq!(parse_version(input), None);
    }
}
