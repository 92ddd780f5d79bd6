//! Application context for dependency injection
//!
//! Built once in `main` and passed down; replaces process-wide state.

use std::sync::Arc;

use crate::application::services::{ListingService, UpdateService};
use crate::config::{Settings, WorkflowVariables};
use crate::infrastructure::pasteboard::{
    CommandClipboardReader, EnvClipboardReader, EnvPasteboardInspector, HelperPasteboardInspector,
};
use crate::infrastructure::releases::GitHubReleases;
use crate::infrastructure::traits::{
    ClipboardReader, CommandRunner, FileSystem, PasteboardInspector, RealCommandRunner,
    RealFileSystem, ReleaseSource,
};
use crate::infrastructure::{InfraError, InfraResult};

/// Everything one invocation needs, wired up.
pub struct AppContext {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,

    /// Pasteboard type enumeration
    pub pasteboard: Arc<dyn PasteboardInspector>,

    /// Clipboard text
    pub clipboard: Arc<dyn ClipboardReader>,

    /// Release feed for update checks
    pub releases: Arc<dyn ReleaseSource>,
}

impl AppContext {
    /// Create a context with real implementations.
    ///
    /// `vars` decides per capability whether the live helper or the value
    /// handed back by Alfred is used.
    pub fn new(settings: Settings, vars: WorkflowVariables) -> InfraResult<Self> {
        let cmd: Arc<dyn CommandRunner> = Arc::new(RealCommandRunner);
        let timeout = settings.helper_timeout();

        let pasteboard: Arc<dyn PasteboardInspector> = match vars.pboard_types {
            Some(value) => Arc::new(EnvPasteboardInspector::new(value)),
            None => Arc::new(HelperPasteboardInspector::new(
                cmd.clone(),
                settings.pasteboard_helper.clone(),
                timeout,
            )),
        };
        let clipboard: Arc<dyn ClipboardReader> = match vars.clipboard {
            Some(value) => Arc::new(EnvClipboardReader::new(value)),
            None => Arc::new(CommandClipboardReader::new(
                cmd.clone(),
                settings.clipboard_command.clone(),
                settings.clipboard_args.clone(),
                timeout,
            )),
        };
        let releases = GitHubReleases::new(settings.update.repo.clone())
            .map_err(|e| InfraError::io("create HTTP client", e))?;

        Ok(Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            cmd,
            pasteboard,
            clipboard,
            Arc::new(releases),
        ))
    }

    /// Create a context with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        pasteboard: Arc<dyn PasteboardInspector>,
        clipboard: Arc<dyn ClipboardReader>,
        releases: Arc<dyn ReleaseSource>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            cmd,
            pasteboard,
            clipboard,
            releases,
        }
    }

    pub fn listing_service(&self) -> ListingService {
        ListingService::new(
            self.fs.clone(),
            self.pasteboard.clone(),
            self.clipboard.clone(),
            self.settings.clone(),
        )
    }

    pub fn update_service(&self) -> UpdateService {
        UpdateService::new(
            self.fs.clone(),
            self.cmd.clone(),
            self.releases.clone(),
            self.settings.clone(),
        )
    }
}
