//! Domain entities: core data structures

use std::collections::HashSet;

/// Raw name Safari registers for its web search service.
pub const WEB_SEARCH_SERVICE: &str = "Search With %WebSearchProvider@";

/// Safari's web search service, as shown to the user.
const WEB_SEARCH_TITLE: &str = "Search Web";

/// A macOS Services menu entry registered by an application.
///
/// Identity is the pair (`app_path`, `name`): the same service name under two
/// different applications yields two distinct services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Raw menu item name, as registered and as passed to `NSPerformService`
    pub name: String,
    /// Pasteboard types the service accepts as input
    pub supported_types: Vec<String>,
    /// Name of the owning application (may be empty)
    pub app_name: String,
    /// Path of the owning application bundle
    pub app_path: String,
    /// Whether the user switched the service off in every presentation mode
    pub disabled: bool,
}

impl Service {
    /// Display title. Only rewrites names that are unreadable as registered.
    pub fn title(&self) -> &str {
        if self.name == WEB_SEARCH_SERVICE {
            WEB_SEARCH_TITLE
        } else {
            &self.name
        }
    }

    /// Stable unique identifier for Alfred's knowledge store.
    pub fn uid(&self) -> String {
        format!("{} - {}", self.app_path, self.name)
    }

    /// True if any supported type is among `types`.
    pub fn supports(&self, types: &HashSet<&str>) -> bool {
        self.supported_types
            .iter()
            .any(|t| types.contains(t.as_str()))
    }
}

/// UI surfaces through which a service can be switched on or off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentationModes {
    pub context_menu: bool,
    pub services_menu: bool,
    pub touch_bar: bool,
}

impl PresentationModes {
    /// A service is disabled when it is hidden from every surface.
    pub fn is_disabled(&self) -> bool {
        !self.context_menu && !self.services_menu && !self.touch_bar
    }
}

/// Expand environment variables in a path string.
///
/// Supports:
/// - `$VAR` syntax
/// - `${VAR}` syntax
/// - `~` for home directory
///
/// Uses shellexpand crate for robust expansion.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
