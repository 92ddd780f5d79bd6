//! Alfred Script Filter feedback
//!
//! The JSON document Alfred reads from a script filter's stdout: a list of
//! result items plus workflow variables passed on to the next run and to
//! downstream actions.

use std::collections::BTreeMap;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;

use crate::application::services::Listing;
use crate::config::{CLIPBOARD_VAR, PBOARD_TYPES_VAR};
use crate::domain::Service;
use crate::infrastructure::pasteboard::TYPES_SEPARATOR;

pub const ICON_ERROR: &str = "icons/error.png";
pub const ICON_WARNING: &str = "icons/warning.png";
pub const ICON_UPDATE_AVAILABLE: &str = "icons/update-available.png";

/// Autocomplete value of the "Update Available" item.
pub const MAGIC_UPDATE: &str = "workflow:update";
/// Query opening the issue tracker.
pub const MAGIC_HELP: &str = "workflow:help";

/// How Alfred interprets `Icon::path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IconKind {
    /// Use the icon of the file at `path`
    #[serde(rename = "fileicon")]
    FileIcon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icon {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<IconKind>,
    pub path: String,
}

impl Icon {
    /// Image file shipped with the workflow.
    pub fn image(path: impl Into<String>) -> Self {
        Self {
            kind: None,
            path: path.into(),
        }
    }

    /// Icon of an arbitrary file, e.g. an application bundle.
    pub fn file_icon(path: impl Into<String>) -> Self {
        Self {
            kind: Some(IconKind::FileIcon),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemText {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largetype: Option<String>,
}

/// Alternate action shown while a modifier key is held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Modifier {
    pub subtitle: String,
    pub arg: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

/// One row in Alfred's result list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Item {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<ItemText>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub mods: BTreeMap<String, Modifier>,
}

impl Item {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arg = Some(arg.into());
        self
    }

    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn autocomplete(mut self, autocomplete: impl Into<String>) -> Self {
        self.autocomplete = Some(autocomplete.into());
        self
    }

    pub fn valid(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    pub fn icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn largetype(mut self, text: impl Into<String>) -> Self {
        self.text = Some(ItemText {
            largetype: Some(text.into()),
        });
        self
    }

    /// Action for ⌘-Return.
    pub fn cmd_modifier(mut self, modifier: Modifier) -> Self {
        self.mods.insert("cmd".into(), modifier);
        self
    }
}

/// Result item for a service: runs it on Return, reveals its app on ⌘-Return.
pub fn service_item(service: &Service, clipboard: &str) -> Item {
    let mut reveal = BTreeMap::new();
    reveal.insert("reveal".to_string(), "true".to_string());

    Item::new(service.title())
        .subtitle(&service.app_name)
        .arg(&service.name)
        .uid(service.uid())
        .valid(true)
        .largetype(clipboard)
        .icon(Icon::file_icon(&service.app_path))
        .cmd_modifier(Modifier {
            subtitle: format!("Reveal {}", service.app_path),
            arg: service.app_path.clone(),
            valid: true,
            variables: reveal,
        })
}

/// Script filter output document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub items: Vec<Item>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    /// Omit UIDs so Alfred does not reorder items by past usage
    #[serde(skip)]
    pub suppress_uids: bool,
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace all items with a single warning. Variables are kept.
    pub fn warn(&mut self, title: &str, subtitle: &str) {
        self.items.clear();
        self.push(
            Item::new(title)
                .subtitle(subtitle)
                .icon(Icon::image(ICON_WARNING)),
        );
    }

    /// Warn only if there is nothing else to show.
    pub fn warn_empty(&mut self, title: &str, subtitle: &str) {
        if self.items.is_empty() {
            self.warn(title, subtitle);
        }
    }

    /// Feedback consisting of one error item.
    pub fn error(title: &str, subtitle: &str) -> Self {
        let mut feedback = Self::new();
        feedback.push(
            Item::new(title)
                .subtitle(subtitle)
                .icon(Icon::image(ICON_ERROR)),
        );
        feedback
    }

    /// Keep items whose title fuzzy-matches `query`, best match first.
    ///
    /// Matching ignores case. Equal scores keep their previous order.
    pub fn filter(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        let matcher = SkimMatcherV2::default().ignore_case();
        let mut scored: Vec<(i64, Item)> = std::mem::take(&mut self.items)
            .into_iter()
            .filter_map(|item| {
                matcher
                    .fuzzy_match(&item.title, query)
                    .map(|score| (score, item))
            })
            .collect();
        scored.sort_by(|(a, _), (b, _)| b.cmp(a));
        self.items = scored.into_iter().map(|(_, item)| item).collect();
    }

    /// Serialize for Alfred.
    pub fn to_json(&self) -> serde_json::Result<String> {
        if self.suppress_uids {
            let mut stripped = self.clone();
            for item in &mut stripped.items {
                item.uid = None;
            }
            return serde_json::to_string(&stripped);
        }
        serde_json::to_string(self)
    }
}

/// Item prompting the user to install a newer release.
pub fn update_available_item() -> Item {
    Item::new("Update Available")
        .subtitle("⇥ or ↩ to update workflow")
        .autocomplete(MAGIC_UPDATE)
        .valid(false)
        .icon(Icon::image(ICON_UPDATE_AVAILABLE))
}

/// Turn a listing into the feedback shown for `query`.
pub fn render_listing(listing: &Listing, query: &str, update_available: bool) -> Feedback {
    let mut feedback = Feedback::new();
    let query = query.trim();

    if query.is_empty() && update_available {
        feedback.suppress_uids = true;
        feedback.push(update_available_item());
    }

    match listing {
        Listing::NoPasteboardData => {
            feedback.warn("No Data on Pasteboard", "");
            return feedback;
        }
        Listing::NoMatchingServices {
            pasteboard_types, ..
        } => {
            feedback.set_var(PBOARD_TYPES_VAR, join_types(pasteboard_types));
            feedback.warn(
                "No Matching Services",
                "No services support the current data",
            );
            return feedback;
        }
        Listing::Services {
            services,
            pasteboard_types,
            clipboard,
        } => {
            feedback.set_var(PBOARD_TYPES_VAR, join_types(pasteboard_types));
            feedback.set_var(CLIPBOARD_VAR, clipboard.as_str());
            for service in services {
                feedback.push(service_item(service, clipboard));
            }
        }
    }

    feedback.filter(query);
    feedback.warn_empty("No Matching Services", "Try a different query?");
    feedback
}

fn join_types(types: &[String]) -> String {
    types.join(&TYPES_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(titles: &[&str]) -> Feedback {
        let mut feedback = Feedback::new();
        for t in titles {
            feedback.push(Item::new(*t).uid(*t).valid(true));
        }
        feedback
    }

    #[test]
    fn given_query_when_filtering_then_keeps_fuzzy_matches_case_insensitively() {
        let mut feedback = titled(&["Add to Reminders", "Open in Preview", "Make New Sticky Note"]);
        feedback.filter("PREV");
        let titles: Vec<&str> = feedback.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Open in Preview"]);
    }

    #[test]
    fn given_blank_query_when_filtering_then_unchanged() {
        let mut feedback = titled(&["b", "a"]);
        feedback.filter("  ");
        assert_eq!(feedback.items.len(), 2);
        assert_eq!(feedback.items[0].title, "b");
    }

    #[test]
    fn given_items_when_warn_then_replaced_by_single_invalid_item() {
        let mut feedback = titled(&["one", "two"]);
        feedback.set_var("KEEP", "me");
        feedback.warn("No Matching Services", "Try a different query?");
        assert_eq!(feedback.items.len(), 1);
        assert!(!feedback.items[0].valid);
        assert_eq!(feedback.items[0].icon, Some(Icon::image(ICON_WARNING)));
        assert_eq!(feedback.variables.get("KEEP").map(String::as_str), Some("me"));
    }

    #[test]
    fn given_suppressed_uids_when_serializing_then_uid_omitted() {
        let mut feedback = titled(&["one"]);
        feedback.suppress_uids = true;
        let json: serde_json::Value = serde_json::from_str(&feedback.to_json().unwrap()).unwrap();
        assert!(json["items"][0].get("uid").is_none());

        feedback.suppress_uids = false;
        let json: serde_json::Value = serde_json::from_str(&feedback.to_json().unwrap()).unwrap();
        assert_eq!(json["items"][0]["uid"], "one");
    }

    #[test]
    fn given_file_icon_when_serializing_then_has_type() {
        let json = serde_json::to_value(Icon::file_icon("/Applications/Notes.app")).unwrap();
        assert_eq!(json["type"], "fileicon");
        assert_eq!(json["path"], "/Applications/Notes.app");
        let json = serde_json::to_value(Icon::image(ICON_ERROR)).unwrap();
        assert!(json.get("type").is_none());
    }
}
