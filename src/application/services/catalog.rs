//! Service catalog loader
//!
//! Reads the two caches macOS keeps about Services: the services cache
//! (`com.apple.nsservicescache.plist`) describing every registered service,
//! and `pbs.plist` recording which presentation modes each service is shown
//! in. The second is reduced to a set of disabled names before the first is
//! read, then dropped.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{parse_status_key, PresentationModes, Service, ServiceCatalog};
use crate::infrastructure::traits::FileSystem;

// ============================================================
// On-disk layout
// ============================================================

#[derive(Debug, Deserialize, Default)]
struct StatusCache {
    #[serde(rename = "NSServicesStatus", default)]
    services: BTreeMap<String, StatusEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct StatusEntry {
    #[serde(rename = "presentation_modes", default)]
    modes: RawModes,
}

#[derive(Debug, Deserialize, Default)]
struct RawModes {
    #[serde(rename = "ContextMenu", default)]
    context_menu: bool,
    #[serde(rename = "ServicesMenu", default)]
    services_menu: bool,
    #[serde(rename = "TouchBar", default)]
    touch_bar: bool,
}

impl From<&RawModes> for PresentationModes {
    fn from(raw: &RawModes) -> Self {
        Self {
            context_menu: raw.context_menu,
            services_menu: raw.services_menu,
            touch_bar: raw.touch_bar,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ServicesCache {
    #[serde(rename = "ServicesCache", default)]
    apps: BTreeMap<String, AppEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct AppEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    service_dicts: Vec<ServiceDescriptor>,
}

#[derive(Debug, Deserialize, Default)]
struct ServiceDescriptor {
    #[serde(rename = "NSMenuItem", default)]
    menu_item: MenuItem,
    #[serde(rename = "NSSendTypes", default)]
    send_types: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct MenuItem {
    #[serde(default)]
    default: String,
}

// ============================================================
// Parsing
// ============================================================

/// Names of services hidden from every presentation mode.
///
/// Keys that do not split into `<token> - <name> - <token>` are logged and
/// skipped.
pub fn parse_status_cache(data: &[u8]) -> Result<HashSet<String>, plist::Error> {
    let cache: StatusCache = plist::from_bytes(data)?;
    let mut disabled = HashSet::new();
    for (key, entry) in &cache.services {
        let name = match parse_status_key(key) {
            Ok(name) => name,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        if PresentationModes::from(&entry.modes).is_disabled() {
            debug!("disabled service: {:?}", name);
            disabled.insert(name.to_string());
        }
    }
    Ok(disabled)
}

/// All services in the services cache, with `disabled` looked up by raw name.
pub fn parse_services_cache(
    data: &[u8],
    disabled: &HashSet<String>,
) -> Result<Vec<Service>, plist::Error> {
    let cache: ServicesCache = plist::from_bytes(data)?;
    let services = cache
        .apps
        .iter()
        .flat_map(|(app_path, app)| {
            app.service_dicts.iter().map(move |desc| Service {
                name: desc.menu_item.default.clone(),
                supported_types: desc.send_types.clone(),
                app_name: app.name.clone(),
                app_path: app_path.clone(),
                disabled: disabled.contains(&desc.menu_item.default),
            })
        })
        .collect();
    Ok(services)
}

// ============================================================
// Service
// ============================================================

/// Service for loading the catalog of installed macOS Services.
pub struct CatalogService {
    fs: Arc<dyn FileSystem>,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load the catalog, sorted by raw service name.
    ///
    /// # Arguments
    /// * `services_path` - services cache
    /// * `status_path` - presentation-mode cache; `None` treats every service as enabled
    ///
    /// # Errors
    /// * `CatalogUnavailable` if either file cannot be read
    /// * `CatalogParse` if either file is not a valid property list
    pub fn load(
        &self,
        services_path: &Path,
        status_path: Option<&Path>,
    ) -> ApplicationResult<ServiceCatalog> {
        debug!(
            "load: services={}, status={:?}",
            services_path.display(),
            status_path
        );

        let disabled = match status_path {
            Some(path) => {
                let data = self.read_cache(path)?;
                parse_status_cache(&data).map_err(|source| ApplicationError::CatalogParse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => HashSet::new(),
        };
        debug!("load: {} disabled service name(s)", disabled.len());

        let data = self.read_cache(services_path)?;
        let services = parse_services_cache(&data, &disabled).map_err(|source| {
            ApplicationError::CatalogParse {
                path: services_path.to_path_buf(),
                source,
            }
        })?;

        let catalog = ServiceCatalog::new(services);
        info!("{} total service(s)", catalog.len());
        Ok(catalog)
    }

    fn read_cache(&self, path: &Path) -> ApplicationResult<Vec<u8>> {
        self.fs
            .read(path)
            .map_err(|source| ApplicationError::CatalogUnavailable {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>NSServicesStatus</key>
    <dict>
        <key>com.apple.Stickies - Make Sticky - makeStickyFromTextService</key>
        <dict>
            <key>presentation_modes</key>
            <dict>
                <key>ContextMenu</key><false/>
                <key>ServicesMenu</key><false/>
                <key>TouchBar</key><false/>
            </dict>
        </dict>
        <key>com.apple.Notes - New Note - newNoteFromSelection</key>
        <dict>
            <key>presentation_modes</key>
            <dict>
                <key>ContextMenu</key><false/>
                <key>ServicesMenu</key><true/>
                <key>TouchBar</key><false/>
            </dict>
        </dict>
        <key>garbage</key>
        <dict/>
    </dict>
</dict>
</plist>"#;

    #[test]
    fn given_status_cache_when_parsing_then_only_fully_hidden_names_disabled() {
        let disabled = parse_status_cache(STATUS.as_bytes()).expect("valid plist");
        assert!(disabled.contains("Make Sticky"));
        assert!(!disabled.contains("New Note"));
        assert_eq!(disabled.len(), 1);
    }

    #[test]
    fn given_empty_dict_when_parsing_then_nothing_found() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><dict/></plist>"#;
        assert!(parse_status_cache(xml.as_bytes()).unwrap().is_empty());
        assert!(parse_services_cache(xml.as_bytes(), &HashSet::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn given_garbage_when_parsing_then_error() {
        assert!(parse_services_cache(b"not a plist", &HashSet::new()).is_err());
    }
}
