//! Listing of services applicable to the current pasteboard.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::services::CatalogService;
use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::Service;
use crate::infrastructure::traits::{ClipboardReader, FileSystem, PasteboardInspector};

/// Outcome of one listing run.
///
/// The two empty states are informational, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Nothing on the pasteboard; the catalog was not consulted.
    NoPasteboardData,
    /// Pasteboard has data but no enabled service accepts it.
    NoMatchingServices {
        pasteboard_types: Vec<String>,
        total: usize,
    },
    /// Services accepting the pasteboard content, in catalog order.
    Services {
        services: Vec<Service>,
        pasteboard_types: Vec<String>,
        clipboard: String,
    },
}

/// Builds a [`Listing`] from the pasteboard and the service catalog.
pub struct ListingService {
    catalog: CatalogService,
    pasteboard: Arc<dyn PasteboardInspector>,
    clipboard: Arc<dyn ClipboardReader>,
    settings: Arc<Settings>,
}

impl ListingService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        pasteboard: Arc<dyn PasteboardInspector>,
        clipboard: Arc<dyn ClipboardReader>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            catalog: CatalogService::new(fs),
            pasteboard,
            clipboard,
            settings,
        }
    }

    /// Pasteboard types, then catalog, then filter, then clipboard text.
    ///
    /// Clipboard text is only fetched when there is at least one service to
    /// show it with.
    #[instrument(skip(self))]
    pub fn collect(&self) -> ApplicationResult<Listing> {
        let pasteboard_types = self
            .pasteboard
            .types()
            .with_helper_context("pasteboard helper")?;
        if pasteboard_types.is_empty() {
            info!("no data on pasteboard");
            return Ok(Listing::NoPasteboardData);
        }
        for t in &pasteboard_types {
            debug!("[pasteboard] type={:?}", t);
        }

        let catalog = self.catalog.load(
            &self.settings.services_cache,
            self.settings.status_cache_path(),
        )?;

        let services = catalog.applicable(&pasteboard_types);
        info!(
            "{} enabled service(s) support current pasteboard types",
            services.len()
        );
        if services.is_empty() {
            return Ok(Listing::NoMatchingServices {
                pasteboard_types,
                total: catalog.len(),
            });
        }

        let clipboard = self
            .clipboard
            .text()
            .with_helper_context("clipboard helper")?;

        Ok(Listing::Services {
            services,
            pasteboard_types,
            clipboard,
        })
    }
}
