//! The service catalog and pasteboard filtering.

use std::collections::HashSet;

use crate::domain::Service;

/// All services known to the system for one invocation, sorted by raw name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCatalog {
    services: Vec<Service>,
}

impl ServiceCatalog {
    /// Build a catalog; services are sorted by raw name, then by app path.
    pub fn new(mut services: Vec<Service>) -> Self {
        services.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.app_path.cmp(&b.app_path))
        });
        Self { services }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Enabled services accepting at least one of `types`, in catalog order.
    ///
    /// An empty `types` slice means the pasteboard is empty; no service is
    /// considered universally applicable, so the result is empty.
    pub fn applicable(&self, types: &[String]) -> Vec<Service> {
        filter_services(&self.services, types)
    }
}

/// Order-preserving pasteboard filter over any slice of services.
pub fn filter_services(services: &[Service], types: &[String]) -> Vec<Service> {
    let wanted: HashSet<&str> = types.iter().map(String::as_str).collect();
    if wanted.is_empty() {
        return Vec::new();
    }
    services
        .iter()
        .filter(|s| !s.disabled && s.supports(&wanted))
        .cloned()
        .collect()
}
