//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, CommandRunner, etc.)
//! but are themselves concrete structs, not traits.

mod catalog;
mod listing;
mod update;

pub use catalog::{parse_services_cache, parse_status_cache, CatalogService};
pub use listing::{Listing, ListingService};
pub use update::{UpdateService, UpdateState};
