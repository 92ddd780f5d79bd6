//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod catalog;
pub mod entities;
pub mod error;
pub mod status;

pub use catalog::{filter_services, ServiceCatalog};
pub use entities::*;
pub use error::DomainError;
pub use status::parse_status_key;
