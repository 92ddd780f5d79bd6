//! Infrastructure layer: I/O implementations and application context
//!
//! This layer implements I/O boundary traits and wires up services.

pub mod di;
pub mod error;
pub mod pasteboard;
pub mod releases;
pub mod traits;

pub use di::AppContext;
pub use error::{InfraError, InfraResult};
