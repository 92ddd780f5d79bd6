//! Dependency wiring

mod context;

pub use context::AppContext;
