//! alfred-services: list and run the macOS Services that accept the
//! current pasteboard content, as an Alfred script filter.
//!
//! Layers, innermost first: `domain` (services, catalog filter, status key
//! parsing), `application` (catalog loading, listing, updates, feedback),
//! `infrastructure` (helper processes, release feed, wiring) and `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
