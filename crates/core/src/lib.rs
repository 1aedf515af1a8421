//! Domain layer for the draft submission and production-sync service.
//!
//! Nothing in this crate performs I/O. The database, remote and API crates
//! all build on the types and pure functions defined here.

pub mod audit;
pub mod diff;
pub mod error;
pub mod media;
pub mod module;
pub mod payload;
pub mod status;
pub mod types;
pub mod validation;
