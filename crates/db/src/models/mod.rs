//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row and, where rows are created from request input, a
//! `Deserialize` create DTO.

pub mod audit;
pub mod content;
pub mod draft_version;
pub mod submission;
pub mod sync_id_mapping;
pub mod sync_job;
pub mod task;
