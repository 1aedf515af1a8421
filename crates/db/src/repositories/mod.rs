//! Repository layer.
//!
//! Each repository is a zero-sized struct. Single-statement methods accept
//! any `PgExecutor` (a pool, or `&mut *tx` inside a transaction); methods
//! that issue several statements take `&mut PgConnection` so callers decide
//! the transaction boundary.

pub mod audit_repo;
pub mod draft_content_repo;
pub mod draft_version_repo;
pub mod submission_repo;
pub mod sync_id_mapping_repo;
pub mod sync_job_repo;
pub mod task_repo;

pub use audit_repo::AuditLogRepo;
pub use draft_content_repo::DraftContentRepo;
pub use draft_version_repo::DraftVersionRepo;
pub use submission_repo::SubmissionRepo;
pub use sync_id_mapping_repo::SyncIdMappingRepo;
pub use sync_job_repo::SyncJobRepo;
pub use task_repo::TaskRepo;
