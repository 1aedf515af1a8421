//! Draft workflow engines.
//!
//! - [`submission`]: submit/diff/confirm over the append-only submission trail.
//! - [`sync`]: validate, upload media, and push a draft to production.
//! - [`import`]: pull a production snapshot back into a draft.
//! - [`jobs`]: sync job bookkeeping shared by the orchestrator.
//! - [`uploads`]: the per-sync upload session.
//! - [`lock`]: the per-draft sync lock.

pub mod import;
pub mod jobs;
pub mod lock;
pub mod submission;
pub mod sync;
pub mod uploads;
