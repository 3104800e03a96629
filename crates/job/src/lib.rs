//! Publish job status machine and wire types.
//!
//! This crate defines the **data model** shared by the rest of the
//! workspace: the closed [`JobStatus`] enum with its transition rules and
//! fixed progress/message tables, and the serde wire types for job records,
//! creation requests, partial updates and status reports. It has no I/O and
//! no runtime dependencies.

pub mod status;
pub mod types;

pub use status::JobStatus;
pub use types::{CreateJobRequest, JobPatch, NewJob, PublishJob, StatusReport};
