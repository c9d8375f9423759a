//! Persistence collaborators for the render workers.
//!
//! This crate provides:
//! - Per-entity repository traits (clips, styles, videos, jobs, B-roll,
//!   transcriptions, analyses)
//! - A combined [`Repository`] bound for worker contexts
//! - An in-memory implementation used by tests and local runs

pub mod error;
pub mod memory;
pub mod repos;

pub use error::{RepoError, RepoResult};
pub use memory::MemoryRepo;
pub use repos::{
    AnalysisRepository, BrollRepository, ClipRepository, JobRepository, Repository,
    StyleRepository, TranscriptionRepository, VideoRepository,
};
