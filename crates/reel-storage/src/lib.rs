//! S3-compatible object storage.
//!
//! This crate provides:
//! - The [`ObjectStorage`] capability used by workers
//! - An S3 client (R2, MinIO, AWS) with presigning and multipart uploads
//! - An in-memory implementation for tests and local runs

pub mod client;
pub mod error;
pub mod memory;
pub mod storage;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use storage::{validate_key, ObjectReader, ObjectStorage, UploadedPart};
