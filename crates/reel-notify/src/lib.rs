//! Real-time job notifications.
//!
//! This crate provides:
//! - [`Hub`], the per-user connection registry with bounded outbound buffers
//! - [`JobNotifier`], the capability workers use to publish job updates

pub mod hub;
pub mod notifier;

pub use hub::{Connection, ConnectionId, Hub, DEFAULT_BUFFER_SIZE};
pub use notifier::{JobNotifier, NoopNotifier};
