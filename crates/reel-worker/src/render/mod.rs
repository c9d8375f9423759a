//! Clip rendering.
//!
//! [`RenderOrchestrator`] runs the fixed stage order (trim, B-roll
//! overlays, crop, captions, finalize) through a [`RenderPipeline`] that
//! owns the scratch workspace.

mod orchestrator;
mod pipeline;

pub use orchestrator::{render_key, RenderInputs, RenderOrchestrator, RENDER_CONTENT_TYPE};
pub use pipeline::RenderPipeline;
