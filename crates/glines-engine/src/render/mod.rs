//! Render plumbing shared by renderers.
//!
//! A frame hands each renderer a [`RenderCtx`] (device, queue, target format,
//! drawable size) and a [`RenderTarget`] (encoder + color view). Renderers own
//! their pipelines and buffers and record passes that load, not clear.

mod ctx;

pub use ctx::{RenderCtx, RenderTarget};
