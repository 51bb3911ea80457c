//! Window + runtime loop.
//!
//! Owns the `winit` event loop and windows, and pairs each window with its GPU context.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
