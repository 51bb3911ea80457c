//! Contract between the runtime loop and applications.
//!
//! The runtime owns windows and GPU contexts; an [`App`] sees them only through
//! the per-frame [`FrameCtx`].

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
