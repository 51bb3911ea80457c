//! glines engine crate.
//!
//! A fixed-capacity GPU line renderer ([`lines`]) plus the small wgpu/winit
//! runtime it is driven from.

pub mod core;
pub mod device;
pub mod lines;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
