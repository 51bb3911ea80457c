//! Fixed-capacity line-list renderer.
//!
//! Lifecycle: [`LineRenderer::initialize`] once per device, [`LineRenderer::update`]
//! whenever the vertex data changes, [`LineRenderer::render`] each frame with the
//! current transform. Every pair of consecutive vertices is one segment.
//!
//! All calls must come from the thread that owns the device; nothing here
//! locks or waits on the GPU.

mod backend;
mod error;
mod renderer;
pub mod recording;
pub mod shader;
mod vertex;
mod wgpu_backend;

pub use backend::{AttribFormat, LineBackend, VertexLayout};
pub use error::{LinesError, ShaderStage};
pub use renderer::{LineRenderer, LineRendererInit};
pub use shader::{ProgramLocations, ShaderProgram, UniformSlot};
pub use vertex::{IDENTITY_MVP, LineVertex, MAX_VERTS};
pub use wgpu_backend::WgpuLineBackend;
