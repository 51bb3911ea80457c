use std::ops::Range;

use super::error::LinesError;
use super::shader::ShaderProgram;

/// One `3 x f32` vertex attribute inside the single vertex stream.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttribFormat {
    pub location: u32,
    pub offset: u64,
}

/// How the vertex buffer is sized and interpreted.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    pub stride: u64,
    pub capacity_bytes: u64,
    pub pos: AttribFormat,
    pub col: AttribFormat,
}

/// Graphics API seam used by [`LineRenderer`](super::LineRenderer).
///
/// The renderer performs all contract checks; a backend only owns resources
/// and executes the already-validated calls. Calls arrive in a fixed order:
/// `create_program`, `create_vertex_storage`, then any number of
/// `write_vertices`/`draw_lines`, then `release` exactly once.
pub trait LineBackend {
    /// Destination a draw is recorded into.
    type Target<'t>;

    fn create_program(&mut self, program: &ShaderProgram) -> Result<(), LinesError>;

    /// Allocates the fixed-size vertex buffer and describes its layout.
    fn create_vertex_storage(&mut self, layout: &VertexLayout) -> Result<(), LinesError>;

    /// Overwrites buffer bytes starting at `offset`.
    fn write_vertices(&mut self, offset: u64, bytes: &[u8]);

    /// Draws `vertices` as a line list with `mvp` (column-major), leaving
    /// nothing bound afterwards.
    fn draw_lines(&mut self, target: &mut Self::Target<'_>, vertices: Range<u32>, mvp: &[f32; 16]);

    /// Frees program, layout and buffer in reverse creation order.
    ///
    /// Also called after a failed initialization, so only what exists is freed.
    fn release(&mut self);
}
