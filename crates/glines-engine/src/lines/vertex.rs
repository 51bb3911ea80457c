use bytemuck::{Pod, Zeroable};

/// Default fixed capacity of a line renderer's vertex buffer.
pub const MAX_VERTS: usize = 65_536;

/// Column-major 4x4 identity, handy as an MVP when positions are already in clip space.
pub const IDENTITY_MVP: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, //
];

/// One end of a line segment.
///
/// Layout is fixed and read by the vertex stage through attribute offsets:
/// `pos` at byte 0, `col` at byte 12, stride 24.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub pos: [f32; 3],
    pub col: [f32; 3], // linear rgb, 0..1
}

impl LineVertex {
    /// Size of one vertex in bytes.
    pub const SIZE: usize = std::mem::size_of::<LineVertex>();

    pub const POS_OFFSET: u64 = std::mem::offset_of!(LineVertex, pos) as u64;
    pub const COL_OFFSET: u64 = std::mem::offset_of!(LineVertex, col) as u64;

    #[inline]
    pub const fn new(pos: [f32; 3], col: [f32; 3]) -> Self {
        Self { pos, col }
    }

    /// Returns the two vertices of a single-colored segment.
    #[inline]
    pub const fn segment(a: [f32; 3], b: [f32; 3], col: [f32; 3]) -> [Self; 2] {
        [Self::new(a, col), Self::new(b, col)]
    }
}
