use super::backend::{AttribFormat, LineBackend, VertexLayout};
use super::error::LinesError;
use super::shader::{self, ProgramLocations};
use super::vertex::{LineVertex, MAX_VERTS};

/// Initialization parameters for a [`LineRenderer`].
#[derive(Debug, Clone)]
pub struct LineRendererInit {
    /// Fixed vertex buffer capacity. Never grows after initialization.
    pub max_vertices: usize,
}

impl Default for LineRendererInit {
    fn default() -> Self {
        Self {
            max_vertices: MAX_VERTS,
        }
    }
}

/// Fixed-capacity line-list renderer.
///
/// Owns the line program, the vertex layout and one vertex buffer through its
/// backend. `update` replaces buffer contents from offset 0; `render` draws the
/// first `count` uploaded vertices as independent segments.
///
/// There is a single buffer: an `update` recorded after a `render` but before
/// that render's work executes on the GPU is visible to it. Callers that need
/// stable geometry per frame should update before rendering.
///
/// Resources are released exactly once, by [`destroy`](Self::destroy) or on drop.
pub struct LineRenderer<B: LineBackend> {
    backend: B,
    locations: ProgramLocations,
    capacity: usize,
    uploaded: u32,
    released: bool,
    warned_odd_count: bool,
}

impl<B: LineBackend> LineRenderer<B> {
    /// Builds the line program and allocates the vertex buffer.
    ///
    /// Shader compile and link failures are logged with their full diagnostic and
    /// returned; nothing is left allocated on failure.
    pub fn initialize(backend: B, init: LineRendererInit) -> Result<Self, LinesError> {
        let capacity = init.max_vertices;
        if capacity == 0 {
            return Err(LinesError::ZeroCapacity);
        }

        let max_capacity = (u32::MAX as usize).min(usize::MAX / LineVertex::SIZE);
        if capacity > max_capacity {
            return Err(LinesError::CapacityExceeded {
                requested: capacity,
                capacity: max_capacity,
            });
        }

        let program = shader::build_program().inspect_err(|e| log::error!("[lines] {e}"))?;

        // From here on, drop releases whatever the backend managed to create.
        let mut renderer = Self {
            backend,
            locations: program.locations,
            capacity,
            uploaded: 0,
            released: false,
            warned_odd_count: false,
        };

        renderer
            .backend
            .create_program(&program)
            .inspect_err(|e| log::error!("[lines] {e}"))?;

        let layout = VertexLayout {
            stride: LineVertex::SIZE as u64,
            capacity_bytes: (capacity * LineVertex::SIZE) as u64,
            pos: AttribFormat {
                location: program.locations.pos,
                offset: LineVertex::POS_OFFSET,
            },
            col: AttribFormat {
                location: program.locations.col,
                offset: LineVertex::COL_OFFSET,
            },
        };
        renderer.backend.create_vertex_storage(&layout)?;

        log::debug!(
            "line renderer ready: {capacity} vertices ({} bytes)",
            layout.capacity_bytes
        );
        Ok(renderer)
    }

    /// Uploads `vertices`, replacing buffer contents from offset 0.
    ///
    /// Returns the number of vertices accepted.
    pub fn update(&mut self, vertices: &[LineVertex]) -> Result<u32, LinesError> {
        self.update_bytes(bytemuck::cast_slice(vertices), vertices.len(), LineVertex::SIZE)
    }

    /// Raw form of [`update`](Self::update): copies `element_count * element_size`
    /// bytes of `data` into the buffer at offset 0.
    ///
    /// `element_size` must equal the vertex size. An empty upload issues no write
    /// and leaves the buffer untouched.
    pub fn update_bytes(
        &mut self,
        data: &[u8],
        element_count: usize,
        element_size: usize,
    ) -> Result<u32, LinesError> {
        if element_size != LineVertex::SIZE {
            return Err(LinesError::ElementSizeMismatch {
                expected: LineVertex::SIZE,
                actual: element_size,
            });
        }
        if element_count > self.capacity {
            return Err(LinesError::CapacityExceeded {
                requested: element_count,
                capacity: self.capacity,
            });
        }

        let len = element_count * element_size;
        if data.len() < len {
            return Err(LinesError::DataTooShort {
                expected: len,
                actual: data.len(),
            });
        }

        // capacity fits in u32, checked at initialization
        let count = element_count as u32;
        if count > 0 {
            self.backend.write_vertices(0, &data[..len]);
        }
        self.uploaded = count;

        log::trace!("uploaded {count} line vertices");
        Ok(count)
    }

    /// Draws the first `count` uploaded vertices as a line list.
    ///
    /// `mvp` is column-major. An odd trailing vertex has no partner and is
    /// dropped, matching line-list primitive assembly.
    pub fn render(
        &mut self,
        target: &mut B::Target<'_>,
        count: u32,
        mvp: &[f32; 16],
    ) -> Result<(), LinesError> {
        if count > self.uploaded {
            return Err(LinesError::DrawOutOfRange {
                requested: count,
                uploaded: self.uploaded,
            });
        }

        let drawn = count & !1;
        if drawn != count && !self.warned_odd_count {
            log::debug!("odd line vertex count {count}; trailing vertex ignored");
            self.warned_odd_count = true;
        }
        if drawn == 0 {
            return Ok(());
        }

        self.backend.draw_lines(target, 0..drawn, mvp);
        Ok(())
    }

    /// Releases all GPU resources now.
    pub fn destroy(mut self) {
        self.release();
    }

    /// Fixed capacity in vertices.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Vertex count of the most recent upload.
    pub fn uploaded(&self) -> u32 {
        self.uploaded
    }

    pub fn locations(&self) -> ProgramLocations {
        self.locations
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.backend.release();
        self.released = true;
        log::debug!("line renderer released");
    }
}

impl<B: LineBackend> Drop for LineRenderer<B> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::recording::{RecordingBackend, RecordingView};
    use crate::lines::IDENTITY_MVP;

    const RED: [f32; 3] = [1.0, 0.0, 0.0];
    const GREEN: [f32; 3] = [0.0, 1.0, 0.0];

    fn renderer_with(max_vertices: usize) -> (LineRenderer<RecordingBackend>, RecordingView) {
        let backend = RecordingBackend::new();
        let journal = backend.view();
        let renderer =
            LineRenderer::initialize(backend, LineRendererInit { max_vertices }).unwrap();
        (renderer, journal)
    }

    fn two_segments() -> Vec<LineVertex> {
        let mut v = Vec::new();
        v.extend(LineVertex::segment([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], RED));
        v.extend(LineVertex::segment([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], GREEN));
        v
    }

    fn ramp(n: usize, base: f32) -> Vec<LineVertex> {
        (0..n)
            .map(|i| LineVertex::new([base + i as f32, 0.0, 0.0], [0.5; 3]))
            .collect()
    }

    // ── initialize ────────────────────────────────────────────────────────

    #[test]
    fn initialize_allocates_fixed_buffer_and_layout() {
        let (renderer, journal) = renderer_with(8);
        assert_eq!(renderer.capacity(), 8);
        assert_eq!(renderer.uploaded(), 0);

        let layout = journal.layout().unwrap();
        assert_eq!(layout.stride, 24);
        assert_eq!(layout.capacity_bytes, 8 * 24);
        assert_eq!(layout.pos, AttribFormat { location: 0, offset: 0 });
        assert_eq!(layout.col, AttribFormat { location: 1, offset: 12 });
        assert_eq!(journal.program(), Some(renderer.locations()));
    }

    #[test]
    fn fresh_buffer_is_zeroed() {
        let (_renderer, journal) = renderer_with(4);
        assert_eq!(journal.buffer(), vec![0u8; 4 * 24]);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let backend = RecordingBackend::new();
        let journal = backend.view();
        let err = LineRenderer::initialize(backend, LineRendererInit { max_vertices: 0 });
        assert!(matches!(err, Err(LinesError::ZeroCapacity)));
        assert!(journal.program().is_none());
    }

    #[test]
    fn failed_storage_releases_program() {
        let backend = RecordingBackend::new().fail_vertex_storage();
        let journal = backend.view();
        let res = LineRenderer::initialize(backend, LineRendererInit::default());
        assert!(res.is_err());
        assert!(journal.program().is_some());
        assert_eq!(journal.releases(), 1);
    }

    #[test]
    fn default_capacity_is_max_verts() {
        assert_eq!(LineRendererInit::default().max_vertices, MAX_VERTS);
    }

    // ── update ────────────────────────────────────────────────────────────

    #[test]
    fn upload_round_trips_bytes() {
        let (mut renderer, journal) = renderer_with(16);
        let v = two_segments();
        assert_eq!(renderer.update(&v).unwrap(), 4);

        let bytes: &[u8] = bytemuck::cast_slice(&v);
        assert_eq!(&journal.buffer()[..bytes.len()], bytes);
        assert_eq!(renderer.uploaded(), 4);
    }

    #[test]
    fn repeated_upload_is_idempotent() {
        let (mut renderer, journal) = renderer_with(16);
        let v = ramp(6, 1.0);
        renderer.update(&v).unwrap();
        let once = journal.buffer();
        renderer.update(&v).unwrap();
        assert_eq!(journal.buffer(), once);
    }

    #[test]
    fn upload_overwrites_previous_range() {
        let (mut renderer, journal) = renderer_with(16);
        let a = ramp(6, 100.0);
        let b = ramp(4, -50.0);
        renderer.update(&a).unwrap();
        renderer.update(&b).unwrap();

        let buf = journal.buffer();
        let b_bytes: &[u8] = bytemuck::cast_slice(&b);
        assert_eq!(&buf[..b_bytes.len()], b_bytes);

        // Past the overwritten range the older upload is still there.
        let a_tail: &[u8] = bytemuck::cast_slice(&a[4..]);
        assert_eq!(&buf[b_bytes.len()..b_bytes.len() + a_tail.len()], a_tail);
        assert_eq!(renderer.uploaded(), 4);
    }

    #[test]
    fn empty_upload_leaves_buffer_untouched() {
        let (mut renderer, journal) = renderer_with(8);
        renderer.update(&ramp(2, 3.0)).unwrap();
        let before = journal.buffer();
        let writes = journal.writes();

        assert_eq!(renderer.update(&[]).unwrap(), 0);
        assert_eq!(journal.buffer(), before);
        assert_eq!(journal.writes(), writes);
        assert_eq!(renderer.uploaded(), 0);
    }

    #[test]
    fn upload_at_capacity_succeeds() {
        let (mut renderer, _journal) = renderer_with(8);
        assert_eq!(renderer.update(&ramp(8, 0.0)).unwrap(), 8);
    }

    #[test]
    fn upload_past_capacity_is_rejected() {
        let (mut renderer, journal) = renderer_with(8);
        let err = renderer.update(&ramp(9, 0.0)).unwrap_err();
        assert_eq!(err, LinesError::CapacityExceeded { requested: 9, capacity: 8 });
        assert_eq!(journal.writes(), 0);
    }

    #[test]
    fn raw_upload_checks_element_size() {
        let (mut renderer, _journal) = renderer_with(8);
        let err = renderer.update_bytes(&[0u8; 32], 2, 16).unwrap_err();
        assert_eq!(err, LinesError::ElementSizeMismatch { expected: 24, actual: 16 });
    }

    #[test]
    fn raw_upload_checks_data_length() {
        let (mut renderer, _journal) = renderer_with(8);
        let err = renderer.update_bytes(&[0u8; 40], 2, 24).unwrap_err();
        assert_eq!(err, LinesError::DataTooShort { expected: 48, actual: 40 });
    }

    #[test]
    fn raw_upload_copies_only_counted_elements() {
        let (mut renderer, journal) = renderer_with(8);
        let v = ramp(3, 7.0);
        let bytes: &[u8] = bytemuck::cast_slice(&v);
        assert_eq!(renderer.update_bytes(bytes, 2, LineVertex::SIZE).unwrap(), 2);

        let buf = journal.buffer();
        assert_eq!(&buf[..48], &bytes[..48]);
        assert!(buf[48..].iter().all(|b| *b == 0));
    }

    // ── render ────────────────────────────────────────────────────────────

    #[test]
    fn two_segments_draw_once_and_unbind() {
        let (mut renderer, journal) = renderer_with(MAX_VERTS);
        renderer.update(&two_segments()).unwrap();
        renderer.render(&mut (), 4, &IDENTITY_MVP).unwrap();

        let draws = journal.draws();
        assert_eq!(draws.len(), 1);
        let draw = &draws[0];
        assert_eq!(draw.vertices, 0..4);
        assert_eq!(draw.primitives, 2);
        assert_eq!(draw.mvp, IDENTITY_MVP);
        // initialize created both, so both were live for the draw
        assert!(draw.program_bound);
        assert!(draw.vertex_array_bound);
        assert!(journal.is_unbound());
    }

    #[test]
    fn odd_count_drops_trailing_vertex() {
        let (mut renderer, journal) = renderer_with(8);
        renderer.update(&ramp(5, 0.0)).unwrap();
        renderer.render(&mut (), 5, &IDENTITY_MVP).unwrap();

        let draws = journal.draws();
        assert_eq!(draws[0].vertices, 0..4);
        assert_eq!(draws[0].primitives, 2);
    }

    #[test]
    fn single_vertex_draws_nothing() {
        let (mut renderer, journal) = renderer_with(8);
        renderer.update(&ramp(1, 0.0)).unwrap();
        renderer.render(&mut (), 1, &IDENTITY_MVP).unwrap();
        assert!(journal.draws().is_empty());
    }

    #[test]
    fn render_before_update_is_out_of_range() {
        let (mut renderer, journal) = renderer_with(8);
        let err = renderer.render(&mut (), 2, &IDENTITY_MVP).unwrap_err();
        assert_eq!(err, LinesError::DrawOutOfRange { requested: 2, uploaded: 0 });
        assert!(journal.draws().is_empty());
    }

    #[test]
    fn render_past_uploaded_is_out_of_range() {
        let (mut renderer, _journal) = renderer_with(8);
        renderer.update(&ramp(4, 0.0)).unwrap();
        assert!(renderer.render(&mut (), 6, &IDENTITY_MVP).is_err());
        assert!(renderer.render(&mut (), 4, &IDENTITY_MVP).is_ok());
    }

    #[test]
    fn render_passes_matrix_through() {
        let (mut renderer, journal) = renderer_with(8);
        renderer.update(&two_segments()).unwrap();
        let mut mvp = IDENTITY_MVP;
        mvp[12] = 0.5; // x translation, column-major
        renderer.render(&mut (), 4, &mvp).unwrap();
        assert_eq!(journal.draws()[0].mvp[12], 0.5);
    }

    // ── release ───────────────────────────────────────────────────────────

    #[test]
    fn destroy_releases_once() {
        let (renderer, journal) = renderer_with(8);
        renderer.destroy();
        assert_eq!(journal.releases(), 1);
    }

    #[test]
    fn drop_releases_once() {
        let (renderer, journal) = renderer_with(8);
        drop(renderer);
        assert_eq!(journal.releases(), 1);
    }
}
