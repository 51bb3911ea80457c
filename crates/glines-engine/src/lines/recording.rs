//! In-memory backend that records what a real backend would be asked to do.
//!
//! Useful for headless tests of code that drives a [`LineRenderer`](super::LineRenderer):
//! the buffer can be read back and every draw is journaled along with the
//! binding state at the time of the call.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use super::backend::{LineBackend, VertexLayout};
use super::error::LinesError;
use super::shader::{ProgramLocations, ShaderProgram};

/// One journaled draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub vertices: Range<u32>,
    /// Independent segments assembled from `vertices`.
    pub primitives: u32,
    pub mvp: [f32; 16],
    pub program_bound: bool,
    pub vertex_array_bound: bool,
}

#[derive(Debug, Default)]
struct Journal {
    program: Option<ProgramLocations>,
    layout: Option<VertexLayout>,
    buffer: Vec<u8>,
    writes: usize,
    draws: Vec<DrawRecord>,
    program_bound: bool,
    vertex_array_bound: bool,
    releases: u32,
}

/// Recording [`LineBackend`]. Its target is `()`.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    journal: Rc<RefCell<Journal>>,
    fail_vertex_storage: bool,
}

/// Read-only view of a [`RecordingBackend`] that outlives the renderer owning it.
#[derive(Debug, Clone)]
pub struct RecordingView {
    journal: Rc<RefCell<Journal>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes vertex storage allocation fail, to exercise partial initialization.
    pub fn fail_vertex_storage(mut self) -> Self {
        self.fail_vertex_storage = true;
        self
    }

    pub fn view(&self) -> RecordingView {
        RecordingView {
            journal: Rc::clone(&self.journal),
        }
    }
}

impl LineBackend for RecordingBackend {
    type Target<'t> = ();

    fn create_program(&mut self, program: &ShaderProgram) -> Result<(), LinesError> {
        self.journal.borrow_mut().program = Some(program.locations);
        Ok(())
    }

    fn create_vertex_storage(&mut self, layout: &VertexLayout) -> Result<(), LinesError> {
        if self.fail_vertex_storage {
            return Err(LinesError::CapacityExceeded {
                requested: (layout.capacity_bytes / layout.stride) as usize,
                capacity: 0,
            });
        }
        let mut j = self.journal.borrow_mut();
        j.layout = Some(*layout);
        j.buffer = vec![0; layout.capacity_bytes as usize];
        Ok(())
    }

    fn write_vertices(&mut self, offset: u64, bytes: &[u8]) {
        let mut j = self.journal.borrow_mut();
        let start = offset as usize;
        j.buffer[start..start + bytes.len()].copy_from_slice(bytes);
        j.writes += 1;
    }

    fn draw_lines(&mut self, _target: &mut (), vertices: Range<u32>, mvp: &[f32; 16]) {
        let mut j = self.journal.borrow_mut();
        // Only what exists and is still alive can be bound.
        let live = j.releases == 0;
        j.program_bound = live && j.program.is_some();
        j.vertex_array_bound = live && j.layout.is_some();

        let record = DrawRecord {
            primitives: vertices.len() as u32 / 2,
            vertices,
            mvp: *mvp,
            program_bound: j.program_bound,
            vertex_array_bound: j.vertex_array_bound,
        };
        j.draws.push(record);

        j.vertex_array_bound = false;
        j.program_bound = false;
    }

    fn release(&mut self) {
        self.journal.borrow_mut().releases += 1;
    }
}

impl RecordingView {
    /// Copy of the whole vertex buffer.
    pub fn buffer(&self) -> Vec<u8> {
        self.journal.borrow().buffer.clone()
    }

    /// Number of buffer writes issued.
    pub fn writes(&self) -> usize {
        self.journal.borrow().writes
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.journal.borrow().draws.clone()
    }

    pub fn program(&self) -> Option<ProgramLocations> {
        self.journal.borrow().program
    }

    pub fn layout(&self) -> Option<VertexLayout> {
        self.journal.borrow().layout
    }

    /// True when neither the program nor the vertex array is bound.
    pub fn is_unbound(&self) -> bool {
        let j = self.journal.borrow();
        !j.program_bound && !j.vertex_array_bound
    }

    pub fn releases(&self) -> u32 {
        self.journal.borrow().releases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::IDENTITY_MVP;
    use crate::lines::shader::build_program;

    fn layout() -> VertexLayout {
        use crate::lines::{AttribFormat, LineVertex};
        VertexLayout {
            stride: LineVertex::SIZE as u64,
            capacity_bytes: 4 * LineVertex::SIZE as u64,
            pos: AttribFormat {
                location: 0,
                offset: LineVertex::POS_OFFSET,
            },
            col: AttribFormat {
                location: 1,
                offset: LineVertex::COL_OFFSET,
            },
        }
    }

    #[test]
    fn draw_without_resources_binds_nothing() {
        let mut backend = RecordingBackend::new();
        let view = backend.view();

        backend.draw_lines(&mut (), 0..2, &IDENTITY_MVP);
        let draw = &view.draws()[0];
        assert!(!draw.program_bound);
        assert!(!draw.vertex_array_bound);
    }

    #[test]
    fn binding_follows_created_resources() {
        let mut backend = RecordingBackend::new();
        let view = backend.view();

        backend.create_program(&build_program().unwrap()).unwrap();
        backend.draw_lines(&mut (), 0..2, &IDENTITY_MVP);
        backend.create_vertex_storage(&layout()).unwrap();
        backend.draw_lines(&mut (), 0..2, &IDENTITY_MVP);

        let draws = view.draws();
        assert!(draws[0].program_bound && !draws[0].vertex_array_bound);
        assert!(draws[1].program_bound && draws[1].vertex_array_bound);
        assert!(view.is_unbound());
    }

    #[test]
    fn released_resources_are_not_bound() {
        let mut backend = RecordingBackend::new();
        let view = backend.view();
        backend.create_program(&build_program().unwrap()).unwrap();
        backend.create_vertex_storage(&layout()).unwrap();

        backend.release();
        backend.draw_lines(&mut (), 0..2, &IDENTITY_MVP);
        let draw = &view.draws()[0];
        assert!(!draw.program_bound);
        assert!(!draw.vertex_array_bound);
        assert_eq!(view.releases(), 1);
    }
}
