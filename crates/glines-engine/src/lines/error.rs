use std::fmt;

/// Pipeline stage a shader belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Errors reported by the line renderer.
///
/// Program build failures carry the full compiler diagnostic so the embedding
/// application can decide whether to log-and-abort or recover.
#[derive(Debug, Clone, PartialEq)]
pub enum LinesError {
    /// A shader stage failed to parse or validate.
    ShaderCompile { stage: ShaderStage, log: String },
    /// The two stages could not be combined into one program.
    ProgramLink { log: String },
    /// A renderer was requested with room for zero vertices.
    ZeroCapacity,
    /// More vertices were submitted than the buffer holds.
    CapacityExceeded { requested: usize, capacity: usize },
    /// Element size does not match the vertex layout.
    ElementSizeMismatch { expected: usize, actual: usize },
    /// Byte slice is shorter than `element_count * element_size`.
    DataTooShort { expected: usize, actual: usize },
    /// Draw reaches past the last uploaded vertex.
    DrawOutOfRange { requested: u32, uploaded: u32 },
}

impl fmt::Display for LinesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinesError::ShaderCompile { stage, log } => {
                write!(f, "{stage} shader compile error:\n{log}")
            }
            LinesError::ProgramLink { log } => write!(f, "program link error:\n{log}"),
            LinesError::ZeroCapacity => f.write_str("line renderer capacity must be non-zero"),
            LinesError::CapacityExceeded { requested, capacity } => write!(
                f,
                "{requested} vertices exceed the buffer capacity of {capacity}"
            ),
            LinesError::ElementSizeMismatch { expected, actual } => write!(
                f,
                "element size {actual} does not match the vertex size {expected}"
            ),
            LinesError::DataTooShort { expected, actual } => write!(
                f,
                "vertex data holds {actual} bytes, {expected} required"
            ),
            LinesError::DrawOutOfRange { requested, uploaded } => write!(
                f,
                "draw of {requested} vertices exceeds the {uploaded} uploaded"
            ),
        }
    }
}

impl std::error::Error for LinesError {}
