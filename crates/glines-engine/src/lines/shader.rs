//! Fixed line shader program: sources, compilation and linking.
//!
//! Compilation parses and validates each WGSL stage with naga. Linking checks
//! the stage interface and queries attribute/uniform slots by name, so the
//! renderer never looks them up again per draw.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::error::{LinesError, ShaderStage};

/// Vertex stage: transforms `pos` by `u_mvp`, passes `col` through.
pub const VERTEX_SHADER_SRC: &str = include_str!("shaders/lines_vs.wgsl");

/// Fragment stage: writes the interpolated color with alpha 1.
pub const FRAGMENT_SHADER_SRC: &str = include_str!("shaders/lines_fs.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

const POS_ATTRIB: &str = "pos";
const COL_ATTRIB: &str = "col";
const MVP_UNIFORM: &str = "u_mvp";

/// Bind group slot of a uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformSlot {
    pub group: u32,
    pub binding: u32,
}

/// Slots queried from a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ProgramLocations {
    pub pos: u32,
    pub col: u32,
    pub mvp: UniformSlot,
}

/// A compiled and linked program ready to hand to a backend.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub vertex_src: &'static str,
    pub fragment_src: &'static str,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    pub locations: ProgramLocations,
}

/// Builds the fixed line program from [`VERTEX_SHADER_SRC`] and [`FRAGMENT_SHADER_SRC`].
pub fn build_program() -> Result<ShaderProgram, LinesError> {
    let vertex = compile(ShaderStage::Vertex, VERTEX_SHADER_SRC)?;
    let fragment = compile(ShaderStage::Fragment, FRAGMENT_SHADER_SRC)?;
    let locations = link(&vertex, &fragment)?;

    Ok(ShaderProgram {
        vertex_src: VERTEX_SHADER_SRC,
        fragment_src: FRAGMENT_SHADER_SRC,
        vertex_entry: VERTEX_ENTRY,
        fragment_entry: FRAGMENT_ENTRY,
        locations,
    })
}

/// Parses and validates one WGSL stage.
pub fn compile(stage: ShaderStage, source: &str) -> Result<naga::Module, LinesError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| LinesError::ShaderCompile {
        stage,
        log: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| LinesError::ShaderCompile {
            stage,
            log: e.to_string(),
        })?;

    Ok(module)
}

/// Checks that `fragment` only reads what `vertex` writes, then queries the
/// `pos`/`col` attribute locations and the `u_mvp` uniform slot.
pub fn link(vertex: &naga::Module, fragment: &naga::Module) -> Result<ProgramLocations, LinesError> {
    let vs = entry_point(vertex, naga::ShaderStage::Vertex, VERTEX_ENTRY)?;
    let fs = entry_point(fragment, naga::ShaderStage::Fragment, FRAGMENT_ENTRY)?;

    let mut produced = Vec::new();
    if let Some(result) = &vs.function.result {
        collect_locations(vertex, result.ty, result.binding.as_ref(), &mut produced);
    }

    let mut consumed = Vec::new();
    for arg in &fs.function.arguments {
        collect_locations(fragment, arg.ty, arg.binding.as_ref(), &mut consumed);
    }

    for (location, inner) in &consumed {
        match produced.iter().find(|(l, _)| l == location) {
            Some((_, out)) if out == inner => {}
            Some((_, out)) => {
                return Err(link_error(format!(
                    "location {location}: vertex output {out:?} does not match fragment input {inner:?}"
                )));
            }
            None => {
                return Err(link_error(format!(
                    "location {location}: fragment input is not written by the vertex stage"
                )));
            }
        }
    }

    Ok(ProgramLocations {
        pos: attrib_location(vs, POS_ATTRIB)?,
        col: attrib_location(vs, COL_ATTRIB)?,
        mvp: uniform_slot(vertex, MVP_UNIFORM)?,
    })
}

fn link_error(log: String) -> LinesError {
    LinesError::ProgramLink { log }
}

fn entry_point<'m>(
    module: &'m naga::Module,
    stage: naga::ShaderStage,
    name: &str,
) -> Result<&'m naga::EntryPoint, LinesError> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage && ep.name == name)
        .ok_or_else(|| link_error(format!("missing {stage:?} entry point `{name}`")))
}

/// Flattens user-defined IO (skipping builtins) into `(location, type)` pairs.
fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<(u32, naga::TypeInner)>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        Some(_) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn attrib_location(vs: &naga::EntryPoint, name: &str) -> Result<u32, LinesError> {
    vs.function
        .arguments
        .iter()
        .filter(|arg| arg.name.as_deref() == Some(name))
        .find_map(|arg| match arg.binding {
            Some(naga::Binding::Location { location, .. }) => Some(location),
            _ => None,
        })
        .ok_or_else(|| link_error(format!("vertex attribute `{name}` not found")))
}

fn uniform_slot(module: &naga::Module, name: &str) -> Result<UniformSlot, LinesError> {
    module
        .global_variables
        .iter()
        .map(|(_, var)| var)
        .filter(|var| var.name.as_deref() == Some(name) && var.space == naga::AddressSpace::Uniform)
        .find_map(|var| var.binding.as_ref())
        .map(|rb| UniformSlot {
            group: rb.group,
            binding: rb.binding,
        })
        .ok_or_else(|| link_error(format!("uniform `{name}` not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex() -> naga::Module {
        compile(ShaderStage::Vertex, VERTEX_SHADER_SRC).unwrap()
    }

    #[test]
    fn fixed_program_builds() {
        let program = build_program().unwrap();
        assert_eq!(program.vertex_entry, "vs_main");
        assert_eq!(program.fragment_entry, "fs_main");
    }

    #[test]
    fn locations_are_queried_by_name() {
        let program = build_program().unwrap();
        assert_eq!(
            program.locations,
            ProgramLocations {
                pos: 0,
                col: 1,
                mvp: UniformSlot { group: 0, binding: 0 },
            }
        );
    }

    #[test]
    fn syntax_error_is_a_compile_error_for_that_stage() {
        let err = compile(ShaderStage::Fragment, "@fragment fn fs_main( {").unwrap_err();
        match err {
            LinesError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn type_error_is_a_compile_error() {
        let src = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return 1.0; }";
        let err = compile(ShaderStage::Vertex, src).unwrap_err();
        assert!(matches!(err, LinesError::ShaderCompile { stage: ShaderStage::Vertex, .. }));
    }

    #[test]
    fn unwritten_fragment_input_fails_to_link() {
        let fs = compile(
            ShaderStage::Fragment,
            "@fragment fn fs_main(@location(3) c: vec3<f32>) -> @location(0) vec4<f32> { return vec4<f32>(c, 1.0); }",
        )
        .unwrap();
        let err = link(&vertex(), &fs).unwrap_err();
        assert!(matches!(err, LinesError::ProgramLink { .. }));
    }

    #[test]
    fn mismatched_interface_type_fails_to_link() {
        let fs = compile(
            ShaderStage::Fragment,
            "@fragment fn fs_main(@location(0) c: vec4<f32>) -> @location(0) vec4<f32> { return c; }",
        )
        .unwrap();
        let err = link(&vertex(), &fs).unwrap_err();
        let LinesError::ProgramLink { log } = err else { panic!("expected link error") };
        assert!(log.contains("location 0"));
    }

    #[test]
    fn missing_attribute_name_fails_to_link() {
        let vs = compile(
            ShaderStage::Vertex,
            "@group(0) @binding(0) var<uniform> u_mvp: mat4x4<f32>;
             @vertex fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
                 return u_mvp * vec4<f32>(position, 1.0);
             }",
        )
        .unwrap();
        let fs = compile(
            ShaderStage::Fragment,
            "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
        )
        .unwrap();
        let err = link(&vs, &fs).unwrap_err();
        let LinesError::ProgramLink { log } = err else { panic!("expected link error") };
        assert!(log.contains("`pos`"));
    }

    #[test]
    fn wrong_entry_point_fails_to_link() {
        let fs = compile(
            ShaderStage::Fragment,
            "@fragment fn main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
        )
        .unwrap();
        assert!(matches!(link(&vertex(), &fs), Err(LinesError::ProgramLink { .. })));
    }
}
