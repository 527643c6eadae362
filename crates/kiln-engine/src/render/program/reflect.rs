//! Per-stage WGSL compilation and interface reflection.
//!
//! A stage is parsed and validated with naga on its own; nothing here knows
//! about the other stage. Cross-stage checks live in `link`.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::error::{ShaderError, ShaderStage};

/// Type of a value crossing a stage boundary (vertex input, inter-stage
/// varying, fragment output).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IoType {
    F32x2,
    F32x3,
    F32x4,
    Other,
}

/// A `@location(n)` slot on an entry point's input or output.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IoLocation {
    pub location: u32,
    pub ty: IoType,
}

/// Uniform value types the program can upload by name.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformKind {
    Mat4,
    Int,
    /// Present in the block but not settable through the program API.
    Other,
}

impl UniformKind {
    pub fn size(self) -> u32 {
        match self {
            UniformKind::Mat4 => 64,
            UniformKind::Int => 4,
            UniformKind::Other => 0,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub kind: UniformKind,
}

/// Layout of the uniform buffer bound at `@group(0) @binding(0)`.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UniformBlock {
    /// Size in bytes as laid out by WGSL.
    pub size: u32,
    pub members: Vec<UniformMember>,
}

impl UniformBlock {
    pub fn member(&self, name: &str) -> Option<&UniformMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// What a resource binding holds.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BindingKind {
    UniformBlock(UniformBlock),
    Texture2d,
    FilteringSampler,
    /// Anything else; the string describes it for diagnostics.
    Other(String),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResourceBinding {
    pub group: u32,
    pub binding: u32,
    pub name: String,
    pub kind: BindingKind,
}

/// A single stage after successful compilation.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub source: String,
    pub entry_point: String,
    pub inputs: Vec<IoLocation>,
    pub outputs: Vec<IoLocation>,
    pub bindings: Vec<ResourceBinding>,
}

impl CompiledStage {
    pub fn binding(&self, group: u32, binding: u32) -> Option<&ResourceBinding> {
        self.bindings.iter().find(|b| b.group == group && b.binding == binding)
    }
}

/// Parses, validates and reflects one stage.
pub fn compile_stage(stage: ShaderStage, source: &str) -> Result<CompiledStage, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| ShaderError::Compile {
        stage,
        log: err.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|err| ShaderError::Compile {
            stage,
            log: err.emit_to_string(source),
        })?;

    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };

    let mut entries = module.entry_points.iter().filter(|ep| ep.stage == naga_stage);
    let entry = entries.next().ok_or_else(|| ShaderError::Compile {
        stage,
        log: format!("no @{stage} entry point"),
    })?;
    if let Some(extra) = entries.next() {
        return Err(ShaderError::Compile {
            stage,
            log: format!(
                "multiple @{stage} entry points (`{}`, `{}`); exactly one is required",
                entry.name, extra.name
            ),
        });
    }

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_locations(&module, arg.binding.as_ref(), arg.ty, &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_locations(&module, result.binding.as_ref(), result.ty, &mut outputs);
    }

    let bindings = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| {
            let rb = var.binding.as_ref()?;
            let name = var.name.clone().unwrap_or_default();
            Some(ResourceBinding {
                group: rb.group,
                binding: rb.binding,
                kind: binding_kind(&module, var, &name),
                name,
            })
        })
        .collect();

    Ok(CompiledStage {
        stage,
        source: source.to_string(),
        entry_point: entry.name.clone(),
        inputs,
        outputs,
        bindings,
    })
}

fn collect_locations(
    module: &naga::Module,
    binding: Option<&naga::Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut Vec<IoLocation>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(IoLocation {
            location: *location,
            ty: io_type(&module.types[ty].inner),
        }),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.binding.as_ref(), member.ty, out);
                }
            }
        }
    }
}

fn io_type(inner: &naga::TypeInner) -> IoType {
    match inner {
        naga::TypeInner::Vector { size, scalar } if *scalar == naga::Scalar::F32 => match size {
            naga::VectorSize::Bi => IoType::F32x2,
            naga::VectorSize::Tri => IoType::F32x3,
            naga::VectorSize::Quad => IoType::F32x4,
        },
        _ => IoType::Other,
    }
}

fn uniform_kind(inner: &naga::TypeInner) -> UniformKind {
    match inner {
        naga::TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if *scalar == naga::Scalar::F32 => UniformKind::Mat4,
        naga::TypeInner::Scalar(scalar) if *scalar == naga::Scalar::I32 => UniformKind::Int,
        _ => UniformKind::Other,
    }
}

fn binding_kind(module: &naga::Module, var: &naga::GlobalVariable, name: &str) -> BindingKind {
    let inner = &module.types[var.ty].inner;
    match (var.space, inner) {
        (naga::AddressSpace::Uniform, naga::TypeInner::Struct { members, span }) => {
            BindingKind::UniformBlock(UniformBlock {
                size: *span,
                members: members
                    .iter()
                    .filter_map(|m| {
                        Some(UniformMember {
                            name: m.name.clone()?,
                            offset: m.offset,
                            kind: uniform_kind(&module.types[m.ty].inner),
                        })
                    })
                    .collect(),
            })
        }
        // A bare `var<uniform> x: mat4x4<f32>` is a block with one member named after the variable.
        (naga::AddressSpace::Uniform, other) => BindingKind::UniformBlock(UniformBlock {
            size: other.size(module.to_ctx()),
            members: vec![UniformMember {
                name: name.to_string(),
                offset: 0,
                kind: uniform_kind(other),
            }],
        }),
        (
            naga::AddressSpace::Handle,
            naga::TypeInner::Image {
                dim: naga::ImageDimension::D2,
                arrayed: false,
                class: naga::ImageClass::Sampled { kind: naga::ScalarKind::Float, multi: false },
            },
        ) => BindingKind::Texture2d,
        (naga::AddressSpace::Handle, naga::TypeInner::Sampler { comparison: false }) => {
            BindingKind::FilteringSampler
        }
        (space, _) => BindingKind::Other(format!("{space:?} `{name}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{UI_FRAGMENT_WGSL, UI_VERTEX_WGSL};

    #[test]
    fn ui_vertex_stage_reflects_inputs_and_uniforms() {
        let stage = compile_stage(ShaderStage::Vertex, UI_VERTEX_WGSL).unwrap();
        assert_eq!(stage.entry_point, "vs_main");

        let locations: Vec<(u32, IoType)> =
            stage.inputs.iter().map(|io| (io.location, io.ty)).collect();
        assert_eq!(
            locations,
            vec![(0, IoType::F32x2), (1, IoType::F32x4), (2, IoType::F32x2)]
        );

        let Some(BindingKind::UniformBlock(block)) = stage.binding(0, 0).map(|b| &b.kind) else {
            panic!("expected a uniform block at group 0 binding 0");
        };
        assert_eq!(block.size, 128);
        assert_eq!(block.member("projection").map(|m| (m.offset, m.kind)), Some((0, UniformKind::Mat4)));
        assert_eq!(block.member("model").map(|m| (m.offset, m.kind)), Some((64, UniformKind::Mat4)));
    }

    #[test]
    fn ui_fragment_stage_reflects_texture_pair() {
        let stage = compile_stage(ShaderStage::Fragment, UI_FRAGMENT_WGSL).unwrap();
        assert_eq!(stage.entry_point, "fs_main");
        assert_eq!(stage.binding(1, 0).map(|b| &b.kind), Some(&BindingKind::Texture2d));
        assert_eq!(stage.binding(1, 1).map(|b| &b.kind), Some(&BindingKind::FilteringSampler));
        assert_eq!(stage.outputs.len(), 1);
        assert_eq!(stage.outputs[0].location, 0);
    }

    #[test]
    fn syntax_error_reports_stage_and_diagnostic() {
        let err = compile_stage(ShaderStage::Fragment, "fn broken( {").unwrap_err();
        assert_eq!(err.stage(), Some(ShaderStage::Fragment));
        assert!(!err.log().is_empty());
    }

    #[test]
    fn validation_error_is_a_compile_error() {
        // Returns an i32 where vec4<f32> is declared.
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1; }";
        let err = compile_stage(ShaderStage::Fragment, src).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Fragment, .. }));
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = compile_stage(ShaderStage::Vertex, UI_FRAGMENT_WGSL).unwrap_err();
        assert_eq!(err.stage(), Some(ShaderStage::Vertex));
        assert!(err.log().contains("no @vertex entry point"));
    }

    #[test]
    fn bare_uniform_is_a_single_member_block() {
        let src = r#"
            @group(0) @binding(0) var<uniform> scale: i32;
            @vertex fn vs_main(@location(0) p: vec2<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(p * f32(scale), 0.0, 1.0);
            }
        "#;
        let stage = compile_stage(ShaderStage::Vertex, src).unwrap();
        let Some(BindingKind::UniformBlock(block)) = stage.binding(0, 0).map(|b| &b.kind) else {
            panic!("expected a uniform block");
        };
        assert_eq!(block.member("scale").map(|m| m.kind), Some(UniformKind::Int));
        assert_eq!(block.size, 4);
        assert!(stage.outputs.is_empty());
    }
}
