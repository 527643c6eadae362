//! Cross-stage linking against the renderer's fixed pipeline interface.
//!
//! The interface every program must fit:
//! - vertex inputs: location 0 `vec2<f32>`, 1 `vec4<f32>`, 2 `vec2<f32>`
//!   (a stage may consume a subset)
//! - `@group(0) @binding(0)`: uniform block, at most [`MAX_UNIFORM_BLOCK`] bytes
//! - `@group(1) @binding(0)`: `texture_2d<f32>`, `@binding(1)`: filtering sampler
//! - fragment output: location 0 `vec4<f32>`

use super::error::{ShaderError, ShaderStage};
use super::reflect::{BindingKind, CompiledStage, IoType, UniformBlock};

pub const UNIFORM_GROUP: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;
pub const TEXTURE_BINDING: u32 = 0;
pub const SAMPLER_BINDING: u32 = 1;

/// Per-draw uniform slot size; one block must fit.
pub const MAX_UNIFORM_BLOCK: u32 = 256;

const VERTEX_INPUTS: [(u32, IoType); 3] = [(0, IoType::F32x2), (1, IoType::F32x4), (2, IoType::F32x2)];

/// Two stages known to agree with each other and with the pipeline interface.
#[derive(Debug, Clone)]
pub struct LinkedShader {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
    pub uniforms: UniformBlock,
    /// Name of the `texture_2d` variable, if any stage samples one.
    pub texture: Option<String>,
}

/// Links two compiled stages. Every problem found is reported in one log.
pub fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<LinkedShader, ShaderError> {
    debug_assert_eq!(vertex.stage, ShaderStage::Vertex);
    debug_assert_eq!(fragment.stage, ShaderStage::Fragment);

    let mut problems = Vec::new();

    for input in &vertex.inputs {
        match VERTEX_INPUTS.iter().find(|(loc, _)| *loc == input.location) {
            None => problems.push(format!(
                "vertex input @location({}) is not provided by the vertex layout",
                input.location
            )),
            Some((_, expected)) if *expected != input.ty => problems.push(format!(
                "vertex input @location({}) is {:?}, the vertex layout provides {:?}",
                input.location, input.ty, expected
            )),
            Some(_) => {}
        }
    }

    for input in &fragment.inputs {
        match vertex.outputs.iter().find(|o| o.location == input.location) {
            None => problems.push(format!(
                "fragment input @location({}) is not written by the vertex stage",
                input.location
            )),
            Some(out) if out.ty != input.ty => problems.push(format!(
                "fragment input @location({}) is {:?}, the vertex stage writes {:?}",
                input.location, input.ty, out.ty
            )),
            Some(_) => {}
        }
    }

    match fragment.outputs.as_slice() {
        [out] if out.location == 0 && out.ty == IoType::F32x4 => {}
        _ => problems.push("fragment stage must write exactly @location(0) vec4<f32>".to_string()),
    }

    let uniforms = merge_uniforms(&vertex, &fragment, &mut problems);
    let texture = check_resources(&vertex, &fragment, &mut problems);

    if !problems.is_empty() {
        return Err(ShaderError::Link { log: problems.join("\n") });
    }

    Ok(LinkedShader {
        vertex,
        fragment,
        uniforms,
        texture,
    })
}

fn merge_uniforms(
    vertex: &CompiledStage,
    fragment: &CompiledStage,
    problems: &mut Vec<String>,
) -> UniformBlock {
    let block_of = |stage: &CompiledStage| match stage.binding(UNIFORM_GROUP, 0).map(|b| &b.kind) {
        Some(BindingKind::UniformBlock(block)) => Some(block.clone()),
        _ => None,
    };

    let merged = match (block_of(vertex), block_of(fragment)) {
        (None, None) => UniformBlock::default(),
        (Some(block), None) | (None, Some(block)) => block,
        (Some(mut vs), Some(fs)) => {
            for member in fs.members {
                match vs.member(&member.name) {
                    Some(existing) if *existing != member => problems.push(format!(
                        "uniform `{}` is declared differently by the vertex and fragment stages",
                        member.name
                    )),
                    Some(_) => {}
                    None => vs.members.push(member),
                }
            }
            vs.size = vs.size.max(fs.size);
            vs
        }
    };

    if merged.size > MAX_UNIFORM_BLOCK {
        problems.push(format!(
            "uniform block is {} bytes, at most {MAX_UNIFORM_BLOCK} are supported",
            merged.size
        ));
    }

    merged
}

fn check_resources(
    vertex: &CompiledStage,
    fragment: &CompiledStage,
    problems: &mut Vec<String>,
) -> Option<String> {
    let mut texture = None;

    for stage in [vertex, fragment] {
        for b in &stage.bindings {
            let ok = match (b.group, b.binding, &b.kind) {
                (UNIFORM_GROUP, 0, BindingKind::UniformBlock(_)) => true,
                (TEXTURE_GROUP, TEXTURE_BINDING, BindingKind::Texture2d) => {
                    texture.get_or_insert_with(|| b.name.clone());
                    true
                }
                (TEXTURE_GROUP, SAMPLER_BINDING, BindingKind::FilteringSampler) => true,
                _ => false,
            };
            if !ok {
                problems.push(format!(
                    "{} stage binding @group({}) @binding({}) `{}` ({:?}) is not provided by the renderer",
                    stage.stage, b.group, b.binding, b.name, b.kind
                ));
            }
        }
    }

    texture
}
