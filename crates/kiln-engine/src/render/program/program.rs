use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat4;

use crate::render::device::GpuDevice;
use crate::render::state::PipelineState;

use super::error::{ShaderError, ShaderStage};
use super::link::{link, LinkedShader};
use super::reflect::{compile_stage, UniformBlock, UniformKind};

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique program identity, used to track the active program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(u64);

/// A linked vertex + fragment program and its CPU-side uniform storage.
///
/// Uniform setters write into a byte block laid out exactly like the WGSL
/// uniform struct. Each draw snapshots the block, so a value set before a
/// draw applies to that draw and every later one until it is set again.
pub struct Program<D: GpuDevice> {
    id: ProgramId,
    gpu: D::Program,
    uniforms: UniformBlock,
    block: Vec<u8>,
    texture: Option<String>,
}

impl<D: GpuDevice> Program<D> {
    /// Compiles both stages, links them, and creates the GPU program.
    ///
    /// Both stages are compiled even if the first fails; the vertex error is
    /// returned first. Linking is never attempted with a broken stage.
    pub fn compile(
        device: &mut D,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = compile_stage(ShaderStage::Vertex, vertex_source);
        let fragment = compile_stage(ShaderStage::Fragment, fragment_source);

        let (vertex, fragment) = match (vertex, fragment) {
            (Ok(v), Ok(f)) => (v, f),
            (Err(err), fragment) => {
                if let Err(also) = fragment {
                    log::error!("{also}");
                }
                return Err(err);
            }
            (Ok(_), Err(err)) => return Err(err),
        };

        let linked = link(vertex, fragment)?;
        let gpu = device.create_program(&linked)?;
        Ok(Self::from_linked(gpu, linked))
    }

    fn from_linked(gpu: D::Program, linked: LinkedShader) -> Self {
        let id = ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed));
        log::debug!(
            "program {id:?} linked: {} uniform(s), {} byte block, texture {:?}",
            linked.uniforms.members.len(),
            linked.uniforms.size,
            linked.texture
        );
        Self {
            id,
            gpu,
            block: vec![0; linked.uniforms.size as usize],
            uniforms: linked.uniforms,
            texture: linked.texture,
        }
    }

    #[inline]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    #[inline]
    pub fn gpu(&self) -> &D::Program {
        &self.gpu
    }

    /// Reflected uniform layout.
    #[inline]
    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    /// Current uniform block bytes.
    #[inline]
    pub fn uniform_bytes(&self) -> &[u8] {
        &self.block
    }

    /// Makes this program the active one in `state`.
    pub fn use_program(&self, state: &mut PipelineState) {
        state.use_program(self.id);
    }

    /// Uploads a 4×4 matrix uniform. Returns `false` (and changes nothing)
    /// if `name` is unknown or not a `mat4x4<f32>`.
    pub fn set_mat4(&mut self, name: &str, value: &Mat4) -> bool {
        self.write(name, UniformKind::Mat4, bytemuck::bytes_of(value))
    }

    /// Uploads an `i32` uniform, or selects the texture unit for the
    /// program's sampled texture. Only unit 0 exists.
    pub fn set_int(&mut self, name: &str, value: i32) -> bool {
        if self.texture.as_deref() == Some(name) {
            if value != 0 {
                log::debug!("program {:?}: texture unit {value} for `{name}` unsupported", self.id);
                return false;
            }
            return true;
        }
        self.write(name, UniformKind::Int, bytemuck::bytes_of(&value))
    }

    /// Reads back a matrix uniform.
    pub fn mat4(&self, name: &str) -> Option<Mat4> {
        let member = self.uniforms.member(name).filter(|m| m.kind == UniformKind::Mat4)?;
        let start = member.offset as usize;
        let bytes = self.block.get(start..start + 64)?;
        Some(Mat4::from_cols_array(&bytemuck::pod_read_unaligned::<[f32; 16]>(bytes)))
    }

    fn write(&mut self, name: &str, kind: UniformKind, bytes: &[u8]) -> bool {
        let Some(member) = self.uniforms.member(name) else {
            log::debug!("program {:?}: no uniform named `{name}`", self.id);
            return false;
        };
        if member.kind != kind {
            log::debug!(
                "program {:?}: uniform `{name}` is {:?}, not {kind:?}",
                self.id,
                member.kind
            );
            return false;
        }
        let start = member.offset as usize;
        let Some(dst) = self.block.get_mut(start..start + bytes.len()) else {
            return false;
        };
        dst.copy_from_slice(bytes);
        true
    }
}
