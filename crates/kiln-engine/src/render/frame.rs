use glam::Mat4;

use crate::coords::ScissorRect;

use super::device::GpuDevice;
use super::handle::{GeometryHandle, TextureHandle};

/// One recorded `render` call with every piece of state it depends on.
pub struct DrawCall<D: GpuDevice> {
    pub program: D::Program,
    pub geometry: D::Geometry,
    pub geometry_handle: GeometryHandle,
    pub index_count: u32,
    /// `None` draws with the white texture.
    pub texture: Option<D::Texture>,
    pub texture_handle: TextureHandle,
    /// Framebuffer-space rectangle, `None` when the scissor test is off.
    pub scissor: Option<ScissorRect>,
    pub model: Mat4,
    /// Snapshot of the program's uniform block.
    pub uniforms: Vec<u8>,
}

impl<D: GpuDevice> Clone for DrawCall<D> {
    fn clone(&self) -> Self {
        Self {
            program: self.program.clone(),
            geometry: self.geometry.clone(),
            geometry_handle: self.geometry_handle,
            index_count: self.index_count,
            texture: self.texture.clone(),
            texture_handle: self.texture_handle,
            scissor: self.scissor,
            model: self.model,
            uniforms: self.uniforms.clone(),
        }
    }
}

impl<D: GpuDevice> std::fmt::Debug for DrawCall<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawCall")
            .field("geometry", &self.geometry_handle)
            .field("index_count", &self.index_count)
            .field("texture", &self.texture_handle)
            .field("scissor", &self.scissor)
            .finish_non_exhaustive()
    }
}

/// Draws recorded since the last `begin_frame`, in submission order.
pub struct Frame<D: GpuDevice> {
    draws: Vec<DrawCall<D>>,
}

impl<D: GpuDevice> Default for Frame<D> {
    fn default() -> Self {
        Self { draws: Vec::new() }
    }
}

impl<D: GpuDevice> Frame<D> {
    #[inline]
    pub fn push(&mut self, draw: DrawCall<D>) {
        self.draws.push(draw);
    }

    #[inline]
    pub fn draws(&self) -> &[DrawCall<D>] {
        &self.draws
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Drops recorded draws but keeps the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.draws.clear();
    }
}
