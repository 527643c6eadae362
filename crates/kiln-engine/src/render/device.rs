use crate::coords::FramebufferSize;

use super::program::{LinkedShader, ShaderError};
use super::texture::TextureSize;
use super::vertex::Vertex;

/// GPU object factory used by the render bridge.
///
/// Associated types are reference-counted GPU objects: cloning one into a
/// recorded draw keeps it alive until the frame is encoded, even if the UI
/// engine releases its handle in between.
///
/// Implementations are driven from the thread owning the graphics context.
pub trait GpuDevice {
    type Program: Clone;
    type Geometry: Clone;
    type Texture: Clone;

    /// Builds pipelines for a linked program.
    fn create_program(&mut self, shader: &LinkedShader) -> Result<Self::Program, ShaderError>;

    /// Uploads vertex and index data once as immutable buffers.
    fn create_geometry(&mut self, vertices: &[Vertex], indices: &[u32]) -> Self::Geometry;

    fn release_geometry(&mut self, geometry: Self::Geometry);

    /// Uploads tightly packed RGBA8 pixels. `pixels.len()` is
    /// `size.width * size.height * 4`; callers check this.
    fn create_texture(&mut self, size: TextureSize, pixels: &[u8]) -> Self::Texture;

    fn release_texture(&mut self, texture: Self::Texture);

    /// Largest width or height `create_texture` accepts.
    fn max_texture_dimension(&self) -> u32;

    /// Framebuffer size right now.
    fn framebuffer_size(&self) -> FramebufferSize;
}
