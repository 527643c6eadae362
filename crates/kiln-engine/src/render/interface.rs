use glam::{Mat4, Vec2};

use crate::coords::Rect;

use super::clip::ClipMaskOperation;
use super::handle::{GeometryHandle, TextureHandle};
use super::texture::TextureSize;
use super::vertex::Vertex;

/// Everything a UI layout engine needs from a renderer.
///
/// Invalid handles are never errors: every operation given an unknown or
/// released handle does nothing.
pub trait RenderInterface {
    /// Uploads geometry once; the slices may be dropped right after.
    fn compile_geometry(&mut self, vertices: &[Vertex], indices: &[u32]) -> GeometryHandle;

    /// Records one draw of `geometry` offset by `translation`, textured by
    /// `texture` or untextured when it is [`TextureHandle::NONE`].
    fn render_geometry(&mut self, geometry: GeometryHandle, translation: Vec2, texture: TextureHandle);

    fn release_geometry(&mut self, geometry: GeometryHandle);

    /// Loads a texture by source name. Returns the handle and the size that
    /// was actually uploaded.
    fn load_texture(&mut self, source: &str) -> (TextureHandle, TextureSize);

    /// Uploads tightly packed RGBA8 pixels.
    fn generate_texture(&mut self, pixels: &[u8], size: TextureSize) -> TextureHandle;

    fn release_texture(&mut self, texture: TextureHandle);

    fn enable_scissor_region(&mut self, enable: bool);

    /// Sets the clip rectangle in UI space (top-left origin).
    fn set_scissor_region(&mut self, region: Rect);

    /// Not supported: only rectangular clipping is available.
    fn enable_clip_mask(&mut self, _enable: bool) {}

    /// Not supported.
    fn render_to_clip_mask(&mut self, _operation: ClipMaskOperation, _geometry: GeometryHandle, _translation: Vec2) {}

    /// Not supported: geometry is placed by translation only.
    fn set_transform(&mut self, _transform: Option<&Mat4>) {}
}
