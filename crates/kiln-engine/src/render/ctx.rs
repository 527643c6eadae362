use crate::coords::FramebufferSize;

/// Target for drawing (encoder + color view of the acquired frame).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    /// Size of `color_view` in physical pixels.
    pub size: FramebufferSize,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        size: FramebufferSize,
    ) -> Self {
        Self { encoder, color_view, size }
    }
}
