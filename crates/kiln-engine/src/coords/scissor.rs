use super::{FramebufferSize, Rect};

/// Scissor rectangle in framebuffer space (bottom-left origin, +Y up).
///
/// Values are signed: a UI rectangle that extends past the framebuffer
/// converts to a rectangle that extends past it too. Clamping happens only
/// when the rectangle is handed to the GPU.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ScissorRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Converts a UI-space rectangle using the framebuffer height `fb_height`.
    ///
    /// `y = H - rect.bottom()`; X, width and height are unchanged.
    #[inline]
    pub fn from_ui(rect: Rect, fb_height: u32) -> Self {
        let h = i32::try_from(fb_height).unwrap_or(i32::MAX);
        Self::new(rect.left, h.saturating_sub(rect.bottom()), rect.width, rect.height)
    }

    /// Converts back to a top-left-origin rectangle clamped to `target`.
    ///
    /// Returns `(x, y, w, h)` ready for `wgpu::RenderPass::set_scissor_rect`,
    /// or `None` if nothing of the rectangle lies inside the target (the draw
    /// must be skipped: wgpu rejects zero-area scissors on some backends).
    pub fn to_target(self, target: FramebufferSize) -> Option<(u32, u32, u32, u32)> {
        let th = i32::try_from(target.height).unwrap_or(i32::MAX);
        let tw = i32::try_from(target.width).unwrap_or(i32::MAX);

        let top = th.saturating_sub(self.y.saturating_add(self.height));
        let ui = Rect::new(self.x, top, self.width, self.height);
        let clipped = ui.intersect(Rect::new(0, 0, tw, th))?;

        // Intersection with a rect rooted at the origin is non-negative.
        Some((
            clipped.left as u32,
            clipped.top as u32,
            clipped.width as u32,
            clipped.height as u32,
        ))
    }
}
