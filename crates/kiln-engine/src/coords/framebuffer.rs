use winit::window::Window;

/// Drawable size in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FramebufferSize {
    pub width: u32,
    pub height: u32,
}

impl FramebufferSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-area framebuffer (minimized window) cannot be rendered to.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Live source of the current framebuffer size.
///
/// Implementations must answer with the size at call time; callers never
/// cache the result across a resize.
pub trait FramebufferSource {
    fn framebuffer_size(&self) -> FramebufferSize;
}

/// A fixed size, for offscreen targets.
impl FramebufferSource for FramebufferSize {
    fn framebuffer_size(&self) -> FramebufferSize {
        *self
    }
}

impl FramebufferSource for Window {
    fn framebuffer_size(&self) -> FramebufferSize {
        let size = self.inner_size();
        FramebufferSize::new(size.width, size.height)
    }
}

impl<T: FramebufferSource + ?Sized> FramebufferSource for std::sync::Arc<T> {
    fn framebuffer_size(&self) -> FramebufferSize {
        (**self).framebuffer_size()
    }
}
