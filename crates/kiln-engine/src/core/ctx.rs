use std::sync::Arc;

use winit::window::{Window, WindowId};

use crate::coords::FramebufferSize;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::RenderTarget;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Arc<Window>,
}

impl<'a> WindowCtx<'a> {
    /// Returns the drawable size in physical pixels, read now.
    pub fn framebuffer_size(&self) -> FramebufferSize {
        let size = self.window.inner_size();
        FramebufferSize::new(size.width, size.height)
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// `'a` is the duration of the callback invocation.
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a> FrameCtx<'a> {
    /// Clears the surface with `clear`, calls `draw` with a ready
    /// [`RenderTarget`], then presents the frame.
    ///
    /// Surface errors are handled here: a lost or outdated surface is
    /// reconfigured and the frame skipped, out-of-memory asks the runtime to exit.
    pub fn render<F>(&mut self, clear: wgpu::Color, draw: F) -> AppControl
    where
        F: FnOnce(&mut RenderTarget<'_>),
    {
        let mut frame = match self.gpu.acquire() {
            Ok(frame) => frame,
            Err(SurfaceErrorAction::Fatal) => {
                log::error!("surface is unrecoverable; exiting");
                return AppControl::Exit;
            }
            Err(_) => return AppControl::Continue,
        };

        frame.clear(clear);
        draw(&mut frame.target());

        self.window.window.pre_present_notify();
        self.gpu.present(frame);
        AppControl::Continue
    }
}
