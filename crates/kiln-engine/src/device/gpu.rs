use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::window::Window;

use crate::coords::FramebufferSize;
use crate::render::RenderTarget;

use super::context::{GpuContext, GpuInit};

/// A window surface on top of a [`GpuContext`].
///
/// Holds an `Arc<Window>` through the surface, so it cannot outlive the window.
pub struct Gpu {
    context: GpuContext,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    /// Last size reported by the window, possibly zero while the surface
    /// keeps its previous configuration.
    size: FramebufferSize,
}

/// One acquired swapchain image and the encoder recording into it.
///
/// Hand it back through [`Gpu::present`] promptly; holding it blocks the
/// next acquire.
pub struct GpuFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    size: FramebufferSize,
}

/// What the caller should do after a failed acquire.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was reconfigured; try again next frame.
    Reconfigured,
    SkipFrame,
    /// Out of memory; stop rendering.
    Fatal,
}

impl SurfaceErrorAction {
    pub fn classify(err: &SurfaceError) -> Self {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout | SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

impl Gpu {
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let inner = window.inner_size();
        let size = FramebufferSize::new(inner.width, inner.height);
        anyhow::ensure!(!size.is_empty(), "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can present to this window")?;
        let context = GpuContext::open(&adapter, &init).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps.formats, init.prefer_srgb)
            .context("surface reports no formats")?;
        let alpha_mode = init
            .alpha_mode
            .filter(|m| caps.alpha_modes.contains(m))
            .or_else(|| caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.frame_latency,
        };
        surface.configure(context.device(), &config);
        log::info!("surface {format:?} {}x{}", size.width, size.height);

        Ok(Self { context, surface, config, size })
    }

    /// Device and queue, for building the render bridge.
    #[inline]
    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    #[inline]
    pub fn framebuffer_size(&self) -> FramebufferSize {
        self.size
    }

    /// Reconfigures the surface. A zero size is remembered but not applied
    /// (wgpu rejects it); the next non-zero size reconfigures.
    pub fn resize(&mut self, size: FramebufferSize) {
        self.size = size;
        if size.is_empty() {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(self.context.device(), &self.config);
    }

    /// Acquires the next swapchain image. A lost or outdated surface is
    /// reconfigured before the error is returned.
    pub fn acquire(&mut self) -> std::result::Result<GpuFrame, SurfaceErrorAction> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => {
                let action = SurfaceErrorAction::classify(&err);
                log::debug!("surface error {err:?}: {action:?}");
                if action == SurfaceErrorAction::Reconfigured && !self.size.is_empty() {
                    self.surface.configure(self.context.device(), &self.config);
                }
                return Err(action);
            }
        };

        let size = FramebufferSize::new(surface_texture.texture.width(), surface_texture.texture.height());
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("kiln frame encoder"),
            });

        Ok(GpuFrame { surface_texture, view, encoder, size })
    }

    /// Submits the frame's commands and presents it.
    pub fn present(&self, frame: GpuFrame) {
        let GpuFrame { surface_texture, view, encoder, .. } = frame;
        self.context.queue().submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }
}

impl GpuFrame {
    /// Size of the acquired image, which may lag a resize by one frame.
    #[inline]
    pub fn size(&self) -> FramebufferSize {
        self.size
    }

    /// Clears the whole image to `color`.
    pub fn clear(&mut self, color: wgpu::Color) {
        let _pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kiln clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    /// Borrows the image as a target for [`crate::render::Renderer::encode`].
    pub fn target(&mut self) -> RenderTarget<'_> {
        RenderTarget::new(&mut self.encoder, &self.view, self.size)
    }
}

/// First format matching the sRGB preference, else the surface's first.
fn choose_surface_format(formats: &[wgpu::TextureFormat], prefer_srgb: bool) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| f.is_srgb() == prefer_srgb)
        .or_else(|| formats.first().copied())
}
