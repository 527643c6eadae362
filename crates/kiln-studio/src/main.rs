use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use kiln_engine::coords::FramebufferSource;
use kiln_engine::core::{App, AppControl, FrameCtx};
use kiln_engine::device::GpuInit;
use kiln_engine::logging::{init_logging, LoggingConfig};
use kiln_engine::render::{
    FileDecoder, Renderer, RendererConfig, WgpuDevice, UI_FRAGMENT_WGSL, UI_VERTEX_WGSL,
};
use kiln_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

mod document;

use document::Document;

/// Directory `load_texture` sources are resolved against.
const ASSET_ROOT_ENV: &str = "KILN_ASSET_ROOT";

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.09,
    b: 0.11,
    a: 1.0,
};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let asset_root = std::env::var_os(ASSET_ROOT_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./"));
    log::info!("asset root: {}", asset_root.display());

    let config = RuntimeConfig {
        title: "kiln studio".to_string(),
        initial_size: LogicalSize::new(800.0, 600.0),
    };

    Runtime::run(config, GpuInit::default(), Studio::new(asset_root))
}

/// The renderer and the document it draws. Both are created on the first
/// frame, once a GPU exists, and torn down together.
struct Studio {
    asset_root: PathBuf,
    scene: Option<(Renderer<WgpuDevice>, Document)>,
}

impl Studio {
    fn new(asset_root: PathBuf) -> Self {
        Self { asset_root, scene: None }
    }

    fn build_scene(&self, ctx: &FrameCtx<'_>) -> Result<(Renderer<WgpuDevice>, Document)> {
        let framebuffer: Arc<dyn FramebufferSource> = ctx.window.window.clone();
        let device = WgpuDevice::new(ctx.gpu.context(), ctx.gpu.surface_format(), framebuffer);
        let mut renderer = Renderer::new(
            device,
            Box::new(FileDecoder::new(&self.asset_root)),
            RendererConfig::default(),
        );

        let program = renderer
            .compile_program(UI_VERTEX_WGSL, UI_FRAGMENT_WGSL)
            .context("failed to build the UI shader program")?;
        renderer.attach_program(program);

        let document = Document::build(&mut renderer);
        log::debug!("document ready, logo {:?}", document.logo_size());
        Ok((renderer, document))
    }
}

impl App for Studio {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        if self.scene.is_none() {
            match self.build_scene(ctx) {
                Ok(scene) => self.scene = Some(scene),
                Err(err) => {
                    log::error!("{err:#}");
                    return AppControl::Exit;
                }
            }
        }
        let Some((renderer, document)) = self.scene.as_mut() else {
            return AppControl::Exit;
        };

        renderer.begin_frame();
        document.render(&mut *renderer, ctx.time.elapsed);

        ctx.render(CLEAR, |target| renderer.encode(target))
    }
}

impl Drop for Studio {
    fn drop(&mut self) {
        if let Some((mut renderer, document)) = self.scene.take() {
            document.release(&mut renderer);
        }
    }
}
