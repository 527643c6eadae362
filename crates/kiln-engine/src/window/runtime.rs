use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::{FramebufferSize, FramebufferSource};
use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "kiln".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Requests the application can make from inside a frame.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    exit: bool,
}

impl RuntimeCtx {
    /// Closes the window and leaves the event loop after this frame.
    pub fn exit(&mut self) {
        self.exit = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit
    }
}

/// Drives one window with continuous redraw.
pub struct Runtime;

impl Runtime {
    /// Runs until the window closes or the app exits. A window or GPU setup
    /// failure ends the loop and is returned here.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut handler = Handler {
            config,
            gpu_init,
            app,
            session: None,
            failure: None,
        };
        event_loop
            .run_app(&mut handler)
            .context("winit event loop terminated with error")?;

        handler.failure.map_or(Ok(()), Err)
    }
}

/// The open window and everything bound to it.
struct Session {
    // Declared before `window` so the surface is dropped first.
    gpu: Gpu,
    window: Arc<Window>,
    clock: FrameClock,
}

impl Session {
    fn open(event_loop: &ActiveEventLoop, config: &RuntimeConfig, gpu_init: &GpuInit) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.initial_size);
        let window = Arc::new(event_loop.create_window(attrs).context("failed to create window")?);

        let gpu = pollster::block_on(Gpu::new(window.clone(), gpu_init.clone()))
            .context("GPU initialization failed")?;

        Ok(Self { gpu, window, clock: FrameClock::default() })
    }

    fn id(&self) -> WindowId {
        self.window.id()
    }

    /// Renders one frame. Returns `false` when the app asked to stop.
    fn frame<A: App>(&mut self, app: &mut A) -> bool {
        // Minimized: nothing to present, and the surface is not reconfigured.
        if self.gpu.framebuffer_size().is_empty() {
            return true;
        }

        let mut runtime = RuntimeCtx::default();
        let mut ctx = FrameCtx {
            window: WindowCtx { id: self.id(), window: &self.window },
            gpu: &mut self.gpu,
            time: self.clock.tick(),
            runtime: &mut runtime,
        };
        let control = app.on_frame(&mut ctx);
        control == AppControl::Continue && !runtime.exit_requested()
    }
}

struct Handler<A: App + 'static> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    session: Option<Session>,
    failure: Option<anyhow::Error>,
}

impl<A: App + 'static> Handler<A> {
    /// Drops the window (and its surface) before leaving the loop.
    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        self.session = None;
        event_loop.exit();
    }
}

impl<A: App + 'static> ApplicationHandler for Handler<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        match Session::open(event_loop, &self.config, &self.gpu_init) {
            Ok(session) => {
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(err) => {
                log::error!("failed to open window: {err:#}");
                self.failure = Some(err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = &self.session {
            session.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(session) = self.session.as_mut() else { return };
        if session.id() != window_id {
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.shut_down(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.shut_down(event_loop),
            WindowEvent::Resized(size) => {
                log::debug!("window resized to {}x{}", size.width, size.height);
                session.gpu.resize(FramebufferSize::new(size.width, size.height));
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = session.window.framebuffer_size();
                session.gpu.resize(size);
            }
            WindowEvent::RedrawRequested => {
                if !session.frame(&mut self.app) {
                    self.shut_down(event_loop);
                }
            }
            _ => {}
        }
    }
}
