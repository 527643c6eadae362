use glam::{Mat4, Vec2};

use crate::coords::{FramebufferSize, Rect};

use super::clip::{ClipController, ClipMaskOperation};
use super::decode::TextureDecoder;
use super::device::GpuDevice;
use super::frame::{DrawCall, Frame};
use super::geometry::GeometryTable;
use super::handle::{GeometryHandle, TextureHandle};
use super::interface::RenderInterface;
use super::program::{Program, ShaderError};
use super::state::PipelineState;
use super::texture::{TextureSize, TextureTable};
use super::vertex::Vertex;
use super::wgpu_device::WgpuDevice;
use super::ctx::RenderTarget;

/// Uniform names the renderer writes into the attached program.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// `mat4x4<f32>`, set once per frame.
    pub projection_uniform: String,
    /// `mat4x4<f32>`, set once per draw.
    pub model_uniform: String,
    /// `texture_2d<f32>` bound to unit 0.
    pub texture_uniform: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            projection_uniform: "projection".to_string(),
            model_uniform: "model".to_string(),
            texture_uniform: "ui_texture".to_string(),
        }
    }
}

/// Orthographic projection mapping UI-space pixels (top-left origin, +Y
/// down) onto the whole framebuffer.
pub fn ui_projection(size: FramebufferSize) -> Mat4 {
    let w = size.width.max(1) as f32;
    let h = size.height.max(1) as f32;
    Mat4::orthographic_rh(0.0, w, h, 0.0, -1.0, 1.0)
}

/// The render bridge: resource tables, the attached program, and the draws
/// recorded for the current frame.
///
/// Single-threaded; drive it from the thread that owns the GPU context.
pub struct Renderer<D: GpuDevice> {
    device: D,
    config: RendererConfig,
    program: Option<Program<D>>,
    geometries: GeometryTable<D>,
    textures: TextureTable<D>,
    decoder: Box<dyn TextureDecoder>,
    state: PipelineState,
    clip: ClipController,
    frame: Frame<D>,
}

impl<D: GpuDevice> Renderer<D> {
    pub fn new(device: D, decoder: Box<dyn TextureDecoder>, config: RendererConfig) -> Self {
        Self {
            device,
            config,
            program: None,
            geometries: GeometryTable::new(),
            textures: TextureTable::new(),
            decoder,
            state: PipelineState::default(),
            clip: ClipController::new(),
            frame: Frame::default(),
        }
    }

    /// Compiles a program against this renderer's device.
    pub fn compile_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<Program<D>, ShaderError> {
        Program::compile(&mut self.device, vertex_source, fragment_source)
    }

    /// Makes `program` the one every draw uses. Returns the previous one.
    pub fn attach_program(&mut self, program: Program<D>) -> Option<Program<D>> {
        for name in [&self.config.projection_uniform, &self.config.model_uniform] {
            if program.uniforms().member(name).is_none() {
                log::warn!("attached program {:?} has no uniform `{name}`", program.id());
            }
        }
        self.program.replace(program)
    }

    /// Detaches the program; `render_geometry` does nothing until another is attached.
    pub fn detach_program(&mut self) -> Option<Program<D>> {
        self.program.take()
    }

    /// Starts a new frame: drops the previous recording and uploads a
    /// projection sized to the framebuffer as it is now.
    pub fn begin_frame(&mut self) {
        self.frame.clear();
        let size = self.device.framebuffer_size();
        let Some(program) = self.program.as_mut() else { return };
        program.use_program(&mut self.state);
        program.set_mat4(&self.config.projection_uniform, &ui_projection(size));
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    #[inline]
    pub fn program(&self) -> Option<&Program<D>> {
        self.program.as_ref()
    }

    #[inline]
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    #[inline]
    pub fn frame(&self) -> &Frame<D> {
        &self.frame
    }

    #[inline]
    pub fn geometries(&self) -> &GeometryTable<D> {
        &self.geometries
    }

    #[inline]
    pub fn textures(&self) -> &TextureTable<D> {
        &self.textures
    }
}

impl<D: GpuDevice> RenderInterface for Renderer<D> {
    fn compile_geometry(&mut self, vertices: &[Vertex], indices: &[u32]) -> GeometryHandle {
        self.geometries.compile(&mut self.device, vertices, indices)
    }

    fn render_geometry(&mut self, geometry: GeometryHandle, translation: Vec2, texture: TextureHandle) {
        let Some(entry) = self.geometries.get(geometry) else {
            log::trace!("render of unknown geometry {geometry:?} ignored");
            return;
        };
        let Some(program) = self.program.as_mut() else {
            log::trace!("render with no program attached ignored");
            return;
        };

        let previous_blend = self.state.blend_enabled();
        self.state.set_blend(true);

        program.use_program(&mut self.state);
        let model = Mat4::from_translation(translation.extend(0.0));
        program.set_mat4(&self.config.model_uniform, &model);
        program.set_int(&self.config.texture_uniform, 0);

        let bound = self.textures.get(texture);
        self.state.bind_texture(if bound.is_some() { texture } else { TextureHandle::NONE });

        if entry.index_count > 0 {
            self.frame.push(DrawCall {
                program: program.gpu().clone(),
                geometry: entry.gpu.clone(),
                geometry_handle: geometry,
                index_count: entry.index_count,
                texture: bound.map(|t| t.gpu.clone()),
                texture_handle: self.state.bound_texture(),
                scissor: self.state.effective_scissor(),
                model,
                uniforms: program.uniform_bytes().to_vec(),
            });
        }

        self.state.set_blend(previous_blend);
    }

    fn release_geometry(&mut self, geometry: GeometryHandle) {
        self.geometries.release(&mut self.device, geometry);
    }

    fn load_texture(&mut self, source: &str) -> (TextureHandle, TextureSize) {
        self.textures.load(&mut self.device, self.decoder.as_ref(), source)
    }

    fn generate_texture(&mut self, pixels: &[u8], size: TextureSize) -> TextureHandle {
        self.textures.generate(&mut self.device, pixels, size)
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        self.textures.release(&mut self.device, texture);
    }

    fn enable_scissor_region(&mut self, enable: bool) {
        self.clip.set_enabled(&mut self.state, enable);
    }

    fn set_scissor_region(&mut self, region: Rect) {
        let framebuffer = self.device.framebuffer_size();
        self.clip.set_region(&mut self.state, region, framebuffer);
    }

    fn enable_clip_mask(&mut self, enable: bool) {
        if enable {
            self.clip.clip_mask_requested();
        }
    }

    fn render_to_clip_mask(&mut self, _operation: ClipMaskOperation, _geometry: GeometryHandle, _translation: Vec2) {
        self.clip.clip_mask_requested();
    }

    fn set_transform(&mut self, transform: Option<&Mat4>) {
        if transform.is_some() {
            self.clip.transform_requested();
        }
    }
}

impl Renderer<WgpuDevice> {
    /// Encodes the draws recorded since `begin_frame` into `target`.
    pub fn encode(&mut self, target: &mut RenderTarget<'_>) {
        self.device.encode(&self.frame, target);
    }
}

impl<D: GpuDevice> Drop for Renderer<D> {
    fn drop(&mut self) {
        let geometries = self.geometries.release_all(&mut self.device);
        let textures = self.textures.release_all(&mut self.device);
        if geometries + textures > 0 {
            log::debug!("renderer dropped with {geometries} geometries and {textures} textures still live");
        }
    }
}
