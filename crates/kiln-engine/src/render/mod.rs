//! Render bridge between a UI layout engine and the GPU.
//!
//! The UI engine talks to [`Renderer`] through [`RenderInterface`]:
//! geometry and textures live behind opaque handles, and each
//! `render_geometry` call is recorded with the pipeline state current at the
//! time. [`Renderer::encode`] replays the recorded draws in order.
//!
//! Convention:
//! - UI geometry is in physical pixels (top-left origin, +Y down).
//! - Scissor rectangles are stored in framebuffer space (bottom-left origin).

mod clip;
mod ctx;
mod decode;
mod device;
mod frame;
mod geometry;
mod handle;
mod interface;
mod program;
mod renderer;
mod state;
mod texture;
mod vertex;
mod wgpu_device;

#[cfg(test)]
pub(crate) mod testing;

pub use clip::{ClipController, ClipMaskOperation};
pub use ctx::RenderTarget;
pub use decode::{DecodeError, DecodedImage, FileDecoder, PlaceholderDecoder, TextureDecoder};
pub use device::GpuDevice;
pub use frame::{DrawCall, Frame};
pub use geometry::{GeometryEntry, GeometryIssues, GeometryTable};
pub use handle::{GeometryHandle, Handle, HandleArena, TextureHandle};
pub use interface::RenderInterface;
pub use program::{
    CompiledStage, LinkedShader, Program, ProgramId, ShaderError, ShaderStage, UniformBlock, UniformKind,
    UniformMember,
};
pub use renderer::{ui_projection, Renderer, RendererConfig};
pub use state::PipelineState;
pub use texture::{TextureEntry, TextureSize, TextureTable, WHITE_PIXEL};
pub use vertex::Vertex;
pub use wgpu_device::{GeometryBuffers, ProgramPipeline, TextureBinding, WgpuDevice};

/// Vertex stage of the stock UI program.
pub const UI_VERTEX_WGSL: &str = include_str!("shaders/ui.vert.wgsl");
/// Fragment stage of the stock UI program: vertex color times the sampled texel.
pub const UI_FRAGMENT_WGSL: &str = include_str!("shaders/ui.frag.wgsl");
