//! Shader program object.
//!
//! WGSL stages are compiled and reflected with naga before anything reaches
//! the GPU, so compile and link failures come back as [`ShaderError`] values
//! with the compiler diagnostic instead of a device panic.

mod error;
mod link;
mod program;
mod reflect;

pub use error::{ShaderError, ShaderStage};
pub use link::{
    LinkedShader, MAX_UNIFORM_BLOCK, SAMPLER_BINDING, TEXTURE_BINDING, TEXTURE_GROUP, UNIFORM_GROUP,
};
pub use program::{Program, ProgramId};
pub use reflect::{CompiledStage, UniformBlock, UniformKind, UniformMember};
