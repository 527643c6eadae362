//! GPU device and window surface.
//!
//! [`GpuContext`] is the device/queue pair the render bridge builds on;
//! [`Gpu`] adds a window surface and frame acquisition on top of it.

mod context;
mod gpu;

pub use context::{GpuContext, GpuInit};
pub use gpu::{Gpu, GpuFrame, SurfaceErrorAction};
