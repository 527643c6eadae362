//! Coordinate types shared by the render bridge and the platform runtime.
//!
//! Two spaces are in play:
//! - UI space: origin top-left, +Y down, units are framebuffer pixels
//!   (the UI context is sized to the framebuffer).
//! - Framebuffer space: origin bottom-left, +Y up. Scissor rectangles are
//!   expressed here before they reach the GPU backend.

mod framebuffer;
mod rect;
mod scissor;

pub use framebuffer::{FramebufferSize, FramebufferSource};
pub use rect::Rect;
pub use scissor::ScissorRect;
