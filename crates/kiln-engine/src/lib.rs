//! Kiln engine crate.
//!
//! Platform + GPU runtime pieces (window loop, surface, frame clock, logging)
//! and the render bridge a UI layout engine draws through.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
