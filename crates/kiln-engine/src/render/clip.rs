//! Rectangular clipping: scissor enable and UI-space to framebuffer-space
//! conversion.

use crate::coords::{FramebufferSize, Rect, ScissorRect};

use super::state::PipelineState;

/// How a clip-mask geometry combines with the current mask.
///
/// Only accepted for API completeness; mask rendering is not implemented.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClipMaskOperation {
    Set,
    SetInverse,
    Intersect,
}

/// Unsupported features that have already been reported once.
#[derive(Debug, Default, Clone, Copy)]
struct Reported {
    clip_mask: bool,
    transform: bool,
}

/// Drives the scissor portion of [`PipelineState`].
#[derive(Debug, Default)]
pub struct ClipController {
    reported: Reported,
}

impl ClipController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns the scissor test on or off. The last rectangle is kept.
    pub fn set_enabled(&self, state: &mut PipelineState, enabled: bool) {
        state.set_scissor_enabled(enabled);
    }

    /// Converts `rect` with the framebuffer height read now and makes it the
    /// active scissor rectangle.
    pub fn set_region(&self, state: &mut PipelineState, rect: Rect, framebuffer: FramebufferSize) -> ScissorRect {
        let scissor = ScissorRect::from_ui(rect, framebuffer.height);
        log::trace!("scissor {rect:?} -> {scissor:?} (fb height {})", framebuffer.height);
        state.set_scissor_rect(scissor);
        scissor
    }

    /// Clip masks are not supported; reports that once.
    pub fn clip_mask_requested(&mut self) {
        if !std::mem::replace(&mut self.reported.clip_mask, true) {
            log::debug!("clip masks are not supported; only rectangular scissor clipping applies");
        }
    }

    /// Non-translation transforms are not supported; reports that once.
    pub fn transform_requested(&mut self) {
        if !std::mem::replace(&mut self.reported.transform, true) {
            log::debug!("element transforms are not supported; geometry is placed by translation only");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_uses_supplied_height() {
        let clip = ClipController::new();
        let mut state = PipelineState::default();

        let rect = Rect::new(10, 20, 100, 50);
        clip.set_region(&mut state, rect, FramebufferSize::new(800, 600));
        assert_eq!(state.scissor_rect(), ScissorRect::new(10, 530, 100, 50));

        clip.set_region(&mut state, rect, FramebufferSize::new(800, 300));
        assert_eq!(state.scissor_rect(), ScissorRect::new(10, 230, 100, 50));
    }

    #[test]
    fn region_does_not_enable_scissor() {
        let clip = ClipController::new();
        let mut state = PipelineState::default();
        clip.set_region(&mut state, Rect::new(0, 0, 5, 5), FramebufferSize::new(10, 10));
        assert_eq!(state.effective_scissor(), None);

        clip.set_enabled(&mut state, true);
        assert_eq!(state.effective_scissor(), Some(ScissorRect::new(0, 5, 5, 5)));
    }

    #[test]
    fn unsupported_features_report_once() {
        let mut clip = ClipController::new();
        clip.clip_mask_requested();
        clip.clip_mask_requested();
        clip.transform_requested();
        assert!(clip.reported.clip_mask && clip.reported.transform);
    }
}
