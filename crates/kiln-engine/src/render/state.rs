use crate::coords::ScissorRect;

use super::handle::TextureHandle;
use super::program::ProgramId;

/// CPU mirror of the fixed-function state a draw depends on.
///
/// Mutations take effect for draws recorded after them, the way global GL
/// state would. Each recorded draw snapshots what it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineState {
    active_program: Option<ProgramId>,
    blend: bool,
    scissor_enabled: bool,
    scissor: ScissorRect,
    /// Texture unit 0.
    bound_texture: TextureHandle,
}

impl PipelineState {
    #[inline]
    pub fn use_program(&mut self, program: ProgramId) {
        self.active_program = Some(program);
    }

    #[inline]
    pub fn active_program(&self) -> Option<ProgramId> {
        self.active_program
    }

    /// Source-alpha / one-minus-source-alpha blending on or off.
    #[inline]
    pub fn set_blend(&mut self, enabled: bool) {
        self.blend = enabled;
    }

    #[inline]
    pub fn blend_enabled(&self) -> bool {
        self.blend
    }

    #[inline]
    pub fn set_scissor_enabled(&mut self, enabled: bool) {
        self.scissor_enabled = enabled;
    }

    #[inline]
    pub fn scissor_enabled(&self) -> bool {
        self.scissor_enabled
    }

    #[inline]
    pub fn set_scissor_rect(&mut self, rect: ScissorRect) {
        self.scissor = rect;
    }

    /// Last rectangle set, whether or not the test is enabled.
    #[inline]
    pub fn scissor_rect(&self) -> ScissorRect {
        self.scissor
    }

    /// Rectangle a draw recorded now is clipped to.
    #[inline]
    pub fn effective_scissor(&self) -> Option<ScissorRect> {
        self.scissor_enabled.then_some(self.scissor)
    }

    #[inline]
    pub fn bind_texture(&mut self, texture: TextureHandle) {
        self.bound_texture = texture;
    }

    #[inline]
    pub fn bound_texture(&self) -> TextureHandle {
        self.bound_texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_scissor_has_no_effect_regardless_of_rect() {
        let mut state = PipelineState::default();
        state.set_scissor_rect(ScissorRect::new(1, 2, 3, 4));
        assert_eq!(state.effective_scissor(), None);

        state.set_scissor_enabled(true);
        assert_eq!(state.effective_scissor(), Some(ScissorRect::new(1, 2, 3, 4)));

        state.set_scissor_enabled(false);
        assert_eq!(state.effective_scissor(), None);
        assert_eq!(state.scissor_rect(), ScissorRect::new(1, 2, 3, 4));
    }

    #[test]
    fn defaults_are_blend_off_no_program_no_texture() {
        let state = PipelineState::default();
        assert!(!state.blend_enabled());
        assert_eq!(state.active_program(), None);
        assert!(state.bound_texture().is_none());
    }
}
