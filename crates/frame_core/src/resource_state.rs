use crate::error::GpuError;
use crate::error::GpuResult;

/// Role a swap-chain buffer is currently declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceState {
    /// Owned by the presentation engine; the only state `present` accepts.
    #[default]
    Present,
    /// Writable by clears and draws.
    RenderTarget,
}

/// A declared state change, as recorded into a command list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub before: ResourceState,
    pub after: ResourceState,
}

impl Transition {
    pub const TO_RENDER_TARGET: Transition = Transition {
        before: ResourceState::Present,
        after: ResourceState::RenderTarget,
    };
    pub const TO_PRESENT: Transition = Transition {
        before: ResourceState::RenderTarget,
        after: ResourceState::Present,
    };

    /// Applies the transition to `state`, refusing it if `state` is not the
    /// declared `before` state.
    pub fn apply(self, state: &mut ResourceState) -> GpuResult<()> {
        if *state != self.before {
            return Err(GpuError::StateMismatch {
                expected: self.before,
                actual: *state,
            });
        }
        *state = self.after;
        Ok(())
    }
}

/// Checks that a resource is in `expected` before it is used in that role.
pub fn require_state(state: ResourceState, expected: ResourceState) -> GpuResult<()> {
    if state == expected {
        Ok(())
    } else {
        Err(GpuError::StateMismatch {
            expected,
            actual: state,
        })
    }
}
