//! Turn action lifecycle
//!
//! A granted turn plays out as `Pending -> Animating -> Resolved`. The host
//! polls `is_resolved` each frame and only then ends the turn, so no other
//! actor can act while an effect is still on screen.

use super::scheduler::ActorId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionPhase {
    /// Turn granted, nothing started yet
    Pending,
    /// Effect playing; counts down in unscaled ms
    Animating { remaining_ms: f32 },
    Resolved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnAction {
    actor: ActorId,
    phase: ActionPhase,
}

impl TurnAction {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            phase: ActionPhase::Pending,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn phase(&self) -> ActionPhase {
        self.phase
    }

    /// Start the effect; a zero-length effect resolves at once
    pub fn begin(&mut self, duration_ms: f32) -> bool {
        if self.phase != ActionPhase::Pending {
            return false;
        }
        self.phase = if duration_ms > 0.0 {
            ActionPhase::Animating {
                remaining_ms: duration_ms,
            }
        } else {
            ActionPhase::Resolved
        };
        true
    }

    pub fn advance(&mut self, real_dt_ms: f32) {
        if let ActionPhase::Animating { remaining_ms } = &mut self.phase {
            *remaining_ms -= real_dt_ms.max(0.0);
            if *remaining_ms <= 0.0 {
                self.phase = ActionPhase::Resolved;
            }
        }
    }

    /// Skip whatever is left of the effect
    pub fn resolve(&mut self) {
        self.phase = ActionPhase::Resolved;
    }

    pub fn is_resolved(&self) -> bool {
        self.phase == ActionPhase::Resolved
    }
}
