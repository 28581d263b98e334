//! Cradle lifecycle state machine.
//!
//! Every window transition runs through [`CradleStateMachine::transition`],
//! so a recompute cannot start while another one is half-applied.

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CradlePhase {
    /// No geometry or an empty list; nothing is materialized.
    #[default]
    Idle,
    /// The window is being computed from scratch around an axis.
    Rebuilding,
    /// The window is being patched at its head and tail after a scroll.
    Shifting,
    /// The cache is being synchronized with the window.
    Evicting,
    /// Window, cache and anchor agree.
    Ready,
}

impl CradlePhase {
    /// Allowed successors of `self`.
    pub fn successors(self) -> &'static [CradlePhase] {
        use CradlePhase::*;
        match self {
            Idle => &[Rebuilding, Idle],
            Rebuilding => &[Evicting, Ready, Idle],
            Shifting => &[Evicting, Ready, Rebuilding],
            Evicting => &[Ready],
            Ready => &[Shifting, Rebuilding, Idle, Ready],
        }
    }

    pub fn can_transition_to(self, next: CradlePhase) -> bool {
        self.successors().contains(&next)
    }

    /// True while a window mutation is in progress.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            CradlePhase::Rebuilding | CradlePhase::Shifting | CradlePhase::Evicting
        )
    }
}

#[derive(Debug, Default)]
pub struct CradleStateMachine {
    phase: CradlePhase,
    last_stable: CradlePhase,
}

impl CradleStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CradlePhase {
        self.phase
    }

    pub fn transition(&mut self, next: CradlePhase) -> Result<(), EngineError> {
        if !self.phase.can_transition_to(next) {
            return Err(EngineError::IllegalTransition {
                from: self.phase,
                to: next,
            });
        }
        log::trace!("cradle phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        if !next.is_busy() {
            self.last_stable = next;
        }
        Ok(())
    }

    /// Drops an aborted transition and returns to the last stable phase.
    pub fn abort(&mut self) {
        if self.phase.is_busy() {
            log::debug!(
                "aborting cradle phase {:?}, back to {:?}",
                self.phase,
                self.last_stable
            );
        }
        self.phase = self.last_stable;
    }
}
