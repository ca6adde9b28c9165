use serde::{Deserialize, Serialize};
use std::fmt;

/// Bootstrap state machine states
///
/// The happy path is strictly linear:
/// `Uninitialized -> PlatformIdentified -> Scanned -> Registered -> Activating -> Ready
/// -> ShuttingDown -> Stopped`. `Failed` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
    Uninitialized,
    PlatformIdentified,
    Scanned,
    Registered,
    Activating,
    Ready,
    ShuttingDown,
    Stopped,
    Failed,
}

impl BootstrapState {
    /// Check if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, BootstrapState::Stopped | BootstrapState::Failed)
    }

    /// Check if the container may be read
    pub fn is_ready(&self) -> bool {
        matches!(self, BootstrapState::Ready)
    }

    /// Check if the state machine may move from `self` to `next`
    pub fn can_transition_to(&self, next: BootstrapState) -> bool {
        use BootstrapState::*;

        match (self, next) {
            (Uninitialized, PlatformIdentified)
            | (PlatformIdentified, Scanned)
            | (Scanned, Registered)
            | (Registered, Activating)
            | (Activating, Ready)
            | (Ready, ShuttingDown)
            | (ShuttingDown, Stopped) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapState::Uninitialized => "uninitialized",
            BootstrapState::PlatformIdentified => "platform_identified",
            BootstrapState::Scanned => "scanned",
            BootstrapState::Registered => "registered",
            BootstrapState::Activating => "activating",
            BootstrapState::Ready => "ready",
            BootstrapState::ShuttingDown => "shutting_down",
            BootstrapState::Stopped => "stopped",
            BootstrapState::Failed => "failed",
        }
    }
}

impl Default for BootstrapState {
    fn default() -> Self {
        BootstrapState::Uninitialized
    }
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work executed while entering a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapPhase {
    PlatformIdentification,
    Scan,
    Registration,
    Activation,
    Readiness,
    Shutdown,
}

impl BootstrapPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapPhase::PlatformIdentification => "platform_identification",
            BootstrapPhase::Scan => "scan",
            BootstrapPhase::Registration => "registration",
            BootstrapPhase::Activation => "activation",
            BootstrapPhase::Readiness => "readiness",
            BootstrapPhase::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for BootstrapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_linear() {
        let path = [
            BootstrapState::Uninitialized,
            BootstrapState::PlatformIdentified,
            BootstrapState::Scanned,
            BootstrapState::Registered,
            BootstrapState::Activating,
            BootstrapState::Ready,
            BootstrapState::ShuttingDown,
            BootstrapState::Stopped,
        ];

        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }

        assert!(!BootstrapState::Uninitialized.can_transition_to(BootstrapState::Scanned));
        assert!(!BootstrapState::Ready.can_transition_to(BootstrapState::Activating));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_states_only() {
        assert!(BootstrapState::Uninitialized.can_transition_to(BootstrapState::Failed));
        assert!(BootstrapState::Activating.can_transition_to(BootstrapState::Failed));
        assert!(BootstrapState::Ready.can_transition_to(BootstrapState::Failed));
        assert!(!BootstrapState::Stopped.can_transition_to(BootstrapState::Failed));
        assert!(!BootstrapState::Failed.can_transition_to(BootstrapState::Failed));
    }

    #[test]
    fn test_no_reentry_from_stopped() {
        assert!(!BootstrapState::Stopped.can_transition_to(BootstrapState::Uninitialized));
        assert!(!BootstrapState::Stopped.can_transition_to(BootstrapState::PlatformIdentified));
    }
}
