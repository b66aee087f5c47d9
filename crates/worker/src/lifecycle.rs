//! Worker lifecycle states.

use std::fmt;

/// Where a worker is in its lifecycle.
///
/// ```text
/// Parsed -> Installing -> Installed -> Activating -> Activated
///    \__________ restored from storage ___________/
/// any non-terminal state -> Redundant
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Precache done; waiting to activate.
    Installed,
    Activating,
    /// Controlling clients and intercepting fetches.
    Activated,
    /// Failed to install or replaced by a newer version.
    Redundant,
}

impl WorkerState {
    /// Check if this state allows fetch interception
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Redundant)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        match (self, next) {
            (Redundant, _) => false,
            (_, Redundant) => true,
            (Parsed, Installing)
            | (Installing, Installed)
            | (Installed, Activating)
            | (Activating, Activated)
            | (Activating, Installed)
            | (Parsed, Activated) => true,
            _ => false,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkerState::*;

    #[test]
    fn test_happy_path() {
        assert!(Parsed.can_transition_to(Installing));
        assert!(Installing.can_transition_to(Installed));
        assert!(Installed.can_transition_to(Activating));
        assert!(Activating.can_transition_to(Activated));
    }

    #[test]
    fn test_skipping_install_is_rejected() {
        assert!(!Parsed.can_transition_to(Activating));
        assert!(!Installing.can_transition_to(Activated));
        assert!(!Activated.can_transition_to(Installing));
    }

    #[test]
    fn test_redundant_is_terminal() {
        for state in [Parsed, Installing, Installed, Activating, Activated] {
            assert!(state.can_transition_to(Redundant));
        }
        assert!(Redundant.is_terminal());
        assert!(!Redundant.can_transition_to(Activated));
        assert!(!Redundant.can_transition_to(Redundant));
    }

    #[test]
    fn test_only_activated_intercepts() {
        assert!(Activated.can_intercept_fetch());
        assert!(!Installed.can_intercept_fetch());
        assert!(!Redundant.can_intercept_fetch());
    }

    #[test]
    fn test_display() {
        assert_eq!(Activating.to_string(), "activating");
    }
}
