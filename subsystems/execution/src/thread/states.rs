//! # Thread States
//!
//! Thread state machine definition.

/// Thread state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadState {
    /// Slot is available for a new thread
    #[default]
    Free,
    /// Thread is eligible once its arrival time has passed
    Runnable,
    /// Thread is executing (at most one system-wide)
    Running,
    /// Host slot suspended inside `run()` while threads execute
    Parked,
}

impl ThreadState {
    /// Check if the slot can be handed to a new thread
    pub fn is_free(&self) -> bool {
        matches!(self, ThreadState::Free)
    }

    /// Check if thread is waiting to be selected
    pub fn is_runnable(&self) -> bool {
        matches!(self, ThreadState::Runnable)
    }

    /// Check if thread holds the CPU
    pub fn is_running(&self) -> bool {
        matches!(self, ThreadState::Running)
    }

    /// Valid transitions from this state
    pub fn valid_transitions(&self) -> &[ThreadState] {
        match self {
            ThreadState::Free => &[ThreadState::Runnable],
            ThreadState::Runnable => &[ThreadState::Running],
            ThreadState::Running => &[
                ThreadState::Runnable,
                ThreadState::Free,
                ThreadState::Parked,
            ],
            ThreadState::Parked => &[ThreadState::Running],
        }
    }

    /// Check if `to` may follow this state
    pub fn can_transition(&self, to: ThreadState) -> bool {
        self.valid_transitions().contains(&to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(ThreadState::default().is_free());
        assert!(ThreadState::Runnable.is_runnable());
        assert!(ThreadState::Running.is_running());
        assert!(!ThreadState::Parked.is_running());
    }

    #[test]
    fn test_lifecycle_transitions() {
        assert!(ThreadState::Free.can_transition(ThreadState::Runnable));
        assert!(ThreadState::Runnable.can_transition(ThreadState::Running));
        assert!(ThreadState::Running.can_transition(ThreadState::Free));
        assert!(ThreadState::Running.can_transition(ThreadState::Runnable));

        // A finished thread is only reborn through a fresh create
        assert!(!ThreadState::Free.can_transition(ThreadState::Running));
        assert!(!ThreadState::Runnable.can_transition(ThreadState::Free));
        assert!(!ThreadState::Parked.can_transition(ThreadState::Free));
    }
}
