/// Breakpoint halting state machine polled once per step.
///
/// Read/write breakpoints fire mid-instruction, so they only move the machine
/// to [`RunState::PendingHalt`]; the poll after the instruction retires turns
/// that into [`RunState::Halted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// No halt requested.
    #[default]
    Running,
    /// A trapped access was seen; halt at the carried instruction address.
    PendingHalt(u16),
    /// Halted at the carried address until execution is resumed.
    Halted(u16),
}

impl RunState {
    /// Returns the halt address when halted.
    #[must_use]
    pub const fn halted_at(self) -> Option<u16> {
        match self {
            Self::Halted(addr) => Some(addr),
            Self::Running | Self::PendingHalt(_) => None,
        }
    }

    /// Returns `true` while a read/write breakpoint is waiting for the poll.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::PendingHalt(_))
    }
}

#[cfg(test)]
mod tests {
    use super::RunState;

    #[test]
    fn run_state_default_is_running() {
        assert_eq!(RunState::default(), RunState::Running);
    }

    #[test]
    fn halted_at_reports_only_halted_variant() {
        assert_eq!(RunState::Running.halted_at(), None);
        assert_eq!(RunState::PendingHalt(0x1234).halted_at(), None);
        assert_eq!(RunState::Halted(0x1234).halted_at(), Some(0x1234));
        assert!(RunState::PendingHalt(0).is_pending());
        assert!(!RunState::Halted(0).is_pending());
    }
}
