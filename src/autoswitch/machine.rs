use super::error::{AutoSwitchError, AutoSwitchResult};

const HISTORY_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoSwitchState {
    /// Waiting for the next tick, or auto-switching is turned off.
    #[default]
    Idle,
    Evaluating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSwitchEvent {
    Defer,
    Begin,
    Finish,
    /// An evaluation was cut short by a panic.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: AutoSwitchState,
    pub event: AutoSwitchEvent,
    pub to: AutoSwitchState,
}

#[derive(Debug, Default)]
pub struct AutoSwitchMachine {
    state: AutoSwitchState,
    history: Vec<StateTransition>,
}

impl AutoSwitchMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AutoSwitchState {
        self.state
    }

    /// Most recent transitions, oldest first.
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn next_state(&self, event: AutoSwitchEvent) -> Option<AutoSwitchState> {
        use AutoSwitchEvent::*;
        match (self.state, event) {
            (AutoSwitchState::Idle, Defer) => Some(AutoSwitchState::Idle),
            (AutoSwitchState::Idle, Begin) => Some(AutoSwitchState::Evaluating),
            (AutoSwitchState::Evaluating, Finish | Abort) => Some(AutoSwitchState::Idle),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: AutoSwitchEvent) -> AutoSwitchResult<AutoSwitchState> {
        let from = self.state;
        let to = self.next_state(event).ok_or_else(|| {
            tracing::warn!(?from, ?event, "invalid auto-switch transition requested");
            AutoSwitchError::InvalidTransition { from, event }
        })?;

        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push(StateTransition { from, event, to });
        self.state = to;
        Ok(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_cycle_returns_to_idle() {
        let mut machine = AutoSwitchMachine::new();
        assert_eq!(
            machine.transition(AutoSwitchEvent::Begin).unwrap(),
            AutoSwitchState::Evaluating
        );
        assert_eq!(
            machine.transition(AutoSwitchEvent::Finish).unwrap(),
            AutoSwitchState::Idle
        );
        assert_eq!(
            machine.history(),
            &[
                StateTransition {
                    from: AutoSwitchState::Idle,
                    event: AutoSwitchEvent::Begin,
                    to: AutoSwitchState::Evaluating,
                },
                StateTransition {
                    from: AutoSwitchState::Evaluating,
                    event: AutoSwitchEvent::Finish,
                    to: AutoSwitchState::Idle,
                },
            ]
        );
    }

    #[test]
    fn invalid_transition_keeps_state_and_history() {
        let mut machine = AutoSwitchMachine::new();
        let err = machine
            .transition(AutoSwitchEvent::Finish)
            .expect_err("idle -> finish should fail");
        assert!(matches!(
            err,
            AutoSwitchError::InvalidTransition {
                from: AutoSwitchState::Idle,
                event: AutoSwitchEvent::Finish
            }
        ));
        assert_eq!(machine.state(), AutoSwitchState::Idle);
        assert!(machine.history().is_empty());

        machine.transition(AutoSwitchEvent::Begin).unwrap();
        assert!(machine.transition(AutoSwitchEvent::Defer).is_err());
        assert_eq!(machine.state(), AutoSwitchState::Evaluating);
    }

    #[test]
    fn abort_only_leaves_an_evaluation() {
        let mut machine = AutoSwitchMachine::new();
        assert!(machine.transition(AutoSwitchEvent::Abort).is_err());

        machine.transition(AutoSwitchEvent::Begin).unwrap();
        assert_eq!(
            machine.transition(AutoSwitchEvent::Abort).unwrap(),
            AutoSwitchState::Idle
        );
    }

    #[test]
    fn history_is_bounded() {
        let mut machine = AutoSwitchMachine::new();
        for _ in 0..(HISTORY_LIMIT + 10) {
            machine.transition(AutoSwitchEvent::Defer).unwrap();
        }
        assert_eq!(machine.history().len(), HISTORY_LIMIT);
    }
}
