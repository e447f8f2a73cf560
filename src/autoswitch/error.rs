use thiserror::Error;

use super::machine::{AutoSwitchEvent, AutoSwitchState};

pub type AutoSwitchResult<T> = std::result::Result<T, AutoSwitchError>;

#[derive(Debug, Error)]
pub enum AutoSwitchError {
    #[error("invalid auto-switch transition: from {from:?} using event {event:?}")]
    InvalidTransition {
        from: AutoSwitchState,
        event: AutoSwitchEvent,
    },
    #[error("failed to spawn auto-switch worker")]
    Spawn(#[source] std::io::Error),
    #[error("auto-switch worker panicked")]
    WorkerPanicked,
}
