use crate::autoswitch::AutoSwitchError;
use crate::config::ConfigError;
use crate::desktop::EnvError;
use crate::schedule::ScheduleError;
use crate::switcher::SwitchError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Switch(#[from] SwitchError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    AutoSwitch(#[from] AutoSwitchError),
    #[error("failed to write command output")]
    Output(#[from] std::io::Error),
}
