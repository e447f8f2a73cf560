//! Time-driven switching between the light and dark variant of the active theme.
//!
//! [`AutoSwitcher::tick_at`] performs one evaluation and is what tests drive.
//! [`AutoSwitcher::spawn`] runs ticks on a background thread at a fixed cadence
//! until the returned handle is stopped or dropped.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::SettingsStore;
use crate::desktop::EnvironmentBackend;
use crate::notification::Notifier;
use crate::schedule::ClockTime;
use crate::switcher::{AppliedTheme, SwitchError, ThemeSwitcher};
use crate::theme::{Mode, SuffixRule};

pub mod error;
pub mod machine;

pub use error::{AutoSwitchError, AutoSwitchResult};
pub use machine::{AutoSwitchEvent, AutoSwitchMachine, AutoSwitchState, StateTransition};

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);
const WORKER_THREAD_NAME: &str = "auto-switch";

type Clock = Box<dyn Fn() -> ClockTime + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Stay,
    SwitchToDark,
    SwitchToLight,
}

pub fn decide(should_be_dark: bool, live_mode: Mode) -> Decision {
    match (should_be_dark, live_mode) {
        (true, Mode::Light) => Decision::SwitchToDark,
        (false, Mode::Dark) => Decision::SwitchToLight,
        _ => Decision::Stay,
    }
}

#[derive(Debug)]
pub enum TickOutcome {
    Disabled,
    /// The live theme could not be read.
    Skipped,
    InSync(Mode),
    Switched(AppliedTheme),
    Failed(SwitchError),
}

pub struct AutoSwitcher<B> {
    switcher: Arc<ThemeSwitcher<B>>,
    settings: Arc<SettingsStore>,
    notifier: Arc<dyn Notifier>,
    clock: Clock,
    machine: AutoSwitchMachine,
    /// Rule the switcher's catalog was last built with.
    suffix_rule: SuffixRule,
}

impl<B: EnvironmentBackend + 'static> AutoSwitcher<B> {
    pub fn new(
        switcher: Arc<ThemeSwitcher<B>>,
        settings: Arc<SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let suffix_rule = settings.snapshot().suffix_rule;
        Self {
            switcher,
            settings,
            notifier,
            clock: Box::new(ClockTime::now_local),
            machine: AutoSwitchMachine::new(),
            suffix_rule,
        }
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> ClockTime + Send + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn state(&self) -> AutoSwitchState {
        self.machine.state()
    }

    pub fn machine(&self) -> &AutoSwitchMachine {
        &self.machine
    }

    pub fn tick(&mut self) -> TickOutcome {
        let now = (self.clock)();
        self.tick_at(now)
    }

    /// One evaluation against the latest settings on disk. Failures are logged
    /// and reported in the outcome, never raised.
    pub fn tick_at(&mut self, now: ClockTime) -> TickOutcome {
        self.settings.reload();
        let settings = self.settings.snapshot();
        self.follow_suffix_rule(settings.suffix_rule);
        if !settings.auto_switch_enabled {
            self.advance(AutoSwitchEvent::Defer);
            return TickOutcome::Disabled;
        }

        self.advance(AutoSwitchEvent::Begin);
        let should_be_dark = settings.dark_window().is_dark_at(now);
        let outcome = self.evaluate(should_be_dark, settings.notifications);
        self.advance(AutoSwitchEvent::Finish);

        tracing::debug!(%now, should_be_dark, ?outcome, "auto-switch tick");
        outcome
    }

    fn evaluate(&self, should_be_dark: bool, notify: bool) -> TickOutcome {
        let Some(live_mode) = self.switcher.current_mode() else {
            tracing::warn!("auto-switch skipped; current theme unavailable");
            return TickOutcome::Skipped;
        };

        if decide(should_be_dark, live_mode) == Decision::Stay {
            return TickOutcome::InSync(live_mode);
        }

        match self.switcher.toggle() {
            Ok(applied) => {
                tracing::info!(theme = %applied.name, mode = %applied.mode, "auto-switched theme");
                if notify {
                    self.notifier.notify(
                        "Theme switched",
                        &format!("Switched to {} ({} mode)", applied.name, applied.mode),
                    );
                }
                TickOutcome::Switched(applied)
            }
            Err(err) => {
                tracing::warn!(%err, "auto-switch failed");
                TickOutcome::Failed(err)
            }
        }
    }

    fn follow_suffix_rule(&mut self, rule: SuffixRule) {
        if rule == self.suffix_rule {
            return;
        }
        tracing::info!(rule = rule.as_str(), "suffix rule changed; rescanning themes");
        self.switcher.rescan(rule);
        self.suffix_rule = rule;
    }

    /// A panic inside a tick is logged and the loop carries on.
    fn tick_catching_panics(&mut self) {
        let ticked = panic::catch_unwind(AssertUnwindSafe(|| self.tick()));
        if let Err(payload) = ticked {
            tracing::error!(panic = panic_message(payload.as_ref()), "auto-switch tick panicked");
            if self.machine.state() == AutoSwitchState::Evaluating {
                self.advance(AutoSwitchEvent::Abort);
            }
        }
    }

    fn advance(&mut self, event: AutoSwitchEvent) {
        if let Err(err) = self.machine.transition(event) {
            tracing::error!(%err, "auto-switch state machine out of step");
        }
    }

    /// Moves the switcher onto a worker thread that ticks right away and then
    /// every `interval`.
    pub fn spawn(mut self, interval: Duration) -> AutoSwitchResult<AutoSwitchHandle> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                tracing::info!(?interval, "auto-switch worker started");
                loop {
                    self.tick_catching_panics();
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::info!("auto-switch worker stopped");
            })
            .map_err(AutoSwitchError::Spawn)?;

        Ok(AutoSwitchHandle {
            stop: stop_tx,
            worker,
        })
    }
}

/// Controls a running worker. Dropping the handle also stops it.
pub struct AutoSwitchHandle {
    stop: mpsc::Sender<()>,
    worker: JoinHandle<()>,
}

impl AutoSwitchHandle {
    pub fn stop(self) -> AutoSwitchResult<()> {
        let _ = self.stop.send(());
        self.worker
            .join()
            .map_err(|_| AutoSwitchError::WorkerPanicked)
    }

    /// Blocks for as long as the worker runs.
    pub fn wait(self) -> AutoSwitchResult<()> {
        let Self { stop, worker } = self;
        let joined = worker.join();
        drop(stop);
        joined.map_err(|_| AutoSwitchError::WorkerPanicked)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
