//! Wires the catalog, switcher, settings and auto-switch loop behind the
//! command surface.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::autoswitch::{AutoSwitchHandle, AutoSwitcher};
use crate::cli::Command;
use crate::config::SettingsStore;
use crate::desktop::{EnvironmentBackend, XfconfBackend};
use crate::error::AppResult;
use crate::notification::{DesktopNotifier, Notifier};
use crate::schedule::{ClockTime, TimeWindow};
use crate::switcher::{AppliedTheme, SwitchError, ThemeSwitcher};
use crate::theme::{classify, default_theme_dirs};

type SharedClock = Arc<dyn Fn() -> ClockTime + Send + Sync>;

pub struct App<B> {
    switcher: Arc<ThemeSwitcher<B>>,
    settings: Arc<SettingsStore>,
    notifier: Arc<dyn Notifier>,
    clock: SharedClock,
}

impl App<XfconfBackend> {
    /// The live desktop: `xfconf-query`, the standard theme directories and
    /// desktop notifications.
    pub fn from_environment(config_path: Option<PathBuf>) -> AppResult<Self> {
        let settings = match config_path {
            Some(path) => SettingsStore::open(path),
            None => SettingsStore::open_default()?,
        };
        tracing::debug!(path = %settings.path().display(), "settings loaded");
        Ok(Self::new(
            XfconfBackend::new(),
            default_theme_dirs(),
            settings,
            Arc::new(DesktopNotifier),
        ))
    }
}

impl<B: EnvironmentBackend + 'static> App<B> {
    pub fn new(
        backend: B,
        theme_dirs: Vec<PathBuf>,
        settings: SettingsStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let rule = settings.snapshot().suffix_rule;
        Self {
            switcher: Arc::new(ThemeSwitcher::scan(backend, theme_dirs, rule)),
            settings: Arc::new(settings),
            notifier,
            clock: Arc::new(ClockTime::now_local),
        }
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> ClockTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn switcher(&self) -> &ThemeSwitcher<B> {
        &self.switcher
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn run<W: Write>(&self, command: &Command, out: &mut W) -> AppResult<()> {
        tracing::debug!(?command, "running command");
        match command {
            Command::List => self.list(out),
            Command::Current => self.current(out),
            Command::Toggle => self.toggle(out),
            Command::Set { theme } => self.set(theme, out),
            Command::Config => self.show_config(out),
            Command::Auto { state } => {
                let enabled = state.enabled();
                self.settings.set_auto_switch(enabled)?;
                let status = if enabled { "enabled" } else { "disabled" };
                writeln!(out, "Auto-switch {status}")?;
                Ok(())
            }
            Command::Interval { start, end } => {
                let window = TimeWindow::new(start.parse()?, end.parse()?);
                self.settings.set_window(window)?;
                writeln!(
                    out,
                    "Dark mode interval set to: {} - {}",
                    window.start, window.end
                )?;
                Ok(())
            }
            Command::Time => self.time(out),
            Command::Daemon { interval_secs } => {
                self.run_daemon(Duration::from_secs(*interval_secs))
            }
        }
    }

    fn list<W: Write>(&self, out: &mut W) -> AppResult<()> {
        let catalog = self.switcher.catalog();
        let table = catalog.table();
        if table.is_empty() {
            writeln!(out, "No theme pairs found.")?;
            return Ok(());
        }
        writeln!(out, "Available theme pairs:")?;
        // Every entry appears in both directions; print each once, light side first.
        for (light, dark) in table.entries().filter(|(key, _)| !classify(key).is_dark()) {
            writeln!(out, "Light: {}", light.replace(',', ", "))?;
            writeln!(out, "Dark:  {}", dark.replace(',', ", "))?;
        }
        Ok(())
    }

    fn current<W: Write>(&self, out: &mut W) -> AppResult<()> {
        let theme = self
            .switcher
            .current_theme()
            .ok_or(SwitchError::CurrentThemeUnknown)?;
        let mode = classify(&theme);
        writeln!(out, "Current theme: {theme}")?;
        writeln!(out, "Current mode:  {mode}")?;
        Ok(())
    }

    fn toggle<W: Write>(&self, out: &mut W) -> AppResult<()> {
        let applied = self.switcher.toggle()?;
        self.remember(&applied);
        writeln!(out, "Switched to: {} ({} mode)", applied.name, applied.mode)?;
        Ok(())
    }

    fn set<W: Write>(&self, theme: &str, out: &mut W) -> AppResult<()> {
        let applied = self.switcher.set_theme(theme);
        self.remember(&applied);
        writeln!(out, "Set theme to: {} ({} mode)", applied.name, applied.mode)?;
        Ok(())
    }

    /// Persistence failures here are logged by the store and otherwise ignored;
    /// the switch itself already happened.
    fn remember(&self, applied: &AppliedTheme) {
        let _ = self.settings.record_last_theme(&applied.name);
    }

    fn show_config<W: Write>(&self, out: &mut W) -> AppResult<()> {
        let settings = self.settings.snapshot();
        writeln!(out, "Settings file: {}", self.settings.path().display())?;
        writeln!(out, "auto_switch_enabled: {}", settings.auto_switch_enabled)?;
        writeln!(out, "dark_start: {}", settings.dark_start)?;
        writeln!(out, "dark_end: {}", settings.dark_end)?;
        writeln!(out, "last_theme: {}", settings.last_theme)?;
        writeln!(out, "notifications: {}", settings.notifications)?;
        writeln!(out, "suffix_rule: {}", settings.suffix_rule.as_str())?;
        Ok(())
    }

    fn time<W: Write>(&self, out: &mut W) -> AppResult<()> {
        let now = (self.clock)();
        let window = self.settings.dark_window();
        let answer = if window.is_dark_at(now) { "Yes" } else { "No" };
        writeln!(out, "Current time: {now}")?;
        writeln!(out, "Dark mode hours: {} - {}", window.start, window.end)?;
        writeln!(out, "Should be dark mode: {answer}")?;
        Ok(())
    }

    /// Starts the background loop with this app's collaborators.
    pub fn spawn_auto_switch(&self, interval: Duration) -> AppResult<AutoSwitchHandle> {
        let clock = Arc::clone(&self.clock);
        let handle = AutoSwitcher::new(
            Arc::clone(&self.switcher),
            Arc::clone(&self.settings),
            Arc::clone(&self.notifier),
        )
        .with_clock(move || clock())
        .spawn(interval)?;
        Ok(handle)
    }

    /// Runs the loop until the process is terminated.
    pub fn run_daemon(&self, interval: Duration) -> AppResult<()> {
        let settings = self.settings.snapshot();
        tracing::info!(
            enabled = settings.auto_switch_enabled,
            window = %settings.dark_window(),
            ?interval,
            "auto-switch daemon running"
        );
        self.spawn_auto_switch(interval)?.wait()?;
        Ok(())
    }
}
