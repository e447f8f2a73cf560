//! CLI argument parsing via clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Switch the XFCE theme between its light and dark variant.
#[derive(Debug, Parser)]
#[command(name = "duskswitch", version)]
pub struct Args {
    /// Settings file (default: $XDG_CONFIG_HOME/duskswitch/settings.json).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List available light/dark theme pairs.
    List,
    /// Show the current theme and mode.
    Current,
    /// Toggle between the light and dark variant of the current theme.
    Toggle,
    /// Apply a specific theme.
    Set {
        /// Theme name to apply.
        theme: String,
    },
    /// Show the current settings.
    Config,
    /// Enable or disable auto-switching.
    Auto {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Set the daily dark mode interval.
    Interval {
        /// Start time (HH:MM).
        start: String,
        /// End time (HH:MM).
        end: String,
    },
    /// Check whether the current time falls in the dark mode interval.
    Time,
    /// Run the auto-switch loop in the foreground.
    Daemon {
        /// Seconds between checks.
        #[arg(long = "interval-secs", default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: u64,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::List => "list",
            Command::Current => "current",
            Command::Toggle => "toggle",
            Command::Set { .. } => "set",
            Command::Config => "config",
            Command::Auto { .. } => "auto",
            Command::Interval { .. } => "interval",
            Command::Time => "time",
            Command::Daemon { .. } => "daemon",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Toggle::On
    }
}
