pub mod app;
pub mod autoswitch;
pub mod cli;
pub mod config;
pub mod desktop;
pub mod error;
pub mod logging;
pub mod notification;
pub mod schedule;
pub mod switcher;
pub mod theme;
pub use error::{AppError, AppResult};

const ONE_SHOT_LOG_LEVEL: &str = "warn";
const DAEMON_LOG_LEVEL: &str = "info";

/// Entrypoint used by the binary: executes one parsed command against the
/// live desktop, printing its result to stdout.
pub fn run(args: cli::Args) -> AppResult<()> {
    let level = match args.command {
        cli::Command::Daemon { .. } => DAEMON_LOG_LEVEL,
        _ => ONE_SHOT_LOG_LEVEL,
    };
    logging::init(level);
    tracing::debug!("starting duskswitch");

    let app = app::App::from_environment(args.config)?;
    let stdout = std::io::stdout();
    app.run(&args.command, &mut stdout.lock())
}
