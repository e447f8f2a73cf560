use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DUSKSWITCH_LOG";

/// Installs the stderr subscriber. `DUSKSWITCH_LOG` wins over `RUST_LOG`;
/// `default_directive` applies when neither is set or both fail to parse.
pub fn init(default_directive: &str) {
    let filter = filter_from_env(default_directive);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn filter_from_env(default_directive: &str) -> EnvFilter {
    [LOG_ENV, EnvFilter::DEFAULT_ENV]
        .into_iter()
        .filter_map(|key| std::env::var(key).ok())
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive))
}
