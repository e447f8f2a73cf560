use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use thiserror::Error;

mod memory;

pub use memory::MemoryBackend;

const XFCONF_COMMAND: &str = "xfconf-query";
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(3);
const COMMAND_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub const XSETTINGS_CHANNEL: &str = "xsettings";
pub const THEME_NAME_PROPERTY: &str = "/Net/ThemeName";
pub const XFWM_CHANNEL: &str = "xfwm4";
pub const XFWM_THEME_PROPERTY: &str = "/general/theme";

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("command io error: {command}")]
    CommandIo {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command failed: {command}: {message}")]
    CommandFailed { command: String, message: String },
    #[error("command timed out after {timeout:?}: {command}")]
    TimedOut { command: String, timeout: Duration },
    #[error("environment unavailable: {message}")]
    Unavailable { message: String },
}

pub type EnvResult<T> = std::result::Result<T, EnvError>;

/// Read/write access to the desktop environment's configuration store.
///
/// Reads collapse every failure into `None`. Writes report the failure, but
/// callers treat them as best-effort.
pub trait EnvironmentBackend: Send + Sync {
    fn get(&self, channel: &str, property: &str) -> Option<String>;
    fn set(&self, channel: &str, property: &str, value: &str) -> EnvResult<()>;
}

/// Talks to xfconfd through the `xfconf-query` command.
#[derive(Debug, Clone)]
pub struct XfconfBackend {
    command: String,
    timeout: Duration,
}

impl XfconfBackend {
    pub fn new() -> Self {
        Self::with_command(XFCONF_COMMAND, DEFAULT_COMMAND_TIMEOUT)
    }

    pub fn with_command(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for XfconfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentBackend for XfconfBackend {
    fn get(&self, channel: &str, property: &str) -> Option<String> {
        let args = ["-c", channel, "-p", property];
        match run_command_with_timeout(&self.command, &args, self.timeout) {
            Ok(stdout) => {
                let value = stdout.trim();
                if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            Err(err) => {
                tracing::debug!(channel, property, ?err, "xfconf read failed");
                None
            }
        }
    }

    fn set(&self, channel: &str, property: &str, value: &str) -> EnvResult<()> {
        run_command_with_timeout(
            &self.command,
            &["-c", channel, "-p", property, "-s", value],
            self.timeout,
        )
        .map(|_| ())
    }
}

/// Runs `command` and returns its stdout. The child is killed once `timeout` elapses.
pub(crate) fn run_command_with_timeout(
    command: &str,
    args: &[&str],
    timeout: Duration,
) -> EnvResult<String> {
    let mut child = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| EnvError::CommandIo {
            command: command.to_string(),
            source: err,
        })?;

    // Drained concurrently so a chatty child cannot stall on a full pipe.
    let stdout = spawn_pipe_reader(child.stdout.take());
    let stderr = spawn_pipe_reader(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                cleanup_command_child(&mut child);
                tracing::warn!(command, ?timeout, "killed hung command");
                return Err(EnvError::TimedOut {
                    command: command.to_string(),
                    timeout,
                });
            }
            Ok(None) => std::thread::sleep(COMMAND_POLL_INTERVAL),
            Err(err) => {
                cleanup_command_child(&mut child);
                return Err(EnvError::CommandIo {
                    command: command.to_string(),
                    source: err,
                });
            }
        }
    };

    let stdout = collect_pipe(stdout);
    if !status.success() {
        let stderr = collect_pipe(stderr);
        let stderr = String::from_utf8_lossy(&stderr);
        return Err(EnvError::CommandFailed {
            command: command.to_string(),
            message: format!("exit status: {status}; stderr: {}", stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

fn spawn_pipe_reader<R>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect_pipe(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default()
}

fn cleanup_command_child(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
