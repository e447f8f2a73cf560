use std::collections::HashMap;

use parking_lot::Mutex;

use super::{EnvError, EnvResult, EnvironmentBackend};

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<(String, String), String>,
    writes: Vec<(String, String, String)>,
    unavailable: bool,
}

/// In-process stand-in for the desktop configuration store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(channel: &str, property: &str, value: &str) -> Self {
        let backend = Self::new();
        backend.insert(channel, property, value);
        backend
    }

    pub fn insert(&self, channel: &str, property: &str, value: &str) {
        self.state
            .lock()
            .values
            .insert((channel.to_string(), property.to_string()), value.to_string());
    }

    /// While unavailable, reads return `None` and writes fail without effect.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Successful writes in the order they happened, as `(channel, property, value)`.
    pub fn writes(&self) -> Vec<(String, String, String)> {
        self.state.lock().writes.clone()
    }
}

impl EnvironmentBackend for MemoryBackend {
    fn get(&self, channel: &str, property: &str) -> Option<String> {
        let state = self.state.lock();
        if state.unavailable {
            return None;
        }
        state
            .values
            .get(&(channel.to_string(), property.to_string()))
            .cloned()
    }

    fn set(&self, channel: &str, property: &str, value: &str) -> EnvResult<()> {
        let mut state = self.state.lock();
        if state.unavailable {
            return Err(EnvError::Unavailable {
                message: format!("{channel}{property} is not reachable"),
            });
        }
        state
            .values
            .insert((channel.to_string(), property.to_string()), value.to_string());
        state
            .writes
            .push((channel.to_string(), property.to_string(), value.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::{THEME_NAME_PROPERTY, XSETTINGS_CHANNEL};

    #[test]
    fn memory_backend_reads_back_written_values() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get(XSETTINGS_CHANNEL, THEME_NAME_PROPERTY), None);

        backend
            .set(XSETTINGS_CHANNEL, THEME_NAME_PROPERTY, "Greybird-dark")
            .expect("write should succeed");

        assert_eq!(
            backend.get(XSETTINGS_CHANNEL, THEME_NAME_PROPERTY).as_deref(),
            Some("Greybird-dark")
        );
        assert_eq!(backend.writes().len(), 1);
    }

    #[test]
    fn unavailable_backend_hides_values_and_rejects_writes() {
        let backend = MemoryBackend::with_value(XSETTINGS_CHANNEL, THEME_NAME_PROPERTY, "Adwaita");
        backend.set_unavailable(true);

        assert_eq!(backend.get(XSETTINGS_CHANNEL, THEME_NAME_PROPERTY), None);
        assert!(backend
            .set(XSETTINGS_CHANNEL, THEME_NAME_PROPERTY, "Adwaita-dark")
            .is_err());
        assert!(backend.writes().is_empty());

        backend.set_unavailable(false);
        assert_eq!(
            backend.get(XSETTINGS_CHANNEL, THEME_NAME_PROPERTY).as_deref(),
            Some("Adwaita")
        );
    }
}
