use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::{parse_interval, ClockTime, ScheduleError, TimeWindow};
use crate::theme::SuffixRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "duskswitch";
const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_DARK_START: ClockTime = clock(19, 0);
const DEFAULT_DARK_END: ClockTime = clock(5, 0);

const fn clock(hour: u8, minute: u8) -> ClockTime {
    match ClockTime::from_hm(hour, minute) {
        Some(time) => time,
        None => panic!("invalid default clock time"),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("failed to write settings: {path}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to parse settings")]
    Parse(#[from] serde_json::Error),
    #[error("settings root must be a JSON object")]
    NotAnObject,
    #[error(transparent)]
    InvalidInput(#[from] ScheduleError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// User settings persisted in `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub auto_switch_enabled: bool,
    pub dark_start: ClockTime,
    pub dark_end: ClockTime,
    pub last_theme: String,
    pub notifications: bool,
    pub suffix_rule: SuffixRule,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_switch_enabled: false,
            dark_start: DEFAULT_DARK_START,
            dark_end: DEFAULT_DARK_END,
            last_theme: String::new(),
            notifications: true,
            suffix_rule: SuffixRule::default(),
        }
    }
}

impl Settings {
    pub fn dark_window(&self) -> TimeWindow {
        TimeWindow::new(self.dark_start, self.dark_end)
    }
}

#[derive(Debug)]
struct StoreState {
    settings: Settings,
    /// What the file held at the last read or successful write.
    synced: Option<Settings>,
}

/// The process-owned settings plus the file that mirrors them.
///
/// Every mutation goes through [`SettingsStore::update`], which persists the
/// whole record before releasing the lock. Other processes may rewrite the
/// file; [`SettingsStore::reload`] picks those writes up.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<StoreState>,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = load_settings(&path);
        let synced = path.exists().then(|| settings.clone());
        Self {
            path,
            current: RwLock::new(StoreState { settings, synced }),
        }
    }

    pub fn open_default() -> ConfigResult<Self> {
        Ok(Self::open(default_settings_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Settings {
        self.current.read().settings.clone()
    }

    pub fn dark_window(&self) -> TimeWindow {
        self.current.read().settings.dark_window()
    }

    /// Adopts the file's contents when they differ from what this store last
    /// read or wrote. Returns whether the in-memory settings changed. A missing
    /// or unparseable file keeps the current value.
    pub fn reload(&self) -> bool {
        let mut state = self.current.write();
        let serialized = match fs::read_to_string(&self.path) {
            Ok(serialized) => serialized,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return false,
            Err(err) => {
                tracing::warn!(?err, path = %self.path.display(), "failed to re-read settings");
                return false;
            }
        };
        let on_disk = match parse_settings_with_repair(&serialized) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(?err, path = %self.path.display(), "ignoring unparseable settings");
                return false;
            }
        };
        if state.synced.as_ref() == Some(&on_disk) {
            return false;
        }

        let changed = state.settings != on_disk;
        state.synced = Some(on_disk.clone());
        state.settings = on_disk;
        if changed {
            tracing::info!(path = %self.path.display(), "settings changed on disk");
        }
        changed
    }

    /// Applies `mutate` and writes the result. A failed write leaves the
    /// in-memory value in place.
    pub fn update<F>(&self, mutate: F) -> ConfigResult<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut state = self.current.write();
        mutate(&mut state.settings);
        if let Err(err) = save_settings(&self.path, &state.settings) {
            tracing::warn!(?err, path = %self.path.display(), "settings not persisted");
            return Err(err);
        }
        state.synced = Some(state.settings.clone());
        Ok(state.settings.clone())
    }

    pub fn set_auto_switch(&self, enabled: bool) -> ConfigResult<Settings> {
        self.update(|settings| settings.auto_switch_enabled = enabled)
    }

    /// Validates `input` as `HH:MM-HH:MM` before touching anything.
    pub fn set_interval(&self, input: &str) -> ConfigResult<TimeWindow> {
        let window = parse_interval(input)?;
        self.set_window(window)
    }

    pub fn set_window(&self, window: TimeWindow) -> ConfigResult<TimeWindow> {
        self.update(|settings| {
            settings.dark_start = window.start;
            settings.dark_end = window.end;
        })?;
        Ok(window)
    }

    pub fn record_last_theme(&self, theme: &str) -> ConfigResult<Settings> {
        self.update(|settings| settings.last_theme = theme.to_string())
    }
}

/// Reads settings, falling back to defaults when the file is missing or unreadable.
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let serialized = match fs::read_to_string(path) {
        Ok(serialized) => serialized,
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read settings; using defaults");
            return Settings::default();
        }
    };
    parse_settings_with_repair(&serialized).unwrap_or_else(|err| {
        tracing::warn!(?err, ?path, "failed to parse settings; using defaults");
        Settings::default()
    })
}

/// Writes the whole record through a sibling temp file and a rename.
pub fn save_settings(path: &Path, settings: &Settings) -> ConfigResult<()> {
    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let serialized = serde_json::to_string_pretty(settings)?;
    let staging = staging_path(path);
    fs::write(&staging, serialized).map_err(write_error)?;
    if let Err(err) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(write_error(err));
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| SETTINGS_FILE.into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Parses settings keeping every valid field; invalid or missing fields take
/// their defaults.
pub fn parse_settings_with_repair(serialized: &str) -> ConfigResult<Settings> {
    let raw: serde_json::Value = serde_json::from_str(serialized)?;
    let object = raw.as_object().ok_or(ConfigError::NotAnObject)?;
    let defaults = Settings::default();

    Ok(Settings {
        auto_switch_enabled: field_or(
            object,
            "auto_switch_enabled",
            defaults.auto_switch_enabled,
        ),
        dark_start: field_or(object, "dark_start", defaults.dark_start),
        dark_end: field_or(object, "dark_end", defaults.dark_end),
        last_theme: field_or(object, "last_theme", defaults.last_theme),
        notifications: field_or(object, "notifications", defaults.notifications),
        suffix_rule: field_or(object, "suffix_rule", defaults.suffix_rule),
    })
}

fn field_or<T: DeserializeOwned>(
    object: &serde_json::Map<String, serde_json::Value>,
    key: &str,
    fallback: T,
) -> T {
    let Some(value) = object.get(key) else {
        return fallback;
    };
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(key, %err, "invalid settings field; using default");
            fallback
        }
    }
}

pub fn default_settings_path() -> ConfigResult<PathBuf> {
    let (xdg_config_home, home) = config_env_dirs();
    settings_path_with(xdg_config_home.as_deref(), home.as_deref())
}

fn settings_path_with(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> ConfigResult<PathBuf> {
    app_config_path(APP_DIR, SETTINGS_FILE, xdg_config_home, home).map_err(|error| match error {
        ConfigPathError::MissingHomeDirectory => ConfigError::MissingHomeDirectory,
    })
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_root() -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let pid = std::process::id();
        path.push(format!("duskswitch-config-{pid}-{nanos}"));
        path
    }

    fn with_temp_root<F: FnOnce(&Path)>(f: F) {
        let root = fixture_root();
        fs::create_dir_all(&root).unwrap();
        f(&root);
        let _ = fs::remove_dir_all(&root);
    }

    fn at(value: &str) -> ClockTime {
        value.parse().unwrap()
    }

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "duskswitch",
            "settings.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/config-root/duskswitch/settings.json")
        );
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path(
            "duskswitch",
            "settings.json",
            Some(Path::new("")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/home/.config/duskswitch/settings.json")
        );
    }

    #[test]
    fn settings_path_errors_when_home_missing_and_xdg_unset() {
        let error = settings_path_with(None, None).unwrap_err();
        assert!(matches!(error, ConfigError::MissingHomeDirectory));
    }

    #[test]
    fn missing_file_loads_defaults() {
        with_temp_root(|root| {
            let settings = load_settings(&root.join("settings.json"));
            assert_eq!(settings, Settings::default());
            assert!(!settings.auto_switch_enabled);
            assert_eq!(settings.dark_start, at("19:00"));
            assert_eq!(settings.dark_end, at("05:00"));
            assert!(settings.last_theme.is_empty());
        });
    }

    #[test]
    fn save_then_load_round_trips() {
        with_temp_root(|root| {
            let path = root.join("nested/settings.json");
            let settings = Settings {
                auto_switch_enabled: true,
                dark_start: at("21:30"),
                dark_end: at("06:15"),
                last_theme: "Adwaita-dark".to_string(),
                notifications: false,
                suffix_rule: SuffixRule::Unanchored,
            };

            save_settings(&path, &settings).unwrap();
            assert_eq!(load_settings(&path), settings);
            assert!(!staging_path(&path).exists());
        });
    }

    #[test]
    fn saved_file_uses_plain_keys_and_indentation() {
        with_temp_root(|root| {
            let path = root.join("settings.json");
            save_settings(&path, &Settings::default()).unwrap();
            let serialized = fs::read_to_string(&path).unwrap();

            assert!(serialized.contains("\n  \"auto_switch_enabled\": false"));
            assert!(serialized.contains("\"dark_start\": \"19:00\""));
            assert!(serialized.contains("\"dark_end\": \"05:00\""));
            assert!(serialized.contains("\"last_theme\": \"\""));
        });
    }

    #[test]
    fn malformed_field_is_repaired_individually() {
        let settings = parse_settings_with_repair(
            r#"{"auto_switch_enabled": true, "dark_start": "25:99", "dark_end": "06:00", "last_theme": 7}"#,
        )
        .unwrap();

        assert!(settings.auto_switch_enabled);
        assert_eq!(settings.dark_start, at("19:00"));
        assert_eq!(settings.dark_end, at("06:00"));
        assert_eq!(settings.last_theme, "");
        assert!(settings.notifications);
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        with_temp_root(|root| {
            let path = root.join("settings.json");
            fs::write(&path, "{ not json").unwrap();
            assert_eq!(load_settings(&path), Settings::default());

            fs::write(&path, "[1, 2]").unwrap();
            assert_eq!(load_settings(&path), Settings::default());
        });
    }

    #[test]
    fn store_persists_every_mutation() {
        with_temp_root(|root| {
            let path = root.join("settings.json");
            let store = SettingsStore::open(&path);

            store.set_auto_switch(true).unwrap();
            store.set_interval("20:00-07:00").unwrap();
            store.record_last_theme("Arc-Dark").unwrap();

            let reloaded = load_settings(&path);
            assert!(reloaded.auto_switch_enabled);
            assert_eq!(reloaded.dark_window().to_string(), "20:00-07:00");
            assert_eq!(reloaded.last_theme, "Arc-Dark");
            assert_eq!(store.snapshot(), reloaded);
        });
    }

    #[test]
    fn malformed_interval_leaves_settings_untouched() {
        with_temp_root(|root| {
            let path = root.join("settings.json");
            let store = SettingsStore::open(&path);
            store.set_interval("18:00-06:00").unwrap();
            let before = fs::read_to_string(&path).unwrap();

            for bad in ["25:99-05:00", "1900-0500"] {
                let err = store.set_interval(bad).unwrap_err();
                assert!(matches!(
                    err,
                    ConfigError::InvalidInput(ScheduleError::MalformedInterval { .. })
                ));
            }

            assert_eq!(store.dark_window().to_string(), "18:00-06:00");
            assert_eq!(fs::read_to_string(&path).unwrap(), before);
        });
    }

    #[test]
    fn reload_picks_up_writes_from_another_store() {
        with_temp_root(|root| {
            let path = root.join("settings.json");
            let daemon = SettingsStore::open(&path);
            let command = SettingsStore::open(&path);
            assert!(!daemon.reload());

            command.set_auto_switch(true).unwrap();
            assert!(daemon.reload());
            assert!(daemon.snapshot().auto_switch_enabled);
            assert!(!daemon.reload());

            command.set_interval("21:00-06:30").unwrap();
            assert!(daemon.reload());
            assert_eq!(daemon.dark_window().to_string(), "21:00-06:30");
        });
    }

    #[test]
    fn reload_ignores_own_writes_and_unparseable_files() {
        with_temp_root(|root| {
            let path = root.join("settings.json");
            let store = SettingsStore::open(&path);
            store.set_auto_switch(true).unwrap();
            assert!(!store.reload());

            fs::write(&path, "{ not json").unwrap();
            assert!(!store.reload());
            assert!(store.snapshot().auto_switch_enabled);
        });
    }

    #[test]
    fn reload_without_file_keeps_unsaved_value() {
        with_temp_root(|root| {
            let blocker = root.join("blocker");
            fs::write(&blocker, "file, not a directory").unwrap();
            let store = SettingsStore::open(blocker.join("settings.json"));

            assert!(store.set_auto_switch(true).is_err());
            assert!(!store.reload());
            assert!(store.snapshot().auto_switch_enabled);
        });
    }

    #[test]
    fn failed_write_keeps_in_memory_value() {
        with_temp_root(|root| {
            let blocker = root.join("blocker");
            fs::write(&blocker, "file, not a directory").unwrap();
            let store = SettingsStore::open(blocker.join("settings.json"));

            let err = store.set_auto_switch(true).unwrap_err();
            assert!(matches!(err, ConfigError::Write { .. }));
            assert!(store.snapshot().auto_switch_enabled);
        });
    }
}
