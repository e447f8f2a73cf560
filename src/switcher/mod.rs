use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::desktop::{
    EnvironmentBackend, THEME_NAME_PROPERTY, XFWM_CHANNEL, XFWM_THEME_PROPERTY,
    XSETTINGS_CHANNEL,
};
use crate::theme::{classify, Mode, SuffixRule, ThemeCatalog};

const XFWM_RESOURCE_DIR: &str = "xfwm4";

#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("current theme could not be read from the desktop environment")]
    CurrentThemeUnknown,
    #[error("no counterpart found for {current}")]
    NoCounterpartFound { current: String },
}

pub type SwitchResult<T> = std::result::Result<T, SwitchError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTheme {
    pub name: String,
    pub mode: Mode,
}

/// Applies themes through an [`EnvironmentBackend`] using an owned catalog.
pub struct ThemeSwitcher<B> {
    backend: B,
    search_paths: Vec<PathBuf>,
    catalog: RwLock<Arc<ThemeCatalog>>,
}

impl<B: EnvironmentBackend> ThemeSwitcher<B> {
    pub fn new(backend: B, search_paths: Vec<PathBuf>, catalog: ThemeCatalog) -> Self {
        Self {
            backend,
            search_paths,
            catalog: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Builds the catalog from `search_paths` first.
    pub fn scan(backend: B, search_paths: Vec<PathBuf>, rule: SuffixRule) -> Self {
        let catalog = ThemeCatalog::scan(&search_paths, rule);
        Self::new(backend, search_paths, catalog)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn catalog(&self) -> Arc<ThemeCatalog> {
        Arc::clone(&self.catalog.read())
    }

    /// Re-derives the whole catalog and swaps it in.
    pub fn rescan(&self, rule: SuffixRule) -> Arc<ThemeCatalog> {
        let catalog = Arc::new(ThemeCatalog::scan(&self.search_paths, rule));
        *self.catalog.write() = Arc::clone(&catalog);
        catalog
    }

    pub fn current_theme(&self) -> Option<String> {
        self.backend.get(XSETTINGS_CHANNEL, THEME_NAME_PROPERTY)
    }

    pub fn current_mode(&self) -> Option<Mode> {
        self.current_theme().map(|name| classify(&name))
    }

    pub fn counterpart_of(&self, theme: &str) -> Option<String> {
        self.catalog
            .read()
            .table()
            .counterpart_of(theme)
            .map(str::to_string)
    }

    /// Switches the live theme to its opposite-mode sibling. Nothing is applied
    /// when the current theme is unknown or has no counterpart.
    pub fn toggle(&self) -> SwitchResult<AppliedTheme> {
        let current = self
            .current_theme()
            .ok_or(SwitchError::CurrentThemeUnknown)?;
        let Some(target) = self.counterpart_of(&current) else {
            tracing::info!(current = %current, "no counterpart theme found");
            return Err(SwitchError::NoCounterpartFound { current });
        };
        tracing::info!(from = %current, to = %target, "toggling theme");
        Ok(self.apply(&target))
    }

    /// Applies `name` as-is, without a pairing lookup.
    pub fn set_theme(&self, name: &str) -> AppliedTheme {
        self.apply(name)
    }

    fn apply(&self, name: &str) -> AppliedTheme {
        if let Err(err) = self
            .backend
            .set(XSETTINGS_CHANNEL, THEME_NAME_PROPERTY, name)
        {
            tracing::warn!(theme = name, ?err, "failed to apply interface theme");
        }
        self.apply_window_manager_theme(name);

        let live = self.current_theme();
        let mode = classify(live.as_deref().unwrap_or(name));
        AppliedTheme {
            name: name.to_string(),
            mode,
        }
    }

    fn apply_window_manager_theme(&self, name: &str) {
        let Some(directory) = self
            .search_paths
            .iter()
            .find(|directory| directory.join(name).join(XFWM_RESOURCE_DIR).exists())
        else {
            tracing::debug!(theme = name, "no window manager theme bundled");
            return;
        };
        tracing::debug!(
            theme = name,
            path = %directory.display(),
            "applying window manager theme"
        );
        if let Err(err) = self.backend.set(XFWM_CHANNEL, XFWM_THEME_PROPERTY, name) {
            tracing::warn!(theme = name, ?err, "failed to apply window manager theme");
        }
    }
}
