mod catalog;
mod mode;

pub use catalog::{
    base_name, default_theme_dirs, list_theme_names, PairingTable, SuffixRule, ThemeCatalog,
    ThemePair,
};
pub use mode::{classify, Mode};
