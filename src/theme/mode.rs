use serde::{Deserialize, Serialize};

const DARK_MARKERS: [&str; 3] = ["dark", "black", "noir"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Light,
    Dark,
}

impl Mode {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a theme by name alone: any of the dark markers anywhere in the
/// name, ignoring case, makes it dark.
pub fn classify(name: &str) -> Mode {
    let lowered = name.to_lowercase();
    if DARK_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        Mode::Dark
    } else {
        Mode::Light
    }
}
