use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::mode::{classify, Mode};

const MODE_SUFFIXES: [&str; 4] = ["-dark", "-light", "-black", "-noir"];
const SYSTEM_THEME_DIR: &str = "/usr/share/themes";

/// How a mode suffix is located when deriving a family's base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuffixRule {
    /// Only a suffix that ends the name is stripped.
    #[default]
    Anchored,
    /// The leftmost suffix occurrence is stripped wherever it appears.
    Unanchored,
}

impl SuffixRule {
    pub fn as_str(self) -> &'static str {
        match self {
            SuffixRule::Anchored => "anchored",
            SuffixRule::Unanchored => "unanchored",
        }
    }
}

/// Strips one mode suffix (`-dark`, `-light`, `-black`, `-noir`, any case)
/// to get the family a theme belongs to.
pub fn base_name(name: &str, rule: SuffixRule) -> String {
    // ASCII lowering keeps byte offsets aligned with `name`.
    let lowered = name.to_ascii_lowercase();
    let found = match rule {
        SuffixRule::Anchored => MODE_SUFFIXES
            .iter()
            .find(|suffix| lowered.ends_with(*suffix))
            .map(|suffix| (name.len() - suffix.len(), suffix.len())),
        SuffixRule::Unanchored => MODE_SUFFIXES
            .iter()
            .filter_map(|suffix| lowered.find(suffix).map(|start| (start, suffix.len())))
            .min_by_key(|(start, _)| *start),
    };
    match found {
        Some((start, len)) => format!("{}{}", &name[..start], &name[start + len..]),
        None => name.to_string(),
    }
}

/// The light and dark members of one family, each sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemePair {
    pub light: Vec<String>,
    pub dark: Vec<String>,
}

impl ThemePair {
    pub fn light_key(&self) -> String {
        self.light.join(",")
    }

    pub fn dark_key(&self) -> String {
        self.dark.join(",")
    }

    fn side(&self, mode: Mode) -> &[String] {
        match mode {
            Mode::Light => &self.light,
            Mode::Dark => &self.dark,
        }
    }
}

/// Bidirectional light/dark pairing built from one catalog scan.
///
/// `entries` keeps the canonical comma-joined form in both directions.
/// `index` maps every paired theme to its family and side, so lookups do not
/// depend on map iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingTable {
    pairs: Vec<ThemePair>,
    entries: BTreeMap<String, String>,
    index: HashMap<String, (usize, Mode)>,
}

impl PairingTable {
    pub fn from_themes<I, S>(names: I, rule: SuffixRule) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut families: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for name in names {
            let name = name.into();
            families
                .entry(base_name(&name, rule))
                .or_default()
                .insert(name);
        }

        let mut table = Self::default();
        for (base, members) in families {
            let (dark, light): (Vec<String>, Vec<String>) = members
                .into_iter()
                .partition(|member| classify(member).is_dark());
            if light.is_empty() || dark.is_empty() {
                tracing::trace!(family = %base, "family has a single mode; no pairing");
                continue;
            }
            table.insert(ThemePair { light, dark });
        }
        table
    }

    fn insert(&mut self, pair: ThemePair) {
        let position = self.pairs.len();
        for member in &pair.light {
            self.index.insert(member.clone(), (position, Mode::Light));
        }
        for member in &pair.dark {
            self.index.insert(member.clone(), (position, Mode::Dark));
        }
        let light_key = pair.light_key();
        let dark_key = pair.dark_key();
        self.entries.insert(light_key.clone(), dark_key.clone());
        self.entries.insert(dark_key, light_key);
        self.pairs.push(pair);
    }

    /// Canonical `(members, counterpart members)` keys, both directions, sorted.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn pairs(&self) -> &[ThemePair] {
        &self.pairs
    }

    /// The concrete theme to switch to: first sorted member of the opposite side.
    pub fn counterpart_of(&self, name: &str) -> Option<&str> {
        let (position, mode) = self.index.get(name)?;
        self.pairs[*position]
            .side(mode.opposite())
            .first()
            .map(String::as_str)
    }

    pub fn is_counterpart_of(&self, a: &str, b: &str) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some((family_a, mode_a)), Some((family_b, mode_b))) => {
                family_a == family_b && mode_a != mode_b
            }
            _ => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of canonical entries, counting both directions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Installed theme names plus the pairing derived from them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeCatalog {
    themes: BTreeSet<String>,
    table: PairingTable,
}

impl ThemeCatalog {
    pub fn scan(search_paths: &[PathBuf], rule: SuffixRule) -> Self {
        let themes = list_theme_names(search_paths);
        let table = PairingTable::from_themes(themes.iter().cloned(), rule);
        tracing::debug!(
            themes = themes.len(),
            pairs = table.pairs().len(),
            "built theme catalog"
        );
        Self { themes, table }
    }

    pub fn from_names<I, S>(names: I, rule: SuffixRule) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let themes: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let table = PairingTable::from_themes(themes.iter().cloned(), rule);
        Self { themes, table }
    }

    pub fn themes(&self) -> impl Iterator<Item = &str> {
        self.themes.iter().map(String::as_str)
    }

    pub fn table(&self) -> &PairingTable {
        &self.table
    }
}

/// Every immediate subdirectory name across `search_paths`, deduplicated.
pub fn list_theme_names(search_paths: &[PathBuf]) -> BTreeSet<String> {
    let mut themes = BTreeSet::new();
    for directory in search_paths {
        if !directory.is_dir() {
            continue;
        }
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    ?err,
                    path = %directory.display(),
                    "failed to read theme directory"
                );
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                themes.insert(name.to_string());
            }
        }
    }
    themes
}

pub fn default_theme_dirs() -> Vec<PathBuf> {
    default_theme_dirs_with(
        std::env::var_os("HOME").map(PathBuf::from).as_deref(),
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from).as_deref(),
    )
}

pub(crate) fn default_theme_dirs_with(
    home: Option<&Path>,
    xdg_data_home: Option<&Path>,
) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = home {
        dirs.push(home.join(".themes"));
    }
    match (xdg_data_home.filter(|path| !path.as_os_str().is_empty()), home) {
        (Some(data_home), _) => dirs.push(data_home.join("themes")),
        (None, Some(home)) => dirs.push(home.join(".local/share/themes")),
        (None, None) => {}
    }
    dirs.push(PathBuf::from(SYSTEM_THEME_DIR));

    let mut seen = BTreeSet::new();
    dirs.retain(|dir| seen.insert(dir.clone()));
    dirs
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
        path.push(format!("duskswitch-catalog-{pid}-{nanos}"));
        path
    }

    fn with_theme_dirs<F: FnOnce(&[PathBuf])>(layout: &[&[&str]], f: F) {
        let root = fixture_root();
        let mut dirs = Vec::new();
        for (position, themes) in layout.iter().enumerate() {
            let dir = root.join(format!("themes-{position}"));
            for theme in *themes {
                fs::create_dir_all(dir.join(theme)).unwrap();
            }
            dirs.push(dir);
        }
        f(&dirs);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn base_name_anchored_only_strips_trailing_suffix() {
        assert_eq!(base_name("Adwaita-dark", SuffixRule::Anchored), "Adwaita");
        assert_eq!(base_name("Arc-Light", SuffixRule::Anchored), "Arc");
        assert_eq!(base_name("Numix-BLACK", SuffixRule::Anchored), "Numix");
        assert_eq!(base_name("Darkwood", SuffixRule::Anchored), "Darkwood");
        assert_eq!(
            base_name("Adwaita-dark-compact", SuffixRule::Anchored),
            "Adwaita-dark-compact"
        );
    }

    #[test]
    fn base_name_unanchored_strips_leftmost_occurrence() {
        assert_eq!(
            base_name("Adwaita-dark-compact", SuffixRule::Unanchored),
            "Adwaita-compact"
        );
        assert_eq!(base_name("Arc-Noir", SuffixRule::Unanchored), "Arc");
        assert_eq!(
            base_name("Foo-light-dark", SuffixRule::Unanchored),
            "Foo-dark"
        );
        assert_eq!(base_name("Adwaita", SuffixRule::Unanchored), "Adwaita");
    }

    #[test]
    fn pairing_table_is_bidirectional_with_sorted_keys() {
        let table = PairingTable::from_themes(
            ["Arc-Light", "Arc", "Arc-Dark", "Arc-Noir"],
            SuffixRule::Anchored,
        );

        let entries: BTreeMap<&str, &str> = table.entries().collect();
        assert_eq!(table.len(), 2);
        assert_eq!(entries.get("Arc,Arc-Light"), Some(&"Arc-Dark,Arc-Noir"));
        assert_eq!(entries.get("Arc-Dark,Arc-Noir"), Some(&"Arc,Arc-Light"));
        for (key, value) in &entries {
            assert_eq!(entries.get(value), Some(key));
        }
    }

    #[test]
    fn single_mode_families_produce_no_entries() {
        let table = PairingTable::from_themes(
            ["Greybird", "Greybird-light", "Nordic-dark", "Adwaita", "Adwaita-dark"],
            SuffixRule::Anchored,
        );

        assert_eq!(table.pairs().len(), 1);
        assert!(!table.contains("Greybird"));
        assert!(!table.contains("Nordic-dark"));
        assert_eq!(table.counterpart_of("Nordic-dark"), None);
        assert_eq!(table.counterpart_of("Adwaita"), Some("Adwaita-dark"));
    }

    #[test]
    fn counterpart_lookup_picks_first_sorted_member() {
        let table = PairingTable::from_themes(
            ["Arc-Noir", "Arc-Dark", "Arc", "Arc-Light"],
            SuffixRule::Anchored,
        );

        assert_eq!(table.counterpart_of("Arc-Noir"), Some("Arc"));
        assert_eq!(table.counterpart_of("Arc-Light"), Some("Arc-Dark"));
        assert_eq!(table.counterpart_of("Missing"), None);
    }

    #[test]
    fn is_counterpart_of_is_symmetric() {
        let table = PairingTable::from_themes(
            ["Adwaita", "Adwaita-dark", "Arc", "Arc-Dark"],
            SuffixRule::Anchored,
        );
        let names = ["Adwaita", "Adwaita-dark", "Arc", "Arc-Dark", "Unknown"];
        for a in names {
            for b in names {
                assert_eq!(table.is_counterpart_of(a, b), table.is_counterpart_of(b, a));
            }
        }
        assert!(table.is_counterpart_of("Adwaita", "Adwaita-dark"));
        assert!(!table.is_counterpart_of("Adwaita", "Arc-Dark"));
        assert!(!table.is_counterpart_of("Adwaita", "Adwaita"));
    }

    #[test]
    fn anchored_rule_keeps_darkwood_out_of_wood_family() {
        let anchored =
            PairingTable::from_themes(["Wood", "Darkwood", "Wood-dark"], SuffixRule::Anchored);
        assert_eq!(anchored.counterpart_of("Wood"), Some("Wood-dark"));
        assert!(!anchored.contains("Darkwood"));
    }

    #[test]
    fn scan_collapses_duplicates_across_search_paths() {
        with_theme_dirs(
            &[&["Adwaita", "Adwaita-dark"], &["Adwaita", "Greybird"]],
            |dirs| {
                let catalog = ThemeCatalog::scan(dirs, SuffixRule::Anchored);
                let themes: Vec<&str> = catalog.themes().collect();
                assert_eq!(themes, vec!["Adwaita", "Adwaita-dark", "Greybird"]);
                assert_eq!(catalog.table().pairs().len(), 1);
            },
        );
    }

    #[test]
    fn scan_ignores_missing_directories_and_plain_files() {
        with_theme_dirs(&[&["Arc", "Arc-Dark"]], |dirs| {
            fs::write(dirs[0].join("README"), "not a theme").unwrap();
            let mut paths = vec![dirs[0].with_file_name("does-not-exist")];
            paths.extend_from_slice(dirs);

            let catalog = ThemeCatalog::scan(&paths, SuffixRule::Anchored);
            let themes: Vec<&str> = catalog.themes().collect();
            assert_eq!(themes, vec!["Arc", "Arc-Dark"]);
        });
    }

    #[test]
    fn scan_is_idempotent() {
        with_theme_dirs(
            &[&["Adwaita", "Adwaita-dark", "Arc-Light", "Arc-Dark", "Nordic"]],
            |dirs| {
                let first = ThemeCatalog::scan(dirs, SuffixRule::Anchored);
                let second = ThemeCatalog::scan(dirs, SuffixRule::Anchored);
                assert_eq!(first, second);
            },
        );
    }

    #[test]
    fn default_theme_dirs_prefers_xdg_data_home() {
        let dirs = default_theme_dirs_with(
            Some(Path::new("/home/user")),
            Some(Path::new("/data/home")),
        );
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/home/user/.themes"),
                PathBuf::from("/data/home/themes"),
                PathBuf::from("/usr/share/themes"),
            ]
        );

        let fallback = default_theme_dirs_with(Some(Path::new("/home/user")), None);
        assert_eq!(fallback[1], PathBuf::from("/home/user/.local/share/themes"));

        let bare = default_theme_dirs_with(None, None);
        assert_eq!(bare, vec![PathBuf::from("/usr/share/themes")]);
    }
}
