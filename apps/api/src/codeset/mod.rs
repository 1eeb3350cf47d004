//! Codeset resolver: static JSON lookup tables mapping classification codes
//! (regions, industries, languages) to localized display names.
//!
//! Files live in one directory, named `{codeset}_{lang}.json`, each holding a
//! flat JSON object of code to name. Tables are loaded once at startup;
//! lookups never fail, they degrade to `None`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::models::localized::Lang;

/// Region codeset name (maakunta).
pub const REGION_CODESET: &str = "maakunta";
/// Industry codeset name (toimiala). Hierarchical, 2-level: the 2-character
/// prefix of a code is its parent class.
pub const INDUSTRY_CODESET: &str = "toimiala";
/// Language codeset name (kieli).
pub const LANGUAGE_CODESET: &str = "kieli";

/// Length of a parent industry class code.
const INDUSTRY_PARENT_LEN: usize = 2;

#[derive(Debug, Default)]
pub struct CodesetResolver {
    tables: HashMap<(String, Lang), HashMap<String, String>>,
}

impl CodesetResolver {
    /// Empty resolver: every lookup misses. Used in tests and as the
    /// fallback when no codeset directory is configured.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads every `{codeset}_{lang}.json` file found in `dir`. Files with
    /// unrecognized names or languages are skipped with a warning; a missing
    /// directory is an error (misconfiguration, not missing data).
    pub fn load(dir: &Path) -> Result<Self> {
        let mut tables = HashMap::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("reading codeset directory {}", dir.display()))?;

        for entry in entries {
            let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some((codeset, lang)) = parse_file_stem(stem) else {
                warn!("Skipping codeset file with unrecognized name: {stem}.json");
                continue;
            };
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading codeset file {}", path.display()))?;
            let table: HashMap<String, String> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing codeset file {}", path.display()))?;
            debug!("Loaded codeset {codeset} ({lang}): {} codes", table.len());
            tables.insert((codeset.to_string(), lang), table);
        }

        Ok(Self { tables })
    }

    /// Localized display name of a code, or `None` if the table or the code
    /// is unknown.
    pub fn localized_name(&self, codeset: &str, code: &str, lang: Lang) -> Option<&str> {
        self.tables
            .get(&(codeset.to_string(), lang))
            .and_then(|table| table.get(code))
            .map(String::as_str)
    }

    /// True if any loaded language table of `codeset` knows `code`.
    pub fn has_code(&self, codeset: &str, code: &str) -> bool {
        Lang::ALL.iter().any(|lang| {
            self.tables
                .get(&(codeset.to_string(), *lang))
                .is_some_and(|table| table.contains_key(code))
        })
    }

    /// Resolves an industry code to its 2-character parent class, if that
    /// parent exists in the industry codeset.
    pub fn industry_parent(&self, code: &str) -> Option<String> {
        let prefix: String = code.chars().take(INDUSTRY_PARENT_LEN).collect();
        if prefix.is_empty() {
            return None;
        }
        self.has_code(INDUSTRY_CODESET, &prefix).then_some(prefix)
    }
}

/// Splits `toimiala_fi` into `("toimiala", Lang::Fi)`. The codeset name may
/// itself contain underscores; the language is always the last segment.
fn parse_file_stem(stem: &str) -> Option<(&str, Lang)> {
    let (codeset, lang) = stem.rsplit_once('_')?;
    let lang = lang.parse().ok()?;
    if codeset.is_empty() {
        return None;
    }
    Some((codeset, lang))
}
