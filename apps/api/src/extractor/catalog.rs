//! Translation catalog loading for the extractor.
//!
//! Catalogs live in `{locales_dir}/{lang}/{namespace}.json`; nested objects
//! flatten to dotted keys, matching how the UI addresses them. A missing
//! directory or namespace is not an error: it just means no plural variants
//! can be resolved.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::models::localized::Lang;

/// CLDR plural suffixes, in reporting order.
const PLURAL_SUFFIXES: [&str; 6] = ["_zero", "_one", "_two", "_few", "_many", "_other"];

#[derive(Debug, Clone, Default)]
pub struct TranslationCatalog {
    namespaces: HashMap<String, HashSet<String>>,
}

impl TranslationCatalog {
    /// A catalog with no namespaces: every plural lookup is empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads every `{namespace}.json` under `{dir}/{lang}/`. Missing or
    /// unreadable files degrade to absent namespaces rather than errors;
    /// the extractor must keep working without catalogs.
    pub fn load(dir: &Path, lang: Lang) -> Self {
        let mut catalog = Self::default();
        let lang_dir = dir.join(lang.as_str());
        let entries = match std::fs::read_dir(&lang_dir) {
            Ok(entries) => entries,
            Err(_) => {
                warn!(
                    "No translation catalogs under {}, plural variants unavailable",
                    lang_dir.display()
                );
                return catalog;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(namespace) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Ok(raw) = std::fs::read_to_string(&path) else {
                warn!("Skipping unreadable catalog {}", path.display());
                continue;
            };
            let Ok(value) = serde_json::from_str::<Value>(&raw) else {
                warn!("Skipping malformed catalog {}", path.display());
                continue;
            };
            let mut keys = HashSet::new();
            flatten("", &value, &mut keys);
            catalog.namespaces.insert(namespace.to_string(), keys);
        }
        catalog
    }

    pub fn insert_namespace(&mut self, namespace: &str, keys: impl IntoIterator<Item = String>) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .extend(keys);
    }

    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.namespaces
            .get(namespace)
            .is_some_and(|keys| keys.contains(key))
    }

    /// Plural variants of `base` actually present in the catalog, e.g.
    /// `item` with `item_one` and `item_other` loaded yields those two.
    /// Unknown namespaces yield an empty list.
    pub fn plural_variants(&self, namespace: &str, base: &str) -> Vec<String> {
        let Some(keys) = self.namespaces.get(namespace) else {
            return Vec::new();
        };
        PLURAL_SUFFIXES
            .iter()
            .map(|suffix| format!("{base}{suffix}"))
            .filter(|candidate| keys.contains(candidate))
            .collect()
    }
}

/// Flattens nested catalog objects into dotted keys. Leaves (strings,
/// numbers, anything non-object) become keys; empty prefixes are skipped.
fn flatten(prefix: &str, value: &Value, out: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        _ => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string());
            }
        }
    }
}
