//! Translation-key extractor.
//!
//! A build-time static scanner for `t('namespace:key')`-style calls in UI
//! source files. It works over raw text windows with regexes, not a real
//! parser: malformed source degrades to "no matches", it never errors.
//!
//! Three behaviors matter downstream:
//! - only the first occurrence of a unique key is recorded; later usages of
//!   the same key are dropped, not accumulated;
//! - a key whose base form has plural variants in the loaded catalog is
//!   expanded into one synthetic usage per variant, and the bare base key is
//!   dropped (otherwise every pluralized catalog entry would be reported as
//!   unused);
//! - non-literal key arguments produce a warning unless a configured
//!   exception marks the call site as known-safe.

pub mod catalog;

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::extractor::catalog::TranslationCatalog;

/// One statically-resolved key usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationKeyUsage {
    pub namespace: String,
    pub key: String,
    pub file: String,
    /// 1-based line of the first occurrence.
    pub line: usize,
}

impl TranslationKeyUsage {
    pub fn full_key(&self) -> String {
        format!("{}:{}", self.namespace, self.key)
    }
}

/// Why a key argument could not be statically resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DynamicKeyKind {
    /// A template literal with interpolation, `` t(`x.${y}`) ``.
    TemplateLiteral,
    /// A bare identifier or member expression, `t(keyVar)`.
    Variable,
    /// Anything else (concatenation, call expressions, ...).
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicKeyWarning {
    pub file: String,
    pub line: usize,
    /// The offending call site as it appears in source.
    pub code: String,
    pub kind: DynamicKeyKind,
}

/// Known-safe dynamic call site: warnings whose snippet matches `pattern`
/// in files whose path ends with `file` are suppressed.
#[derive(Debug, Clone)]
pub struct ExceptionPattern {
    pub file: String,
    pub pattern: Regex,
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Namespace assumed for keys without a `ns:` prefix.
    pub default_namespace: String,
    pub exceptions: Vec<ExceptionPattern>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            default_namespace: "common".to_string(),
            exceptions: Vec::new(),
        }
    }
}

/// Result of scanning one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    pub keys: Vec<TranslationKeyUsage>,
    pub warnings: Vec<DynamicKeyWarning>,
}

/// Every `t(` call site with its first argument window. The window stops at
/// the first `)` or end of line, which is enough to classify the argument.
static CALL_SITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bt\(\s*([^)\n]*)").expect("call site regex is valid"));

/// A statically-determined first argument: a quoted string, or a template
/// literal without interpolation, followed by the end of the argument.
static STATIC_ARG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:'([^']*)'|"([^"]*)"|`([^`$]*)`)\s*(?:,.*)?$"#)
        .expect("static argument regex is valid")
});

/// Scans `code` for translation key usage. Never fails: unparseable text
/// simply yields no matches.
pub fn extract(
    code: &str,
    file_name: &str,
    catalog: &TranslationCatalog,
    options: &ExtractOptions,
) -> Extraction {
    let lines = LineIndex::new(code);
    let mut seen: HashSet<String> = HashSet::new();
    let mut extraction = Extraction::default();

    for captures in CALL_SITE.captures_iter(code) {
        let whole = captures.get(0).expect("capture 0 always present");
        let argument = captures
            .get(1)
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        let line = lines.line_of(whole.start());

        match resolve_static_key(argument) {
            Some(key) if !key.is_empty() => {
                record_usage(key, file_name, line, catalog, options, &mut seen, &mut extraction);
            }
            Some(_) => {} // empty literal, nothing to record
            None => {
                let warning = DynamicKeyWarning {
                    file: file_name.to_string(),
                    line,
                    code: whole.as_str().trim_end().to_string(),
                    kind: classify_dynamic(argument),
                };
                if !is_excepted(&warning, file_name, &options.exceptions) {
                    extraction.warnings.push(warning);
                }
            }
        }
    }

    extraction
}

/// Returns the literal key if the argument is statically determined.
fn resolve_static_key(argument: &str) -> Option<&str> {
    let captures = STATIC_ARG.captures(argument)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .or_else(|| captures.get(3))
        .map(|m| m.as_str())
}

fn classify_dynamic(argument: &str) -> DynamicKeyKind {
    if argument.starts_with('`') {
        return DynamicKeyKind::TemplateLiteral;
    }
    if argument
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
    {
        return DynamicKeyKind::Variable;
    }
    DynamicKeyKind::Other
}

fn is_excepted(
    warning: &DynamicKeyWarning,
    file_name: &str,
    exceptions: &[ExceptionPattern],
) -> bool {
    exceptions
        .iter()
        .any(|e| file_name.ends_with(&e.file) && e.pattern.is_match(&warning.code))
}

/// Records one resolved key, expanding plural variants and keeping only the
/// first occurrence per unique full key.
fn record_usage(
    key: &str,
    file_name: &str,
    line: usize,
    catalog: &TranslationCatalog,
    options: &ExtractOptions,
    seen: &mut HashSet<String>,
    extraction: &mut Extraction,
) {
    let (namespace, bare) = match key.split_once(':') {
        Some((namespace, bare)) => (namespace, bare),
        None => (options.default_namespace.as_str(), key),
    };

    let variants = catalog.plural_variants(namespace, bare);
    let keys: Vec<String> = if variants.is_empty() {
        vec![bare.to_string()]
    } else {
        // The bare base key is dropped once plural variants exist
        variants
    };

    for key in keys {
        let full = format!("{namespace}:{key}");
        if seen.insert(full) {
            extraction.keys.push(TranslationKeyUsage {
                namespace: namespace.to_string(),
                key,
                file: file_name.to_string(),
                line,
            });
        }
    }
}

/// Byte offset to 1-based line mapping over the raw text.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(code: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(code.char_indices().filter(|(_, c)| *c == '\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|start| *start <= offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_options() -> ExtractOptions {
        ExtractOptions::default()
    }

    fn keys_of(extraction: &Extraction) -> Vec<String> {
        extraction.keys.iter().map(|k| k.full_key()).collect()
    }

    #[test]
    fn test_literal_keys_with_and_without_namespace() {
        let code = r#"
            const a = t('tool:filters.region');
            const b = t("results.empty");
        "#;
        let extraction = extract(code, "Tool.tsx", &TranslationCatalog::empty(), &plain_options());
        assert_eq!(
            keys_of(&extraction),
            vec!["tool:filters.region", "common:results.empty"]
        );
        assert_eq!(extraction.keys[0].line, 2);
        assert_eq!(extraction.keys[1].line, 3);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_first_occurrence_per_key_wins() {
        let code = "t('a.b')\nt('a.b')\nt('a.b')\n";
        let extraction = extract(code, "x.ts", &TranslationCatalog::empty(), &plain_options());
        assert_eq!(extraction.keys.len(), 1);
        assert_eq!(extraction.keys[0].line, 1);
    }

    #[test]
    fn test_template_literal_without_interpolation_is_static() {
        let code = "t(`tool:sort.relevance`)";
        let extraction = extract(code, "x.ts", &TranslationCatalog::empty(), &plain_options());
        assert_eq!(keys_of(&extraction), vec!["tool:sort.relevance"]);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_dynamic_keys_are_warned_and_classified() {
        let code = "\
t(`tool.${kind}.label`)
t(labelKey)
t('prefix.' + suffix)
";
        let extraction = extract(code, "x.ts", &TranslationCatalog::empty(), &plain_options());
        assert!(extraction.keys.is_empty());
        let kinds: Vec<DynamicKeyKind> = extraction.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DynamicKeyKind::TemplateLiteral,
                DynamicKeyKind::Variable,
                DynamicKeyKind::Other
            ]
        );
        assert_eq!(extraction.warnings[0].line, 1);
        assert!(extraction.warnings[1].code.contains("t(labelKey"));
    }

    #[test]
    fn test_exception_suppresses_known_safe_dynamic_call() {
        let code = "t(`opportunity.${kind}.title`)";
        let options = ExtractOptions {
            exceptions: vec![ExceptionPattern {
                file: "OpportunityCard.tsx".to_string(),
                pattern: Regex::new(r"opportunity\.\$\{kind\}").unwrap(),
            }],
            ..ExtractOptions::default()
        };
        let catalog = TranslationCatalog::empty();

        let suppressed = extract(code, "src/components/OpportunityCard.tsx", &catalog, &options);
        assert!(suppressed.warnings.is_empty());

        // Same pattern in another file still warns
        let elsewhere = extract(code, "src/components/Other.tsx", &catalog, &options);
        assert_eq!(elsewhere.warnings.len(), 1);
    }

    #[test]
    fn test_plural_variants_replace_base_key() {
        let mut catalog = TranslationCatalog::empty();
        catalog.insert_namespace(
            "common",
            ["item", "item_one", "item_other", "unrelated"]
                .into_iter()
                .map(str::to_string),
        );
        let extraction = extract("t('item')", "x.ts", &catalog, &plain_options());
        assert_eq!(
            keys_of(&extraction),
            vec!["common:item_one", "common:item_other"]
        );
    }

    #[test]
    fn test_key_without_plural_variants_kept_as_is() {
        let mut catalog = TranslationCatalog::empty();
        catalog.insert_namespace("common", ["title".to_string()]);
        let extraction = extract("t('title')", "x.ts", &catalog, &plain_options());
        assert_eq!(keys_of(&extraction), vec!["common:title"]);
    }

    #[test]
    fn test_malformed_source_never_panics() {
        for code in ["t(", "t('unterminated", "t()", "t(`half ${", "}\u{0})t('", ""] {
            let _ = extract(code, "x.ts", &TranslationCatalog::empty(), &plain_options());
        }
        // An unterminated literal is not a static key
        let extraction = extract(
            "t('unterminated",
            "x.ts",
            &TranslationCatalog::empty(),
            &plain_options(),
        );
        assert!(extraction.keys.is_empty());
    }

    #[test]
    fn test_member_call_sites_are_found() {
        let code = "i18n.t('tool:title')";
        let extraction = extract(code, "x.ts", &TranslationCatalog::empty(), &plain_options());
        assert_eq!(keys_of(&extraction), vec!["tool:title"]);
    }
}
