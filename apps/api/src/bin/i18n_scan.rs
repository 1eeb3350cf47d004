//! Build-time translation-key scanner.
//!
//! Walks a UI source tree, extracts every statically-determined translation
//! key (with plural variants resolved against the loaded catalogs) and
//! reports dynamically-constructed keys as warnings. Output is a JSON
//! report on stdout, consumed by the catalog maintenance tooling.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use polku_api::extractor::catalog::TranslationCatalog;
use polku_api::extractor::{
    extract, DynamicKeyWarning, ExceptionPattern, ExtractOptions, TranslationKeyUsage,
};
use polku_api::models::localized::Lang;

/// File extensions treated as UI source.
const SOURCE_EXTENSIONS: [&str; 4] = ["ts", "tsx", "js", "jsx"];

#[derive(Parser)]
#[command(
    name = "i18n-scan",
    about = "Extracts translation key usage from a source tree"
)]
struct Args {
    /// Source tree root to scan
    root: PathBuf,

    /// Directory holding {lang}/{namespace}.json translation catalogs
    #[arg(long, default_value = "locales")]
    locales: PathBuf,

    /// Catalog language used to resolve plural variants
    #[arg(long, default_value = "fi")]
    lang: Lang,

    /// Namespace assumed for keys without a "ns:" prefix
    #[arg(long = "ns", default_value = "common")]
    default_namespace: String,

    /// JSON file of known-safe dynamic patterns:
    /// [{"file": "Card.tsx", "pattern": "opportunity\\."}]
    #[arg(long)]
    exceptions: Option<PathBuf>,

    /// Exit non-zero when any dynamic-key warning remains
    #[arg(long)]
    deny_dynamic: bool,
}

#[derive(Deserialize)]
struct RawException {
    file: String,
    pattern: String,
}

#[derive(Serialize)]
struct Report {
    files_scanned: usize,
    keys: Vec<TranslationKeyUsage>,
    warnings: Vec<DynamicKeyWarning>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let catalog = TranslationCatalog::load(&args.locales, args.lang);
    let options = ExtractOptions {
        default_namespace: args.default_namespace.clone(),
        exceptions: load_exceptions(args.exceptions.as_deref())?,
    };

    let mut report = Report {
        files_scanned: 0,
        keys: Vec::new(),
        warnings: Vec::new(),
    };
    let mut seen: HashSet<String> = HashSet::new();

    for entry in WalkDir::new(&args.root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
    {
        let entry = entry.context("walking source tree")?;
        if !entry.file_type().is_file() || !is_source_file(entry.path()) {
            continue;
        }
        let Ok(code) = std::fs::read_to_string(entry.path()) else {
            eprintln!("skipping unreadable file {}", entry.path().display());
            continue;
        };
        let file_name = entry
            .path()
            .strip_prefix(&args.root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();

        let extraction = extract(&code, &file_name, &catalog, &options);
        report.files_scanned += 1;
        for usage in extraction.keys {
            // First occurrence across the whole tree wins
            if seen.insert(usage.full_key()) {
                report.keys.push(usage);
            }
        }
        report.warnings.extend(extraction.warnings);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.deny_dynamic && !report.warnings.is_empty() {
        eprintln!(
            "{} dynamic translation key(s) could not be resolved",
            report.warnings.len()
        );
        std::process::exit(1);
    }
    Ok(())
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

fn load_exceptions(path: Option<&Path>) -> Result<Vec<ExceptionPattern>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading exceptions file {}", path.display()))?;
    let raw: Vec<RawException> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    raw.into_iter()
        .map(|e| {
            let pattern = Regex::new(&e.pattern)
                .with_context(|| format!("invalid exception pattern '{}'", e.pattern))?;
            Ok(ExceptionPattern {
                file: e.file,
                pattern,
            })
        })
        .collect()
}
