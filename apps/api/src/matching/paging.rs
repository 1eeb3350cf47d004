//! Generic sort and pagination helpers.
//!
//! `paginate` is a dumb slicing primitive: it clamps the page number to a
//! minimum of 1 and nothing else. Callers that must not run past the last
//! page (the stores) clamp with `clamp_page` first.

use std::cmp::Ordering;

use chrono::DateTime;
use serde_json::Value;

/// Returns the 1-based slice `[(page-1)*size, page*size)` of `items`.
/// Pages below 1 are treated as page 1; pages past the end yield an empty
/// slice. Never panics.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    if page_size == 0 {
        return Vec::new();
    }
    let page = page.max(1);
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(page_size).min(items.len());
    items[start..end].to_vec()
}

/// Number of pages a collection of `count` items spans. An empty collection
/// still has one (empty) page.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if count == 0 || page_size == 0 {
        return 1;
    }
    count.div_ceil(page_size)
}

/// Clamps a requested page into `[1, total_pages]`.
pub fn clamp_page(page: usize, count: usize, page_size: usize) -> usize {
    page.clamp(1, total_pages(count, page_size))
}

/// Builds a comparator over JSON values that resolves `path` by dot-notation
/// traversal and compares what it finds: numbers numerically, timestamp
/// strings chronologically, other strings case-folded. Any other pairing
/// compares equal; that is the defined fallback, not an error. Usable with
/// any stable sort.
pub fn sort_by_property(path: &str, reverse: bool) -> impl Fn(&Value, &Value) -> Ordering + '_ {
    move |a, b| {
        let ordering = compare_resolved(resolve_path(a, path), resolve_path(b, path));
        if reverse {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(value, |acc, segment| acc.get(segment))
}

fn compare_resolved(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .unwrap_or(0.0)
            .total_cmp(&y.as_f64().unwrap_or(0.0)),
        (Some(Value::String(x)), Some(Value::String(y))) => compare_strings(x, y),
        _ => Ordering::Equal,
    }
}

fn compare_strings(a: &str, b: &str) -> Ordering {
    // RFC 3339 timestamps compare chronologically, everything else case-folded
    if let (Ok(x), Ok(y)) = (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
        return x.cmp(&y);
    }
    a.to_lowercase().cmp(&b.to_lowercase())
}
