//! The id-keyed suggestion record and its ordering.
//!
//! A record is built wholesale from one scored-suggestion response and never
//! mutated afterwards; a new fetch replaces it entirely. Iteration order is
//! the backend's ranking order, which doubles as the tie-break for every
//! stable sort applied on top.

use std::collections::HashMap;

use crate::matching::SortMode;
use crate::models::opportunity::{SuggestionEntry, SuggestionMetadata};

#[derive(Debug, Clone, Default)]
pub struct SuggestionRecord {
    order: Vec<String>,
    by_id: HashMap<String, SuggestionMetadata>,
}

impl SuggestionRecord {
    /// Builds the record from a flat suggestion response. Duplicate ids are
    /// not expected from the backend; if one appears, the later metadata
    /// wins but the id keeps its first position.
    pub fn from_entries(entries: Vec<SuggestionEntry>) -> Self {
        let mut record = Self::default();
        for entry in entries {
            if record.by_id.insert(entry.id.clone(), entry.metadata).is_none() {
                record.order.push(entry.id);
            }
        }
        record
    }

    pub fn get(&self, id: &str) -> Option<&SuggestionMetadata> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates entries in insertion (ranking) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SuggestionMetadata)> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id).map(|meta| (id.as_str(), meta)))
    }
}

/// Orders candidate ids per the active sort mode. The sort is stable, so ids
/// with equal keys keep their relative (insertion) order. Missing scores and
/// missing alphabetical indexes sort as zero.
pub fn sort_ids(record: &SuggestionRecord, mut ids: Vec<String>, mode: SortMode) -> Vec<String> {
    match mode {
        SortMode::Relevance => {
            let score =
                |id: &str| record.get(id).and_then(|meta| meta.score).unwrap_or(0.0);
            ids.sort_by(|a, b| score(b).total_cmp(&score(a)));
        }
        SortMode::Alphabetical => {
            let index = |id: &str| {
                record
                    .get(id)
                    .and_then(|meta| meta.alphabetical_index)
                    .unwrap_or(0.0)
            };
            ids.sort_by(|a, b| index(a).total_cmp(&index(b)));
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::opportunity::OpportunityKind;

    fn entry(id: &str, score: Option<f64>, alpha: Option<f64>) -> SuggestionEntry {
        SuggestionEntry {
            id: id.to_string(),
            metadata: SuggestionMetadata {
                score,
                alphabetical_index: alpha,
                ..SuggestionMetadata::of_kind(OpportunityKind::Job)
            },
        }
    }

    #[test]
    fn test_record_preserves_count_and_order() {
        let record = SuggestionRecord::from_entries(vec![
            entry("x", Some(0.1), None),
            entry("y", Some(0.9), None),
            entry("z", None, None),
        ]);
        assert_eq!(record.len(), 3);
        let ids: Vec<&str> = record.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_duplicate_id_last_write_wins_first_position_kept() {
        let record = SuggestionRecord::from_entries(vec![
            entry("x", Some(0.1), None),
            entry("y", Some(0.5), None),
            entry("x", Some(0.8), None),
        ]);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("x").unwrap().score, Some(0.8));
        let ids: Vec<&str> = record.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn test_relevance_sorts_descending_missing_as_zero() {
        let record = SuggestionRecord::from_entries(vec![
            entry("low", Some(0.2), None),
            entry("none", None, None),
            entry("high", Some(0.9), None),
        ]);
        let ids = record.iter().map(|(id, _)| id.to_string()).collect();
        let sorted = sort_ids(&record, ids, SortMode::Relevance);
        assert_eq!(sorted, vec!["high", "low", "none"]);
    }

    #[test]
    fn test_alphabetical_sorts_ascending_stable() {
        let record = SuggestionRecord::from_entries(vec![
            entry("b", None, Some(2.0)),
            entry("a1", None, Some(1.0)),
            entry("a2", None, Some(1.0)),
        ]);
        let ids = record.iter().map(|(id, _)| id.to_string()).collect();
        let sorted = sort_ids(&record, ids, SortMode::Alphabetical);
        // Equal indexes keep insertion order
        assert_eq!(sorted, vec!["a1", "a2", "b"]);
    }
}
