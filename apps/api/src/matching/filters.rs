//! Filter predicates over suggestion metadata.
//!
//! Every predicate follows the same rule: an empty selection for a dimension
//! matches everything. Filters narrow, they never require. The one exception
//! is the industry filter, which excludes records with no industry data once
//! any industry is selected; that asymmetry is a product decision, not an
//! accident (records that cannot be classified must not surface under an
//! industry filter).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::codeset::CodesetResolver;
use crate::matching::suggestions::SuggestionRecord;
use crate::models::opportunity::{EducationKind, JobSource, OpportunityKind, SuggestionMetadata};

/// Upper end of the duration slider scale, in months ("6+ years").
pub const DURATION_SCALE_MAX: f64 = 72.0;

/// Selected education duration range, in months.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min: f64,
    pub max: f64,
}

impl DurationRange {
    /// True when the range spans the whole slider scale, i.e. the user has
    /// not actually narrowed anything.
    pub fn is_full_scale(&self) -> bool {
        self.min <= 0.0 && self.max >= DURATION_SCALE_MAX
    }
}

/// The active filter selections of one store. All dimensions default to
/// empty, which matches every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub regions: Vec<String>,
    pub education_kinds: Vec<EducationKind>,
    pub job_sources: Vec<JobSource>,
    pub industries: Vec<String>,
    pub profession_groups: Vec<String>,
    pub duration: Option<DurationRange>,
}

impl FilterSelection {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
            && self.education_kinds.is_empty()
            && self.job_sources.is_empty()
            && self.industries.is_empty()
            && self.profession_groups.is_empty()
            && self.duration.is_none()
    }

    /// Composite predicate: logical AND across all dimensions.
    pub fn matches(&self, meta: &SuggestionMetadata, resolver: &CodesetResolver) -> bool {
        let mut parents = HashMap::new();
        self.matches_with_cache(meta, resolver, &mut parents)
    }

    fn matches_with_cache(
        &self,
        meta: &SuggestionMetadata,
        resolver: &CodesetResolver,
        parents: &mut HashMap<String, Option<String>>,
    ) -> bool {
        filter_by_region(&self.regions, meta)
            && filter_by_education_type(&self.education_kinds, meta)
            && filter_by_job_type(&self.job_sources, meta)
            && filter_by_profession_groups(&self.profession_groups, meta)
            && filter_by_industries(&self.industries, meta, resolver, parents)
            && filter_by_duration(self.duration.as_ref(), meta)
    }

    /// Applies the composite predicate over a whole suggestion record,
    /// returning surviving ids in the record's insertion order. The industry
    /// parent cache is shared across the call so each unique code prefix is
    /// resolved at most once.
    pub fn apply(&self, record: &SuggestionRecord, resolver: &CodesetResolver) -> Vec<String> {
        let mut parents = HashMap::new();
        record
            .iter()
            .filter(|(_, meta)| self.matches_with_cache(meta, resolver, &mut parents))
            .map(|(id, _)| id.to_string())
            .collect()
    }
}

/// True if no regions are selected, else true iff the record lists at least
/// one selected region.
pub fn filter_by_region(regions: &[String], meta: &SuggestionMetadata) -> bool {
    if regions.is_empty() {
        return true;
    }
    meta.regions.iter().any(|r| regions.contains(r))
}

/// Education sub-kind filter. Non-education records always pass: the
/// dimension does not apply to them.
pub fn filter_by_education_type(types: &[EducationKind], meta: &SuggestionMetadata) -> bool {
    if types.is_empty() || meta.kind != OpportunityKind::Education {
        return true;
    }
    meta.education_kind.is_some_and(|kind| types.contains(&kind))
}

/// Job source filter, symmetric to the education sub-kind filter.
pub fn filter_by_job_type(types: &[JobSource], meta: &SuggestionMetadata) -> bool {
    if types.is_empty() || meta.kind != OpportunityKind::Job {
        return true;
    }
    meta.job_source.is_some_and(|source| types.contains(&source))
}

/// Profession group filter. Group codes are hierarchical, so selection is by
/// prefix: selecting "C1" matches "C1234".
pub fn filter_by_profession_groups(prefixes: &[String], meta: &SuggestionMetadata) -> bool {
    if prefixes.is_empty() || meta.kind != OpportunityKind::Job {
        return true;
    }
    let Some(group) = &meta.profession_group else {
        return false;
    };
    prefixes.iter().any(|prefix| group.starts_with(prefix.as_str()))
}

/// Industry filter. A job record with no industry data is excluded once any
/// industry is selected. Each industry code resolves to its 2-character
/// parent class through the codeset resolver; `parents` memoises those
/// lookups for the duration of one record scan.
pub fn filter_by_industries(
    selected: &[String],
    meta: &SuggestionMetadata,
    resolver: &CodesetResolver,
    parents: &mut HashMap<String, Option<String>>,
) -> bool {
    if selected.is_empty() || meta.kind != OpportunityKind::Job {
        return true;
    }
    let Some(codes) = &meta.industries else {
        return false;
    };
    codes.iter().any(|code| {
        let prefix: String = code.chars().take(2).collect();
        let parent = parents
            .entry(prefix)
            .or_insert_with_key(|p| resolver.industry_parent(p));
        parent
            .as_deref()
            .is_some_and(|p| selected.iter().any(|s| s == p))
    })
}

/// Duration range filter, education records only.
///
/// The full slider scale matches everything, including records with unknown
/// duration. A minimum at the top of the scale means "6+ years" and matches
/// on the point estimate alone. Any other narrowed range excludes records
/// with no point estimate, and otherwise overlaps the record's duration
/// bounds (falling back to the point estimate where a bound is absent) with
/// the selected range.
pub fn filter_by_duration(range: Option<&DurationRange>, meta: &SuggestionMetadata) -> bool {
    let Some(range) = range else {
        return true;
    };
    if meta.kind != OpportunityKind::Education {
        return true;
    }
    if range.is_full_scale() {
        return true;
    }
    if range.min >= DURATION_SCALE_MAX {
        return meta.duration.is_some_and(|d| d >= DURATION_SCALE_MAX);
    }
    let Some(point) = meta.duration else {
        return false;
    };
    let lower = meta.duration_min.unwrap_or(point);
    let upper = meta.duration_max.unwrap_or(point);
    lower <= range.max && upper >= range.min
}
