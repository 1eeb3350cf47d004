//! Opportunity wire types shared with the upstream backend.
//!
//! The backend speaks Finnish on the wire (`tyyppi`, `ehdotusMetadata`, ...);
//! field names here are English with explicit serde renames so the mapping is
//! visible in one place. Suggestion metadata is immutable once received:
//! filters and sorting only ever read it.

use serde::{Deserialize, Serialize};

use crate::models::localized::LocalizedText;

/// Top-level opportunity kind. Every suggestion and detail record is exactly
/// one of these; filter predicates match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpportunityKind {
    #[serde(rename = "TYOMAHDOLLISUUS")]
    Job,
    #[serde(rename = "KOULUTUSMAHDOLLISUUS")]
    Education,
}

/// Source dataset of a job opportunity (`aineisto`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobSource {
    #[serde(rename = "TMT")]
    Tmt,
    #[serde(rename = "AMMATTITIETO")]
    AmmattiTieto,
}

/// Sub-kind of an education opportunity (`koulutusmahdollisuusTyyppi`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EducationKind {
    #[serde(rename = "TUTKINTO")]
    Degree,
    #[serde(rename = "EI_TUTKINTO")]
    NonDegree,
}

/// Lightweight scoring/classification record for one suggestion
/// (`ehdotusMetadata`). Absent optional fields mean "unknown", never zero;
/// the duration predicate in particular relies on that distinction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionMetadata {
    #[serde(rename = "tyyppi")]
    pub kind: OpportunityKind,
    #[serde(rename = "aineisto", skip_serializing_if = "Option::is_none")]
    pub job_source: Option<JobSource>,
    #[serde(
        rename = "koulutusmahdollisuusTyyppi",
        skip_serializing_if = "Option::is_none"
    )]
    pub education_kind: Option<EducationKind>,
    /// Hierarchical profession group code; prefixes widen the group.
    #[serde(rename = "ammattiryhma", skip_serializing_if = "Option::is_none")]
    pub profession_group: Option<String>,
    /// Industry codes; `None` means the backend has no industry data at all.
    #[serde(rename = "toimialat", skip_serializing_if = "Option::is_none")]
    pub industries: Option<Vec<String>>,
    #[serde(rename = "maakunnat", default)]
    pub regions: Vec<String>,
    /// Point estimate of education duration, in months.
    #[serde(rename = "kesto", skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(rename = "kestoMinimi", skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<f64>,
    #[serde(rename = "kestoMaksimi", skip_serializing_if = "Option::is_none")]
    pub duration_max: Option<f64>,
    /// Relevance score from the suggestion ranking.
    #[serde(rename = "pisteet", skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Precomputed alphabetical sort key for the record's localized title.
    #[serde(rename = "aakkosIndeksi", skip_serializing_if = "Option::is_none")]
    pub alphabetical_index: Option<f64>,
}

impl SuggestionMetadata {
    /// Minimal metadata of the given kind; everything else unknown.
    pub fn of_kind(kind: OpportunityKind) -> Self {
        Self {
            kind,
            job_source: None,
            education_kind: None,
            profession_group: None,
            industries: None,
            regions: Vec::new(),
            duration: None,
            duration_min: None,
            duration_max: None,
            score: None,
            alphabetical_index: None,
        }
    }
}

/// One entry of a scored-suggestion response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionEntry {
    #[serde(rename = "mahdollisuusId")]
    pub id: String,
    #[serde(rename = "ehdotusMetadata")]
    pub metadata: SuggestionMetadata,
}

/// Full detail record of a job opportunity, hydrated per page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOpportunity {
    pub id: String,
    #[serde(rename = "otsikko")]
    pub title: LocalizedText,
    #[serde(rename = "tiivistelma", default)]
    pub description: LocalizedText,
    #[serde(rename = "ammattiryhma", skip_serializing_if = "Option::is_none")]
    pub profession_group: Option<String>,
}

/// Full detail record of an education opportunity, hydrated per page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationOpportunity {
    pub id: String,
    #[serde(rename = "otsikko")]
    pub title: LocalizedText,
    #[serde(rename = "tiivistelma", default)]
    pub description: LocalizedText,
    #[serde(rename = "kesto", skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(
        rename = "koulutusmahdollisuusTyyppi",
        skip_serializing_if = "Option::is_none"
    )]
    pub education_kind: Option<EducationKind>,
}

/// A hydrated opportunity of either kind, tagged on the wire like the
/// suggestion metadata is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tyyppi")]
pub enum TypedOpportunity {
    #[serde(rename = "TYOMAHDOLLISUUS")]
    Job(JobOpportunity),
    #[serde(rename = "KOULUTUSMAHDOLLISUUS")]
    Education(EducationOpportunity),
}

impl TypedOpportunity {
    pub fn id(&self) -> &str {
        match self {
            TypedOpportunity::Job(job) => &job.id,
            TypedOpportunity::Education(education) => &education.id,
        }
    }

    pub fn kind(&self) -> OpportunityKind {
        match self {
            TypedOpportunity::Job(_) => OpportunityKind::Job,
            TypedOpportunity::Education(_) => OpportunityKind::Education,
        }
    }
}
