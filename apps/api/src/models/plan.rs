//! Favorites, goals and plans (suunnitelmat) as the upstream backend stores
//! them. These are authoritative on the backend: the service never mutates
//! them locally, it writes through and re-fetches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::localized::LocalizedText;
use crate::models::opportunity::OpportunityKind;

/// A saved favorite pointing at one opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: Uuid,
    #[serde(rename = "kohdeId")]
    pub target_id: String,
    #[serde(rename = "tyyppi")]
    pub kind: OpportunityKind,
    #[serde(rename = "luotu")]
    pub created_at: DateTime<Utc>,
}

/// Toggle payload: which opportunity to (un)favorite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteTarget {
    #[serde(rename = "kohdeId")]
    pub target_id: String,
    #[serde(rename = "tyyppi")]
    pub kind: OpportunityKind,
}

/// A user goal (paamaara): the opportunity the user is working toward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    #[serde(rename = "nimi")]
    pub name: LocalizedText,
    #[serde(rename = "mahdollisuusId")]
    pub opportunity_id: String,
    #[serde(rename = "tyyppi")]
    pub kind: OpportunityKind,
    #[serde(rename = "luotu")]
    pub created_at: DateTime<Utc>,
}

/// Goal upsert payload. The backend assigns the id on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(rename = "nimi")]
    pub name: LocalizedText,
    #[serde(rename = "mahdollisuusId")]
    pub opportunity_id: String,
    #[serde(rename = "tyyppi")]
    pub kind: OpportunityKind,
}

/// One phase of a plan: an opportunity the user intends to complete on the
/// way to the goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPhase {
    pub id: Uuid,
    #[serde(rename = "mahdollisuusId")]
    pub opportunity_id: String,
    #[serde(rename = "tyyppi")]
    pub kind: OpportunityKind,
}

/// A user-authored plan (suunnitelma) toward a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    #[serde(rename = "paamaaraId")]
    pub goal_id: Uuid,
    #[serde(rename = "nimi")]
    pub name: LocalizedText,
    #[serde(rename = "vaiheet", default)]
    pub phases: Vec<PlanPhase>,
    #[serde(rename = "luotu")]
    pub created_at: DateTime<Utc>,
}

/// Plan create payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    #[serde(rename = "paamaaraId")]
    pub goal_id: Uuid,
    #[serde(rename = "nimi")]
    pub name: LocalizedText,
}
