//! Opportunity matching core: filter predicates, the id-keyed suggestion
//! record, and the sort/paginate utilities the stores are built on.
//!
//! Everything in here is pure and synchronous. Orchestration (fetching,
//! cancellation, hydration) lives in `stores`.

pub mod filters;
pub mod paging;
pub mod suggestions;

use serde::{Deserialize, Serialize};

/// How filtered suggestion ids are ordered before pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Descending relevance score; unscored entries sort last.
    #[default]
    Relevance,
    /// Ascending precomputed alphabetical index of the localized title.
    Alphabetical,
}
