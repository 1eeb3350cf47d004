//! The suggested-phases store: education-only suggestions toward a goal,
//! proposed as candidate phases for a plan. Duration is the main filter
//! dimension here.

use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::{GoalSuggestionRequest, OpportunityBackend};
use crate::codeset::CodesetResolver;
use crate::matching::filters::{DurationRange, FilterSelection};
use crate::matching::SortMode;
use crate::models::localized::Lang;
use crate::models::opportunity::OpportunityKind;
use crate::stores::engine::{Outcome, PageSnapshot, SuggestionEngine, SuggestionSource};
use crate::stores::DEFAULT_PAGE_SIZE;

/// Partial state update applied before a refresh.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhaseUpdate {
    /// `Some(None)` clears the goal; absent keeps the current one.
    pub goal_id: Option<Option<Uuid>>,
    pub duration: Option<Option<DurationRange>>,
    pub sort: Option<SortMode>,
    pub lang: Option<Lang>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub struct PhaseSuggestionStore {
    engine: SuggestionEngine,
    goal_id: Option<Uuid>,
    duration: Option<DurationRange>,
    sort: SortMode,
    lang: Lang,
    page: usize,
    page_size: usize,
}

impl PhaseSuggestionStore {
    pub fn new(backend: Arc<dyn OpportunityBackend>, codesets: Arc<CodesetResolver>) -> Self {
        Self {
            engine: SuggestionEngine::new(backend, codesets),
            goal_id: None,
            duration: None,
            sort: SortMode::default(),
            lang: Lang::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn snapshot(&self) -> &PageSnapshot {
        self.engine.snapshot()
    }

    pub async fn update(&mut self, update: PhaseUpdate, cancel: &CancellationToken) -> Outcome {
        if let Some(goal_id) = update.goal_id {
            if self.goal_id != goal_id {
                self.engine.invalidate();
            }
            self.goal_id = goal_id;
        }
        if let Some(duration) = update.duration {
            self.duration = duration;
        }
        if let Some(sort) = update.sort {
            self.sort = sort;
        }
        if let Some(lang) = update.lang {
            self.lang = lang;
        }
        if let Some(page) = update.page {
            self.page = page;
        }
        if let Some(page_size) = update.page_size {
            self.page_size = page_size.max(1);
        }

        let Some(goal_id) = self.goal_id else {
            return Outcome::Committed(self.engine.clear(self.page_size));
        };
        // The backend restricts scoring to education opportunities for this
        // flow; duration narrowing happens client-side like everywhere else.
        let source = SuggestionSource::Goal(GoalSuggestionRequest {
            goal_id,
            kind: Some(OpportunityKind::Education),
        });
        let filters = FilterSelection {
            duration: self.duration,
            ..FilterSelection::default()
        };
        self.engine
            .refresh(
                &source,
                self.lang,
                &filters,
                self.sort,
                self.page,
                self.page_size,
                cancel,
            )
            .await
    }
}
