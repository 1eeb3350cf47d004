//! The search store: free-text queries routed through the profile
//! suggestion endpoint, then the shared filter/sort/paginate pipeline.

use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::backend::{OpportunityBackend, ProfileSuggestionRequest};
use crate::codeset::CodesetResolver;
use crate::matching::filters::FilterSelection;
use crate::matching::SortMode;
use crate::models::localized::Lang;
use crate::stores::engine::{Outcome, PageSnapshot, SuggestionEngine, SuggestionSource};
use crate::stores::DEFAULT_PAGE_SIZE;

/// Partial state update applied before a refresh.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchUpdate {
    pub query: Option<String>,
    pub filters: Option<FilterSelection>,
    pub sort: Option<SortMode>,
    pub lang: Option<Lang>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub struct SearchStore {
    engine: SuggestionEngine,
    query: String,
    filters: FilterSelection,
    sort: SortMode,
    lang: Lang,
    page: usize,
    page_size: usize,
}

impl SearchStore {
    pub fn new(backend: Arc<dyn OpportunityBackend>, codesets: Arc<CodesetResolver>) -> Self {
        Self {
            engine: SuggestionEngine::new(backend, codesets),
            query: String::new(),
            filters: FilterSelection::default(),
            sort: SortMode::default(),
            lang: Lang::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn snapshot(&self) -> &PageSnapshot {
        self.engine.snapshot()
    }

    /// Applies the update and refreshes. A blank query commits an empty
    /// snapshot without a backend round trip.
    pub async fn update(&mut self, update: SearchUpdate, cancel: &CancellationToken) -> Outcome {
        if let Some(query) = update.query {
            self.query = query;
        }
        if let Some(filters) = update.filters {
            self.filters = filters;
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

        let query = self.query.trim();
        if query.is_empty() {
            return Outcome::Committed(self.engine.clear(self.page_size));
        }
        let source = SuggestionSource::Profile(ProfileSuggestionRequest {
            free_text: Some(query.to_string()),
            ..ProfileSuggestionRequest::default()
        });
        self.engine
            .refresh(
                &source,
                self.lang,
                &self.filters,
                self.sort,
                self.page,
                self.page_size,
                cancel,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::fake::{FakeBackend, FetchPlan};

    fn store_with(backend: Arc<FakeBackend>) -> SearchStore {
        SearchStore::new(backend, Arc::new(CodesetResolver::empty()))
    }

    #[tokio::test]
    async fn test_blank_query_commits_empty_without_fetch() {
        let backend = Arc::new(FakeBackend::default());
        let mut store = store_with(backend.clone());

        let outcome = store
            .update(
                SearchUpdate {
                    query: Some("   ".to_string()),
                    ..SearchUpdate::default()
                },
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(outcome, Outcome::Committed(ref s) if s.total == 0));
        assert_eq!(backend.suggestion_calls(), 0);
    }

    #[tokio::test]
    async fn test_query_change_refetches() {
        let backend = Arc::new(FakeBackend::default());
        backend.queue_suggestions(FetchPlan::ok(FakeBackend::scored_jobs(3)));
        backend.queue_suggestions(FetchPlan::ok(FakeBackend::scored_jobs(6)));
        let mut store = store_with(backend.clone());
        let token = CancellationToken::new();

        store
            .update(
                SearchUpdate {
                    query: Some("hitsaaja".to_string()),
                    ..SearchUpdate::default()
                },
                &token,
            )
            .await;
        assert_eq!(store.snapshot().total, 3);

        // Same query again: the cached record is reused
        store
            .update(
                SearchUpdate {
                    page: Some(1),
                    ..SearchUpdate::default()
                },
                &token,
            )
            .await;
        assert_eq!(backend.suggestion_calls(), 1);

        store
            .update(
                SearchUpdate {
                    query: Some("kokki".to_string()),
                    ..SearchUpdate::default()
                },
                &token,
            )
            .await;
        assert_eq!(backend.suggestion_calls(), 2);
        assert_eq!(store.snapshot().total, 6);
    }
}
