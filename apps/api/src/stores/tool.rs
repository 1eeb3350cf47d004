//! The tool store: profile-based suggestions with the full filter set, plus
//! the favorites list.

use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::{BackendError, OpportunityBackend, ProfileSuggestionRequest};
use crate::codeset::CodesetResolver;
use crate::matching::filters::FilterSelection;
use crate::matching::SortMode;
use crate::models::localized::Lang;
use crate::models::plan::{Favorite, FavoriteTarget};
use crate::stores::engine::{Outcome, PageSnapshot, SuggestionEngine, SuggestionSource};
use crate::stores::DEFAULT_PAGE_SIZE;

/// Partial state update applied before a refresh. Absent fields keep their
/// current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolUpdate {
    pub profile: Option<ProfileSuggestionRequest>,
    pub filters: Option<FilterSelection>,
    pub sort: Option<SortMode>,
    pub lang: Option<Lang>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub struct ToolStore {
    engine: SuggestionEngine,
    backend: Arc<dyn OpportunityBackend>,
    profile: ProfileSuggestionRequest,
    filters: FilterSelection,
    sort: SortMode,
    lang: Lang,
    page: usize,
    page_size: usize,
    favorites: Vec<Favorite>,
}

impl ToolStore {
    pub fn new(backend: Arc<dyn OpportunityBackend>, codesets: Arc<CodesetResolver>) -> Self {
        Self {
            engine: SuggestionEngine::new(Arc::clone(&backend), codesets),
            backend,
            profile: ProfileSuggestionRequest::default(),
            filters: FilterSelection::default(),
            sort: SortMode::default(),
            lang: Lang::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            favorites: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &PageSnapshot {
        self.engine.snapshot()
    }

    pub fn favorites(&self) -> &[Favorite] {
        &self.favorites
    }

    /// Applies the update and runs the orchestration pipeline.
    pub async fn update(&mut self, update: ToolUpdate, cancel: &CancellationToken) -> Outcome {
        if let Some(profile) = update.profile {
            self.profile = profile;
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

        let source = SuggestionSource::Profile(self.profile.clone());
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

    /// Adds or removes the favorite for `target`, then re-fetches the
    /// authoritative list. The backend owns favorites; nothing is patched
    /// locally.
    pub async fn toggle_favorite(
        &mut self,
        user: Uuid,
        target: FavoriteTarget,
    ) -> Result<Vec<Favorite>, BackendError> {
        let cancel = CancellationToken::new();
        let existing = self
            .favorites
            .iter()
            .find(|f| f.target_id == target.target_id && f.kind == target.kind)
            .map(|f| f.id);
        match existing {
            Some(id) => self.backend.delete_favorite(user, id, &cancel).await?,
            None => self.backend.add_favorite(user, &target, &cancel).await?,
        }
        self.favorites = self.backend.favorites(user, &cancel).await?;
        Ok(self.favorites.clone())
    }

    pub async fn refresh_favorites(&mut self, user: Uuid) -> Result<Vec<Favorite>, BackendError> {
        let cancel = CancellationToken::new();
        self.favorites = self.backend.favorites(user, &cancel).await?;
        Ok(self.favorites.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::opportunity::OpportunityKind;
    use crate::stores::fake::{FakeBackend, FetchPlan};

    fn store_with(backend: Arc<FakeBackend>) -> ToolStore {
        ToolStore::new(backend, Arc::new(CodesetResolver::empty()))
    }

    fn target(id: &str) -> FavoriteTarget {
        FavoriteTarget {
            target_id: id.to_string(),
            kind: OpportunityKind::Job,
        }
    }

    #[tokio::test]
    async fn test_update_applies_partial_state() {
        let backend = Arc::new(FakeBackend::default());
        backend.queue_suggestions(FetchPlan::ok(FakeBackend::scored_jobs(30)));
        let mut store = store_with(backend);

        let outcome = store
            .update(
                ToolUpdate {
                    page: Some(2),
                    page_size: Some(5),
                    ..ToolUpdate::default()
                },
                &CancellationToken::new(),
            )
            .await;

        let Outcome::Committed(snapshot) = outcome else {
            panic!("expected a committed snapshot");
        };
        assert_eq!(snapshot.page, 2);
        assert_eq!(snapshot.items.len(), 5);
        assert_eq!(snapshot.items[0].id(), "job-5");
    }

    #[tokio::test]
    async fn test_toggle_favorite_round_trips_through_backend() {
        let backend = Arc::new(FakeBackend::default());
        let mut store = store_with(backend.clone());
        let user = Uuid::new_v4();

        let favorites = store.toggle_favorite(user, target("job-1")).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(backend.favorites_len(), 1);

        // Toggling the same target again removes it
        let favorites = store.toggle_favorite(user, target("job-1")).await.unwrap();
        assert!(favorites.is_empty());
        assert_eq!(backend.favorites_len(), 0);
    }
}
