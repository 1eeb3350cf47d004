//! The shared orchestration engine behind every opportunity store.
//!
//! One engine owns one suggestion record and the page snapshot derived from
//! it. `refresh` is the primary operation: refetch the scored suggestions if
//! stale, filter, sort, clamp the page, hydrate details for that page only,
//! and commit the snapshot unless the call has been superseded in the
//! meantime. Backend failures reset to empty instead of surfacing; the UI
//! infers "no results" from an empty snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::{
    GoalSuggestionRequest, OpportunityBackend, ProfileSuggestionRequest,
};
use crate::codeset::CodesetResolver;
use crate::matching::filters::FilterSelection;
use crate::matching::paging::{clamp_page, paginate};
use crate::matching::suggestions::{sort_ids, SuggestionRecord};
use crate::matching::SortMode;
use crate::models::localized::Lang;
use crate::models::opportunity::{OpportunityKind, TypedOpportunity};

/// Which suggestion endpoint feeds the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    Profile(ProfileSuggestionRequest),
    Goal(GoalSuggestionRequest),
}

/// The committed page published to the UI. Always a fully-formed snapshot;
/// readers never observe a partial update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageSnapshot {
    pub items: Vec<TypedOpportunity>,
    /// Filtered candidate count across all pages.
    pub total: usize,
    /// The page actually served after clamping, 1-based.
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorePhase {
    #[default]
    Idle,
    FetchingSuggestions,
    Filtering,
    HydratingPage,
}

/// Outcome of one orchestration run. A superseded run committed nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Committed(PageSnapshot),
    Superseded,
}

pub struct SuggestionEngine {
    backend: Arc<dyn OpportunityBackend>,
    codesets: Arc<CodesetResolver>,
    record: SuggestionRecord,
    /// Fingerprint of (source, language) the record was built from; a
    /// mismatch on refresh forces a refetch.
    record_key: Option<String>,
    phase: StorePhase,
    snapshot: PageSnapshot,
}

impl SuggestionEngine {
    pub fn new(backend: Arc<dyn OpportunityBackend>, codesets: Arc<CodesetResolver>) -> Self {
        Self {
            backend,
            codesets,
            record: SuggestionRecord::default(),
            record_key: None,
            phase: StorePhase::Idle,
            snapshot: PageSnapshot::default(),
        }
    }

    pub fn phase(&self) -> StorePhase {
        self.phase
    }

    pub fn snapshot(&self) -> &PageSnapshot {
        &self.snapshot
    }

    pub fn suggestion_count(&self) -> usize {
        self.record.len()
    }

    /// Drops the cached record so the next refresh refetches. Used when the
    /// inputs behind the record changed server-side (e.g. a goal edit).
    pub fn invalidate(&mut self) {
        self.record = SuggestionRecord::default();
        self.record_key = None;
    }

    /// Drops everything and commits an empty snapshot. Used by stores whose
    /// source became undefined (cleared search query, removed goal).
    pub fn clear(&mut self, page_size: usize) -> PageSnapshot {
        self.invalidate();
        self.snapshot = PageSnapshot {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_size,
        };
        self.phase = StorePhase::Idle;
        self.snapshot.clone()
    }

    /// The primary orchestration operation: update suggestions and fetch a
    /// page. See the module docs for the step-by-step contract.
    pub async fn refresh(
        &mut self,
        source: &SuggestionSource,
        lang: Lang,
        filters: &FilterSelection,
        sort: SortMode,
        page: usize,
        page_size: usize,
        cancel: &CancellationToken,
    ) -> Outcome {
        let key = Self::source_key(source, lang);
        if self.record.is_empty() || self.record_key.as_deref() != Some(key.as_str()) {
            self.phase = StorePhase::FetchingSuggestions;
            let fetched = match source {
                SuggestionSource::Profile(request) => {
                    self.backend
                        .suggestions_by_profile(request, lang, cancel)
                        .await
                }
                SuggestionSource::Goal(request) => {
                    self.backend.suggestions_by_goal(request, lang, cancel).await
                }
            };
            match fetched {
                Ok(entries) => {
                    if cancel.is_cancelled() {
                        // Resolved after being superseded: do not rebuild
                        self.phase = StorePhase::Idle;
                        return Outcome::Superseded;
                    }
                    debug!("Rebuilt suggestion record: {} entries", entries.len());
                    self.record = SuggestionRecord::from_entries(entries);
                    self.record_key = Some(key);
                }
                Err(error) if error.is_cancelled() => {
                    self.phase = StorePhase::Idle;
                    return Outcome::Superseded;
                }
                Err(error) => {
                    warn!("Suggestion fetch failed, resetting record: {error}");
                    self.record = SuggestionRecord::default();
                    self.record_key = None;
                }
            }
        }

        self.phase = StorePhase::Filtering;
        let candidates = filters.apply(&self.record, &self.codesets);
        let ranked = sort_ids(&self.record, candidates, sort);
        let total = ranked.len();
        let page = clamp_page(page, total, page_size);
        let page_ids = paginate(&ranked, page, page_size);

        self.phase = StorePhase::HydratingPage;
        let items = match self.hydrate(&page_ids, lang, cancel).await {
            Ok(items) => items,
            Err(Superseded) => {
                self.phase = StorePhase::Idle;
                return Outcome::Superseded;
            }
        };

        if cancel.is_cancelled() {
            self.phase = StorePhase::Idle;
            return Outcome::Superseded;
        }
        self.snapshot = PageSnapshot {
            items,
            total,
            page,
            page_size,
        };
        self.phase = StorePhase::Idle;
        Outcome::Committed(self.snapshot.clone())
    }

    /// Hydrates detail records for one page of ids and restores the ranked
    /// order (the backend may answer in any order). A non-cancel failure
    /// yields an empty page rather than a partial or mismatched one.
    async fn hydrate(
        &self,
        page_ids: &[String],
        lang: Lang,
        cancel: &CancellationToken,
    ) -> Result<Vec<TypedOpportunity>, Superseded> {
        if page_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut job_ids = Vec::new();
        let mut education_ids = Vec::new();
        for id in page_ids {
            match self.record.get(id).map(|meta| meta.kind) {
                Some(OpportunityKind::Job) => job_ids.push(id.clone()),
                Some(OpportunityKind::Education) => education_ids.push(id.clone()),
                None => {}
            }
        }

        match self
            .backend
            .opportunities_by_ids(&job_ids, &education_ids, lang, cancel)
            .await
        {
            Ok(mut items) => {
                let position: HashMap<&str, usize> = page_ids
                    .iter()
                    .enumerate()
                    .map(|(index, id)| (id.as_str(), index))
                    .collect();
                items.retain(|item| position.contains_key(item.id()));
                items.sort_by_key(|item| position[item.id()]);
                Ok(items)
            }
            Err(error) if error.is_cancelled() => Err(Superseded),
            Err(error) => {
                warn!("Detail hydration failed, serving empty page: {error}");
                Ok(Vec::new())
            }
        }
    }

    fn source_key(source: &SuggestionSource, lang: Lang) -> String {
        // These types cannot fail to serialize
        let source = serde_json::to_string(source).unwrap_or_default();
        format!("{lang}:{source}")
    }
}

/// Internal marker: the run lost to a newer request.
struct Superseded;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::fake::{FakeBackend, FetchPlan};
    use crate::stores::StoreHandle;
    use std::time::Duration;

    fn profile_source(text: &str) -> SuggestionSource {
        SuggestionSource::Profile(ProfileSuggestionRequest {
            free_text: Some(text.to_string()),
            ..ProfileSuggestionRequest::default()
        })
    }

    fn engine_with(backend: Arc<FakeBackend>) -> SuggestionEngine {
        SuggestionEngine::new(backend, Arc::new(CodesetResolver::empty()))
    }

    #[tokio::test]
    async fn test_refresh_commits_filtered_sorted_page() {
        let backend = Arc::new(FakeBackend::default());
        backend.queue_suggestions(FetchPlan::ok(FakeBackend::scored_jobs(25)));
        let mut engine = engine_with(backend);

        let outcome = engine
            .refresh(
                &profile_source("hitsaus"),
                Lang::Fi,
                &FilterSelection::default(),
                SortMode::Relevance,
                2,
                10,
                &CancellationToken::new(),
            )
            .await;

        let Outcome::Committed(snapshot) = outcome else {
            panic!("expected a committed snapshot");
        };
        assert_eq!(snapshot.total, 25);
        assert_eq!(snapshot.page, 2);
        assert_eq!(snapshot.items.len(), 10);
        // scored_jobs assigns descending scores to job-0..job-24 in order
        assert_eq!(snapshot.items[0].id(), "job-10");
    }

    #[tokio::test]
    async fn test_page_overflow_clamps_to_last_page() {
        let backend = Arc::new(FakeBackend::default());
        backend.queue_suggestions(FetchPlan::ok(FakeBackend::scored_jobs(25)));
        let mut engine = engine_with(backend);

        let outcome = engine
            .refresh(
                &profile_source("x"),
                Lang::Fi,
                &FilterSelection::default(),
                SortMode::Relevance,
                7,
                10,
                &CancellationToken::new(),
            )
            .await;

        let Outcome::Committed(snapshot) = outcome else {
            panic!("expected a committed snapshot");
        };
        assert_eq!(snapshot.page, 3);
        assert_eq!(snapshot.items.len(), 5);
    }

    #[tokio::test]
    async fn test_fetch_failure_resets_to_empty_without_error() {
        let backend = Arc::new(FakeBackend::default());
        backend.queue_suggestions(FetchPlan::fail());
        let mut engine = engine_with(backend);

        let outcome = engine
            .refresh(
                &profile_source("x"),
                Lang::Fi,
                &FilterSelection::default(),
                SortMode::Relevance,
                1,
                10,
                &CancellationToken::new(),
            )
            .await;

        let Outcome::Committed(snapshot) = outcome else {
            panic!("fail-soft must still commit");
        };
        assert_eq!(snapshot.total, 0);
        assert!(snapshot.items.is_empty());
        assert_eq!(engine.suggestion_count(), 0);
        assert_eq!(engine.phase(), StorePhase::Idle);
    }

    #[tokio::test]
    async fn test_record_reused_until_language_changes() {
        let backend = Arc::new(FakeBackend::default());
        backend.queue_suggestions(FetchPlan::ok(FakeBackend::scored_jobs(5)));
        backend.queue_suggestions(FetchPlan::ok(FakeBackend::scored_jobs(3)));
        let mut engine = engine_with(backend.clone());

        let source = profile_source("x");
        let filters = FilterSelection::default();
        let token = CancellationToken::new();
        engine
            .refresh(&source, Lang::Fi, &filters, SortMode::Relevance, 1, 10, &token)
            .await;
        engine
            .refresh(&source, Lang::Fi, &filters, SortMode::Relevance, 2, 2, &token)
            .await;
        assert_eq!(backend.suggestion_calls(), 1);

        let outcome = engine
            .refresh(&source, Lang::Sv, &filters, SortMode::Relevance, 1, 10, &token)
            .await;
        assert_eq!(backend.suggestion_calls(), 2);
        let Outcome::Committed(snapshot) = outcome else {
            panic!("expected a committed snapshot");
        };
        assert_eq!(snapshot.total, 3);
    }

    #[tokio::test]
    async fn test_hydration_failure_serves_empty_page() {
        let backend = Arc::new(FakeBackend::default());
        backend.queue_suggestions(FetchPlan::ok(FakeBackend::scored_jobs(4)));
        backend.fail_details();
        let mut engine = engine_with(backend);

        let outcome = engine
            .refresh(
                &profile_source("x"),
                Lang::Fi,
                &FilterSelection::default(),
                SortMode::Relevance,
                1,
                10,
                &CancellationToken::new(),
            )
            .await;

        let Outcome::Committed(snapshot) = outcome else {
            panic!("expected a committed snapshot");
        };
        // The candidate count survives; the page itself is empty, never partial
        assert_eq!(snapshot.total, 4);
        assert!(snapshot.items.is_empty());
    }

    #[tokio::test]
    async fn test_hydrated_page_restored_to_ranked_order() {
        let backend = Arc::new(FakeBackend::default());
        backend.queue_suggestions(FetchPlan::ok(FakeBackend::scored_jobs(6)));
        backend.reverse_details();
        let mut engine = engine_with(backend);

        let outcome = engine
            .refresh(
                &profile_source("x"),
                Lang::Fi,
                &FilterSelection::default(),
                SortMode::Relevance,
                1,
                4,
                &CancellationToken::new(),
            )
            .await;

        let Outcome::Committed(snapshot) = outcome else {
            panic!("expected a committed snapshot");
        };
        let ids: Vec<&str> = snapshot.items.iter().map(|item| item.id()).collect();
        assert_eq!(ids, vec!["job-0", "job-1", "job-2", "job-3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_never_overwrites_newer_state() {
        let backend = Arc::new(FakeBackend::default());
        // First fetch is slow, second resolves immediately
        backend.queue_suggestions(FetchPlan::ok(FakeBackend::scored_jobs(10)).with_delay(500));
        backend.queue_suggestions(FetchPlan::ok(FakeBackend::scored_jobs(2)));
        let handle = Arc::new(StoreHandle::new(engine_with(backend)));

        let first = {
            let handle = Arc::clone(&handle);
            tokio::spawn(async move {
                let token = handle.supersede();
                let mut engine = handle.lock().await;
                engine
                    .refresh(
                        &profile_source("first"),
                        Lang::Fi,
                        &FilterSelection::default(),
                        SortMode::Relevance,
                        1,
                        10,
                        &token,
                    )
                    .await
            })
        };
        // Let the first request reach its backend await
        tokio::time::sleep(Duration::from_millis(10)).await;

        let token = handle.supersede();
        let mut engine = handle.lock().await;
        let second = engine
            .refresh(
                &profile_source("second"),
                Lang::Fi,
                &FilterSelection::default(),
                SortMode::Relevance,
                1,
                10,
                &token,
            )
            .await;

        let Outcome::Committed(snapshot) = second else {
            panic!("second request must win");
        };
        assert_eq!(snapshot.total, 2);
        assert_eq!(engine.snapshot().total, 2);
        drop(engine);

        assert_eq!(first.await.unwrap(), Outcome::Superseded);
        // Final state still reflects the second request only
        assert_eq!(handle.lock().await.snapshot().total, 2);
    }

    #[tokio::test]
    async fn test_resolved_but_superseded_fetch_does_not_commit() {
        let backend = Arc::new(FakeBackend::default());
        // The backend resolves normally but the token is cancelled just
        // before it returns, as if a newer request raced in
        backend.queue_suggestions(
            FetchPlan::ok(FakeBackend::scored_jobs(10)).cancel_before_return(),
        );
        let mut engine = engine_with(backend);

        let token = CancellationToken::new();
        let outcome = engine
            .refresh(
                &profile_source("x"),
                Lang::Fi,
                &FilterSelection::default(),
                SortMode::Relevance,
                1,
                10,
                &token,
            )
            .await;

        assert_eq!(outcome, Outcome::Superseded);
        assert_eq!(engine.suggestion_count(), 0);
        assert_eq!(engine.snapshot().total, 0);
    }
}
