//! In-memory `OpportunityBackend` for store tests: scripted suggestion
//! responses, controllable delays and failures, and a mutable favorites /
//! goals ledger.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::{
    BackendError, GoalSuggestionRequest, OpportunityBackend, ProfileSuggestionRequest,
};
use crate::models::localized::{Lang, LocalizedText};
use crate::models::opportunity::{
    EducationOpportunity, JobOpportunity, OpportunityKind, SuggestionEntry, SuggestionMetadata,
    TypedOpportunity,
};
use crate::models::plan::{Favorite, FavoriteTarget, Goal, GoalInput, Plan, PlanInput};

/// One scripted answer for a suggestion fetch.
pub struct FetchPlan {
    delay_ms: u64,
    result: Result<Vec<SuggestionEntry>, ()>,
    cancel_before_return: bool,
}

impl FetchPlan {
    pub fn ok(entries: Vec<SuggestionEntry>) -> Self {
        Self {
            delay_ms: 0,
            result: Ok(entries),
            cancel_before_return: false,
        }
    }

    pub fn fail() -> Self {
        Self {
            delay_ms: 0,
            result: Err(()),
            cancel_before_return: false,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Cancels the caller's token just before resolving, simulating a
    /// response that arrives after a newer request superseded it.
    pub fn cancel_before_return(mut self) -> Self {
        self.cancel_before_return = true;
        self
    }
}

#[derive(Default)]
pub struct FakeBackend {
    suggestion_plans: Mutex<VecDeque<FetchPlan>>,
    suggestion_calls: AtomicUsize,
    detail_fail: AtomicBool,
    detail_reverse: AtomicBool,
    favorite_delay_ms: AtomicUsize,
    favorites: Mutex<Vec<Favorite>>,
    goals: Mutex<Vec<Goal>>,
    plans: Mutex<Vec<Plan>>,
}

impl FakeBackend {
    pub fn queue_suggestions(&self, plan: FetchPlan) {
        self.suggestion_plans.lock().unwrap().push_back(plan);
    }

    pub fn suggestion_calls(&self) -> usize {
        self.suggestion_calls.load(Ordering::SeqCst)
    }

    pub fn fail_details(&self) {
        self.detail_fail.store(true, Ordering::SeqCst);
    }

    pub fn reverse_details(&self) {
        self.detail_reverse.store(true, Ordering::SeqCst);
    }

    pub fn delay_favorites(&self, delay_ms: usize) {
        self.favorite_delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    pub fn favorites_len(&self) -> usize {
        self.favorites.lock().unwrap().len()
    }

    /// Job suggestions `job-0..job-n` with strictly descending scores, so
    /// relevance order equals insertion order.
    pub fn scored_jobs(count: usize) -> Vec<SuggestionEntry> {
        (0..count)
            .map(|index| SuggestionEntry {
                id: format!("job-{index}"),
                metadata: SuggestionMetadata {
                    score: Some(1.0 - index as f64 / count as f64),
                    ..SuggestionMetadata::of_kind(OpportunityKind::Job)
                },
            })
            .collect()
    }

    /// Education suggestions `edu-0..edu-n` with the given durations.
    pub fn educations(durations: &[Option<f64>]) -> Vec<SuggestionEntry> {
        durations
            .iter()
            .enumerate()
            .map(|(index, duration)| SuggestionEntry {
                id: format!("edu-{index}"),
                metadata: SuggestionMetadata {
                    duration: *duration,
                    score: Some(1.0 - index as f64 * 0.01),
                    ..SuggestionMetadata::of_kind(OpportunityKind::Education)
                },
            })
            .collect()
    }

    async fn next_suggestions(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestionEntry>, BackendError> {
        self.suggestion_calls.fetch_add(1, Ordering::SeqCst);
        let plan = self
            .suggestion_plans
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| FetchPlan::ok(Vec::new()));
        if plan.delay_ms > 0 {
            tokio::select! {
                _ = cancel.cancelled() => return Err(BackendError::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(plan.delay_ms)) => {}
            }
        }
        if plan.cancel_before_return {
            cancel.cancel();
        }
        plan.result.map_err(|_| BackendError::Api {
            status: 500,
            message: "scripted failure".to_string(),
        })
    }
}

#[async_trait]
impl OpportunityBackend for FakeBackend {
    async fn suggestions_by_profile(
        &self,
        _request: &ProfileSuggestionRequest,
        _lang: Lang,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestionEntry>, BackendError> {
        self.next_suggestions(cancel).await
    }

    async fn suggestions_by_goal(
        &self,
        _request: &GoalSuggestionRequest,
        _lang: Lang,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestionEntry>, BackendError> {
        self.next_suggestions(cancel).await
    }

    async fn opportunities_by_ids(
        &self,
        job_ids: &[String],
        education_ids: &[String],
        _lang: Lang,
        _cancel: &CancellationToken,
    ) -> Result<Vec<TypedOpportunity>, BackendError> {
        if self.detail_fail.load(Ordering::SeqCst) {
            return Err(BackendError::Api {
                status: 502,
                message: "scripted hydration failure".to_string(),
            });
        }
        let mut out: Vec<TypedOpportunity> = job_ids
            .iter()
            .map(|id| {
                TypedOpportunity::Job(JobOpportunity {
                    id: id.clone(),
                    title: LocalizedText::from_fi(format!("Työ {id}")),
                    description: LocalizedText::default(),
                    profession_group: None,
                })
            })
            .chain(education_ids.iter().map(|id| {
                TypedOpportunity::Education(EducationOpportunity {
                    id: id.clone(),
                    title: LocalizedText::from_fi(format!("Koulutus {id}")),
                    description: LocalizedText::default(),
                    duration: None,
                    education_kind: None,
                })
            }))
            .collect();
        if self.detail_reverse.load(Ordering::SeqCst) {
            out.reverse();
        }
        Ok(out)
    }

    async fn favorites(
        &self,
        _user: Uuid,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Favorite>, BackendError> {
        Ok(self.favorites.lock().unwrap().clone())
    }

    async fn add_favorite(
        &self,
        _user: Uuid,
        target: &FavoriteTarget,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        let delay = self.favorite_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::select! {
                _ = cancel.cancelled() => return Err(BackendError::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(delay as u64)) => {}
            }
        }
        self.favorites.lock().unwrap().push(Favorite {
            id: Uuid::new_v4(),
            target_id: target.target_id.clone(),
            kind: target.kind,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete_favorite(
        &self,
        _user: Uuid,
        favorite: Uuid,
        _cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        self.favorites.lock().unwrap().retain(|f| f.id != favorite);
        Ok(())
    }

    async fn goals(
        &self,
        _user: Uuid,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Goal>, BackendError> {
        Ok(self.goals.lock().unwrap().clone())
    }

    async fn upsert_goal(
        &self,
        _user: Uuid,
        goal: &GoalInput,
        _cancel: &CancellationToken,
    ) -> Result<Goal, BackendError> {
        let mut goals = self.goals.lock().unwrap();
        let stored = Goal {
            id: goal.id.unwrap_or_else(Uuid::new_v4),
            name: goal.name.clone(),
            opportunity_id: goal.opportunity_id.clone(),
            kind: goal.kind,
            created_at: Utc::now(),
        };
        goals.retain(|g| Some(g.id) != goal.id);
        goals.push(stored.clone());
        Ok(stored)
    }

    async fn delete_goal(
        &self,
        _user: Uuid,
        goal: Uuid,
        _cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        self.goals.lock().unwrap().retain(|g| g.id != goal);
        Ok(())
    }

    async fn plans(
        &self,
        _user: Uuid,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Plan>, BackendError> {
        Ok(self.plans.lock().unwrap().clone())
    }

    async fn create_plan(
        &self,
        _user: Uuid,
        plan: &PlanInput,
        _cancel: &CancellationToken,
    ) -> Result<Plan, BackendError> {
        let stored = Plan {
            id: Uuid::new_v4(),
            goal_id: plan.goal_id,
            name: plan.name.clone(),
            phases: Vec::new(),
            created_at: Utc::now(),
        };
        self.plans.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn delete_plan(
        &self,
        _user: Uuid,
        plan: Uuid,
        _cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        self.plans.lock().unwrap().retain(|p| p.id != plan);
        Ok(())
    }
}
