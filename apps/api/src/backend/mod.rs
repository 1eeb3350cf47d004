//! Upstream opportunity backend client.
//!
//! ARCHITECTURAL RULE: this module is the single point of entry for all
//! upstream REST calls. Stores depend on the `OpportunityBackend` trait, not
//! on the HTTP implementation, so tests can drive them with an in-memory
//! fake. Every call takes a cancellation token; a superseded request returns
//! `BackendError::Cancelled` and nothing else.
//!
//! There is deliberately no retry logic here: a failed fetch surfaces as an
//! empty result upstream, and the next user action re-attempts.

use std::future::Future;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::localized::Lang;
use crate::models::opportunity::{
    EducationOpportunity, JobOpportunity, OpportunityKind, SuggestionEntry, TypedOpportunity,
};
use crate::models::plan::{Favorite, FavoriteTarget, Goal, GoalInput, Plan, PlanInput};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("request superseded")]
    Cancelled,
}

impl BackendError {
    /// True when the request lost to a newer one. Callers swallow this
    /// silently; it is an expected race outcome, not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BackendError::Cancelled)
    }
}

/// Profile snapshot sent to the scored-suggestion endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSuggestionRequest {
    #[serde(rename = "osaamiset")]
    pub competences: Vec<String>,
    #[serde(rename = "kiinnostukset")]
    pub interests: Vec<String>,
    #[serde(rename = "vapaateksti", skip_serializing_if = "Option::is_none")]
    pub free_text: Option<String>,
}

/// Goal reference sent to the goal-suggestion endpoint. The optional kind
/// restricts scoring to one opportunity kind on the backend side (the
/// phase-suggestion flow only wants education opportunities).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSuggestionRequest {
    #[serde(rename = "paamaaraId")]
    pub goal_id: Uuid,
    #[serde(rename = "tyyppi", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<OpportunityKind>,
}

/// The upstream boundary of the service. Suggestion and hydration calls are
/// localized; favorites, goals and plans are language-independent.
#[async_trait]
pub trait OpportunityBackend: Send + Sync {
    async fn suggestions_by_profile(
        &self,
        request: &ProfileSuggestionRequest,
        lang: Lang,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestionEntry>, BackendError>;

    async fn suggestions_by_goal(
        &self,
        request: &GoalSuggestionRequest,
        lang: Lang,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestionEntry>, BackendError>;

    /// Hydrates full detail records for the given ids, batched per kind.
    /// Callers pass one page's worth of ids, never the whole candidate set.
    async fn opportunities_by_ids(
        &self,
        job_ids: &[String],
        education_ids: &[String],
        lang: Lang,
        cancel: &CancellationToken,
    ) -> Result<Vec<TypedOpportunity>, BackendError>;

    async fn favorites(
        &self,
        user: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<Favorite>, BackendError>;

    async fn add_favorite(
        &self,
        user: Uuid,
        target: &FavoriteTarget,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError>;

    async fn delete_favorite(
        &self,
        user: Uuid,
        favorite: Uuid,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError>;

    async fn goals(
        &self,
        user: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<Goal>, BackendError>;

    async fn upsert_goal(
        &self,
        user: Uuid,
        goal: &GoalInput,
        cancel: &CancellationToken,
    ) -> Result<Goal, BackendError>;

    async fn delete_goal(
        &self,
        user: Uuid,
        goal: Uuid,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError>;

    async fn plans(
        &self,
        user: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<Plan>, BackendError>;

    async fn create_plan(
        &self,
        user: Uuid,
        plan: &PlanInput,
        cancel: &CancellationToken,
    ) -> Result<Plan, BackendError>;

    async fn delete_plan(
        &self,
        user: Uuid,
        plan: Uuid,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError>;
}

/// The production backend client.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Races a request future against the cancellation token. Dropping the
    /// in-flight future aborts the underlying connection, so a superseded
    /// request does no further work.
    async fn race<T>(
        fut: impl Future<Output = Result<T, BackendError>>,
        cancel: &CancellationToken,
    ) -> Result<T, BackendError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(BackendError::Cancelled),
            result = fut => result,
        }
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<T, BackendError> {
        Self::race(
            async {
                let response = ensure_success(builder.send().await?).await?;
                Ok(response.json::<T>().await?)
            },
            cancel,
        )
        .await
    }

    async fn request_unit(
        &self,
        builder: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        Self::race(
            async {
                ensure_success(builder.send().await?).await?;
                Ok(())
            },
            cancel,
        )
        .await
    }

    fn get(&self, path: &str, lang: Lang) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Accept-Language", lang.as_str())
    }

    fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        lang: Lang,
    ) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Accept-Language", lang.as_str())
            .json(body)
    }

    fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path))
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl OpportunityBackend for HttpBackend {
    async fn suggestions_by_profile(
        &self,
        request: &ProfileSuggestionRequest,
        lang: Lang,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestionEntry>, BackendError> {
        self.request_json(
            self.post_json("/ehdotukset/profiili", request, lang),
            cancel,
        )
        .await
    }

    async fn suggestions_by_goal(
        &self,
        request: &GoalSuggestionRequest,
        lang: Lang,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestionEntry>, BackendError> {
        self.request_json(
            self.post_json("/ehdotukset/paamaara", request, lang),
            cancel,
        )
        .await
    }

    async fn opportunities_by_ids(
        &self,
        job_ids: &[String],
        education_ids: &[String],
        lang: Lang,
        cancel: &CancellationToken,
    ) -> Result<Vec<TypedOpportunity>, BackendError> {
        let mut out = Vec::with_capacity(job_ids.len() + education_ids.len());
        if !job_ids.is_empty() {
            let query: Vec<(&str, &str)> = job_ids.iter().map(|id| ("id", id.as_str())).collect();
            let jobs: Vec<JobOpportunity> = self
                .request_json(self.get("/tyomahdollisuudet", lang).query(&query), cancel)
                .await?;
            out.extend(jobs.into_iter().map(TypedOpportunity::Job));
        }
        if !education_ids.is_empty() {
            let query: Vec<(&str, &str)> = education_ids
                .iter()
                .map(|id| ("id", id.as_str()))
                .collect();
            let educations: Vec<EducationOpportunity> = self
                .request_json(
                    self.get("/koulutusmahdollisuudet", lang).query(&query),
                    cancel,
                )
                .await?;
            out.extend(educations.into_iter().map(TypedOpportunity::Education));
        }
        Ok(out)
    }

    async fn favorites(
        &self,
        user: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<Favorite>, BackendError> {
        self.request_json(
            self.get(&format!("/profiili/{user}/suosikit"), Lang::Fi),
            cancel,
        )
        .await
    }

    async fn add_favorite(
        &self,
        user: Uuid,
        target: &FavoriteTarget,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        self.request_unit(
            self.post_json(&format!("/profiili/{user}/suosikit"), target, Lang::Fi),
            cancel,
        )
        .await
    }

    async fn delete_favorite(
        &self,
        user: Uuid,
        favorite: Uuid,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        self.request_unit(
            self.delete(&format!("/profiili/{user}/suosikit/{favorite}")),
            cancel,
        )
        .await
    }

    async fn goals(
        &self,
        user: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<Goal>, BackendError> {
        self.request_json(
            self.get(&format!("/profiili/{user}/paamaarat"), Lang::Fi),
            cancel,
        )
        .await
    }

    async fn upsert_goal(
        &self,
        user: Uuid,
        goal: &GoalInput,
        cancel: &CancellationToken,
    ) -> Result<Goal, BackendError> {
        self.request_json(
            self.post_json(&format!("/profiili/{user}/paamaarat"), goal, Lang::Fi),
            cancel,
        )
        .await
    }

    async fn delete_goal(
        &self,
        user: Uuid,
        goal: Uuid,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        self.request_unit(
            self.delete(&format!("/profiili/{user}/paamaarat/{goal}")),
            cancel,
        )
        .await
    }

    async fn plans(
        &self,
        user: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<Plan>, BackendError> {
        self.request_json(
            self.get(&format!("/profiili/{user}/suunnitelmat"), Lang::Fi),
            cancel,
        )
        .await
    }

    async fn create_plan(
        &self,
        user: Uuid,
        plan: &PlanInput,
        cancel: &CancellationToken,
    ) -> Result<Plan, BackendError> {
        self.request_json(
            self.post_json(&format!("/profiili/{user}/suunnitelmat"), plan, Lang::Fi),
            cancel,
        )
        .await
    }

    async fn delete_plan(
        &self,
        user: Uuid,
        plan: Uuid,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        self.request_unit(
            self.delete(&format!("/profiili/{user}/suunnitelmat/{plan}")),
            cancel,
        )
        .await
    }
}
