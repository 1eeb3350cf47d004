//! HTTP surface of the stores. Handlers are thin: resolve the session,
//! supersede the store's in-flight request where applicable, run the store
//! action, return the committed snapshot.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::paging::sort_by_property;
use crate::models::plan::{Favorite, FavoriteTarget, Goal, GoalInput, Plan, PlanInput};
use crate::state::AppState;
use crate::stores::engine::{Outcome, PageSnapshot};
use crate::stores::phases::PhaseUpdate;
use crate::stores::plan::PlanUpdate;
use crate::stores::search::SearchUpdate;
use crate::stores::tool::ToolUpdate;

#[derive(Debug, Deserialize)]
pub struct ToolPageRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(flatten)]
    pub update: ToolUpdate,
}

#[derive(Debug, Deserialize)]
pub struct SearchPageRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(flatten)]
    pub update: SearchUpdate,
}

#[derive(Debug, Deserialize)]
pub struct PlanPageRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(flatten)]
    pub update: PlanUpdate,
}

#[derive(Debug, Deserialize)]
pub struct PhasePageRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(flatten)]
    pub update: PhaseUpdate,
}

/// Every page endpoint answers with the snapshot that is current after the
/// call. `superseded` marks a request that lost to a newer one; its caller
/// is usually gone, but the field keeps the race visible to clients.
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub session_id: Uuid,
    pub superseded: bool,
    #[serde(flatten)]
    pub snapshot: PageSnapshot,
}

fn page_response(session_id: Uuid, outcome: Outcome, current: &PageSnapshot) -> PageResponse {
    match outcome {
        Outcome::Committed(snapshot) => PageResponse {
            session_id,
            superseded: false,
            snapshot,
        },
        Outcome::Superseded => PageResponse {
            session_id,
            superseded: true,
            snapshot: current.clone(),
        },
    }
}

/// POST /api/v1/tool/opportunities
pub async fn handle_tool_page(
    State(state): State<AppState>,
    Json(request): Json<ToolPageRequest>,
) -> Result<Json<PageResponse>, AppError> {
    let session = state.session(request.session_id);
    let token = session.tool.supersede();
    let mut store = session.tool.lock().await;
    let outcome = store.update(request.update, &token).await;
    Ok(Json(page_response(session.id, outcome, store.snapshot())))
}

/// POST /api/v1/search/opportunities
pub async fn handle_search_page(
    State(state): State<AppState>,
    Json(request): Json<SearchPageRequest>,
) -> Result<Json<PageResponse>, AppError> {
    let session = state.session(request.session_id);
    let token = session.search.supersede();
    let mut store = session.search.lock().await;
    let outcome = store.update(request.update, &token).await;
    Ok(Json(page_response(session.id, outcome, store.snapshot())))
}

/// POST /api/v1/plan/opportunities
pub async fn handle_plan_page(
    State(state): State<AppState>,
    Json(request): Json<PlanPageRequest>,
) -> Result<Json<PageResponse>, AppError> {
    let session = state.session(request.session_id);
    let token = session.plan.supersede();
    let mut store = session.plan.lock().await;
    let outcome = store.update(request.update, &token).await;
    Ok(Json(page_response(session.id, outcome, store.snapshot())))
}

/// POST /api/v1/plan/phase-suggestions
pub async fn handle_phase_page(
    State(state): State<AppState>,
    Json(request): Json<PhasePageRequest>,
) -> Result<Json<PageResponse>, AppError> {
    let session = state.session(request.session_id);
    let token = session.phases.supersede();
    let mut store = session.phases.lock().await;
    let outcome = store.update(request.update, &token).await;
    Ok(Json(page_response(session.id, outcome, store.snapshot())))
}

#[derive(Debug, Deserialize)]
pub struct FavoritesQuery {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Dot-notation path into the serialized favorite, e.g. `luotu`.
    pub sort: Option<String>,
    #[serde(default)]
    pub reverse: bool,
}

#[derive(Debug, Serialize)]
pub struct FavoriteListResponse {
    pub session_id: Uuid,
    pub favorites: Vec<Value>,
}

/// GET /api/v1/favorites
pub async fn handle_get_favorites(
    State(state): State<AppState>,
    Query(query): Query<FavoritesQuery>,
) -> Result<Json<FavoriteListResponse>, AppError> {
    let session = state.session(query.session_id);
    let favorites = {
        let mut tool = session.tool.lock().await;
        tool.refresh_favorites(session.id).await?
    };
    let mut favorites: Vec<Value> = favorites
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()
        .map_err(|e| AppError::Internal(e.into()))?;
    if let Some(sort) = query.sort.as_deref() {
        favorites.sort_by(sort_by_property(sort, query.reverse));
    }
    Ok(Json(FavoriteListResponse {
        session_id: session.id,
        favorites,
    }))
}

#[derive(Debug, Deserialize)]
pub struct FavoriteToggleRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(flatten)]
    pub target: FavoriteTarget,
}

#[derive(Debug, Serialize)]
pub struct FavoriteToggleResponse {
    pub session_id: Uuid,
    /// False when the toggle was dropped because another one was in flight.
    pub applied: bool,
    pub favorites: Vec<Favorite>,
}

/// POST /api/v1/favorites/toggle
pub async fn handle_toggle_favorite(
    State(state): State<AppState>,
    Json(request): Json<FavoriteToggleRequest>,
) -> Result<Json<FavoriteToggleResponse>, AppError> {
    let session = state.session(request.session_id);
    let response = match session.toggle_favorite(request.target).await? {
        Some(favorites) => FavoriteToggleResponse {
            session_id: session.id,
            applied: true,
            favorites,
        },
        None => {
            let tool = session.tool.lock().await;
            FavoriteToggleResponse {
                session_id: session.id,
                applied: false,
                favorites: tool.favorites().to_vec(),
            }
        }
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct GoalListResponse {
    pub session_id: Uuid,
    pub goals: Vec<Goal>,
}

/// GET /api/v1/goals
pub async fn handle_get_goals(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<GoalListResponse>, AppError> {
    let session = state.session(query.session_id);
    let goals = {
        let mut plan = session.plan.lock().await;
        plan.refresh_goals(session.id).await?
    };
    Ok(Json(GoalListResponse {
        session_id: session.id,
        goals,
    }))
}

#[derive(Debug, Deserialize)]
pub struct GoalUpsertRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(flatten)]
    pub goal: GoalInput,
}

#[derive(Debug, Serialize)]
pub struct GoalUpsertResponse {
    pub session_id: Uuid,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
}

/// POST /api/v1/goals
pub async fn handle_upsert_goal(
    State(state): State<AppState>,
    Json(request): Json<GoalUpsertRequest>,
) -> Result<Json<GoalUpsertResponse>, AppError> {
    let session = state.session(request.session_id);
    let goal = session.upsert_goal(request.goal).await?;
    Ok(Json(GoalUpsertResponse {
        session_id: session.id,
        applied: goal.is_some(),
        goal,
    }))
}

/// DELETE /api/v1/goals/:id
pub async fn handle_delete_goal(
    State(state): State<AppState>,
    Path(goal): Path<Uuid>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<GoalListResponse>, AppError> {
    let session = state.session(query.session_id);
    let goals = {
        let mut plan = session.plan.lock().await;
        plan.delete_goal(session.id, goal).await?;
        plan.goals().to_vec()
    };
    Ok(Json(GoalListResponse {
        session_id: session.id,
        goals,
    }))
}

#[derive(Debug, Serialize)]
pub struct PlanListResponse {
    pub session_id: Uuid,
    pub plans: Vec<Plan>,
}

/// GET /api/v1/plans
pub async fn handle_get_plans(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<PlanListResponse>, AppError> {
    let session = state.session(query.session_id);
    let plans = {
        let mut plan = session.plan.lock().await;
        plan.refresh_plans(session.id).await?
    };
    Ok(Json(PlanListResponse {
        session_id: session.id,
        plans,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PlanCreateRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(flatten)]
    pub plan: PlanInput,
}

#[derive(Debug, Serialize)]
pub struct PlanCreateResponse {
    pub session_id: Uuid,
    pub plan: Plan,
}

/// POST /api/v1/plans
pub async fn handle_create_plan(
    State(state): State<AppState>,
    Json(request): Json<PlanCreateRequest>,
) -> Result<Json<PlanCreateResponse>, AppError> {
    let session = state.session(request.session_id);
    let plan = {
        let mut store = session.plan.lock().await;
        store.create_plan(session.id, request.plan).await?
    };
    Ok(Json(PlanCreateResponse {
        session_id: session.id,
        plan,
    }))
}

/// DELETE /api/v1/plans/:id
pub async fn handle_delete_plan(
    State(state): State<AppState>,
    Path(plan): Path<Uuid>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<PlanListResponse>, AppError> {
    let session = state.session(query.session_id);
    let plans = {
        let mut store = session.plan.lock().await;
        store.delete_plan(session.id, plan).await?;
        store.plans().to_vec()
    };
    Ok(Json(PlanListResponse {
        session_id: session.id,
        plans,
    }))
}
