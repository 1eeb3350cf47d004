pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;
use crate::stores::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Opportunity pages per store
        .route("/api/v1/tool/opportunities", post(handlers::handle_tool_page))
        .route(
            "/api/v1/search/opportunities",
            post(handlers::handle_search_page),
        )
        .route(
            "/api/v1/plan/opportunities",
            post(handlers::handle_plan_page),
        )
        .route(
            "/api/v1/plan/phase-suggestions",
            post(handlers::handle_phase_page),
        )
        // Favorites
        .route("/api/v1/favorites", get(handlers::handle_get_favorites))
        .route(
            "/api/v1/favorites/toggle",
            post(handlers::handle_toggle_favorite),
        )
        // Goals and plans
        .route(
            "/api/v1/goals",
            get(handlers::handle_get_goals).post(handlers::handle_upsert_goal),
        )
        .route("/api/v1/goals/:id", delete(handlers::handle_delete_goal))
        .route(
            "/api/v1/plans",
            get(handlers::handle_get_plans).post(handlers::handle_create_plan),
        )
        .route("/api/v1/plans/:id", delete(handlers::handle_delete_plan))
        .with_state(state)
}
