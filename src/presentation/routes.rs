// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::handlers::{health_handler, task_handler};
use crate::presentation::middleware::auth_middleware::{auth_middleware, AuthState};
use crate::presentation::middleware::rate_limit_middleware::{
    rate_limit_middleware, RateLimiter,
};
use crate::presentation::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// 构建完整路由
///
/// health 免认证；其余路由先过速率限制再过 bearer 认证
pub fn build_router(
    state: AppState,
    auth_state: AuthState,
    rate_limiter: Arc<RateLimiter>,
) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(health_handler::health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/tasks", get(task_handler::list_tasks))
        .route("/api/tasks/scrape", post(task_handler::create_scrape_tasks))
        .route(
            "/api/tasks/discover",
            post(task_handler::create_discover_task),
        )
        .route("/api/tasks/{id}", get(task_handler::get_task))
        .route("/api/tasks/{id}/retry", post(task_handler::retry_task))
        .layer(from_fn_with_state(auth_state, auth_middleware))
        .layer(from_fn_with_state(rate_limiter, rate_limit_middleware))
        .with_state(state);

    public_routes.merge(protected_routes)
}
