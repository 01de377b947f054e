// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::task_response::HealthResponseDto;
use crate::domain::models::task::TaskStatus;
use crate::presentation::AppState;
use axum::{extract::State, http::StatusCode, Json};
use tracing::error;

/// 健康检查
///
/// 免认证；数据库不可达时降级为 503，计数置 -1
pub async fn health(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponseDto>) {
    let (accounts_total, accounts_available) = state.ctx.engine.account_stats();

    let running = state.ctx.tasks.count_by_status(TaskStatus::Running).await;
    let pending = state.ctx.tasks.count_by_status(TaskStatus::Pending).await;

    match (running, pending) {
        (Ok(tasks_running), Ok(tasks_pending)) => (
            StatusCode::OK,
            Json(HealthResponseDto {
                status: "ok".to_string(),
                accounts_total,
                accounts_available,
                tasks_running: tasks_running as i64,
                tasks_pending: tasks_pending as i64,
            }),
        ),
        (running, pending) => {
            if let Err(e) = running.and(pending) {
                error!("Health check task counts failed: {}", e);
            }
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponseDto {
                    status: "degraded".to_string(),
                    accounts_total,
                    accounts_available,
                    tasks_running: -1,
                    tasks_pending: -1,
                }),
            )
        }
    }
}
