// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::discover_request::{DiscoverRequestDto, DiscoverResponseDto};
use crate::application::dto::scrape_request::{
    ScrapeRequestDto, ScrapeResponseDto, ScrapeTaskResultDto,
};
use crate::application::dto::task_response::{RetryResponseDto, TaskDto, TaskListResponseDto};
use crate::domain::models::blog::ScrapeStatus;
use crate::domain::models::task::{TaskStatus, TaskType};
use crate::domain::repositories::task_repository::TaskFilter;
use crate::presentation::errors::ApiError;
use crate::presentation::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Duration;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;
use validator::Validate;

/// HTTP 面创建的 full_scrape 任务优先级
const SCRAPE_PRIORITY: i32 = 3;

/// discover 任务优先级（后台批量工作，最低档）
const DISCOVER_PRIORITY: i32 = 10;

/// 任务列表查询参数
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub task_type: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    20
}

fn parse_task_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse::<Uuid>()
        .map_err(|_| ApiError::Validation(format!("Invalid UUID: {}", raw)))
}

/// GET /api/tasks — 带过滤的分页列表
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<TaskListResponseDto>, ApiError> {
    let status = match &query.status {
        Some(raw) => Some(
            raw.parse::<TaskStatus>()
                .map_err(|_| ApiError::Validation(format!("Invalid status: {}", raw)))?,
        ),
        None => None,
    };
    let task_type = match &query.task_type {
        Some(raw) => Some(
            raw.parse::<TaskType>()
                .map_err(|_| ApiError::Validation(format!("Invalid task_type: {}", raw)))?,
        ),
        None => None,
    };
    let limit = query.limit.clamp(1, 100);

    let (tasks, total) = state
        .ctx
        .queue
        .list(TaskFilter { status, task_type }, limit, query.offset)
        .await?;

    Ok(Json(TaskListResponseDto {
        tasks: tasks.into_iter().map(TaskDto::from).collect(),
        total,
        limit,
        offset: query.offset,
    }))
}

/// GET /api/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskDto>, ApiError> {
    let task_id = parse_task_id(&task_id)?;
    let task = state
        .ctx
        .queue
        .get(task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    Ok(Json(task.into()))
}

/// POST /api/tasks/scrape — 按用户名批量创建 full_scrape 任务
///
/// 已删除的博主与新鲜度窗口内的博主跳过；
/// 同键任务已存在时也按 skipped 返回。单个用户名的错误不影响其余
pub async fn create_scrape_tasks(
    State(state): State<AppState>,
    Json(body): Json<ScrapeRequestDto>,
) -> Result<(StatusCode, Json<ScrapeResponseDto>), ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let usernames = body.cleaned_usernames();
    if usernames.is_empty() {
        return Err(ApiError::Validation(
            "usernames must not be empty after cleaning".to_string(),
        ));
    }

    let freshness = Duration::days(state.ctx.settings.rescrape_days);
    let mut results: Vec<ScrapeTaskResultDto> = Vec::with_capacity(usernames.len());
    let mut created = 0usize;
    let mut skipped = 0usize;

    for username in usernames {
        match process_scrape_username(&state, &username, freshness).await {
            Ok(result) => {
                match result.status.as_str() {
                    "created" => created += 1,
                    _ => skipped += 1,
                }
                results.push(result);
            }
            Err(e) => {
                error!("Failed to process username {}: {}", username, e);
                results.push(ScrapeTaskResultDto {
                    task_id: None,
                    username,
                    blog_id: None,
                    status: "error".to_string(),
                });
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(ScrapeResponseDto {
            created,
            skipped,
            tasks: results,
        }),
    ))
}

async fn process_scrape_username(
    state: &AppState,
    username: &str,
    freshness: Duration,
) -> Result<ScrapeTaskResultDto, ApiError> {
    let blog = state.ctx.blogs.find_or_create("instagram", username).await?;

    // 已删除的博主不再入队
    if blog.scrape_status == ScrapeStatus::Deleted {
        return Ok(ScrapeTaskResultDto {
            task_id: None,
            username: username.to_string(),
            blog_id: Some(blog.id),
            status: "skipped".to_string(),
        });
    }

    // 新鲜度窗口内不重复抓取
    if state.ctx.blogs.is_fresh(blog.id, freshness).await? {
        return Ok(ScrapeTaskResultDto {
            task_id: None,
            username: username.to_string(),
            blog_id: Some(blog.id),
            status: "skipped".to_string(),
        });
    }

    let task_id = state
        .ctx
        .queue
        .enqueue_if_absent(
            Some(blog.id),
            TaskType::FullScrape,
            SCRAPE_PRIORITY,
            serde_json::json!({}),
        )
        .await?;

    Ok(ScrapeTaskResultDto {
        task_id,
        username: username.to_string(),
        blog_id: Some(blog.id),
        status: if task_id.is_some() {
            "created".to_string()
        } else {
            "skipped".to_string()
        },
    })
}

/// POST /api/tasks/discover — 按话题标签创建 discover 任务
pub async fn create_discover_task(
    State(state): State<AppState>,
    Json(body): Json<DiscoverRequestDto>,
) -> Result<(StatusCode, Json<DiscoverResponseDto>), ApiError> {
    let hashtag = body
        .cleaned_hashtag()
        .ok_or_else(|| ApiError::Validation("hashtag must not be empty".to_string()))?;
    if body.min_followers < 0 {
        return Err(ApiError::Validation(
            "min_followers must not be negative".to_string(),
        ));
    }

    let task_id = state
        .ctx
        .queue
        .enqueue_if_absent(
            None,
            TaskType::Discover,
            DISCOVER_PRIORITY,
            serde_json::json!({
                "hashtag": hashtag,
                "min_followers": body.min_followers,
            }),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DiscoverResponseDto { task_id, hashtag }),
    ))
}

/// POST /api/tasks/{id}/retry — 手工重新排队 failed 任务
///
/// 这是重试预算耗尽后唯一的重入口；非 failed 状态 409
pub async fn retry_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<RetryResponseDto>, ApiError> {
    let task_id = parse_task_id(&task_id)?;
    let task = state.ctx.queue.retry(task_id).await?;
    Ok(Json(RetryResponseDto {
        task_id: task.id,
        status: "retrying".to_string(),
    }))
}
