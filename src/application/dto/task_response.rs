// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Task;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

/// 一个任务的 API 表示
#[derive(Debug, Clone, Serialize)]
pub struct TaskDto {
    pub id: Uuid,
    pub blog_id: Option<Uuid>,
    pub task_type: String,
    pub status: String,
    pub priority: i32,
    pub payload: serde_json::Value,
    pub attempts: i32,
    pub max_attempts: i32,
    pub error_message: Option<String>,
    pub next_retry_at: Option<DateTime<FixedOffset>>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<Task> for TaskDto {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            blog_id: task.blog_id,
            task_type: task.task_type.to_string(),
            status: task.status.to_string(),
            priority: task.priority,
            payload: task.payload,
            attempts: task.attempts,
            max_attempts: task.max_attempts,
            error_message: task.error_message,
            next_retry_at: task.next_retry_at,
            started_at: task.started_at,
            completed_at: task.completed_at,
            created_at: task.created_at,
        }
    }
}

/// GET /api/tasks 的分页响应
#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponseDto {
    pub tasks: Vec<TaskDto>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// POST /api/tasks/{id}/retry 的响应
#[derive(Debug, Clone, Serialize)]
pub struct RetryResponseDto {
    pub task_id: Uuid,
    pub status: String,
}

/// GET /api/health 的响应
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponseDto {
    pub status: String,
    pub accounts_total: usize,
    pub accounts_available: usize,
    pub tasks_running: i64,
    pub tasks_pending: i64,
}
