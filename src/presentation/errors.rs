// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::task_repository::RepositoryError;
use crate::queue::task_queue::QueueError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API 错误类型
///
/// 错误分级到 HTTP 状态码的唯一映射点
#[derive(Error, Debug)]
pub enum ApiError {
    /// 请求体不合法
    #[error("{0}")]
    Validation(String),

    /// 资源不存在
    #[error("{0}")]
    NotFound(String),

    /// 状态不允许该操作
    #[error("{0}")]
    Conflict(String),

    /// 服务端错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<QueueError> for ApiError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::Repository(RepositoryError::NotFound) => {
                ApiError::NotFound("Task not found".to_string())
            }
            QueueError::Repository(RepositoryError::InvalidState(msg)) => ApiError::Conflict(msg),
            QueueError::Repository(RepositoryError::Database(e)) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ApiError::NotFound("Not found".to_string()),
            RepositoryError::InvalidState(msg) => ApiError::Conflict(msg),
            RepositoryError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}
