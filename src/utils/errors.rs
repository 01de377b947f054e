// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    RepositoryError(String),

    #[error("抓取错误: {0}")]
    ScrapeError(String),

    #[error("AI 流水线错误: {0}")]
    PipelineError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl From<crate::domain::repositories::task_repository::RepositoryError> for WorkerError {
    fn from(e: crate::domain::repositories::task_repository::RepositoryError) -> Self {
        WorkerError::RepositoryError(e.to_string())
    }
}
