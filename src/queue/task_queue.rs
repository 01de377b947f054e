// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{Task, TaskType};
use crate::domain::repositories::task_repository::{TaskFilter, TaskRepository};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] crate::domain::repositories::task_repository::RepositoryError),
}

/// 任务队列特质
///
/// 处理器与 HTTP 层操作队列的唯一入口
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// 条件入队：同键已有非终态任务时跳过
    async fn enqueue_if_absent(
        &self,
        blog_id: Option<Uuid>,
        task_type: TaskType,
        priority: i32,
        payload: serde_json::Value,
    ) -> Result<Option<Uuid>, QueueError>;

    /// 原子认领至多 limit 个可执行任务
    async fn claim_batch(&self, limit: usize) -> Result<Vec<Task>, QueueError>;

    /// 完成任务
    async fn mark_done(&self, task_id: Uuid) -> Result<(), QueueError>;

    /// 失败任务（retry=true 时按 backoff 重新排队）
    async fn mark_failed(
        &self,
        task_id: Uuid,
        error: &str,
        retry: bool,
    ) -> Result<(), QueueError>;

    /// 手工重试 failed 任务
    async fn retry(&self, task_id: Uuid) -> Result<Task, QueueError>;

    /// 按ID查询
    async fn get(&self, task_id: Uuid) -> Result<Option<Task>, QueueError>;

    /// 分页列表
    async fn list(
        &self,
        filter: TaskFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Task>, u64), QueueError>;
}

/// PostgreSQL任务队列实现
pub struct PostgresTaskQueue<R: TaskRepository> {
    /// 任务仓库
    repository: Arc<R>,
}

impl<R: TaskRepository> PostgresTaskQueue<R> {
    /// 创建新的PostgreSQL任务队列实例
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: TaskRepository> TaskQueue for PostgresTaskQueue<R> {
    async fn enqueue_if_absent(
        &self,
        blog_id: Option<Uuid>,
        task_type: TaskType,
        priority: i32,
        payload: serde_json::Value,
    ) -> Result<Option<Uuid>, QueueError> {
        let id = self
            .repository
            .create_if_absent(blog_id, task_type, priority, payload)
            .await?;
        Ok(id)
    }

    async fn claim_batch(&self, limit: usize) -> Result<Vec<Task>, QueueError> {
        let tasks = self.repository.claim_batch(limit).await?;
        Ok(tasks)
    }

    async fn mark_done(&self, task_id: Uuid) -> Result<(), QueueError> {
        self.repository.mark_done(task_id).await?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        task_id: Uuid,
        error: &str,
        retry: bool,
    ) -> Result<(), QueueError> {
        self.repository.mark_failed(task_id, error, retry).await?;
        Ok(())
    }

    async fn retry(&self, task_id: Uuid) -> Result<Task, QueueError> {
        let task = self.repository.retry(task_id).await?;
        Ok(task)
    }

    async fn get(&self, task_id: Uuid) -> Result<Option<Task>, QueueError> {
        let task = self.repository.find_by_id(task_id).await?;
        Ok(task)
    }

    async fn list(
        &self,
        filter: TaskFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Task>, u64), QueueError> {
        let page = self.repository.list(filter, limit, offset).await?;
        Ok(page)
    }
}

#[async_trait]
impl<T: TaskQueue + ?Sized> TaskQueue for Arc<T> {
    async fn enqueue_if_absent(
        &self,
        blog_id: Option<Uuid>,
        task_type: TaskType,
        priority: i32,
        payload: serde_json::Value,
    ) -> Result<Option<Uuid>, QueueError> {
        (**self)
            .enqueue_if_absent(blog_id, task_type, priority, payload)
            .await
    }

    async fn claim_batch(&self, limit: usize) -> Result<Vec<Task>, QueueError> {
        (**self).claim_batch(limit).await
    }

    async fn mark_done(&self, task_id: Uuid) -> Result<(), QueueError> {
        (**self).mark_done(task_id).await
    }

    async fn mark_failed(
        &self,
        task_id: Uuid,
        error: &str,
        retry: bool,
    ) -> Result<(), QueueError> {
        (**self).mark_failed(task_id, error, retry).await
    }

    async fn retry(&self, task_id: Uuid) -> Result<Task, QueueError> {
        (**self).retry(task_id).await
    }

    async fn get(&self, task_id: Uuid) -> Result<Option<Task>, QueueError> {
        (**self).get(task_id).await
    }

    async fn list(
        &self,
        filter: TaskFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Task>, u64), QueueError> {
        (**self).list(filter, limit, offset).await
    }
}
