// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{Task, TaskStatus, TaskType};
use async_trait::async_trait;
use chrono::Duration;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(#[from] DbErr),

    /// 未找到数据
    #[error("未找到数据")]
    NotFound,

    /// 无效状态转换
    #[error("无效状态转换: {0}")]
    InvalidState(String),
}

/// 任务列表查询过滤条件
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
}

/// 任务仓库特质
///
/// 队列的全部状态迁移都必须经过该接口；
/// 处理器不允许直接改写 scrape_tasks 行
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 条件创建任务
    ///
    /// 仅当 (blog_id, task_type) 没有非终态任务时插入。
    /// 去重只看键，payload 差异不影响判定。
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(id))` - 新任务ID
    /// * `Ok(None)` - 已存在非终态任务，跳过
    async fn create_if_absent(
        &self,
        blog_id: Option<Uuid>,
        task_type: TaskType,
        priority: i32,
        payload: serde_json::Value,
    ) -> Result<Option<Uuid>, RepositoryError>;

    /// 原子认领一批待处理任务
    ///
    /// 将至多 `limit` 个可执行任务从 pending 迁移到 running，
    /// 设置 started_at 并递增 attempts。
    /// 可执行条件：status = pending 且 next_retry_at 为空或已过期。
    /// 排序：priority ASC, created_at ASC。
    async fn claim_batch(&self, limit: usize) -> Result<Vec<Task>, RepositoryError>;

    /// 标记任务完成
    async fn mark_done(&self, task_id: Uuid) -> Result<(), RepositoryError>;

    /// 标记任务失败
    ///
    /// `retry` 为 true 且 attempts < max_attempts 时回到 pending，
    /// next_retry_at 按指数 backoff 设置；否则进入终态 failed
    async fn mark_failed(
        &self,
        task_id: Uuid,
        error: &str,
        retry: bool,
    ) -> Result<(), RepositoryError>;

    /// 手工重试已失败任务
    ///
    /// 仅允许从 failed 状态触发；不重置 attempts
    async fn retry(&self, task_id: Uuid) -> Result<Task, RepositoryError>;

    /// 按ID查找任务
    async fn find_by_id(&self, task_id: Uuid) -> Result<Option<Task>, RepositoryError>;

    /// 分页查询任务列表
    async fn list(
        &self,
        filter: TaskFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Task>, u64), RepositoryError>;

    /// 按状态统计任务数
    async fn count_by_status(&self, status: TaskStatus) -> Result<u64, RepositoryError>;

    /// 回收卡死的 running 任务
    ///
    /// started_at 早于阈值的指定类型任务回到 pending；
    /// 已耗尽 attempts 的直接置为 failed。返回回收数量
    async fn recover_stuck(
        &self,
        older_than: Duration,
        task_types: &[TaskType],
    ) -> Result<u64, RepositoryError>;

    /// 所有 running 状态的 ai_analysis 任务
    async fn running_analysis(&self) -> Result<Vec<Task>, RepositoryError>;

    /// started_at 早于阈值的 running ai_analysis 任务
    async fn stale_running_analysis(
        &self,
        older_than: Duration,
    ) -> Result<Vec<Task>, RepositoryError>;

    /// 将 batch_id 写入任务 payload
    async fn attach_batch(&self, task_id: Uuid, batch_id: &str) -> Result<(), RepositoryError>;
}
