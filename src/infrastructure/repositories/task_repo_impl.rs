// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{Task, TaskStatus, TaskType};
use crate::domain::repositories::task_repository::{RepositoryError, TaskFilter, TaskRepository};
use crate::infrastructure::database::entities::task as task_entity;
use crate::utils::retry_policy::backoff_delay;
use crate::utils::sanitize::sanitize_error;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::sea_query::{LockBehavior, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 任务仓库实现
///
/// 基于SeaORM实现的队列数据访问层。
/// 认领与条件创建都在单事务内完成，配合行锁保证并发正确性
#[derive(Clone)]
pub struct TaskRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl TaskRepositoryImpl {
    /// 创建新的任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<task_entity::Model> for Task {
    fn from(model: task_entity::Model) -> Self {
        Self {
            id: model.id,
            blog_id: model.blog_id,
            task_type: model.task_type.parse().unwrap_or_default(),
            status: model.status.parse().unwrap_or_default(),
            priority: model.priority,
            payload: model.payload,
            attempts: model.attempts,
            max_attempts: model.max_attempts,
            error_message: model.error_message,
            next_retry_at: model.next_retry_at,
            started_at: model.started_at,
            completed_at: model.completed_at,
            created_at: model.created_at,
        }
    }
}

impl From<Task> for task_entity::ActiveModel {
    fn from(task: Task) -> Self {
        Self {
            id: Set(task.id),
            blog_id: Set(task.blog_id),
            task_type: Set(task.task_type.to_string()),
            status: Set(task.status.to_string()),
            priority: Set(task.priority),
            payload: Set(task.payload),
            attempts: Set(task.attempts),
            max_attempts: Set(task.max_attempts),
            error_message: Set(task.error_message),
            next_retry_at: Set(task.next_retry_at),
            started_at: Set(task.started_at),
            completed_at: Set(task.completed_at),
            created_at: Set(task.created_at),
        }
    }
}

/// 非终态状态集合（唯一性判定的范围）
fn open_statuses() -> Vec<String> {
    vec![
        TaskStatus::Pending.to_string(),
        TaskStatus::Running.to_string(),
    ]
}

#[async_trait]
impl TaskRepository for TaskRepositoryImpl {
    async fn create_if_absent(
        &self,
        blog_id: Option<Uuid>,
        task_type: TaskType,
        priority: i32,
        payload: serde_json::Value,
    ) -> Result<Option<Uuid>, RepositoryError> {
        let txn = self.db.begin().await?;

        // 条件插入：同一事务内检查非终态任务再插入。
        // FOR UPDATE 串行化同键的并发创建者；检查时还不存在的行
        // 由部分唯一索引 uq_scrape_tasks_open 兜底
        let mut condition = Condition::all()
            .add(task_entity::Column::TaskType.eq(task_type.to_string()))
            .add(task_entity::Column::Status.is_in(open_statuses()));
        condition = match blog_id {
            Some(id) => condition.add(task_entity::Column::BlogId.eq(id)),
            None => condition.add(task_entity::Column::BlogId.is_null()),
        };

        let existing = task_entity::Entity::find()
            .filter(condition)
            .lock_exclusive()
            .one(&txn)
            .await?;

        if existing.is_some() {
            txn.commit().await?;
            debug!(
                "Task {} for blog {:?} already exists, skipping",
                task_type, blog_id
            );
            return Ok(None);
        }

        let task = Task::new(blog_id, task_type, priority, payload);
        let model: task_entity::ActiveModel = task.clone().into();

        match model.insert(&txn).await {
            Ok(_) => {
                txn.commit().await?;
                info!(
                    "Created task {} for blog {:?}: {}",
                    task_type, blog_id, task.id
                );
                Ok(Some(task.id))
            }
            Err(e) => {
                let _ = txn.rollback().await;
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    debug!(
                        "Concurrent creator won for {} / blog {:?}, skipping",
                        task_type, blog_id
                    );
                    Ok(None)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn claim_batch(&self, limit: usize) -> Result<Vec<Task>, RepositoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let txn = self.db.begin().await?;
        let now = Utc::now();

        let models = task_entity::Entity::find()
            .filter(task_entity::Column::Status.eq(TaskStatus::Pending.to_string()))
            .filter(
                Condition::any()
                    .add(task_entity::Column::NextRetryAt.is_null())
                    .add(task_entity::Column::NextRetryAt.lte(now)),
            )
            .order_by_asc(task_entity::Column::Priority)
            .order_by_asc(task_entity::Column::CreatedAt)
            .limit(limit as u64)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .all(&txn)
            .await?;

        let mut claimed: Vec<Task> = Vec::with_capacity(models.len());
        for model in models {
            let mut active: task_entity::ActiveModel = model.into();
            active.status = Set(TaskStatus::Running.to_string());
            active.started_at = Set(Some(now.into()));
            let attempts = *active.attempts.as_ref();
            active.attempts = Set(attempts + 1);

            let updated = active.update(&txn).await?;
            claimed.push(updated.into());
        }

        txn.commit().await?;

        if !claimed.is_empty() {
            debug!("Claimed {} tasks", claimed.len());
        }
        Ok(claimed)
    }

    async fn mark_done(&self, task_id: Uuid) -> Result<(), RepositoryError> {
        let model = task_entity::Entity::find_by_id(task_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: task_entity::ActiveModel = model.into();
        active.status = Set(TaskStatus::Done.to_string());
        active.completed_at = Set(Some(Utc::now().into()));
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        task_id: Uuid,
        error_msg: &str,
        retry: bool,
    ) -> Result<(), RepositoryError> {
        let model = task_entity::Entity::find_by_id(task_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let attempts = model.attempts;
        let max_attempts = model.max_attempts;
        let safe_error = sanitize_error(error_msg);
        let mut active: task_entity::ActiveModel = model.into();

        if retry && attempts < max_attempts {
            let delay = backoff_delay(attempts);
            active.status = Set(TaskStatus::Pending.to_string());
            active.error_message = Set(Some(safe_error));
            active.next_retry_at = Set(Some((Utc::now() + delay).into()));
            active.update(self.db.as_ref()).await?;
            info!(
                "Task {} retry in {}s (attempt {}/{})",
                task_id,
                delay.num_seconds(),
                attempts,
                max_attempts
            );
        } else {
            active.status = Set(TaskStatus::Failed.to_string());
            active.error_message = Set(Some(safe_error.clone()));
            active.completed_at = Set(Some(Utc::now().into()));
            active.update(self.db.as_ref()).await?;
            error!("Task {} permanently failed: {}", task_id, safe_error);
        }
        Ok(())
    }

    async fn retry(&self, task_id: Uuid) -> Result<Task, RepositoryError> {
        let model = task_entity::Entity::find_by_id(task_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if model.status != TaskStatus::Failed.to_string() {
            return Err(RepositoryError::InvalidState(format!(
                "task status is '{}', expected 'failed'",
                model.status
            )));
        }

        // attempts 保留不变：手工重试不重置重试预算的审计口径
        let mut active: task_entity::ActiveModel = model.into();
        active.status = Set(TaskStatus::Pending.to_string());
        active.error_message = Set(None);
        active.next_retry_at = Set(None);
        active.completed_at = Set(None);
        let updated = active.update(self.db.as_ref()).await?;
        info!("Task {} manually requeued", task_id);
        Ok(updated.into())
    }

    async fn find_by_id(&self, task_id: Uuid) -> Result<Option<Task>, RepositoryError> {
        let model = task_entity::Entity::find_by_id(task_id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list(
        &self,
        filter: TaskFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Task>, u64), RepositoryError> {
        let mut query = task_entity::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(task_entity::Column::Status.eq(status.to_string()));
        }
        if let Some(task_type) = filter.task_type {
            query = query.filter(task_entity::Column::TaskType.eq(task_type.to_string()));
        }

        let total = query.clone().count(self.db.as_ref()).await?;
        let models = query
            .order_by_desc(task_entity::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await?;

        Ok((models.into_iter().map(Task::from).collect(), total))
    }

    async fn count_by_status(&self, status: TaskStatus) -> Result<u64, RepositoryError> {
        let count = task_entity::Entity::find()
            .filter(task_entity::Column::Status.eq(status.to_string()))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn recover_stuck(
        &self,
        older_than: Duration,
        task_types: &[TaskType],
    ) -> Result<u64, RepositoryError> {
        let threshold = Utc::now() - older_than;
        let type_strings: Vec<String> = task_types.iter().map(|t| t.to_string()).collect();

        let models = task_entity::Entity::find()
            .filter(task_entity::Column::Status.eq(TaskStatus::Running.to_string()))
            .filter(task_entity::Column::TaskType.is_in(type_strings))
            .filter(task_entity::Column::StartedAt.lte(threshold))
            .all(self.db.as_ref())
            .await?;

        if models.is_empty() {
            return Ok(0);
        }

        let minutes = older_than.num_minutes();
        let mut recovered = 0u64;
        for model in models {
            let exhausted = model.attempts >= model.max_attempts;
            let mut active: task_entity::ActiveModel = model.into();
            if exhausted {
                active.status = Set(TaskStatus::Failed.to_string());
                active.error_message = Set(Some(format!(
                    "Stuck in running for >{}min, max attempts exhausted",
                    minutes
                )));
                active.completed_at = Set(Some(Utc::now().into()));
            } else {
                active.status = Set(TaskStatus::Pending.to_string());
                active.error_message = Set(Some(format!(
                    "Recovered: stuck in running for >{}min",
                    minutes
                )));
                recovered += 1;
            }
            active.update(self.db.as_ref()).await?;
        }

        if recovered > 0 {
            warn!("Recovered {} stuck tasks (>{}min)", recovered, minutes);
        }
        Ok(recovered)
    }

    async fn running_analysis(&self) -> Result<Vec<Task>, RepositoryError> {
        let models = task_entity::Entity::find()
            .filter(task_entity::Column::Status.eq(TaskStatus::Running.to_string()))
            .filter(task_entity::Column::TaskType.eq(TaskType::AiAnalysis.to_string()))
            .order_by_asc(task_entity::Column::StartedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Task::from).collect())
    }

    async fn stale_running_analysis(
        &self,
        older_than: Duration,
    ) -> Result<Vec<Task>, RepositoryError> {
        let threshold = Utc::now() - older_than;
        let models = task_entity::Entity::find()
            .filter(task_entity::Column::Status.eq(TaskStatus::Running.to_string()))
            .filter(task_entity::Column::TaskType.eq(TaskType::AiAnalysis.to_string()))
            .filter(task_entity::Column::StartedAt.lte(threshold))
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Task::from).collect())
    }

    async fn attach_batch(&self, task_id: Uuid, batch_id: &str) -> Result<(), RepositoryError> {
        let model = task_entity::Entity::find_by_id(task_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut payload = model.payload.clone();
        match payload.as_object_mut() {
            Some(map) => {
                map.insert(
                    "batch_id".to_string(),
                    serde_json::Value::String(batch_id.to_string()),
                );
            }
            None => {
                payload = serde_json::json!({ "batch_id": batch_id });
            }
        }

        let mut active: task_entity::ActiveModel = model.into();
        active.payload = Set(payload);
        active.update(self.db.as_ref()).await?;
        Ok(())
    }
}
