// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{Task, TaskType};
use crate::utils::errors::WorkerError;
use crate::workers::{ai_analysis, discover, full_scrape, WorkerContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// 停机后等待在途任务的宽限期
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// 轮询工作器
///
/// 单循环 + 有界并发：每个 tick 认领「空闲槽位数」个任务，
/// 逐个派发到独立 tokio task。收到停机信号后停止认领，
/// 宽限期内等待在途任务，超时的留在 running 由调度器回收
pub struct PollingWorker {
    ctx: Arc<WorkerContext>,
}

impl PollingWorker {
    /// 创建新的轮询工作器实例
    pub fn new(ctx: Arc<WorkerContext>) -> Self {
        Self { ctx }
    }

    /// 运行轮询循环直到停机信号
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let poll_interval = Duration::from_secs(self.ctx.settings.worker_poll_interval);
        let max_concurrent = self.ctx.settings.worker_max_concurrent;
        let mut in_flight: JoinSet<()> = JoinSet::new();

        info!(
            "Worker started (poll={}s, concurrent={})",
            self.ctx.settings.worker_poll_interval, max_concurrent
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let free_slots = max_concurrent.saturating_sub(in_flight.len());
            if free_slots > 0 {
                match self.ctx.queue.claim_batch(free_slots).await {
                    Ok(tasks) => {
                        if !tasks.is_empty() {
                            info!("Claimed {} pending tasks", tasks.len());
                        }
                        for task in tasks {
                            let ctx = self.ctx.clone();
                            in_flight.spawn(async move {
                                process_task(ctx, task).await;
                            });
                        }
                    }
                    Err(e) => error!("Error claiming tasks: {}", e),
                }
            }

            // 等 poll_interval、任一在途任务完成或停机信号，先到先醒
            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                _ = shutdown.changed() => {}
            }
        }

        // 优雅停机：不再认领，宽限期内等在途任务跑完
        if !in_flight.is_empty() {
            info!("Waiting for {} active tasks to finish...", in_flight.len());
            let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
                while in_flight.join_next().await.is_some() {}
            })
            .await;

            if drained.is_err() {
                // 超时任务留在 running，recover_tasks 稍后拉回 pending
                warn!(
                    "Abandoning {} tasks still running after {}s grace",
                    in_flight.len(),
                    SHUTDOWN_GRACE.as_secs()
                );
                in_flight.abort_all();
            }
        }

        info!("Worker shutting down");
    }
}

/// 处理一个已认领的任务
///
/// 处理器自行完成队列状态迁移；漏网的意外错误在这里
/// 按暂时性错误记失败（带重试）
async fn process_task(ctx: Arc<WorkerContext>, task: Task) {
    debug!(
        "Processing task {}: type={}, attempts={}/{}",
        task.id, task.task_type, task.attempts, task.max_attempts
    );

    let result = match task.task_type {
        TaskType::FullScrape => full_scrape::handle(&ctx, &task).await,
        TaskType::Discover => discover::handle(&ctx, &task).await,
        TaskType::AiAnalysis => ai_analysis::handle(&ctx, &task).await,
    };

    if let Err(e) = result {
        error!("Unhandled error in task {}: {}", task.id, e);
        mark_failed_best_effort(&ctx, &task, &e).await;
    }
}

async fn mark_failed_best_effort(ctx: &WorkerContext, task: &Task, e: &WorkerError) {
    if let Err(mark_err) = ctx.queue.mark_failed(task.id, &e.to_string(), true).await {
        error!("Failed to mark task {} as failed: {}", task.id, mark_err);
    }
}
