// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::insights::AIInsights;
use crate::domain::models::task::TaskType;
use crate::domain::services::embedding_text::build_embedding_text;
use crate::workers::{ai_analysis, reconcile, WorkerContext};
use chrono::{Datelike, Duration as ChronoDuration, TimeZone, Utc, Weekday};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

/// running 超过该分钟数的抓取类任务判定为卡死
const STUCK_THRESHOLD_MINUTES: i64 = 30;

/// ai_analysis 任务在 running 超过该小时数判定为僵尸批次
/// （24 小时批处理窗口 + 余量）
const STALE_BATCH_HOURS: i64 = 26;

/// 每轮 embedding 回填的博主数上限
const EMBEDDING_BACKFILL_LIMIT: u64 = 50;

/// 每天的重抓名额
const RESCRAPE_LIMIT: u64 = 100;

/// 计划重抓任务的优先级
const RESCRAPE_PRIORITY: i32 = 8;

/// 任务调度器
///
/// 固定间隔与 cron 式维护任务。全部任务幂等，
/// 相邻两次运行可以重叠而不破坏状态
pub struct TaskScheduler {
    ctx: Arc<WorkerContext>,
}

impl TaskScheduler {
    /// 创建新的任务调度器实例
    pub fn new(ctx: Arc<WorkerContext>) -> Self {
        Self { ctx }
    }

    /// 启动全部周期任务
    ///
    /// # 返回值
    ///
    /// 返回后台任务句柄列表
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        // 每 15 分钟 —— 轮询并核销 AI 批次
        {
            let ctx = self.ctx.clone();
            handles.push(tokio::spawn(async move {
                let mut ticker = interval(Duration::from_secs(15 * 60));
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if let Err(e) = reconcile::reconcile_batches(&ctx).await {
                        error!("poll_batches failed: {}", e);
                    }
                    // 蓄水池里按时间触发的批次也在这里兜底提交
                    if let Err(e) = ai_analysis::submit_pending_batch(&ctx).await {
                        error!("batch submit check failed: {}", e);
                    }
                }
            }));
        }

        // 每 10 分钟 —— 回收卡死的 running 任务
        // ai_analysis 不在回收范围：它们的 running 属于批处理周期，
        // 由 retry_stale_batches 负责
        {
            let ctx = self.ctx.clone();
            handles.push(tokio::spawn(async move {
                let mut ticker = interval(Duration::from_secs(10 * 60));
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    match ctx
                        .tasks
                        .recover_stuck(
                            ChronoDuration::minutes(STUCK_THRESHOLD_MINUTES),
                            &[TaskType::FullScrape, TaskType::Discover],
                        )
                        .await
                    {
                        Ok(count) if count > 0 => info!("Recovered {} stuck tasks", count),
                        Ok(_) => {}
                        Err(e) => error!("recover_tasks failed: {}", e),
                    }
                }
            }));
        }

        // 每 2 小时 —— 僵尸批次重试
        {
            let ctx = self.ctx.clone();
            handles.push(tokio::spawn(async move {
                let mut ticker = interval(Duration::from_secs(2 * 60 * 60));
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if let Err(e) = retry_stale_batches(&ctx).await {
                        error!("retry_stale_batches failed: {}", e);
                    }
                }
            }));
        }

        // 每小时 —— 缺失 embedding 回填
        {
            let ctx = self.ctx.clone();
            handles.push(tokio::spawn(async move {
                let mut ticker = interval(Duration::from_secs(60 * 60));
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if let Err(e) = retry_missing_embeddings(&ctx).await {
                        error!("retry_missing_embeddings failed: {}", e);
                    }
                }
            }));
        }

        // 每天 03:00 UTC —— 过期档案计划重抓
        {
            let ctx = self.ctx.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    tokio::time::sleep(until_next_daily(3)).await;
                    if let Err(e) = schedule_updates(&ctx).await {
                        error!("schedule_updates failed: {}", e);
                    }
                }
            }));
        }

        // 每周日 04:00 UTC —— 清理孤儿图片
        {
            let ctx = self.ctx.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    tokio::time::sleep(until_next_weekly(Weekday::Sun, 4)).await;
                    if let Err(e) = cleanup_images(&ctx).await {
                        error!("cleanup failed: {}", e);
                    }
                }
            }));
        }

        info!("Scheduler started (6 periodic jobs)");
        handles
    }
}

/// 僵尸批次重试：running 超过 26 小时的 ai_analysis 任务
/// 带重试失败，下次认领时重新进蓄水池
pub async fn retry_stale_batches(ctx: &WorkerContext) -> Result<(), crate::utils::errors::WorkerError> {
    let stale = ctx
        .tasks
        .stale_running_analysis(ChronoDuration::hours(STALE_BATCH_HOURS))
        .await?;
    if stale.is_empty() {
        return Ok(());
    }

    for task in &stale {
        ctx.tasks
            .mark_failed(
                task.id,
                &format!("Batch not completed in {}h", STALE_BATCH_HOURS),
                true,
            )
            .await?;
    }
    info!("Retried {} stale AI batch tasks", stale.len());
    Ok(())
}

/// 缺失 embedding 回填
///
/// 有 ai_insights 但没有向量的博主重建文本并重新生成；
/// 单个博主的失败互相隔离。重复运行与单次运行结果一致
pub async fn retry_missing_embeddings(
    ctx: &WorkerContext,
) -> Result<(), crate::utils::errors::WorkerError> {
    let blogs = ctx.blogs.missing_embeddings(EMBEDDING_BACKFILL_LIMIT).await?;
    if blogs.is_empty() {
        return Ok(());
    }

    let mut regenerated = 0usize;
    for blog in blogs {
        let Some(raw) = &blog.ai_insights else {
            continue;
        };
        let insights: AIInsights = match serde_json::from_value(raw.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("[retry_embedding] Blog {}: invalid insights: {}", blog.id, e);
                continue;
            }
        };
        // refusal 占位文档没有可嵌入的内容
        if insights.refusal_reason.is_some() {
            continue;
        }

        let text = build_embedding_text(&insights);
        match ctx.openai.embed(&text).await {
            Ok(vector) => match ctx.blogs.save_embedding(blog.id, &vector).await {
                Ok(()) => regenerated += 1,
                Err(e) => error!("[retry_embedding] Blog {}: store failed: {}", blog.id, e),
            },
            Err(e) => error!("[retry_embedding] Blog {}: {}", blog.id, e),
        }
    }

    if regenerated > 0 {
        info!("[retry_embedding] Regenerated {} embeddings", regenerated);
    }
    Ok(())
}

/// 计划重抓：active 且 scraped_at 超过新鲜度窗口的博主，
/// 按粉丝数倒序取前 100，建低优先级 full_scrape
pub async fn schedule_updates(ctx: &WorkerContext) -> Result<(), crate::utils::errors::WorkerError> {
    let window = ChronoDuration::days(ctx.settings.rescrape_days);
    let blog_ids = ctx.blogs.stale_for_rescrape(window, RESCRAPE_LIMIT).await?;

    let mut created = 0usize;
    for blog_id in blog_ids {
        let task_id = ctx
            .queue
            .enqueue_if_absent(
                Some(blog_id),
                TaskType::FullScrape,
                RESCRAPE_PRIORITY,
                serde_json::json!({}),
            )
            .await
            .map_err(|e| crate::utils::errors::WorkerError::RepositoryError(e.to_string()))?;
        if task_id.is_some() {
            created += 1;
        }
    }

    info!("Scheduled {} blog re-scrape tasks", created);
    Ok(())
}

/// 清理对象存储中已无对应博主的图片目录
pub async fn cleanup_images(ctx: &WorkerContext) -> Result<(), crate::utils::errors::WorkerError> {
    let known = ctx.blogs.all_ids().await?;
    let deleted = ctx.storage.cleanup_orphans(&known).await;
    debug!("[cleanup_images] {} orphaned objects removed", deleted);
    Ok(())
}

/// 距离下一个每日 hour:00 UTC 的时长
fn until_next_daily(hour: u32) -> Duration {
    let now = Utc::now();
    let today = now.date_naive();
    let mut next = Utc
        .from_utc_datetime(&today.and_hms_opt(hour, 0, 0).unwrap_or_default());
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}

/// 距离下一个 weekday hour:00 UTC 的时长
fn until_next_weekly(weekday: Weekday, hour: u32) -> Duration {
    let now = Utc::now();
    let today = now.date_naive();
    let days_ahead = (7 + weekday.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        % 7;
    let mut next = Utc.from_utc_datetime(
        &(today + ChronoDuration::days(days_ahead))
            .and_hms_opt(hour, 0, 0)
            .unwrap_or_default(),
    );
    if next <= now {
        next += ChronoDuration::days(7);
    }
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}
