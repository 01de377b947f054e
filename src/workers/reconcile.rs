// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::ai::batch::{poll_batch, BatchPoll};
use crate::domain::models::blog::ScrapeStatus;
use crate::domain::models::insights::{AIInsights, AnalysisOutcome};
use crate::domain::models::task::{Task, TaskType};
use crate::domain::services::embedding_text::build_embedding_text;
use crate::domain::services::taxonomy::{
    build_category_index, build_tag_index, plan_categories, plan_tags, TaxonomyIndex,
};
use crate::utils::errors::WorkerError;
use crate::workers::WorkerContext;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// text_only 重试链的任务优先级（与首轮分析一致）
const TEXT_ONLY_RETRY_PRIORITY: i32 = 3;

/// 轮询并核销所有在途批次
///
/// running ai_analysis 任务按 batch_id 分组，逐批查询供应商状态：
/// 进行中的不动，完成的逐条核销，供应商侧终止的整批失败重试。
/// 单批错误互相隔离
pub async fn reconcile_batches(ctx: &WorkerContext) -> Result<(), WorkerError> {
    let running = ctx.tasks.running_analysis().await?;
    if running.is_empty() {
        debug!("[poll_batches] No running ai_analysis tasks");
        return Ok(());
    }

    let mut batches: HashMap<String, Vec<Task>> = HashMap::new();
    for task in running {
        if let Some(batch_id) = task.batch_id().map(|s| s.to_string()) {
            batches.entry(batch_id).or_default().push(task);
        }
    }

    debug!("[poll_batches] {} active batches", batches.len());
    for (batch_id, tasks) in batches {
        if let Err(e) = reconcile_one_batch(ctx, &batch_id, &tasks).await {
            error!("Error polling batch {}: {}", batch_id, e);
        }
    }
    Ok(())
}

async fn reconcile_one_batch(
    ctx: &WorkerContext,
    batch_id: &str,
    tasks: &[Task],
) -> Result<(), WorkerError> {
    let poll = poll_batch(&ctx.openai, batch_id)
        .await
        .map_err(|e| WorkerError::PipelineError(e.to_string()))?;

    match poll {
        BatchPoll::Pending(status) => {
            debug!("[poll_batches] Batch {} still {}", batch_id, status);
            Ok(())
        }
        BatchPoll::Dead(status) => {
            // 供应商侧终止：整批带重试失败，下次认领时重新提交
            warn!(
                "[poll_batches] Batch {} {} on provider side, retrying {} tasks",
                batch_id,
                status,
                tasks.len()
            );
            for task in tasks {
                ctx.tasks
                    .mark_failed(
                        task.id,
                        &format!("Batch {} {}", batch_id, status),
                        true,
                    )
                    .await?;
            }
            Ok(())
        }
        BatchPoll::Completed(outcomes) => {
            // 词表快照整批复用
            let category_index = build_category_index(&ctx.taxonomy.load_categories().await?);
            let tag_index = build_tag_index(&ctx.taxonomy.load_active_tags().await?);

            for task in tasks {
                let Some(blog_id) = task.blog_id else {
                    ctx.tasks
                        .mark_failed(task.id, "ai_analysis task has no blog_id", false)
                        .await?;
                    continue;
                };

                match outcomes.get(&blog_id.to_string()) {
                    None => {
                        ctx.tasks
                            .mark_failed(
                                task.id,
                                "Batch completed without result for this task",
                                true,
                            )
                            .await?;
                    }
                    Some(outcome) => {
                        if let Err(e) = reconcile_outcome(
                            ctx,
                            task,
                            blog_id,
                            outcome,
                            &category_index,
                            &tag_index,
                        )
                        .await
                        {
                            error!(
                                "Failed to reconcile result for blog {}: {}",
                                blog_id, e
                            );
                        }
                    }
                }
            }
            info!("Batch {} processed: {} results", batch_id, outcomes.len());
            Ok(())
        }
    }
}

/// 核销单条结果
///
/// 成功：写入 insights（blog → active），匹配词表，生成 embedding
/// （失败只记日志），任务完成。
/// 拒绝：首次 → blog ai_refused + 建一次 text_only 重试；
/// 再次 → blog ai_analyzed，链到此为止。
/// 供应商错误：blog ai_analyzed（无 insights），任务完成
pub async fn reconcile_outcome(
    ctx: &WorkerContext,
    task: &Task,
    blog_id: Uuid,
    outcome: &AnalysisOutcome,
    category_index: &TaxonomyIndex,
    tag_index: &TaxonomyIndex,
) -> Result<(), WorkerError> {
    match outcome {
        AnalysisOutcome::Success(insights) => {
            debug!(
                "[poll_batches] Blog {}: saving insights (confidence={})",
                blog_id, insights.confidence
            );
            ctx.blogs.save_insights(blog_id, insights).await?;

            apply_taxonomy(ctx, blog_id, insights, category_index, tag_index).await;
            generate_embedding(ctx, blog_id, insights).await;

            ctx.tasks.mark_done(task.id).await?;
        }
        AnalysisOutcome::Refusal(reason) => {
            let already_refused = ctx
                .blogs
                .find_by_id(blog_id)
                .await?
                .map(|b| b.scrape_status == ScrapeStatus::AiRefused)
                .unwrap_or(false);

            if already_refused {
                // 纯文本重试也被拒绝：链到此为止
                warn!(
                    "[poll_batches] Blog {}: refused again ({}), giving up",
                    blog_id, reason
                );
                ctx.blogs
                    .save_refusal(blog_id, reason, ScrapeStatus::AiAnalyzed)
                    .await?;
                ctx.tasks.mark_done(task.id).await?;
            } else {
                warn!(
                    "[poll_batches] Blog {}: AI refusal ({}), queueing text-only retry",
                    blog_id, reason
                );
                ctx.blogs
                    .save_refusal(blog_id, reason, ScrapeStatus::AiRefused)
                    .await?;
                ctx.tasks.mark_done(task.id).await?;
                ctx.queue
                    .enqueue_if_absent(
                        Some(blog_id),
                        TaskType::AiAnalysis,
                        TEXT_ONLY_RETRY_PRIORITY,
                        serde_json::json!({ "text_only": true }),
                    )
                    .await
                    .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
            }
        }
        AnalysisOutcome::ProviderError => {
            debug!("[poll_batches] Blog {}: provider error, no insights", blog_id);
            ctx.blogs
                .set_scrape_status(blog_id, ScrapeStatus::AiAnalyzed)
                .await?;
            ctx.tasks.mark_done(task.id).await?;
        }
    }
    Ok(())
}

/// 词表匹配并落库；未命中的值逐条告警（带 blog_id，供运营排查词表缺口）
async fn apply_taxonomy(
    ctx: &WorkerContext,
    blog_id: Uuid,
    insights: &AIInsights,
    category_index: &TaxonomyIndex,
    tag_index: &TaxonomyIndex,
) {
    let category_match = plan_categories(insights, category_index);
    for value in &category_match.unresolved {
        warn!("Unresolved category for blog {}: '{}'", blog_id, value);
    }
    if !category_match.assignments.is_empty() {
        if let Err(e) = ctx
            .taxonomy
            .replace_blog_categories(blog_id, &category_match.assignments)
            .await
        {
            error!("Failed to match categories for blog {}: {}", blog_id, e);
        }
    }

    let tag_match = plan_tags(insights, tag_index);
    for value in &tag_match.unresolved {
        warn!("Unresolved tag for blog {}: '{}'", blog_id, value);
    }
    if !tag_match.tag_ids.is_empty() {
        if let Err(e) = ctx
            .taxonomy
            .replace_blog_tags(blog_id, &tag_match.tag_ids)
            .await
        {
            error!("Failed to match tags for blog {}: {}", blog_id, e);
        }
    }
}

/// embedding 是尽力而为的副作用；失败不阻塞任务完成，
/// retry_missing_embeddings 是恢复路径
async fn generate_embedding(ctx: &WorkerContext, blog_id: Uuid, insights: &AIInsights) {
    let text = build_embedding_text(insights);
    match ctx.openai.embed(&text).await {
        Ok(vector) => {
            if let Err(e) = ctx.blogs.save_embedding(blog_id, &vector).await {
                error!("Failed to store embedding for blog {}: {}", blog_id, e);
            } else {
                debug!(
                    "[poll_batches] Blog {}: embedding saved ({} dim)",
                    blog_id,
                    vector.len()
                );
            }
        }
        Err(e) => error!("Failed to generate embedding for blog {}: {}", blog_id, e),
    }
}
