// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::ai::batch::submit_batch;
use crate::ai::prompt::{build_system_prompt, AnalysisProfile, PromptCategory};
use crate::domain::models::task::Task;
use crate::domain::repositories::taxonomy_repository::{CategoryRow, TagRow};
use crate::utils::errors::WorkerError;
use crate::workers::WorkerContext;
use chrono::{Duration, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

/// ai_analysis 处理器
///
/// 不直接调用 AI：任务被认领后停留在 running（不带 batch_id）
/// 充当蓄水池，这里只做一次提交检查。
/// 提交条件：未挂批的任务数达到 batch_min_size，或最老的已等待
/// 超过 batch_max_age_hours
pub async fn handle(ctx: &WorkerContext, _task: &Task) -> Result<(), WorkerError> {
    submit_pending_batch(ctx).await
}

/// 检查蓄水池并在达到阈值时提交一个批次
pub async fn submit_pending_batch(ctx: &WorkerContext) -> Result<(), WorkerError> {
    let running = ctx.tasks.running_analysis().await?;
    let unattached: Vec<Task> = running
        .into_iter()
        .filter(|t| t.batch_id().is_none())
        .collect();

    if unattached.is_empty() {
        return Ok(());
    }

    let max_age = Duration::hours(ctx.settings.batch_max_age_hours);
    let age_triggered = unattached
        .iter()
        .filter_map(|t| t.started_at)
        .min()
        .map(|oldest| Utc::now().signed_duration_since(oldest.with_timezone(&Utc)) > max_age)
        .unwrap_or(false);

    if unattached.len() < ctx.settings.batch_min_size && !age_triggered {
        debug!(
            "[ai_analysis] {} accumulating, not enough for batch (min={}, age_triggered={})",
            unattached.len(),
            ctx.settings.batch_min_size,
            age_triggered
        );
        return Ok(());
    }

    debug!(
        "[ai_analysis] Submitting batch: {} tasks (min={}, age_triggered={})",
        unattached.len(),
        ctx.settings.batch_min_size,
        age_triggered
    );

    // 装配每个任务的分析上下文
    let mut profiles: Vec<AnalysisProfile> = Vec::new();
    let mut included: Vec<Uuid> = Vec::new();
    for task in &unattached {
        let Some(blog_id) = task.blog_id else {
            ctx.tasks
                .mark_failed(task.id, "ai_analysis task has no blog_id", false)
                .await?;
            continue;
        };
        let Some(blog) = ctx.blogs.find_by_id(blog_id).await? else {
            ctx.tasks
                .mark_failed(task.id, "Blog not found", false)
                .await?;
            continue;
        };

        let posts = ctx
            .blogs
            .recent_posts(blog_id, ctx.settings.posts_to_fetch)
            .await?;
        let highlights = ctx.blogs.highlights(blog_id).await?;

        profiles.push(AnalysisProfile {
            blog,
            posts,
            highlights,
            text_only: task.text_only(),
        });
        included.push(task.id);
    }

    if profiles.is_empty() {
        return Ok(());
    }

    let system_prompt = load_system_prompt(ctx).await?;

    match submit_batch(
        &ctx.openai,
        &profiles,
        &ctx.settings.batch_model,
        &system_prompt,
    )
    .await
    {
        Ok(batch_id) => {
            for task_id in &included {
                ctx.tasks.attach_batch(*task_id, &batch_id).await?;
            }
            info!(
                "AI batch submitted: {}, {} profiles",
                batch_id,
                profiles.len()
            );
        }
        Err(e) => {
            error!("Failed to submit AI batch: {}", e);
            for task_id in included {
                if let Err(mark_err) = ctx
                    .tasks
                    .mark_failed(task_id, &e.to_string(), true)
                    .await
                {
                    error!("Failed to roll back task {}: {}", task_id, mark_err);
                }
            }
        }
    }

    Ok(())
}

/// 从数据库词表组装系统提示词
async fn load_system_prompt(ctx: &WorkerContext) -> Result<String, WorkerError> {
    let categories = ctx.taxonomy.load_categories().await?;
    let tags = ctx.taxonomy.load_active_tags().await?;
    Ok(build_system_prompt(
        &to_prompt_categories(&categories),
        &tags_by_group(&tags),
    ))
}

/// 顶级分类（带 code）聚合各自的子分类名
fn to_prompt_categories(rows: &[CategoryRow]) -> Vec<PromptCategory> {
    let mut result: Vec<PromptCategory> = Vec::new();
    for row in rows {
        if row.parent_id.is_some() {
            continue;
        }
        let Some(code) = row.code.clone().filter(|c| !c.is_empty()) else {
            continue;
        };
        let subcategories: Vec<String> = rows
            .iter()
            .filter(|r| r.parent_id == Some(row.id))
            .map(|r| r.name.clone())
            .collect();
        result.push(PromptCategory {
            code,
            name: row.name.clone(),
            subcategories,
        });
    }
    result
}

/// 标签按 group 分组（group 排序稳定）
fn tags_by_group(rows: &[TagRow]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|(g, _)| *g == row.group) {
            Some((_, names)) => names.push(row.name.clone()),
            None => groups.push((row.group.clone(), vec![row.name.clone()])),
        }
    }
    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups
}
