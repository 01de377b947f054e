// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{Task, TaskType};
use crate::utils::errors::WorkerError;
use crate::utils::sanitize::normalize_username;
use crate::workers::WorkerContext;
use chrono::Duration;
use tracing::{debug, error, info};

/// discover 链出的 full_scrape 任务优先级
const DISCOVER_SCRAPE_PRIORITY: i32 = 5;

/// 候选档案的最小发布内容数
const MIN_MEDIA_COUNT: i32 = 5;

/// discover 处理器
///
/// 按话题标签搜索候选，过滤（公开、粉丝数达标、内容量达标），
/// 未知候选建 person + blog 并链出 full_scrape；
/// 已知候选只在新鲜度窗口外补一个 full_scrape
pub async fn handle(ctx: &WorkerContext, task: &Task) -> Result<(), WorkerError> {
    let Some(hashtag) = task.hashtag().map(|s| s.to_string()) else {
        ctx.queue
            .mark_failed(task.id, "No hashtag in payload", false)
            .await
            .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
        return Ok(());
    };
    let min_followers = task.min_followers();

    let discovered = match ctx.engine.discover(&hashtag, min_followers).await {
        Ok(candidates) => candidates,
        Err(e) => {
            ctx.queue
                .mark_failed(task.id, &e.to_string(), e.is_retryable())
                .await
                .map_err(|err| WorkerError::RepositoryError(err.to_string()))?;
            return Ok(());
        }
    };

    let candidates: Vec<_> = discovered
        .into_iter()
        .filter(|p| {
            !p.is_private && p.follower_count >= min_followers && p.media_count >= MIN_MEDIA_COUNT
        })
        .collect();

    // 一次查询拿到全部已知博主
    let usernames: Vec<String> = candidates
        .iter()
        .map(|p| normalize_username(&p.username))
        .collect();
    let existing = ctx.blogs.find_by_usernames("instagram", &usernames).await?;

    let freshness = Duration::days(ctx.settings.rescrape_days);
    let mut new_count = 0usize;

    for mut candidate in candidates {
        candidate.username = normalize_username(&candidate.username);

        if let Some(blog) = existing.iter().find(|b| b.username == candidate.username) {
            // 已知博主：新鲜度窗口外才补抓
            if !ctx.blogs.is_fresh(blog.id, freshness).await? {
                if let Err(e) = ctx
                    .queue
                    .enqueue_if_absent(
                        Some(blog.id),
                        TaskType::FullScrape,
                        DISCOVER_SCRAPE_PRIORITY,
                        serde_json::json!({}),
                    )
                    .await
                {
                    error!(
                        "Failed to create rescrape task for @{}: {}",
                        candidate.username, e
                    );
                }
            }
            continue;
        }

        // 单个候选失败不中断整次 discover
        match ctx
            .blogs
            .create_discovered("instagram", &candidate, "hashtag_search")
            .await
        {
            Ok(blog) => {
                if let Err(e) = ctx
                    .queue
                    .enqueue_if_absent(
                        Some(blog.id),
                        TaskType::FullScrape,
                        DISCOVER_SCRAPE_PRIORITY,
                        serde_json::json!({}),
                    )
                    .await
                {
                    error!(
                        "Failed to create scrape task for @{}: {}",
                        candidate.username, e
                    );
                    continue;
                }
                new_count += 1;
            }
            Err(e) => {
                error!("Failed to create profile @{}: {}", candidate.username, e);
            }
        }
    }

    ctx.queue
        .mark_done(task.id)
        .await
        .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
    info!(
        "Discover #{}: {} candidates passed filter, {} new",
        hashtag,
        usernames.len(),
        new_count
    );
    debug!("Discover #{} finished (task={})", hashtag, task.id);
    Ok(())
}
