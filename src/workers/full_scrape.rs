// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::blog::{BlogScrapeUpdate, ScrapeStatus};
use crate::domain::models::task::{Task, TaskType};
use crate::domain::services::metrics;
use crate::engines::traits::ScrapeError;
use crate::utils::errors::WorkerError;
use crate::workers::WorkerContext;
use tracing::{debug, info, warn};

/// 抓取成功后链式创建的 AI 分析任务优先级
const AI_ANALYSIS_PRIORITY: i32 = 3;

/// full_scrape 处理器
///
/// 1. blog → scraping
/// 2. 调抓取引擎，按错误类型映射任务结局
/// 3. 成功：派生指标、图片转存、upsert、blog → analyzing、链出 ai_analysis
pub async fn handle(ctx: &WorkerContext, task: &Task) -> Result<(), WorkerError> {
    let Some(blog_id) = task.blog_id else {
        ctx.queue
            .mark_failed(task.id, "full_scrape task has no blog_id", false)
            .await
            .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
        return Ok(());
    };

    let Some(blog) = ctx.blogs.find_by_id(blog_id).await? else {
        ctx.queue
            .mark_failed(task.id, "Blog not found", false)
            .await
            .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
        return Ok(());
    };

    debug!("[full_scrape] Scraping @{} (blog={})", blog.username, blog_id);
    ctx.blogs
        .set_scrape_status(blog_id, ScrapeStatus::Scraping)
        .await?;

    let profile = match ctx.engine.scrape_profile(&blog.username).await {
        Ok(profile) => profile,
        Err(ScrapeError::PrivateAccount) => {
            ctx.blogs
                .set_scrape_status(blog_id, ScrapeStatus::Private)
                .await?;
            ctx.queue
                .mark_done(task.id)
                .await
                .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
            info!("[full_scrape] @{} is private", blog.username);
            return Ok(());
        }
        Err(ScrapeError::UserNotFound) => {
            ctx.blogs
                .set_scrape_status(blog_id, ScrapeStatus::Deleted)
                .await?;
            ctx.queue
                .mark_done(task.id)
                .await
                .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
            info!("[full_scrape] @{} not found, marked deleted", blog.username);
            return Ok(());
        }
        Err(e @ ScrapeError::InsufficientBalance(_)) => {
            // 余额耗尽重试无意义；blog 状态不动，补款后可重新入队
            ctx.queue
                .mark_failed(task.id, &e.to_string(), false)
                .await
                .map_err(|err| WorkerError::RepositoryError(err.to_string()))?;
            return Ok(());
        }
        Err(e) => {
            ctx.blogs
                .set_scrape_status(blog_id, ScrapeStatus::Pending)
                .await?;
            ctx.queue
                .mark_failed(task.id, &e.to_string(), e.is_retryable())
                .await
                .map_err(|err| WorkerError::RepositoryError(err.to_string()))?;
            return Ok(());
        }
    };

    debug!(
        "[full_scrape] @{}: scraped {} publications, {} highlights, followers={}",
        blog.username,
        profile.medias.len(),
        profile.highlights.len(),
        profile.follower_count
    );

    let avg_reels_views = metrics::avg_reels_views(&profile.medias);

    // CDN 图片转存为长期 URL；失败不阻塞抓取，保留 CDN 地址
    let mut posts = profile.medias.clone();
    let (avatar_storage_url, post_urls) = ctx
        .storage
        .persist_profile_images(
            blog_id,
            profile.profile_pic_url.as_deref(),
            &posts,
            ctx.settings.thumbnails_to_persist,
        )
        .await;
    for post in posts.iter_mut() {
        if let Some(url) = post_urls.get(&post.platform_id) {
            post.thumbnail_url = Some(url.clone());
        }
    }

    let update = BlogScrapeUpdate {
        platform_id: Some(profile.platform_id.clone()),
        bio: Some(profile.biography.clone()),
        followers_count: profile.follower_count,
        following_count: profile.following_count,
        media_count: profile.media_count,
        is_verified: profile.is_verified,
        is_business: profile.is_business,
        er: profile.avg_er,
        er_reels: profile.avg_er_reels,
        er_trend: profile.er_trend.map(|t| t.to_string()),
        posts_per_week: profile.posts_per_week,
        avg_reels_views,
        avatar_url: avatar_storage_url.or_else(|| profile.profile_pic_url.clone()),
        bio_links: if profile.bio_links.is_empty() {
            None
        } else {
            serde_json::to_value(&profile.bio_links).ok()
        },
    };

    if let Err(e) = store_scrape(ctx, blog_id, blog.person_id, &profile.full_name, &update, &posts, &profile.highlights).await {
        warn!("[full_scrape] @{}: persist failed: {}", blog.username, e);
        ctx.blogs
            .set_scrape_status(blog_id, ScrapeStatus::Pending)
            .await?;
        ctx.queue
            .mark_failed(task.id, &e.to_string(), true)
            .await
            .map_err(|err| WorkerError::RepositoryError(err.to_string()))?;
        return Ok(());
    }

    ctx.blogs
        .set_scrape_status(blog_id, ScrapeStatus::Analyzing)
        .await?;

    // AI 分析任务在 (blog_id, ai_analysis) 上去重
    ctx.queue
        .enqueue_if_absent(
            Some(blog_id),
            TaskType::AiAnalysis,
            AI_ANALYSIS_PRIORITY,
            serde_json::json!({}),
        )
        .await
        .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;

    ctx.queue
        .mark_done(task.id)
        .await
        .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
    info!("Full scrape done for @{} (blog={})", blog.username, blog_id);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn store_scrape(
    ctx: &WorkerContext,
    blog_id: uuid::Uuid,
    person_id: Option<uuid::Uuid>,
    full_name: &str,
    update: &BlogScrapeUpdate,
    posts: &[crate::domain::models::profile::ScrapedPost],
    highlights: &[crate::domain::models::profile::ScrapedHighlight],
) -> Result<(), WorkerError> {
    ctx.blogs.apply_scrape(blog_id, update).await?;

    if let Some(person_id) = person_id {
        if !full_name.is_empty() {
            ctx.blogs.update_person_name(person_id, full_name).await?;
        }
    }

    ctx.blogs.upsert_posts(blog_id, posts).await?;
    ctx.blogs.upsert_highlights(blog_id, highlights).await?;
    Ok(())
}
