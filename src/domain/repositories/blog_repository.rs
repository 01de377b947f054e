// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::blog::{Blog, BlogScrapeUpdate, ScrapeStatus};
use crate::domain::models::insights::AIInsights;
use crate::domain::models::profile::{DiscoveredProfile, ScrapedHighlight, ScrapedPost};
use crate::domain::repositories::task_repository::RepositoryError;
use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

/// 博主仓库特质
///
/// blogs / persons / blog_posts / blog_highlights 的数据访问层
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// 查找或创建博主
    ///
    /// username 需已规范化（小写、去 @）。不存在时创建 person + blog；
    /// 并发竞争由 (platform, username) 唯一约束兜底，竞争失败方
    /// 清理孤儿 person 并返回已有记录
    async fn find_or_create(
        &self,
        platform: &str,
        username: &str,
    ) -> Result<Blog, RepositoryError>;

    /// 按ID查找博主
    async fn find_by_id(&self, blog_id: Uuid) -> Result<Option<Blog>, RepositoryError>;

    /// 批量按用户名查找
    async fn find_by_usernames(
        &self,
        platform: &str,
        usernames: &[String],
    ) -> Result<Vec<Blog>, RepositoryError>;

    /// 为 discover 候选创建 person + blog
    async fn create_discovered(
        &self,
        platform: &str,
        profile: &DiscoveredProfile,
        source: &str,
    ) -> Result<Blog, RepositoryError>;

    /// 更新抓取生命周期状态
    async fn set_scrape_status(
        &self,
        blog_id: Uuid,
        status: ScrapeStatus,
    ) -> Result<(), RepositoryError>;

    /// 落库抓取结果（资料字段 + scraped_at）
    async fn apply_scrape(
        &self,
        blog_id: Uuid,
        update: &BlogScrapeUpdate,
    ) -> Result<(), RepositoryError>;

    /// 更新 person 的全名
    async fn update_person_name(
        &self,
        person_id: Uuid,
        full_name: &str,
    ) -> Result<(), RepositoryError>;

    /// Upsert 帖子，冲突键 (blog_id, platform_id)
    async fn upsert_posts(
        &self,
        blog_id: Uuid,
        posts: &[ScrapedPost],
    ) -> Result<(), RepositoryError>;

    /// Upsert 精选故事，冲突键 (blog_id, platform_id)
    async fn upsert_highlights(
        &self,
        blog_id: Uuid,
        highlights: &[ScrapedHighlight],
    ) -> Result<(), RepositoryError>;

    /// 最近的帖子（按 taken_at 倒序）
    async fn recent_posts(
        &self,
        blog_id: Uuid,
        limit: u64,
    ) -> Result<Vec<ScrapedPost>, RepositoryError>;

    /// 博主的全部精选故事
    async fn highlights(&self, blog_id: Uuid) -> Result<Vec<ScrapedHighlight>, RepositoryError>;

    /// 判断博主是否在新鲜度窗口内（scraped_at 距今不足 window）
    async fn is_fresh(&self, blog_id: Uuid, window: Duration) -> Result<bool, RepositoryError>;

    /// 写入 AI 分析结果并置为 active
    async fn save_insights(
        &self,
        blog_id: Uuid,
        insights: &AIInsights,
    ) -> Result<(), RepositoryError>;

    /// 记录 AI 拒绝原因并更新状态
    async fn save_refusal(
        &self,
        blog_id: Uuid,
        reason: &str,
        status: ScrapeStatus,
    ) -> Result<(), RepositoryError>;

    /// 保存语义向量
    async fn save_embedding(&self, blog_id: Uuid, vector: &[f32]) -> Result<(), RepositoryError>;

    /// 有 ai_insights 但缺 embedding 的博主（backfill 用）
    async fn missing_embeddings(&self, limit: u64) -> Result<Vec<Blog>, RepositoryError>;

    /// 需要重新抓取的 active 博主ID
    ///
    /// scraped_at 早于窗口，按粉丝数倒序，最多 limit 个
    async fn stale_for_rescrape(
        &self,
        window: Duration,
        limit: u64,
    ) -> Result<Vec<Uuid>, RepositoryError>;

    /// 全部博主ID（图片清理任务用）
    async fn all_ids(&self) -> Result<Vec<Uuid>, RepositoryError>;
}
