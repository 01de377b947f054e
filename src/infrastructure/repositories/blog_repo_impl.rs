// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::blog::{Blog, BlogScrapeUpdate, ScrapeStatus};
use crate::domain::models::insights::AIInsights;
use crate::domain::models::profile::{DiscoveredProfile, ScrapedHighlight, ScrapedPost};
use crate::domain::repositories::blog_repository::BlogRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::database::entities::{
    blog as blog_entity, blog_highlight as highlight_entity, blog_post as post_entity,
    person as person_entity,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// 博主仓库实现
#[derive(Clone)]
pub struct BlogRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl BlogRepositoryImpl {
    /// 创建新的博主仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 孤儿 person 清理
    ///
    /// blog 插入竞争失败后，本次请求创建的 person 不再被引用
    async fn cleanup_orphan_person(&self, person_id: Uuid) {
        if let Err(e) = person_entity::Entity::delete_by_id(person_id)
            .exec(self.db.as_ref())
            .await
        {
            warn!("Failed to cleanup orphan person {}: {}", person_id, e);
        }
    }
}

impl From<blog_entity::Model> for Blog {
    fn from(model: blog_entity::Model) -> Self {
        Self {
            id: model.id,
            person_id: model.person_id,
            platform: model.platform,
            username: model.username,
            platform_id: model.platform_id,
            bio: model.bio,
            followers_count: model.followers_count,
            following_count: model.following_count,
            media_count: model.media_count,
            is_verified: model.is_verified,
            is_business: model.is_business,
            er: model.er,
            er_reels: model.er_reels,
            er_trend: model.er_trend,
            posts_per_week: model.posts_per_week,
            avg_reels_views: model.avg_reels_views,
            avatar_url: model.avatar_url,
            bio_links: model.bio_links,
            source: model.source,
            scrape_status: model.scrape_status.parse().unwrap_or_default(),
            scraped_at: model.scraped_at,
            ai_insights: model.ai_insights,
            ai_confidence: model.ai_confidence,
            ai_analyzed_at: model.ai_analyzed_at,
            embedding: model
                .embedding
                .and_then(|j| serde_json::from_value(j).ok()),
            created_at: model.created_at,
        }
    }
}

fn post_to_domain(model: post_entity::Model) -> ScrapedPost {
    ScrapedPost {
        platform_id: model.platform_id,
        media_type: model.media_type,
        product_type: model.product_type,
        caption_text: model.caption_text,
        hashtags: serde_json::from_value(model.hashtags).unwrap_or_default(),
        mentions: serde_json::from_value(model.mentions).unwrap_or_default(),
        has_sponsor_tag: model.has_sponsor_tag,
        sponsor_brands: serde_json::from_value(model.sponsor_brands).unwrap_or_default(),
        like_count: model.like_count,
        comment_count: model.comment_count,
        play_count: model.play_count,
        thumbnail_url: model.thumbnail_url,
        title: model.title,
        comments_disabled: model.comments_disabled,
        top_comments: Vec::new(),
        taken_at: model.taken_at.to_utc(),
    }
}

fn highlight_to_domain(model: highlight_entity::Model) -> ScrapedHighlight {
    ScrapedHighlight {
        platform_id: model.platform_id,
        title: model.title,
        media_count: model.media_count,
        cover_url: model.cover_url,
        story_mentions: serde_json::from_value(model.story_mentions).unwrap_or_default(),
        story_links: serde_json::from_value(model.story_links).unwrap_or_default(),
        story_locations: serde_json::from_value(model.story_locations).unwrap_or_default(),
    }
}

#[async_trait]
impl BlogRepository for BlogRepositoryImpl {
    async fn find_or_create(
        &self,
        platform: &str,
        username: &str,
    ) -> Result<Blog, RepositoryError> {
        let existing = blog_entity::Entity::find()
            .filter(blog_entity::Column::Platform.eq(platform))
            .filter(blog_entity::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?;
        if let Some(model) = existing {
            return Ok(model.into());
        }

        let person = person_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            full_name: Set(username.to_string()),
            created_at: Set(Utc::now().into()),
        };
        let person = person.insert(self.db.as_ref()).await?;

        let blog = blog_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            person_id: Set(Some(person.id)),
            platform: Set(platform.to_string()),
            username: Set(username.to_string()),
            scrape_status: Set(ScrapeStatus::Pending.to_string()),
            source: Set(Some("api".to_string())),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        match blog.insert(self.db.as_ref()).await {
            Ok(model) => Ok(model.into()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // 并发请求抢先创建了同名 blog，回收孤儿 person 后复查
                self.cleanup_orphan_person(person.id).await;
                let model = blog_entity::Entity::find()
                    .filter(blog_entity::Column::Platform.eq(platform))
                    .filter(blog_entity::Column::Username.eq(username))
                    .one(self.db.as_ref())
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                debug!("Lost blog insert race for @{}, reusing {}", username, model.id);
                Ok(model.into())
            }
            Err(e) => {
                self.cleanup_orphan_person(person.id).await;
                Err(e.into())
            }
        }
    }

    async fn find_by_id(&self, blog_id: Uuid) -> Result<Option<Blog>, RepositoryError> {
        let model = blog_entity::Entity::find_by_id(blog_id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_usernames(
        &self,
        platform: &str,
        usernames: &[String],
    ) -> Result<Vec<Blog>, RepositoryError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        let models = blog_entity::Entity::find()
            .filter(blog_entity::Column::Platform.eq(platform))
            .filter(blog_entity::Column::Username.is_in(usernames.iter().cloned()))
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Blog::from).collect())
    }

    async fn create_discovered(
        &self,
        platform: &str,
        profile: &DiscoveredProfile,
        source: &str,
    ) -> Result<Blog, RepositoryError> {
        let person = person_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            full_name: Set(if profile.full_name.is_empty() {
                profile.username.clone()
            } else {
                profile.full_name.clone()
            }),
            created_at: Set(Utc::now().into()),
        };
        let person = person.insert(self.db.as_ref()).await?;

        let blog = blog_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            person_id: Set(Some(person.id)),
            platform: Set(platform.to_string()),
            username: Set(profile.username.clone()),
            platform_id: Set(Some(profile.platform_id.clone())),
            bio: Set(Some(profile.biography.clone())),
            followers_count: Set(profile.follower_count),
            media_count: Set(profile.media_count),
            is_verified: Set(profile.is_verified),
            is_business: Set(profile.is_business),
            scrape_status: Set(ScrapeStatus::Pending.to_string()),
            source: Set(Some(source.to_string())),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        match blog.insert(self.db.as_ref()).await {
            Ok(model) => Ok(model.into()),
            Err(e) => {
                self.cleanup_orphan_person(person.id).await;
                Err(e.into())
            }
        }
    }

    async fn set_scrape_status(
        &self,
        blog_id: Uuid,
        status: ScrapeStatus,
    ) -> Result<(), RepositoryError> {
        let model = blog_entity::Entity::find_by_id(blog_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let mut active: blog_entity::ActiveModel = model.into();
        active.scrape_status = Set(status.to_string());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn apply_scrape(
        &self,
        blog_id: Uuid,
        update: &BlogScrapeUpdate,
    ) -> Result<(), RepositoryError> {
        let model = blog_entity::Entity::find_by_id(blog_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: blog_entity::ActiveModel = model.into();
        if let Some(platform_id) = &update.platform_id {
            active.platform_id = Set(Some(platform_id.clone()));
        }
        active.bio = Set(update.bio.clone());
        active.followers_count = Set(update.followers_count);
        active.following_count = Set(update.following_count);
        active.media_count = Set(update.media_count);
        active.is_verified = Set(update.is_verified);
        active.is_business = Set(update.is_business);
        active.er = Set(update.er);
        active.er_reels = Set(update.er_reels);
        active.er_trend = Set(update.er_trend.clone());
        active.posts_per_week = Set(update.posts_per_week);
        active.avg_reels_views = Set(update.avg_reels_views);
        if let Some(avatar_url) = &update.avatar_url {
            active.avatar_url = Set(Some(avatar_url.clone()));
        }
        active.bio_links = Set(update.bio_links.clone());
        active.scraped_at = Set(Some(Utc::now().into()));
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn update_person_name(
        &self,
        person_id: Uuid,
        full_name: &str,
    ) -> Result<(), RepositoryError> {
        let model = person_entity::Entity::find_by_id(person_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let mut active: person_entity::ActiveModel = model.into();
        active.full_name = Set(full_name.to_string());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn upsert_posts(
        &self,
        blog_id: Uuid,
        posts: &[ScrapedPost],
    ) -> Result<(), RepositoryError> {
        if posts.is_empty() {
            return Ok(());
        }

        let models: Vec<post_entity::ActiveModel> = posts
            .iter()
            .map(|p| post_entity::ActiveModel {
                id: Set(Uuid::new_v4()),
                blog_id: Set(blog_id),
                platform_id: Set(p.platform_id.clone()),
                media_type: Set(p.media_type),
                product_type: Set(p.product_type.clone()),
                caption_text: Set(p.caption_text.clone()),
                hashtags: Set(serde_json::json!(p.hashtags)),
                mentions: Set(serde_json::json!(p.mentions)),
                has_sponsor_tag: Set(p.has_sponsor_tag),
                sponsor_brands: Set(serde_json::json!(p.sponsor_brands)),
                like_count: Set(p.like_count),
                comment_count: Set(p.comment_count),
                play_count: Set(p.play_count),
                thumbnail_url: Set(p.thumbnail_url.clone()),
                title: Set(p.title.clone()),
                comments_disabled: Set(p.comments_disabled),
                taken_at: Set(p.taken_at.into()),
            })
            .collect();

        post_entity::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([post_entity::Column::BlogId, post_entity::Column::PlatformId])
                    .update_columns([
                        post_entity::Column::MediaType,
                        post_entity::Column::ProductType,
                        post_entity::Column::CaptionText,
                        post_entity::Column::Hashtags,
                        post_entity::Column::Mentions,
                        post_entity::Column::HasSponsorTag,
                        post_entity::Column::SponsorBrands,
                        post_entity::Column::LikeCount,
                        post_entity::Column::CommentCount,
                        post_entity::Column::PlayCount,
                        post_entity::Column::ThumbnailUrl,
                        post_entity::Column::Title,
                        post_entity::Column::CommentsDisabled,
                        post_entity::Column::TakenAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn upsert_highlights(
        &self,
        blog_id: Uuid,
        highlights: &[ScrapedHighlight],
    ) -> Result<(), RepositoryError> {
        if highlights.is_empty() {
            return Ok(());
        }

        let models: Vec<highlight_entity::ActiveModel> = highlights
            .iter()
            .map(|h| highlight_entity::ActiveModel {
                id: Set(Uuid::new_v4()),
                blog_id: Set(blog_id),
                platform_id: Set(h.platform_id.clone()),
                title: Set(h.title.clone()),
                media_count: Set(h.media_count),
                cover_url: Set(h.cover_url.clone()),
                story_mentions: Set(serde_json::json!(h.story_mentions)),
                story_links: Set(serde_json::json!(h.story_links)),
                story_locations: Set(serde_json::json!(h.story_locations)),
            })
            .collect();

        highlight_entity::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    highlight_entity::Column::BlogId,
                    highlight_entity::Column::PlatformId,
                ])
                .update_columns([
                    highlight_entity::Column::Title,
                    highlight_entity::Column::MediaCount,
                    highlight_entity::Column::CoverUrl,
                    highlight_entity::Column::StoryMentions,
                    highlight_entity::Column::StoryLinks,
                    highlight_entity::Column::StoryLocations,
                ])
                .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn recent_posts(
        &self,
        blog_id: Uuid,
        limit: u64,
    ) -> Result<Vec<ScrapedPost>, RepositoryError> {
        let models = post_entity::Entity::find()
            .filter(post_entity::Column::BlogId.eq(blog_id))
            .order_by_desc(post_entity::Column::TakenAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(post_to_domain).collect())
    }

    async fn highlights(&self, blog_id: Uuid) -> Result<Vec<ScrapedHighlight>, RepositoryError> {
        let models = highlight_entity::Entity::find()
            .filter(highlight_entity::Column::BlogId.eq(blog_id))
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(highlight_to_domain).collect())
    }

    async fn is_fresh(&self, blog_id: Uuid, window: Duration) -> Result<bool, RepositoryError> {
        let threshold = Utc::now() - window;
        let count = blog_entity::Entity::find()
            .filter(blog_entity::Column::Id.eq(blog_id))
            .filter(blog_entity::Column::ScrapedAt.gt(threshold))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn save_insights(
        &self,
        blog_id: Uuid,
        insights: &AIInsights,
    ) -> Result<(), RepositoryError> {
        let model = blog_entity::Entity::find_by_id(blog_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let dump = serde_json::to_value(insights)
            .map_err(|e| RepositoryError::InvalidState(format!("insights serialize: {}", e)))?;

        let mut active: blog_entity::ActiveModel = model.into();
        active.ai_insights = Set(Some(dump));
        active.ai_confidence = Set(Some(insights.confidence as i16));
        active.ai_analyzed_at = Set(Some(Utc::now().into()));
        active.scrape_status = Set(ScrapeStatus::Active.to_string());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn save_refusal(
        &self,
        blog_id: Uuid,
        reason: &str,
        status: ScrapeStatus,
    ) -> Result<(), RepositoryError> {
        let model = blog_entity::Entity::find_by_id(blog_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: blog_entity::ActiveModel = model.into();
        active.ai_insights = Set(Some(serde_json::json!({ "refusal_reason": reason })));
        active.ai_analyzed_at = Set(Some(Utc::now().into()));
        active.scrape_status = Set(status.to_string());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn save_embedding(&self, blog_id: Uuid, vector: &[f32]) -> Result<(), RepositoryError> {
        let model = blog_entity::Entity::find_by_id(blog_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: blog_entity::ActiveModel = model.into();
        active.embedding = Set(Some(serde_json::json!(vector)));
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn missing_embeddings(&self, limit: u64) -> Result<Vec<Blog>, RepositoryError> {
        let models = blog_entity::Entity::find()
            .filter(blog_entity::Column::AiInsights.is_not_null())
            .filter(blog_entity::Column::Embedding.is_null())
            .filter(blog_entity::Column::ScrapeStatus.ne(ScrapeStatus::AiRefused.to_string()))
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Blog::from).collect())
    }

    async fn stale_for_rescrape(
        &self,
        window: Duration,
        limit: u64,
    ) -> Result<Vec<Uuid>, RepositoryError> {
        let threshold = Utc::now() - window;
        let models = blog_entity::Entity::find()
            .filter(blog_entity::Column::ScrapeStatus.eq(ScrapeStatus::Active.to_string()))
            .filter(
                Condition::any()
                    .add(blog_entity::Column::ScrapedAt.is_null())
                    .add(blog_entity::Column::ScrapedAt.lt(threshold)),
            )
            .order_by_desc(blog_entity::Column::FollowersCount)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(|m| m.id).collect())
    }

    async fn all_ids(&self) -> Result<Vec<Uuid>, RepositoryError> {
        let models = blog_entity::Entity::find().all(self.db.as_ref()).await?;
        Ok(models.into_iter().map(|m| m.id).collect())
    }
}
