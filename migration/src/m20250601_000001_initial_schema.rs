// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 数据库初始模式迁移
///
/// 创建任务队列、博主、内容、分类标签等所有业务表
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    /// 应用数据库迁移
    ///
    /// # 参数
    ///
    /// * `manager` - 数据库模式管理器
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 迁移成功
    /// * `Err(DbErr)` - 迁移失败
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. persons (无依赖)
        manager
            .create_table(
                Table::create()
                    .table(Persons::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Persons::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Persons::FullName).string().not_null())
                    .col(
                        ColumnDef::new(Persons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 2. blogs (依赖 persons)
        manager
            .create_table(
                Table::create()
                    .table(Blogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Blogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Blogs::PersonId).uuid())
                    .col(ColumnDef::new(Blogs::Platform).string().not_null())
                    .col(ColumnDef::new(Blogs::Username).string().not_null())
                    .col(ColumnDef::new(Blogs::PlatformId).string())
                    .col(ColumnDef::new(Blogs::Bio).text())
                    .col(
                        ColumnDef::new(Blogs::FollowersCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Blogs::FollowingCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Blogs::MediaCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Blogs::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Blogs::IsBusiness)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Blogs::Er).double())
                    .col(ColumnDef::new(Blogs::ErReels).double())
                    .col(ColumnDef::new(Blogs::ErTrend).string())
                    .col(ColumnDef::new(Blogs::PostsPerWeek).double())
                    .col(ColumnDef::new(Blogs::AvgReelsViews).big_integer())
                    .col(ColumnDef::new(Blogs::AvatarUrl).text())
                    .col(ColumnDef::new(Blogs::BioLinks).json())
                    .col(ColumnDef::new(Blogs::Source).string())
                    .col(
                        ColumnDef::new(Blogs::ScrapeStatus)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Blogs::ScrapedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Blogs::AiInsights).json())
                    .col(ColumnDef::new(Blogs::AiConfidence).small_integer())
                    .col(ColumnDef::new(Blogs::AiAnalyzedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Blogs::Embedding).json())
                    .col(
                        ColumnDef::new(Blogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blogs_person_id")
                            .from(Blogs::Table, Blogs::PersonId)
                            .to(Persons::Table, Persons::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // (platform, username) 唯一约束 —— 并发创建依赖该约束兜底
        manager
            .create_index(
                Index::create()
                    .name("uq_blogs_platform_username")
                    .table(Blogs::Table)
                    .col(Blogs::Platform)
                    .col(Blogs::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 3. scrape_tasks (依赖 blogs，blog_id 对 discover 任务可空)
        manager
            .create_table(
                Table::create()
                    .table(ScrapeTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapeTasks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapeTasks::BlogId).uuid())
                    .col(ColumnDef::new(ScrapeTasks::TaskType).string().not_null())
                    .col(
                        ColumnDef::new(ScrapeTasks::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ScrapeTasks::Priority)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(ColumnDef::new(ScrapeTasks::Payload).json().not_null())
                    .col(
                        ColumnDef::new(ScrapeTasks::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapeTasks::MaxAttempts)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(ColumnDef::new(ScrapeTasks::ErrorMessage).text())
                    .col(ColumnDef::new(ScrapeTasks::NextRetryAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScrapeTasks::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScrapeTasks::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ScrapeTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scrape_tasks_blog_id")
                            .from(ScrapeTasks::Table, ScrapeTasks::BlogId)
                            .to(Blogs::Table, Blogs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 4. blog_posts (依赖 blogs)
        manager
            .create_table(
                Table::create()
                    .table(BlogPosts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlogPosts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlogPosts::BlogId).uuid().not_null())
                    .col(ColumnDef::new(BlogPosts::PlatformId).string().not_null())
                    .col(
                        ColumnDef::new(BlogPosts::MediaType)
                            .small_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(BlogPosts::ProductType).string())
                    .col(
                        ColumnDef::new(BlogPosts::CaptionText)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(BlogPosts::Hashtags).json().not_null())
                    .col(ColumnDef::new(BlogPosts::Mentions).json().not_null())
                    .col(
                        ColumnDef::new(BlogPosts::HasSponsorTag)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(BlogPosts::SponsorBrands).json().not_null())
                    .col(
                        ColumnDef::new(BlogPosts::LikeCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BlogPosts::CommentCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(BlogPosts::PlayCount).big_integer())
                    .col(ColumnDef::new(BlogPosts::ThumbnailUrl).text())
                    .col(ColumnDef::new(BlogPosts::Title).string())
                    .col(
                        ColumnDef::new(BlogPosts::CommentsDisabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(BlogPosts::TakenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_posts_blog_id")
                            .from(BlogPosts::Table, BlogPosts::BlogId)
                            .to(Blogs::Table, Blogs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_blog_posts_blog_platform")
                    .table(BlogPosts::Table)
                    .col(BlogPosts::BlogId)
                    .col(BlogPosts::PlatformId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 5. blog_highlights (依赖 blogs)
        manager
            .create_table(
                Table::create()
                    .table(BlogHighlights::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlogHighlights::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlogHighlights::BlogId).uuid().not_null())
                    .col(
                        ColumnDef::new(BlogHighlights::PlatformId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BlogHighlights::Title).string().not_null())
                    .col(
                        ColumnDef::new(BlogHighlights::MediaCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(BlogHighlights::CoverUrl).text())
                    .col(
                        ColumnDef::new(BlogHighlights::StoryMentions)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BlogHighlights::StoryLinks).json().not_null())
                    .col(
                        ColumnDef::new(BlogHighlights::StoryLocations)
                            .json()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_highlights_blog_id")
                            .from(BlogHighlights::Table, BlogHighlights::BlogId)
                            .to(Blogs::Table, Blogs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_blog_highlights_blog_platform")
                    .table(BlogHighlights::Table)
                    .col(BlogHighlights::BlogId)
                    .col(BlogHighlights::PlatformId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 6. categories (parent_id 自引用树)
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Code).string())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::ParentId).uuid())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_parent_id")
                            .from(Categories::Table, Categories::ParentId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 7. tags
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tags::Name).string().not_null())
                    .col(ColumnDef::new(Tags::Group).string().not_null())
                    .col(
                        ColumnDef::new(Tags::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .to_owned(),
            )
            .await?;

        // 8. blog_categories 关联表
        manager
            .create_table(
                Table::create()
                    .table(BlogCategories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BlogCategories::BlogId).uuid().not_null())
                    .col(
                        ColumnDef::new(BlogCategories::CategoryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BlogCategories::IsPrimary)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .primary_key(
                        Index::create()
                            .col(BlogCategories::BlogId)
                            .col(BlogCategories::CategoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_categories_blog_id")
                            .from(BlogCategories::Table, BlogCategories::BlogId)
                            .to(Blogs::Table, Blogs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_categories_category_id")
                            .from(BlogCategories::Table, BlogCategories::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 9. blog_tags 关联表
        manager
            .create_table(
                Table::create()
                    .table(BlogTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BlogTags::BlogId).uuid().not_null())
                    .col(ColumnDef::new(BlogTags::TagId).uuid().not_null())
                    .primary_key(Index::create().col(BlogTags::BlogId).col(BlogTags::TagId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_tags_blog_id")
                            .from(BlogTags::Table, BlogTags::BlogId)
                            .to(Blogs::Table, Blogs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_tags_tag_id")
                            .from(BlogTags::Table, BlogTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    /// 回滚数据库迁移
    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlogTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BlogCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BlogHighlights::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BlogPosts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScrapeTasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Blogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Persons::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Persons {
    Table,
    Id,
    FullName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Blogs {
    Table,
    Id,
    PersonId,
    Platform,
    Username,
    PlatformId,
    Bio,
    FollowersCount,
    FollowingCount,
    MediaCount,
    IsVerified,
    IsBusiness,
    Er,
    ErReels,
    ErTrend,
    PostsPerWeek,
    AvgReelsViews,
    AvatarUrl,
    BioLinks,
    Source,
    ScrapeStatus,
    ScrapedAt,
    AiInsights,
    AiConfidence,
    AiAnalyzedAt,
    Embedding,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ScrapeTasks {
    Table,
    Id,
    BlogId,
    TaskType,
    Status,
    Priority,
    Payload,
    Attempts,
    MaxAttempts,
    ErrorMessage,
    NextRetryAt,
    StartedAt,
    CompletedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BlogPosts {
    Table,
    Id,
    BlogId,
    PlatformId,
    MediaType,
    ProductType,
    CaptionText,
    Hashtags,
    Mentions,
    HasSponsorTag,
    SponsorBrands,
    LikeCount,
    CommentCount,
    PlayCount,
    ThumbnailUrl,
    Title,
    CommentsDisabled,
    TakenAt,
}

#[derive(DeriveIden)]
enum BlogHighlights {
    Table,
    Id,
    BlogId,
    PlatformId,
    Title,
    MediaCount,
    CoverUrl,
    StoryMentions,
    StoryLinks,
    StoryLocations,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Code,
    Name,
    ParentId,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    Name,
    Group,
    Status,
}

#[derive(DeriveIden)]
enum BlogCategories {
    Table,
    BlogId,
    CategoryId,
    IsPrimary,
}

#[derive(DeriveIden)]
enum BlogTags {
    Table,
    BlogId,
    TagId,
}
