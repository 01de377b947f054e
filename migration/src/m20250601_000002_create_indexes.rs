// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

/// 查询索引与任务唯一性约束迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 队列轮询路径: status + next_retry_at + 排序字段
        manager
            .create_index(
                Index::create()
                    .name("idx_scrape_tasks_status_priority")
                    .table(ScrapeTasks::Table)
                    .col(ScrapeTasks::Status)
                    .col(ScrapeTasks::Priority)
                    .col(ScrapeTasks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scrape_tasks_blog_type")
                    .table(ScrapeTasks::Table)
                    .col(ScrapeTasks::BlogId)
                    .col(ScrapeTasks::TaskType)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_blogs_scrape_status")
                    .table(Blogs::Table)
                    .col(Blogs::ScrapeStatus)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_blog_posts_blog_taken")
                    .table(BlogPosts::Table)
                    .col(BlogPosts::BlogId)
                    .col(BlogPosts::TakenAt)
                    .to_owned(),
            )
            .await?;

        // 非终态任务 (blog_id, task_type) 部分唯一索引。
        // create_if_absent 在事务内做条件插入，该索引兜底并发窗口。
        // sea-query 不支持部分索引，Postgres 下用原生 SQL。
        if manager.get_database_backend() == DbBackend::Postgres {
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS uq_scrape_tasks_open \
                     ON scrape_tasks (blog_id, task_type) \
                     WHERE status IN ('pending', 'running') AND blog_id IS NOT NULL",
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() == DbBackend::Postgres {
            manager
                .get_connection()
                .execute_unprepared("DROP INDEX IF EXISTS uq_scrape_tasks_open")
                .await?;
        }

        manager
            .drop_index(
                Index::drop()
                    .name("idx_blog_posts_blog_taken")
                    .table(BlogPosts::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_blogs_scrape_status")
                    .table(Blogs::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_scrape_tasks_blog_type")
                    .table(ScrapeTasks::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_scrape_tasks_status_priority")
                    .table(ScrapeTasks::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapeTasks {
    Table,
    BlogId,
    TaskType,
    Status,
    Priority,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Blogs {
    Table,
    ScrapeStatus,
}

#[derive(DeriveIden)]
enum BlogPosts {
    Table,
    BlogId,
    TakenAt,
}
