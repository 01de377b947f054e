// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::task_repository::RepositoryError;
use crate::domain::repositories::taxonomy_repository::{
    CategoryAssignment, CategoryRow, TagRow, TaxonomyRepository,
};
use crate::infrastructure::database::entities::{
    blog_category as blog_category_entity, blog_tag as blog_tag_entity,
    category as category_entity, tag as tag_entity,
};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 分类/标签仓库实现
///
/// 关联表替换用 delete + insert：部分唯一约束下 upsert 改写
/// is_primary 会失败，整体替换语义也更直观
#[derive(Clone)]
pub struct TaxonomyRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl TaxonomyRepositoryImpl {
    /// 创建新的分类/标签仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaxonomyRepository for TaxonomyRepositoryImpl {
    async fn load_categories(&self) -> Result<Vec<CategoryRow>, RepositoryError> {
        let models = category_entity::Entity::find().all(self.db.as_ref()).await?;
        Ok(models
            .into_iter()
            .map(|m| CategoryRow {
                id: m.id,
                code: m.code,
                name: m.name,
                parent_id: m.parent_id,
            })
            .collect())
    }

    async fn load_active_tags(&self) -> Result<Vec<TagRow>, RepositoryError> {
        let models = tag_entity::Entity::find()
            .filter(tag_entity::Column::Status.eq("active"))
            .all(self.db.as_ref())
            .await?;
        Ok(models
            .into_iter()
            .map(|m| TagRow {
                id: m.id,
                name: m.name,
                group: m.group,
            })
            .collect())
    }

    async fn replace_blog_categories(
        &self,
        blog_id: Uuid,
        rows: &[CategoryAssignment],
    ) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        blog_category_entity::Entity::delete_many()
            .filter(blog_category_entity::Column::BlogId.eq(blog_id))
            .exec(&txn)
            .await?;

        for row in rows {
            let active = blog_category_entity::ActiveModel {
                blog_id: Set(blog_id),
                category_id: Set(row.category_id),
                is_primary: Set(row.is_primary),
            };
            active.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    async fn replace_blog_tags(
        &self,
        blog_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        blog_tag_entity::Entity::delete_many()
            .filter(blog_tag_entity::Column::BlogId.eq(blog_id))
            .exec(&txn)
            .await?;

        for tag_id in tag_ids {
            let active = blog_tag_entity::ActiveModel {
                blog_id: Set(blog_id),
                tag_id: Set(*tag_id),
            };
            active.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }
}
