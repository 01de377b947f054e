// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::task_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 分类记录
///
/// 顶级分类携带机器码 code；子分类只有人类可读名
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: Uuid,
    pub code: Option<String>,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// 标签记录
#[derive(Debug, Clone)]
pub struct TagRow {
    pub id: Uuid,
    pub name: String,
    pub group: String,
}

/// 待写入的博主分类关联
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAssignment {
    pub category_id: Uuid,
    pub is_primary: bool,
}

/// 分类/标签仓库特质
#[async_trait]
pub trait TaxonomyRepository: Send + Sync {
    /// 加载全部分类
    async fn load_categories(&self) -> Result<Vec<CategoryRow>, RepositoryError>;

    /// 加载 active 状态的标签
    async fn load_active_tags(&self) -> Result<Vec<TagRow>, RepositoryError>;

    /// 整体替换博主的分类关联（delete + 批量 insert）
    async fn replace_blog_categories(
        &self,
        blog_id: Uuid,
        rows: &[CategoryAssignment],
    ) -> Result<(), RepositoryError>;

    /// 整体替换博主的标签关联
    async fn replace_blog_tags(
        &self,
        blog_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<(), RepositoryError>;
}
