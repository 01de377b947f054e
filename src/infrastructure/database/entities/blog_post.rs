// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "blog_posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub blog_id: Uuid,
    pub platform_id: String,
    pub media_type: i16,
    pub product_type: Option<String>,
    pub caption_text: String,
    pub hashtags: Json,
    pub mentions: Json,
    pub has_sponsor_tag: bool,
    pub sponsor_brands: Json,
    pub like_count: i64,
    pub comment_count: i64,
    pub play_count: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub title: Option<String>,
    pub comments_disabled: bool,
    pub taken_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
