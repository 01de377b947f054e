// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "blogs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub person_id: Option<Uuid>,
    pub platform: String,
    pub username: String,
    pub platform_id: Option<String>,
    pub bio: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub media_count: i32,
    pub is_verified: bool,
    pub is_business: bool,
    pub er: Option<f64>,
    pub er_reels: Option<f64>,
    pub er_trend: Option<String>,
    pub posts_per_week: Option<f64>,
    pub avg_reels_views: Option<i64>,
    pub avatar_url: Option<String>,
    pub bio_links: Option<Json>,
    pub source: Option<String>,
    pub scrape_status: String,
    pub scraped_at: Option<ChronoDateTimeWithTimeZone>,
    pub ai_insights: Option<Json>,
    pub ai_confidence: Option<i16>,
    pub ai_analyzed_at: Option<ChronoDateTimeWithTimeZone>,
    pub embedding: Option<Json>,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
