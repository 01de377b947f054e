// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 帖子评论
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedComment {
    pub username: String,
    pub text: String,
}

/// 帖子或 Reels
///
/// 抓取引擎产出的规范化帖子结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPost {
    /// 平台内部ID
    pub platform_id: String,
    /// 媒体类型：1=图片，2=视频，8=轮播
    pub media_type: i16,
    /// 产品类型：feed、clips、igtv
    pub product_type: Option<String>,
    /// 帖子文案
    pub caption_text: String,
    /// 文案中的话题标签
    pub hashtags: Vec<String>,
    /// 文案中的 @提及
    pub mentions: Vec<String>,
    /// 带有赞助标记
    pub has_sponsor_tag: bool,
    /// 赞助品牌的 username
    pub sponsor_brands: Vec<String>,
    pub like_count: i64,
    pub comment_count: i64,
    /// 播放量（仅视频）
    pub play_count: Option<i64>,
    /// 缩略图URL（抓取时为 CDN 临时地址）
    pub thumbnail_url: Option<String>,
    /// Reels/IGTV 标题
    pub title: Option<String>,
    /// 评论被关闭
    pub comments_disabled: bool,
    /// 用于 AI 分析的热门评论
    pub top_comments: Vec<ScrapedComment>,
    /// 发布时间
    pub taken_at: DateTime<Utc>,
}

/// 精选故事（highlight）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedHighlight {
    pub platform_id: String,
    pub title: String,
    pub media_count: i32,
    pub cover_url: Option<String>,
    /// 故事中的 @提及
    pub story_mentions: Vec<String>,
    /// 故事中的外链
    pub story_links: Vec<String>,
    /// 故事中的地点名
    pub story_locations: Vec<String>,
}

/// 简介外链
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BioLink {
    pub url: String,
    pub title: Option<String>,
}

/// 互动率趋势
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErTrend {
    Growing,
    Stable,
    Declining,
}

impl fmt::Display for ErTrend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErTrend::Growing => write!(f, "growing"),
            ErTrend::Stable => write!(f, "stable"),
            ErTrend::Declining => write!(f, "declining"),
        }
    }
}

/// 完整的抓取结果
///
/// 所有抓取后端统一产出该结构；派生指标由 metrics 服务计算后填入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedProfile {
    pub platform_id: String,
    pub username: String,
    pub full_name: String,
    pub biography: String,
    pub external_url: Option<String>,
    pub bio_links: Vec<BioLink>,
    pub follower_count: i64,
    pub following_count: i64,
    pub media_count: i32,
    pub is_verified: bool,
    pub is_business: bool,
    /// 头像URL（CDN 临时地址）
    pub profile_pic_url: Option<String>,
    pub medias: Vec<ScrapedPost>,
    pub highlights: Vec<ScrapedHighlight>,
    /// 互动率（近期帖子中位数，百分比）
    pub avg_er: Option<f64>,
    /// Reels 互动率
    pub avg_er_reels: Option<f64>,
    pub er_trend: Option<ErTrend>,
    pub posts_per_week: Option<f64>,
}

/// discover 搜索返回的候选档案
#[derive(Debug, Clone)]
pub struct DiscoveredProfile {
    pub username: String,
    pub full_name: String,
    pub platform_id: String,
    pub follower_count: i64,
    pub media_count: i32,
    pub is_private: bool,
    pub is_verified: bool,
    pub is_business: bool,
    pub biography: String,
}
