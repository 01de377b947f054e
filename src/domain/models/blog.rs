// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 博主实体
///
/// blogs 表的领域表示，聚合资料、互动指标与 AI 分析结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    /// 博主唯一标识符
    pub id: Uuid,
    /// 关联的 persons 记录
    pub person_id: Option<Uuid>,
    /// 平台标识（instagram）
    pub platform: String,
    /// 平台用户名（小写、去 @）
    pub username: String,
    /// 平台内部ID
    pub platform_id: Option<String>,
    /// 个人简介
    pub bio: Option<String>,
    /// 粉丝数
    pub followers_count: i64,
    /// 关注数
    pub following_count: i64,
    /// 发布内容总数
    pub media_count: i32,
    /// 平台认证标记
    pub is_verified: bool,
    /// 商业账号标记
    pub is_business: bool,
    /// 互动率（近期帖子中位数）
    pub er: Option<f64>,
    /// Reels 互动率
    pub er_reels: Option<f64>,
    /// 互动率趋势
    pub er_trend: Option<String>,
    /// 每周发帖频率
    pub posts_per_week: Option<f64>,
    /// Reels 平均播放量
    pub avg_reels_views: Option<i64>,
    /// 头像URL（持久化存储后的地址）
    pub avatar_url: Option<String>,
    /// 简介中的外链列表
    pub bio_links: Option<serde_json::Value>,
    /// 记录来源（api、hashtag_search）
    pub source: Option<String>,
    /// 抓取生命周期状态
    pub scrape_status: ScrapeStatus,
    /// 最近一次抓取时间
    pub scraped_at: Option<DateTime<FixedOffset>>,
    /// AI 分析结果
    pub ai_insights: Option<serde_json::Value>,
    /// AI 分析置信度（1..5 整数）
    pub ai_confidence: Option<i16>,
    /// AI 分析完成时间
    pub ai_analyzed_at: Option<DateTime<FixedOffset>>,
    /// 语义检索向量（1536 维）
    pub embedding: Option<Vec<f32>>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 博主抓取生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    /// 等待首次抓取
    #[default]
    Pending,
    /// 抓取进行中
    Scraping,
    /// 抓取完成，等待 AI 分析
    Analyzing,
    /// 分析完成，数据可用
    Active,
    /// 私密账号
    Private,
    /// 账号已删除或不存在
    Deleted,
    /// AI 拒绝分析（等待纯文本重试）
    AiRefused,
    /// AI 流程结束但无完整结果
    AiAnalyzed,
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScrapeStatus::Pending => write!(f, "pending"),
            ScrapeStatus::Scraping => write!(f, "scraping"),
            ScrapeStatus::Analyzing => write!(f, "analyzing"),
            ScrapeStatus::Active => write!(f, "active"),
            ScrapeStatus::Private => write!(f, "private"),
            ScrapeStatus::Deleted => write!(f, "deleted"),
            ScrapeStatus::AiRefused => write!(f, "ai_refused"),
            ScrapeStatus::AiAnalyzed => write!(f, "ai_analyzed"),
        }
    }
}

impl FromStr for ScrapeStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScrapeStatus::Pending),
            "scraping" => Ok(ScrapeStatus::Scraping),
            "analyzing" => Ok(ScrapeStatus::Analyzing),
            "active" => Ok(ScrapeStatus::Active),
            "private" => Ok(ScrapeStatus::Private),
            "deleted" => Ok(ScrapeStatus::Deleted),
            "ai_refused" => Ok(ScrapeStatus::AiRefused),
            "ai_analyzed" => Ok(ScrapeStatus::AiAnalyzed),
            _ => Err(()),
        }
    }
}

/// 抓取成功后写入 blogs 的字段集合
///
/// 由 full_scrape 处理器根据 ScrapedProfile 构建，一次性落库
#[derive(Debug, Clone, Default)]
pub struct BlogScrapeUpdate {
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
    pub bio_links: Option<serde_json::Value>,
}
