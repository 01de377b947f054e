// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{ErTrend, ScrapedPost};
use once_cell::sync::Lazy;
use regex::Regex;

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[а-яА-ЯёЁa-zA-Z0-9_]+").expect("hashtag regex"));

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[a-zA-Z0-9_]+(?:\.[a-zA-Z0-9_]+)*").expect("mention regex"));

/// 互动率（ER）
///
/// ER = median(likes + comments) / followers * 100。
/// 中位数而不是平均值：剔除爆款帖的离群影响
pub fn median_er(posts: &[ScrapedPost], follower_count: i64) -> Option<f64> {
    if posts.is_empty() || follower_count <= 0 {
        return None;
    }

    let mut engagements: Vec<i64> = posts
        .iter()
        .map(|p| p.like_count + p.comment_count)
        .collect();
    engagements.sort_unstable();

    let mid = engagements.len() / 2;
    let median = if engagements.len() % 2 == 0 {
        (engagements[mid - 1] + engagements[mid]) as f64 / 2.0
    } else {
        engagements[mid] as f64
    };

    Some(round2(median / follower_count as f64 * 100.0))
}

/// 互动率趋势
///
/// 新旧两半各算 ER，相对变化超过 ±20% 判定为 growing/declining。
/// 少于 4 个帖子不判定
pub fn er_trend(posts: &[ScrapedPost], follower_count: i64) -> Option<ErTrend> {
    if posts.len() < 4 || follower_count <= 0 {
        return None;
    }

    let mut sorted: Vec<&ScrapedPost> = posts.iter().collect();
    sorted.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));

    let mid = sorted.len() / 2;
    let newer: Vec<ScrapedPost> = sorted[..mid].iter().map(|p| (*p).clone()).collect();
    let older: Vec<ScrapedPost> = sorted[mid..].iter().map(|p| (*p).clone()).collect();

    let er_newer = median_er(&newer, follower_count)?;
    let er_older = median_er(&older, follower_count)?;
    if er_older == 0.0 {
        return None;
    }

    let change = (er_newer - er_older) / er_older;
    if change > 0.2 {
        Some(ErTrend::Growing)
    } else if change < -0.2 {
        Some(ErTrend::Declining)
    } else {
        Some(ErTrend::Stable)
    }
}

/// 每周发帖频率
///
/// 帖子数 / 首尾帖时间跨度（周）。少于 2 个帖子或同一时刻不计算
pub fn posts_per_week(posts: &[ScrapedPost]) -> Option<f64> {
    if posts.len() < 2 {
        return None;
    }

    let mut sorted: Vec<&ScrapedPost> = posts.iter().collect();
    sorted.sort_by(|a, b| a.taken_at.cmp(&b.taken_at));

    let first = sorted.first()?.taken_at;
    let last = sorted.last()?.taken_at;
    let days = (last - first).num_seconds() as f64 / 86400.0;
    if days == 0.0 {
        return None;
    }

    Some(round2(posts.len() as f64 / (days / 7.0)))
}

/// Reels 平均播放量
///
/// product_type = clips 且有 play_count 的帖子求均值
pub fn avg_reels_views(posts: &[ScrapedPost]) -> Option<i64> {
    let views: Vec<i64> = posts
        .iter()
        .filter(|p| p.product_type.as_deref() == Some("clips"))
        .filter_map(|p| p.play_count)
        .collect();

    if views.is_empty() {
        return None;
    }
    Some(views.iter().sum::<i64>() / views.len() as i64)
}

/// 从文案提取话题标签（支持西里尔字母）
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// 从文案提取 @提及
///
/// 点号只允许出现在单词字符之间，不能收尾
pub fn extract_mentions(text: &str) -> Vec<String> {
    MENTION_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
