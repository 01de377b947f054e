// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{
    BioLink, DiscoveredProfile, ScrapedComment, ScrapedHighlight, ScrapedPost, ScrapedProfile,
};
use crate::domain::services::metrics;
use crate::engines::traits::{ScrapeError, ScraperEngine};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const HIKER_API_URL: &str = "https://api.hikerapi.com";

/// 请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// discover 候选上限（逐个拉取用户资料，控制调用开销）
const DISCOVER_CANDIDATES: usize = 20;

/// HikerAPI 抓取引擎配置
#[derive(Debug, Clone)]
pub struct HikerConfig {
    /// API 访问令牌
    pub token: String,
    /// 拉取的精选故事数量
    pub highlights_to_fetch: usize,
    /// 每个帖子拉取的评论数
    pub comments_to_fetch: usize,
    /// 拉取评论的帖子数
    pub posts_with_comments: usize,
}

/// HikerAPI 抓取引擎
///
/// SaaS 后端：无本地账号池，按请求计费。
/// HTTP 402 意味着余额耗尽，重试只会白烧预算
pub struct HikerEngine {
    http: reqwest::Client,
    config: HikerConfig,
    base_url: String,
}

impl HikerEngine {
    /// 创建新的 HikerAPI 引擎实例
    pub fn new(config: HikerConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            config,
            base_url: HIKER_API_URL.to_string(),
        }
    }

    /// 覆盖 API 地址（测试用）
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// 执行 GET 请求并映射 HTTP 状态到错误类型
    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ScrapeError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .header("x-access-key", &self.config.token)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    ScrapeError::Transient(format!("{}: {}", path, e))
                } else {
                    ScrapeError::Other(format!("{}: {}", path, e))
                }
            })?;

        let status = response.status();
        if status.as_u16() == 402 {
            let detail = response.text().await.unwrap_or_default();
            return Err(ScrapeError::InsufficientBalance(format!(
                "HikerAPI HTTP 402: {}",
                detail
            )));
        }
        if status.as_u16() == 429 {
            return Err(ScrapeError::RateLimited("HikerAPI HTTP 429".to_string()));
        }
        if status.is_server_error() {
            return Err(ScrapeError::Transient(format!(
                "HikerAPI HTTP {}",
                status.as_u16()
            )));
        }
        if status.as_u16() == 404 {
            return Err(ScrapeError::UserNotFound);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Other(format!(
                "HikerAPI HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ScrapeError::Other(format!("{}: invalid JSON: {}", path, e)))
    }

    async fn fetch_highlights(&self, user_id: &str) -> Vec<ScrapedHighlight> {
        let amount = self.config.highlights_to_fetch.to_string();
        let raw = match self
            .get_json(
                "/v1/user/highlights",
                &[("user_id", user_id), ("amount", &amount)],
            )
            .await
        {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to fetch highlights for {}: {}", user_id, e);
                return Vec::new();
            }
        };

        let list = raw.as_array().cloned().unwrap_or_default();
        let mut highlights = Vec::new();
        for hl in list.iter().take(self.config.highlights_to_fetch) {
            let pk = json_str(hl, "pk");
            // highlight 详情接口的 pk 不带 "highlight:" 前缀
            let pk_clean = pk.replace("highlight:", "");
            match self
                .get_json("/v2/highlight/by/id", &[("id", &pk_clean)])
                .await
            {
                Ok(detail) => {
                    let items = extract_highlight_items(&detail);
                    highlights.push(map_highlight(hl, &items));
                }
                Err(e) => {
                    warn!("Failed to fetch highlight {}: {}", pk, e);
                    highlights.push(map_highlight(hl, &[]));
                }
            }
        }
        highlights
    }

    async fn fetch_comments(&self, posts: &mut [ScrapedPost]) {
        let targets: Vec<usize> = posts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.comments_disabled && p.comment_count > 0)
            .map(|(i, _)| i)
            .take(self.config.posts_with_comments)
            .collect();

        for index in targets {
            let media_id = posts[index].platform_id.clone();
            match self
                .get_json("/v1/media/comments/chunk", &[("media_id", &media_id)])
                .await
            {
                Ok(raw) => {
                    let comments: Vec<ScrapedComment> = raw
                        .as_array()
                        .map(|arr| {
                            arr.iter()
                                .filter_map(|c| {
                                    let text = json_str(c, "text");
                                    let username = c
                                        .get("user")
                                        .map(|u| json_str(u, "username"))
                                        .unwrap_or_default();
                                    if text.trim().is_empty() || username.is_empty() {
                                        None
                                    } else {
                                        Some(ScrapedComment {
                                            username,
                                            text: text.trim().to_string(),
                                        })
                                    }
                                })
                                .take(self.config.comments_to_fetch)
                                .collect()
                        })
                        .unwrap_or_default();
                    posts[index].top_comments = comments;
                }
                Err(e) => {
                    warn!("Failed to fetch comments for {}: {}", media_id, e);
                }
            }
        }
    }
}

#[async_trait]
impl ScraperEngine for HikerEngine {
    async fn scrape_profile(&self, username: &str) -> Result<ScrapedProfile, ScrapeError> {
        info!("[hikerapi] Scraping profile @{}", username);

        let response = self
            .get_json("/v2/user/by/username", &[("username", username)])
            .await?;
        let user = response.get("user").cloned().unwrap_or(Value::Null);

        if user.is_null() || json_str(&user, "pk").is_empty() {
            return Err(ScrapeError::UserNotFound);
        }
        if user.get("is_private").and_then(Value::as_bool).unwrap_or(false) {
            return Err(ScrapeError::PrivateAccount);
        }

        let user_id = json_str(&user, "pk");

        // 媒体分页接口返回 [medias, next_cursor]
        let medias_raw = self
            .get_json("/v1/user/medias/chunk", &[("user_id", &user_id)])
            .await?;
        let raw_list: Vec<Value> = match medias_raw.as_array() {
            Some(arr) => match arr.first() {
                Some(Value::Array(inner)) => inner.clone(),
                _ => arr.clone(),
            },
            None => Vec::new(),
        };

        let mut medias: Vec<ScrapedPost> = raw_list.iter().map(map_media).collect();

        let highlights = self.fetch_highlights(&user_id).await;
        self.fetch_comments(&mut medias).await;

        let follower_count = user
            .get("follower_count")
            .and_then(Value::as_i64)
            .unwrap_or(0);

        let reels: Vec<ScrapedPost> = medias
            .iter()
            .filter(|p| p.media_type == 2 && p.product_type.as_deref() == Some("clips"))
            .cloned()
            .collect();

        let bio_links = user
            .get("bio_links")
            .and_then(Value::as_array)
            .map(|links| {
                links
                    .iter()
                    .filter_map(|l| {
                        let url = json_str(l, "url");
                        if url.is_empty() {
                            return None;
                        }
                        let title = json_str(l, "title");
                        Some(BioLink {
                            url,
                            title: if title.is_empty() { None } else { Some(title) },
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let profile = ScrapedProfile {
            platform_id: user_id,
            username: {
                let name = json_str(&user, "username");
                if name.is_empty() {
                    username.to_string()
                } else {
                    name
                }
            },
            full_name: json_str(&user, "full_name"),
            biography: json_str(&user, "biography"),
            external_url: opt_str(&user, "external_url"),
            bio_links,
            follower_count,
            following_count: user
                .get("following_count")
                .and_then(Value::as_i64)
                .unwrap_or(0),
            media_count: user
                .get("media_count")
                .and_then(Value::as_i64)
                .unwrap_or(0) as i32,
            is_verified: user
                .get("is_verified")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            is_business: user
                .get("is_business")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            profile_pic_url: opt_str(&user, "profile_pic_url"),
            avg_er: metrics::median_er(&medias, follower_count),
            avg_er_reels: metrics::median_er(&reels, follower_count),
            er_trend: metrics::er_trend(&medias, follower_count),
            posts_per_week: metrics::posts_per_week(&medias),
            medias,
            highlights,
        };

        info!(
            "[hikerapi] Scraped @{}: {} publications, {} highlights, ER={:?}",
            profile.username,
            profile.medias.len(),
            profile.highlights.len(),
            profile.avg_er
        );
        Ok(profile)
    }

    async fn discover(
        &self,
        hashtag: &str,
        _min_followers: i64,
    ) -> Result<Vec<DiscoveredProfile>, ScrapeError> {
        info!("[hikerapi] Discover #{}", hashtag);

        let raw = self
            .get_json("/v1/hashtag/medias/top", &[("name", hashtag)])
            .await?;

        // 去重收集作者 username，再逐个拉详情（榜单媒体不带 follower_count）
        let mut usernames: Vec<String> = Vec::new();
        if let Some(arr) = raw.as_array() {
            for media in arr {
                let username = media
                    .get("user")
                    .map(|u| json_str(u, "username"))
                    .unwrap_or_default();
                if !username.is_empty() && !usernames.contains(&username) {
                    usernames.push(username);
                }
                if usernames.len() >= DISCOVER_CANDIDATES {
                    break;
                }
            }
        }

        let mut discovered = Vec::new();
        for username in usernames {
            match self
                .get_json("/v2/user/by/username", &[("username", &username)])
                .await
            {
                Ok(response) => {
                    let user = response.get("user").cloned().unwrap_or(Value::Null);
                    if user.is_null() || json_str(&user, "pk").is_empty() {
                        continue;
                    }
                    discovered.push(DiscoveredProfile {
                        username: json_str(&user, "username"),
                        full_name: json_str(&user, "full_name"),
                        platform_id: json_str(&user, "pk"),
                        follower_count: user
                            .get("follower_count")
                            .and_then(Value::as_i64)
                            .unwrap_or(0),
                        media_count: user
                            .get("media_count")
                            .and_then(Value::as_i64)
                            .unwrap_or(0) as i32,
                        is_private: user
                            .get("is_private")
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                        is_verified: user
                            .get("is_verified")
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                        is_business: user
                            .get("is_business")
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                        biography: json_str(&user, "biography"),
                    });
                }
                Err(ScrapeError::InsufficientBalance(msg)) => {
                    return Err(ScrapeError::InsufficientBalance(msg));
                }
                Err(e) => {
                    debug!("Skipping candidate @{}: {}", username, e);
                }
            }
        }

        info!("[hikerapi] Discover #{}: {} candidates", hashtag, discovered.len());
        Ok(discovered)
    }

    fn name(&self) -> &'static str {
        "hikerapi"
    }
}

/// 读取字符串字段；数值 pk 也转成字符串
fn json_str(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn opt_str(value: &Value, key: &str) -> Option<String> {
    let s = json_str(value, key);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// HikerAPI media dict → ScrapedPost
fn map_media(media: &Value) -> ScrapedPost {
    let caption = json_str(media, "caption_text");

    let sponsor_brands: Vec<String> = media
        .get("sponsor_tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .map(|t| json_str(t, "username"))
                .filter(|u| !u.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let thumbnail_url = extract_thumbnail_url(media);

    let taken_at = match media.get("taken_at") {
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now),
        Some(Value::String(s)) => s
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
        _ => Utc::now(),
    };

    ScrapedPost {
        platform_id: json_str(media, "pk"),
        media_type: media
            .get("media_type")
            .and_then(Value::as_i64)
            .unwrap_or(1) as i16,
        product_type: opt_str(media, "product_type"),
        hashtags: metrics::extract_hashtags(&caption),
        mentions: metrics::extract_mentions(&caption),
        has_sponsor_tag: !sponsor_brands.is_empty(),
        sponsor_brands,
        like_count: media.get("like_count").and_then(Value::as_i64).unwrap_or(0),
        comment_count: media
            .get("comment_count")
            .and_then(Value::as_i64)
            .unwrap_or(0),
        play_count: media.get("play_count").and_then(Value::as_i64),
        thumbnail_url,
        title: opt_str(media, "title"),
        comments_disabled: media
            .get("comments_disabled")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        top_comments: Vec::new(),
        caption_text: caption,
        taken_at,
    }
}

/// 选取缩略图 URL，回退到 image_versions2 候选
fn extract_thumbnail_url(media: &Value) -> Option<String> {
    if let Some(url) = opt_str(media, "thumbnail_url") {
        return Some(url);
    }

    media
        .get("image_versions2")
        .and_then(|iv| iv.get("candidates"))
        .and_then(Value::as_array)
        .and_then(|candidates| {
            candidates.iter().find_map(|c| {
                for key in ["url", "thumbnail_url", "display_url", "src"] {
                    if let Some(url) = opt_str(c, key) {
                        return Some(url);
                    }
                }
                None
            })
        })
}

/// highlight 详情结构：response.reels.{highlight:pk}.items
fn extract_highlight_items(detail: &Value) -> Vec<Value> {
    detail
        .get("response")
        .and_then(|r| r.get("reels"))
        .and_then(Value::as_object)
        .and_then(|reels| reels.values().next())
        .and_then(|reel| reel.get("items"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// HikerAPI highlight dict → ScrapedHighlight
fn map_highlight(highlight: &Value, items: &[Value]) -> ScrapedHighlight {
    let mut story_mentions: Vec<String> = Vec::new();
    let mut story_locations: Vec<String> = Vec::new();
    let mut story_links: Vec<String> = Vec::new();

    for story in items {
        if let Some(mentions) = story.get("mentions").and_then(Value::as_array) {
            for mention in mentions {
                let username = mention
                    .get("user")
                    .map(|u| json_str(u, "username"))
                    .unwrap_or_default();
                if !username.is_empty() && !story_mentions.contains(&username) {
                    story_mentions.push(username);
                }
            }
        }
        if let Some(locations) = story.get("locations").and_then(Value::as_array) {
            for loc in locations {
                let name = loc
                    .get("location")
                    .map(|l| json_str(l, "name"))
                    .unwrap_or_default();
                if !name.is_empty() && !story_locations.contains(&name) {
                    story_locations.push(name);
                }
            }
        }
        if let Some(links) = story.get("links").and_then(Value::as_array) {
            for link in links {
                let url = opt_str(link, "webUri").or_else(|| opt_str(link, "url"));
                if let Some(url) = url {
                    if !story_links.contains(&url) {
                        story_links.push(url);
                    }
                }
            }
        }
    }

    story_mentions.sort();
    story_locations.sort();
    story_links.sort();

    let cover_url = highlight
        .get("cover_media")
        .and_then(|cm| cm.get("cropped_image_version"))
        .and_then(|civ| civ.get("url"))
        .and_then(Value::as_str)
        .map(|s| s.to_string());

    ScrapedHighlight {
        platform_id: json_str(highlight, "pk"),
        title: json_str(highlight, "title"),
        media_count: highlight
            .get("media_count")
            .and_then(Value::as_i64)
            .unwrap_or(0) as i32,
        cover_url,
        story_mentions,
        story_links,
        story_locations,
    }
}
