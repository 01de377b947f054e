// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::blog::Blog;
use crate::domain::models::profile::{ScrapedHighlight, ScrapedPost};
use std::collections::HashMap;

/// 一个待分析档案的完整上下文
///
/// 由 ai_analysis 提交器从数据库装配；text_only 标记 refusal 重试链
#[derive(Debug, Clone)]
pub struct AnalysisProfile {
    pub blog: Blog,
    pub posts: Vec<ScrapedPost>,
    pub highlights: Vec<ScrapedHighlight>,
    pub text_only: bool,
}

/// 非平凡文案的最小长度（数据质量提示用）
const MEANINGFUL_CAPTION_LEN: usize = 20;

/// 文案截断长度（字符）
const CAPTION_EXCERPT_LEN: usize = 500;

const BASE_PROMPT: &str = "\
Ты — аналитик инфлюенс-маркетинга. Анализируешь Instagram-профили блогеров из СНГ \
(Казахстан, Россия, Узбекистан).

На основе текстов постов, био, хайлайтов и изображений заполни JSON-профиль.

ВАЖНЫЕ ПРАВИЛА:
1. Все текстовые поля (summary, city, profession, topics, brands, interests и т.д.) \
заполняй СТРОГО НА РУССКОМ ЯЗЫКЕ.
2. Поля с фиксированным перечнем значений (page_type, content_tone, lifestyle_level и т.д.) \
заполняй на английском как указано в схеме.
3. Если данных недостаточно для определения поля — ставь null.
4. confidence — целое число от 1 до 5: полнота исходных данных для анализа.

ОПРЕДЕЛЕНИЕ page_type:
- \"blog\" — личный блог конкретного человека (от первого лица, личные фото, лайфстайл)
- \"public\" — тематический паблик/сообщество без привязки к личности
- \"business\" — страница компании, магазина, бренда, салона

ОПРЕДЕЛЕНИЕ primary_categories:
- До 3 кодов категорий из списка ниже, по убыванию значимости. Используй СТРОГО код \
(английский), не русское название. Первый элемент — основная категория.

ОПРЕДЕЛЕНИЕ secondary_topics:
- До 5 подкатегорий из списка ниже (русские названия): [\"Макияж\", \"Уход за кожей\"].

ОПРЕДЕЛЕНИЕ tags:
- Выбирай теги СТРОГО из списка ниже (русские).

ОПРЕДЕЛЕНИЕ engagement_quality:
- \"organic\" — комментарии осмысленные, релевантные контенту
- \"suspicious\" — много однотипных/эмодзи-комментариев, подозрение на накрутку
- \"mixed\" — что-то среднее

ОПРЕДЕЛЕНИЕ has_manager:
- true если в био, контактах или контенте указан менеджер/агентство.
- manager_contact — контакт менеджера если есть.

ОПРЕДЕЛЕНИЕ ambassador_brands:
- Бренды, у которых блогер является амбассадором (долгосрочное сотрудничество).
";

/// 分类/标签词表条目（构建提示词用，与仓库行解耦）
pub struct PromptCategory {
    pub code: String,
    pub name: String,
    pub subcategories: Vec<String>,
}

/// 组装系统提示词：基础指令 + 完整分类/标签词表
pub fn build_system_prompt(
    categories: &[PromptCategory],
    tags_by_group: &[(String, Vec<String>)],
) -> String {
    let mut prompt = String::from(BASE_PROMPT);

    prompt.push_str("\nКАТЕГОРИИ И ПОДКАТЕГОРИИ:\n");
    for category in categories {
        if category.subcategories.is_empty() {
            prompt.push_str(&format!("- {} ({})\n", category.code, category.name));
        } else {
            prompt.push_str(&format!(
                "- {} ({}): {}\n",
                category.code,
                category.name,
                category.subcategories.join(", ")
            ));
        }
    }

    prompt.push_str("\nТЕГИ (выбирай из этого списка):\n");
    for (group, names) in tags_by_group {
        prompt.push_str(&format!("{}: {}\n", group, names.join(", ")));
    }

    prompt
}

/// 组装用户侧文本：资料、派生指标、精选故事、帖子明细、汇总、数据质量提示
pub fn build_user_text(profile: &AnalysisProfile) -> String {
    let blog = &profile.blog;
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!("Username: @{}", blog.username));
    parts.push(format!(
        "Bio: {}",
        blog.bio.clone().unwrap_or_default()
    ));
    if let Some(links) = &blog.bio_links {
        if let Some(arr) = links.as_array() {
            let rendered: Vec<String> = arr
                .iter()
                .filter_map(|l| {
                    let url = l.get("url").and_then(|v| v.as_str())?;
                    match l.get("title").and_then(|v| v.as_str()) {
                        Some(title) if !title.is_empty() => {
                            Some(format!("{} ({})", url, title))
                        }
                        _ => Some(url.to_string()),
                    }
                })
                .collect();
            if !rendered.is_empty() {
                parts.push(format!("Bio links: {}", rendered.join(", ")));
            }
        }
    }
    parts.push(format!("Followers: {}", blog.followers_count));
    parts.push(format!("Following: {}", blog.following_count));
    parts.push(format!("Total posts: {}", blog.media_count));
    parts.push(format!("Is verified: {}", blog.is_verified));
    parts.push(format!("Is business: {}", blog.is_business));

    // 派生指标
    if let Some(er) = blog.er {
        parts.push(format!("Avg ER posts: {:.2}%", er));
    }
    if let Some(er_reels) = blog.er_reels {
        parts.push(format!("Avg ER reels: {:.2}%", er_reels));
    }
    if let Some(trend) = &blog.er_trend {
        parts.push(format!("ER trend: {}", trend));
    }
    if let Some(ppw) = blog.posts_per_week {
        parts.push(format!("Posts per week: {:.1}", ppw));
    }
    if let Some(views) = blog.avg_reels_views {
        parts.push(format!("Avg reels views: {}", views));
    }

    // 精选故事
    if !profile.highlights.is_empty() {
        let titles: Vec<&str> = profile
            .highlights
            .iter()
            .map(|h| h.title.as_str())
            .collect();
        parts.push(format!("\nHighlight titles: {:?}", titles));

        let mut mentions: Vec<String> = Vec::new();
        let mut links: Vec<String> = Vec::new();
        let mut locations: Vec<String> = Vec::new();
        for h in &profile.highlights {
            for m in &h.story_mentions {
                if !mentions.contains(m) {
                    mentions.push(m.clone());
                }
            }
            for l in &h.story_links {
                if !links.contains(l) {
                    links.push(l.clone());
                }
            }
            for loc in &h.story_locations {
                if !locations.contains(loc) {
                    locations.push(loc.clone());
                }
            }
        }
        mentions.sort();
        links.sort();
        locations.sort();
        if !mentions.is_empty() {
            parts.push(format!("Highlight mentions: {:?}", mentions));
        }
        if !links.is_empty() {
            parts.push(format!("Highlight links: {:?}", links));
        }
        if !locations.is_empty() {
            parts.push(format!("Highlight locations: {:?}", locations));
        }
    }

    // 帖子明细
    if !profile.posts.is_empty() {
        parts.push("\n--- Posts ---".to_string());
        for (i, post) in profile.posts.iter().enumerate() {
            let date = post.taken_at.format("%Y-%m-%d");
            let mut meta = format!("likes={}, comments={}", post.like_count, post.comment_count);
            if blog.followers_count > 0 {
                let er = (post.like_count + post.comment_count) as f64
                    / blog.followers_count as f64
                    * 100.0;
                meta.push_str(&format!(", ER={:.1}%", er));
            }
            if let Some(plays) = post.play_count {
                meta.push_str(&format!(", plays={}", plays));
            }
            if let Some(title) = &post.title {
                meta.push_str(&format!(", title=\"{}\"", title));
            }
            if post.has_sponsor_tag {
                meta.push_str(&format!(", SPONSORED by {:?}", post.sponsor_brands));
            }
            if post.comments_disabled {
                meta.push_str(", comments_disabled=True");
            }

            let excerpt: String = post.caption_text.chars().take(CAPTION_EXCERPT_LEN).collect();
            parts.push(format!("Post {} ({}, {}): {}", i + 1, date, meta, excerpt));

            if !post.top_comments.is_empty() {
                let comments: Vec<String> = post
                    .top_comments
                    .iter()
                    .map(|c| format!("@{}: {}", c.username, c.text))
                    .collect();
                parts.push(format!("  Comments: {}", comments.join(" | ")));
            }
        }
    }

    // 高频话题标签与提及
    let top_hashtags = top_by_count(profile.posts.iter().flat_map(|p| p.hashtags.iter()), 20);
    if !top_hashtags.is_empty() {
        parts.push(format!("\nTop hashtags: {:?}", top_hashtags));
    }
    let top_mentions = top_by_count(profile.posts.iter().flat_map(|p| p.mentions.iter()), 10);
    if !top_mentions.is_empty() {
        parts.push(format!("Top mentions: {:?}", top_mentions));
    }

    let mut brands: Vec<String> = Vec::new();
    for post in &profile.posts {
        for brand in &post.sponsor_brands {
            if !brands.contains(brand) {
                brands.push(brand.clone());
            }
        }
    }
    if !brands.is_empty() {
        brands.sort();
        parts.push(format!("Sponsor brands: {:?}", brands));
    }

    // 数据质量提示：让模型按数据量校准 confidence
    let meaningful_posts = profile
        .posts
        .iter()
        .filter(|p| p.caption_text.chars().count() >= MEANINGFUL_CAPTION_LEN)
        .count();
    let posts_with_comments = profile
        .posts
        .iter()
        .filter(|p| !p.top_comments.is_empty())
        .count();
    parts.push("\n--- Data quality ---".to_string());
    parts.push(format!("Posts scraped: {}", profile.posts.len()));
    parts.push(format!("Posts with meaningful text: {}", meaningful_posts));
    parts.push(format!(
        "Bio present: {}",
        blog.bio.as_deref().map(|b| !b.is_empty()).unwrap_or(false)
    ));
    parts.push(format!("Highlights: {}", profile.highlights.len()));
    parts.push(format!("Posts with comments: {}", posts_with_comments));

    if profile.text_only {
        parts.push(
            "\nИзображения недоступны. Анализируй только по текстовым данным."
                .to_string(),
        );
    }

    parts.join("\n")
}

/// 组装 chat completions 的 messages 数组
///
/// image_map 把 CDN URL 映射到 base64 data URI；text_only 档案不带图片
pub fn build_messages(
    system_prompt: &str,
    profile: &AnalysisProfile,
    image_map: &HashMap<String, String>,
) -> serde_json::Value {
    let mut content = vec![serde_json::json!({
        "type": "text",
        "text": build_user_text(profile),
    })];

    if !profile.text_only {
        let urls = crate::ai::images::collect_image_urls(
            profile.blog.avatar_url.as_deref(),
            &profile.posts,
        );
        for url in urls {
            if let Some(data_uri) = image_map.get(&url) {
                content.push(serde_json::json!({
                    "type": "image_url",
                    "image_url": { "url": data_uri, "detail": "low" },
                }));
            }
        }
    }

    serde_json::json!([
        { "role": "system", "content": system_prompt },
        { "role": "user", "content": content },
    ])
}

/// 按出现次数取前 N 个
fn top_by_count<'a>(items: impl Iterator<Item = &'a String>, limit: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(name, _)| name == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.into_iter().take(limit).map(|(name, _)| name).collect()
}
