// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::insights::{AIInsights, EngagementQuality, PageType};

/// 全空结果的兜底文本
const FALLBACK_TEXT: &str = "блогер";

/// 把 AI 分析结果渲染成语义检索用的俄语文本
///
/// 段落顺序固定，空段落跳过；末尾拼一行综合特征。
/// 置信类数值一律按整数渲染
pub fn build_embedding_text(insights: &AIInsights) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !insights.short_summary.is_empty() {
        parts.push(insights.short_summary.clone());
    }

    // 分类与子分类
    let content = &insights.content;
    let mut category_parts: Vec<String> = Vec::new();
    if !content.primary_categories.is_empty() {
        category_parts.push(format!(
            "Категории: {}",
            content.primary_categories.join(", ")
        ));
    }
    if !content.secondary_topics.is_empty() {
        category_parts.push(format!(
            "Подкатегории: {}",
            content.secondary_topics.join(", ")
        ));
    }
    if !category_parts.is_empty() {
        parts.push(format!("{}.", category_parts.join(". ")));
    }

    // 博主画像
    let bp = &insights.blogger_profile;
    let mut profile_parts: Vec<String> = Vec::new();
    if let Some(profession) = &bp.profession {
        if !profession.is_empty() {
            profile_parts.push(format!("Профессия: {}", profession));
        }
    }
    match (&bp.city, &bp.country) {
        (Some(city), Some(country)) if !city.is_empty() => {
            profile_parts.push(format!("Город: {}, {}", city, country));
        }
        (Some(city), None) if !city.is_empty() => {
            profile_parts.push(format!("Город: {}", city));
        }
        (None, Some(country)) if !country.is_empty() => {
            profile_parts.push(format!("Страна: {}", country));
        }
        _ => {}
    }
    if !bp.speaks_languages.is_empty() {
        profile_parts.push(format!("Языки: {}", bp.speaks_languages.join(", ")));
    }
    if let Some(page_type) = bp.page_type {
        profile_parts.push(format!("Тип: {}", page_type_label(page_type)));
    }
    if !profile_parts.is_empty() {
        parts.push(format!("{}.", profile_parts.join(". ")));
    }

    if !insights.tags.is_empty() {
        parts.push(format!("Теги: {}.", insights.tags.join(", ")));
    }

    // 受众
    let aud = &insights.audience_inference;
    let aud_parts: Vec<&str> = [
        aud.estimated_audience_gender.as_deref(),
        aud.estimated_audience_age.as_deref(),
        aud.estimated_audience_geo.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect();
    if !aud_parts.is_empty() {
        parts.push(format!("Аудитория: {}.", aud_parts.join(", ")));
    }
    if !aud.audience_interests.is_empty() {
        parts.push(format!(
            "Интересы аудитории: {}.",
            aud.audience_interests.join(", ")
        ));
    }

    // 营销
    let mv = &insights.marketing_value;
    if !mv.best_fit_industries.is_empty() {
        parts.push(format!(
            "Подходит для рекламы: {}.",
            mv.best_fit_industries.join(", ")
        ));
    }
    if !mv.not_suitable_for.is_empty() {
        parts.push(format!("Не подходит: {}.", mv.not_suitable_for.join(", ")));
    }
    if !insights.commercial.detected_brand_categories.is_empty() {
        parts.push(format!(
            "Рекламирует: {}.",
            insights.commercial.detected_brand_categories.join(", ")
        ));
    }

    // 综合特征行
    let mut traits: Vec<String> = Vec::new();
    if let Some(quality) = aud.engagement_quality {
        traits.push(format!(
            "вовлечённость {}",
            engagement_quality_label(quality)
        ));
    }
    if let Some(score) = mv.brand_safety_score {
        traits.push(format!("безопасность бренда {}/5", score));
    }
    if let Some(level) = insights.lifestyle.lifestyle_level {
        traits.push(format!("уровень жизни {}", level));
    }
    if let Some(quality) = content.content_quality {
        traits.push(format!("качество контента {}", quality));
    }
    if let Some(risk) = mv.collaboration_risk {
        traits.push(format!("риск сотрудничества {}", risk));
    }
    if !traits.is_empty() {
        parts.push(format!("Характеристики: {}.", traits.join(", ")));
    }

    if parts.is_empty() {
        FALLBACK_TEXT.to_string()
    } else {
        parts.join("\n")
    }
}

fn page_type_label(page_type: PageType) -> &'static str {
    match page_type {
        PageType::Blog => "личный блог",
        PageType::Public => "паблик",
        PageType::Business => "бизнес",
    }
}

fn engagement_quality_label(quality: EngagementQuality) -> &'static str {
    match quality {
        EngagementQuality::Organic => "органическая",
        EngagementQuality::Mixed => "смешанная",
        EngagementQuality::Suspicious => "подозрительная",
    }
}
