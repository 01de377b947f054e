// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use blogrs::domain::models::insights::{
        AIInsights, ContentQuality, EngagementQuality, LifestyleLevel, PageType, RiskLevel,
    };
    use blogrs::domain::services::embedding_text::build_embedding_text;

    fn full_insights() -> AIInsights {
        let mut insights = AIInsights::default();
        insights.short_summary = "Бьюти-блогер из Алматы.".to_string();
        insights.content.primary_categories = vec!["beauty".to_string()];
        insights.content.secondary_topics = vec!["Макияж".to_string()];
        insights.content.content_quality = Some(ContentQuality::High);
        insights.blogger_profile.profession = Some("визажист".to_string());
        insights.blogger_profile.city = Some("Алматы".to_string());
        insights.blogger_profile.country = Some("Казахстан".to_string());
        insights.blogger_profile.speaks_languages =
            vec!["русский".to_string(), "казахский".to_string()];
        insights.blogger_profile.page_type = Some(PageType::Blog);
        insights.tags = vec!["красота".to_string(), "макияж".to_string()];
        insights.audience_inference.estimated_audience_gender = Some("женская".to_string());
        insights.audience_inference.audience_interests = vec!["уход за собой".to_string()];
        insights.audience_inference.engagement_quality = Some(EngagementQuality::Organic);
        insights.marketing_value.best_fit_industries = vec!["косметика".to_string()];
        insights.marketing_value.not_suitable_for = vec!["алкоголь".to_string()];
        insights.marketing_value.brand_safety_score = Some(4);
        insights.marketing_value.collaboration_risk = Some(RiskLevel::Low);
        insights.lifestyle.lifestyle_level = Some(LifestyleLevel::Premium);
        insights.commercial.detected_brand_categories = vec!["косметика".to_string()];
        insights
    }

    #[test]
    fn test_render_section_order() {
        let text = build_embedding_text(&full_insights());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Бьюти-блогер из Алматы.");
        assert_eq!(lines[1], "Категории: beauty. Подкатегории: Макияж.");
        assert_eq!(
            lines[2],
            "Профессия: визажист. Город: Алматы, Казахстан. Языки: русский, казахский. Тип: личный блог."
        );
        assert_eq!(lines[3], "Теги: красота, макияж.");
        assert_eq!(lines[4], "Аудитория: женская.");
        assert_eq!(lines[5], "Интересы аудитории: уход за собой.");
        assert_eq!(lines[6], "Подходит для рекламы: косметика.");
        assert_eq!(lines[7], "Не подходит: алкоголь.");
        assert_eq!(lines[8], "Рекламирует: косметика.");
    }

    #[test]
    fn test_render_characteristics_line() {
        let text = build_embedding_text(&full_insights());
        let last = text.lines().last().unwrap();
        assert_eq!(
            last,
            "Характеристики: вовлечённость органическая, безопасность бренда 4/5, \
             уровень жизни premium, качество контента high, риск сотрудничества low."
        );
    }

    #[test]
    fn test_brand_safety_renders_as_integer() {
        let text = build_embedding_text(&full_insights());
        assert!(text.contains("4/5"));
        assert!(!text.contains("4.0"));
    }

    #[test]
    fn test_empty_insights_fallback() {
        let text = build_embedding_text(&AIInsights::default());
        assert_eq!(text, "блогер");
    }

    #[test]
    fn test_country_without_city() {
        let mut insights = AIInsights::default();
        insights.blogger_profile.country = Some("Казахстан".to_string());
        let text = build_embedding_text(&insights);
        assert!(text.contains("Страна: Казахстан."));
    }

    #[test]
    fn test_empty_sections_are_skipped() {
        let mut insights = AIInsights::default();
        insights.tags = vec!["путешествия".to_string()];
        let text = build_embedding_text(&insights);
        assert_eq!(text, "Теги: путешествия.");
    }
}
