// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use blogrs::ai::prompt::{
        build_messages, build_system_prompt, build_user_text, AnalysisProfile, PromptCategory,
    };
    use blogrs::domain::models::blog::{Blog, ScrapeStatus};
    use blogrs::domain::models::profile::{ScrapedComment, ScrapedPost};
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn make_blog() -> Blog {
        Blog {
            id: Uuid::new_v4(),
            person_id: None,
            platform: "instagram".to_string(),
            username: "blogger1".to_string(),
            platform_id: Some("123".to_string()),
            bio: Some("Визажист, Алматы".to_string()),
            followers_count: 10_000,
            following_count: 300,
            media_count: 120,
            is_verified: false,
            is_business: false,
            er: Some(2.5),
            er_reels: None,
            er_trend: Some("stable".to_string()),
            posts_per_week: Some(3.0),
            avg_reels_views: None,
            avatar_url: Some("https://cdn.example/avatar.jpg".to_string()),
            bio_links: None,
            source: None,
            scrape_status: ScrapeStatus::Analyzing,
            scraped_at: None,
            ai_insights: None,
            ai_confidence: None,
            ai_analyzed_at: None,
            embedding: None,
            created_at: Utc::now().into(),
        }
    }

    fn make_post(caption: &str, thumbnail: Option<&str>) -> ScrapedPost {
        ScrapedPost {
            platform_id: "p1".to_string(),
            media_type: 1,
            product_type: None,
            caption_text: caption.to_string(),
            hashtags: vec!["#макияж".to_string()],
            mentions: vec![],
            has_sponsor_tag: false,
            sponsor_brands: vec![],
            like_count: 250,
            comment_count: 10,
            play_count: None,
            thumbnail_url: thumbnail.map(|s| s.to_string()),
            title: None,
            comments_disabled: false,
            top_comments: vec![ScrapedComment {
                username: "fan".to_string(),
                text: "Супер!".to_string(),
            }],
            taken_at: Utc.with_ymd_and_hms(2025, 5, 20, 10, 0, 0).unwrap(),
        }
    }

    fn make_profile(text_only: bool) -> AnalysisProfile {
        AnalysisProfile {
            blog: make_blog(),
            posts: vec![make_post(
                "Сегодня разбираем стойкие тональные кремы",
                Some("https://cdn.example/p1.jpg"),
            )],
            highlights: vec![],
            text_only,
        }
    }

    #[test]
    fn test_user_text_contains_profile_and_metrics() {
        let text = build_user_text(&make_profile(false));

        assert!(text.contains("Username: @blogger1"));
        assert!(text.contains("Bio: Визажист, Алматы"));
        assert!(text.contains("Followers: 10000"));
        assert!(text.contains("Avg ER posts: 2.50%"));
        assert!(text.contains("ER trend: stable"));
        assert!(text.contains("Top hashtags:"));
        // 帖子行带单帖 ER：(250+10)/10000*100 = 2.6%
        assert!(text.contains("ER=2.6%"));
    }

    #[test]
    fn test_user_text_data_quality_hint() {
        let text = build_user_text(&make_profile(false));

        assert!(text.contains("--- Data quality ---"));
        assert!(text.contains("Posts scraped: 1"));
        assert!(text.contains("Posts with meaningful text: 1"));
        assert!(text.contains("Bio present: true"));
        assert!(text.contains("Highlights: 0"));
        assert!(text.contains("Posts with comments: 1"));
    }

    #[test]
    fn test_text_only_appends_note() {
        let text = build_user_text(&make_profile(true));
        assert!(text.contains("Изображения недоступны"));

        let without = build_user_text(&make_profile(false));
        assert!(!without.contains("Изображения недоступны"));
    }

    #[test]
    fn test_messages_include_mapped_images() {
        let profile = make_profile(false);
        let mut image_map = HashMap::new();
        image_map.insert(
            "https://cdn.example/avatar.jpg".to_string(),
            "data:image/jpeg;base64,QUJD".to_string(),
        );

        let messages = build_messages("system", &profile, &image_map);
        let content = messages[1]["content"].as_array().unwrap();

        // 文本 + 命中映射的头像；没有下载成功的缩略图被跳过
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["detail"], "low");
    }

    #[test]
    fn test_text_only_messages_have_no_images() {
        let profile = make_profile(true);
        let mut image_map = HashMap::new();
        image_map.insert(
            "https://cdn.example/avatar.jpg".to_string(),
            "data:image/jpeg;base64,QUJD".to_string(),
        );

        let messages = build_messages("system", &profile, &image_map);
        let content = messages[1]["content"].as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["type"], "text");
    }

    #[test]
    fn test_system_prompt_lists_taxonomy() {
        let categories = vec![PromptCategory {
            code: "beauty".to_string(),
            name: "Красота".to_string(),
            subcategories: vec!["Макияж".to_string(), "Уход за кожей".to_string()],
        }];
        let tags = vec![(
            "content".to_string(),
            vec!["красота".to_string(), "макияж".to_string()],
        )];

        let prompt = build_system_prompt(&categories, &tags);
        assert!(prompt.contains("- beauty (Красота): Макияж, Уход за кожей"));
        assert!(prompt.contains("content: красота, макияж"));
        assert!(prompt.contains("КАТЕГОРИИ И ПОДКАТЕГОРИИ"));
    }
}
