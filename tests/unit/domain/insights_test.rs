// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use blogrs::domain::models::insights::{AIInsights, EngagementQuality, PageType};

    #[test]
    fn test_minimal_document_parses_with_defaults() {
        let insights: AIInsights = serde_json::from_str("{}").unwrap();
        assert_eq!(insights.confidence, 3);
        assert!(insights.tags.is_empty());
        assert!(insights.blogger_profile.page_type.is_none());
    }

    #[test]
    fn test_unknown_top_level_field_is_rejected() {
        let result = serde_json::from_str::<AIInsights>(r#"{ "surprise_field": 1 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_nested_field_is_rejected() {
        let result = serde_json::from_str::<AIInsights>(
            r#"{ "blogger_profile": { "profession": "визажист", "shoe_size": 42 } }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_full_document_round_trips() {
        let raw = r#"{
            "short_label": "бьюти-мастер",
            "short_summary": "Визажист из Алматы.",
            "tags": ["красота"],
            "confidence": 4,
            "blogger_profile": { "profession": "визажист", "page_type": "blog" },
            "content": { "primary_categories": ["beauty"], "secondary_topics": ["Макияж"] },
            "audience_inference": { "engagement_quality": "organic" },
            "marketing_value": { "brand_safety_score": 5 }
        }"#;
        let insights: AIInsights = serde_json::from_str(raw).unwrap();

        assert_eq!(insights.confidence, 4);
        assert_eq!(insights.blogger_profile.page_type, Some(PageType::Blog));
        assert_eq!(
            insights.audience_inference.engagement_quality,
            Some(EngagementQuality::Organic)
        );
        assert_eq!(insights.marketing_value.brand_safety_score, Some(5));

        // 序数字段序列化必须是整数，不能出现小数
        let dumped = serde_json::to_string(&insights).unwrap();
        assert!(dumped.contains("\"confidence\":4"));
        assert!(dumped.contains("\"brand_safety_score\":5"));
        assert!(!dumped.contains("4.0"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_ordinals() {
        let mut insights = AIInsights::default();
        insights.confidence = 6;
        assert!(insights.validate().is_err());

        let mut insights = AIInsights::default();
        insights.confidence = 0;
        assert!(insights.validate().is_err());

        let mut insights = AIInsights::default();
        insights.marketing_value.brand_safety_score = Some(9);
        assert!(insights.validate().is_err());

        let mut insights = AIInsights::default();
        insights.confidence = 5;
        insights.marketing_value.brand_safety_score = Some(1);
        assert!(insights.validate().is_ok());
    }

    #[test]
    fn test_invalid_enum_value_is_rejected() {
        let result = serde_json::from_str::<AIInsights>(
            r#"{ "audience_inference": { "engagement_quality": "fake" } }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_refusal_placeholder_document_parses() {
        let insights: AIInsights =
            serde_json::from_str(r#"{ "refusal_reason": "policy" }"#).unwrap();
        assert_eq!(insights.refusal_reason.as_deref(), Some("policy"));
    }
}
