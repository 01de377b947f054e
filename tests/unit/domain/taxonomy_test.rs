// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use blogrs::domain::models::insights::AIInsights;
    use blogrs::domain::repositories::taxonomy_repository::{CategoryRow, TagRow};
    use blogrs::domain::services::taxonomy::{
        build_category_index, build_tag_index, normalize_lookup_key, plan_categories, plan_tags,
        TaxonomyIndex, FUZZY_CUTOFF,
    };
    use uuid::Uuid;

    fn insights_with_categories(primary: &[&str], secondary: &[&str]) -> AIInsights {
        let mut insights = AIInsights::default();
        insights.content.primary_categories = primary.iter().map(|s| s.to_string()).collect();
        insights.content.secondary_topics = secondary.iter().map(|s| s.to_string()).collect();
        insights
    }

    #[test]
    fn test_normalize_lookup_key() {
        assert_eq!(normalize_lookup_key("Beauty & Makeup"), "beauty makeup");
        assert_eq!(normalize_lookup_key("eco-friendly  Living"), "eco friendly living");
        assert_eq!(normalize_lookup_key("fitness"), "fitness");
    }

    #[test]
    fn test_lookup_exact_wins() {
        let id = Uuid::new_v4();
        let mut index = TaxonomyIndex::new();
        index.insert("beauty", id);
        assert_eq!(index.lookup("beauty", FUZZY_CUTOFF), Some(id));
    }

    #[test]
    fn test_lookup_normalized_form() {
        let id = Uuid::new_v4();
        let mut index = TaxonomyIndex::new();
        index.insert("beauty makeup", id);
        assert_eq!(index.lookup("Beauty & Makeup", FUZZY_CUTOFF), Some(id));
    }

    #[test]
    fn test_lookup_fuzzy_above_cutoff() {
        let id = Uuid::new_v4();
        let mut index = TaxonomyIndex::new();
        index.insert("fitness", id);
        // 少一个字母：相似度约 0.86
        assert_eq!(index.lookup("fitnes", FUZZY_CUTOFF), Some(id));
    }

    #[test]
    fn test_lookup_none_below_cutoff() {
        let mut index = TaxonomyIndex::new();
        index.insert("fitness", Uuid::new_v4());
        assert_eq!(index.lookup("travel", FUZZY_CUTOFF), None);
    }

    #[test]
    fn test_category_index_keys_codes_and_names() {
        let beauty_id = Uuid::new_v4();
        let makeup_id = Uuid::new_v4();
        let rows = vec![
            CategoryRow {
                id: beauty_id,
                code: Some("beauty".to_string()),
                name: "Красота".to_string(),
                parent_id: None,
            },
            CategoryRow {
                id: makeup_id,
                code: None,
                name: "Макияж".to_string(),
                parent_id: Some(beauty_id),
            },
        ];
        let index = build_category_index(&rows);

        assert_eq!(index.lookup("beauty", FUZZY_CUTOFF), Some(beauty_id));
        assert_eq!(index.lookup("красота", FUZZY_CUTOFF), Some(beauty_id));
        assert_eq!(index.lookup("макияж", FUZZY_CUTOFF), Some(makeup_id));
    }

    #[test]
    fn test_plan_categories_fuzzy_primary() {
        // "beauty & makeup" 经规范化得到 "beauty makeup"
        let cat_id = Uuid::new_v4();
        let mut index = TaxonomyIndex::new();
        index.insert("beauty makeup", cat_id);

        let insights = insights_with_categories(&["beauty & makeup"], &[]);
        let result = plan_categories(&insights, &index);

        assert_eq!(result.assignments.len(), 1);
        assert_eq!(result.assignments[0].category_id, cat_id);
        assert!(result.assignments[0].is_primary);
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_plan_categories_exactly_one_primary() {
        let beauty_id = Uuid::new_v4();
        let fitness_id = Uuid::new_v4();
        let mut index = TaxonomyIndex::new();
        index.insert("beauty", beauty_id);
        index.insert("fitness", fitness_id);

        let insights = insights_with_categories(&["beauty", "fitness"], &[]);
        let result = plan_categories(&insights, &index);

        let primary_count = result.assignments.iter().filter(|a| a.is_primary).count();
        assert_eq!(primary_count, 1);
        assert_eq!(result.assignments[0].category_id, beauty_id);
        assert!(result.assignments[0].is_primary);
        assert!(!result.assignments[1].is_primary);
    }

    #[test]
    fn test_plan_categories_skips_unresolved_keeps_order() {
        let fitness_id = Uuid::new_v4();
        let mut index = TaxonomyIndex::new();
        index.insert("fitness", fitness_id);

        let insights = insights_with_categories(&["zzzzzz", "fitness"], &[]);
        let result = plan_categories(&insights, &index);

        // 第一个解析成功的代码成为主分类
        assert_eq!(result.assignments.len(), 1);
        assert!(result.assignments[0].is_primary);
        assert_eq!(result.unresolved, vec!["zzzzzz"]);
    }

    #[test]
    fn test_plan_categories_dedupes_ids() {
        let beauty_id = Uuid::new_v4();
        let mut index = TaxonomyIndex::new();
        index.insert("beauty", beauty_id);
        index.insert("красота", beauty_id);

        let insights = insights_with_categories(&["beauty"], &["Красота"]);
        let result = plan_categories(&insights, &index);

        assert_eq!(result.assignments.len(), 1);
        assert!(result.assignments[0].is_primary);
    }

    #[test]
    fn test_plan_categories_secondary_not_primary() {
        let beauty_id = Uuid::new_v4();
        let makeup_id = Uuid::new_v4();
        let mut index = TaxonomyIndex::new();
        index.insert("beauty", beauty_id);
        index.insert("макияж", makeup_id);

        let insights = insights_with_categories(&["beauty"], &["Макияж"]);
        let result = plan_categories(&insights, &index);

        assert_eq!(result.assignments.len(), 2);
        assert!(result.assignments[0].is_primary);
        assert_eq!(result.assignments[1].category_id, makeup_id);
        assert!(!result.assignments[1].is_primary);
    }

    #[test]
    fn test_plan_tags_dedupes_and_records_misses() {
        let tag_id = Uuid::new_v4();
        let rows = vec![
            TagRow {
                id: tag_id,
                name: "ЗОЖ".to_string(),
                group: "content".to_string(),
            },
            TagRow {
                id: tag_id,
                name: "Здоровый образ жизни".to_string(),
                group: "content".to_string(),
            },
        ];
        let index = build_tag_index(&rows);

        let mut insights = AIInsights::default();
        insights.tags = vec![
            "ЗОЖ".to_string(),
            "Здоровый образ жизни".to_string(),
            "несуществующий тег".to_string(),
        ];
        let result = plan_tags(&insights, &index);

        // 同一标签的不同写法只保留一条
        assert_eq!(result.tag_ids, vec![tag_id]);
        assert_eq!(result.unresolved, vec!["несуществующий тег"]);
    }
}
