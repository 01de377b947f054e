// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use blogrs::ai::batch::{build_request_line, parse_error_file, parse_result_line};
    use blogrs::ai::schema::openai_insights_schema;
    use blogrs::domain::models::insights::AnalysisOutcome;
    use serde_json::json;

    fn result_line(custom_id: &str, body: serde_json::Value) -> String {
        json!({
            "custom_id": custom_id,
            "response": { "status_code": 200, "body": body },
        })
        .to_string()
    }

    #[test]
    fn test_parse_success_line() {
        let content = json!({
            "short_summary": "Фуд-блогер.",
            "confidence": 5,
            "content": { "primary_categories": ["food"] },
        })
        .to_string();
        let line = result_line(
            "blog-1",
            json!({ "choices": [{ "message": { "content": content } }] }),
        );

        let (custom_id, outcome) = parse_result_line(&line).unwrap();
        assert_eq!(custom_id, "blog-1");
        match outcome {
            AnalysisOutcome::Success(insights) => {
                assert_eq!(insights.confidence, 5);
                assert_eq!(insights.content.primary_categories, vec!["food"]);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_content_parts_array() {
        let content = json!({ "confidence": 2 }).to_string();
        let line = result_line(
            "blog-2",
            json!({
                "choices": [{
                    "message": {
                        "content": [
                            { "type": "text", "text": content },
                        ]
                    }
                }]
            }),
        );

        let (_, outcome) = parse_result_line(&line).unwrap();
        assert!(matches!(outcome, AnalysisOutcome::Success(_)));
    }

    #[test]
    fn test_parse_refusal_line() {
        let line = result_line(
            "blog-3",
            json!({ "choices": [{ "message": { "refusal": "policy" } }] }),
        );

        let (custom_id, outcome) = parse_result_line(&line).unwrap();
        assert_eq!(custom_id, "blog-3");
        match outcome {
            AnalysisOutcome::Refusal(reason) => assert_eq!(reason, "policy"),
            other => panic!("expected refusal, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_provider_errors() {
        // HTTP 层错误
        let line = json!({
            "custom_id": "blog-4",
            "response": { "status_code": 500, "body": {} },
        })
        .to_string();
        let (_, outcome) = parse_result_line(&line).unwrap();
        assert!(matches!(outcome, AnalysisOutcome::ProviderError));

        // status_code = 0：供应商内部故障
        let line = json!({
            "custom_id": "blog-5",
            "response": { "status_code": 0 },
        })
        .to_string();
        let (_, outcome) = parse_result_line(&line).unwrap();
        assert!(matches!(outcome, AnalysisOutcome::ProviderError));

        // response 缺失
        let line = json!({ "custom_id": "blog-6" }).to_string();
        let (_, outcome) = parse_result_line(&line).unwrap();
        assert!(matches!(outcome, AnalysisOutcome::ProviderError));
    }

    #[test]
    fn test_parse_invalid_content_is_provider_error() {
        // 不是合法 JSON
        let line = result_line(
            "blog-7",
            json!({ "choices": [{ "message": { "content": "not json" } }] }),
        );
        let (_, outcome) = parse_result_line(&line).unwrap();
        assert!(matches!(outcome, AnalysisOutcome::ProviderError));

        // 未知字段被严格模式拒绝
        let content = json!({ "confidence": 3, "bogus": true }).to_string();
        let line = result_line(
            "blog-8",
            json!({ "choices": [{ "message": { "content": content } }] }),
        );
        let (_, outcome) = parse_result_line(&line).unwrap();
        assert!(matches!(outcome, AnalysisOutcome::ProviderError));
    }

    #[test]
    fn test_parse_out_of_range_confidence_is_provider_error() {
        let content = json!({ "confidence": 9 }).to_string();
        let line = result_line(
            "blog-9",
            json!({ "choices": [{ "message": { "content": content } }] }),
        );
        let (_, outcome) = parse_result_line(&line).unwrap();
        assert!(matches!(outcome, AnalysisOutcome::ProviderError));
    }

    #[test]
    fn test_missing_custom_id_is_skipped() {
        let line = json!({ "response": { "status_code": 200 } }).to_string();
        assert!(parse_result_line(&line).is_none());
    }

    #[test]
    fn test_parse_error_file_collects_ids() {
        let text = [
            json!({ "custom_id": "blog-a", "error": { "code": "server_error" } }).to_string(),
            String::new(),
            json!({ "error": { "code": "no_id" } }).to_string(),
            json!({ "custom_id": "blog-b" }).to_string(),
        ]
        .join("\n");

        assert_eq!(parse_error_file(&text), vec!["blog-a", "blog-b"]);
    }

    #[test]
    fn test_build_request_line_shape() {
        let messages = json!([{ "role": "user", "content": "hi" }]);
        let line = build_request_line("blog-1", "gpt-5-mini", messages);

        assert_eq!(line["custom_id"], "blog-1");
        assert_eq!(line["method"], "POST");
        assert_eq!(line["url"], "/v1/chat/completions");
        assert_eq!(line["body"]["model"], "gpt-5-mini");
        let json_schema = &line["body"]["response_format"]["json_schema"];
        assert_eq!(json_schema["name"], "ai_insights");
        assert_eq!(json_schema["strict"], true);
        assert_eq!(json_schema["schema"]["additionalProperties"], false);
    }

    #[test]
    fn test_openai_schema_is_strict() {
        let schema = openai_insights_schema();

        // 顶层对象关闭额外属性，required 覆盖全部字段
        assert_eq!(schema["additionalProperties"], false);
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"confidence"));
        assert!(required.contains(&"blogger_profile"));

        // 嵌套对象同样内联并关闭额外属性
        let nested = &schema["properties"]["blogger_profile"];
        assert!(nested.get("$ref").is_none());
    }
}
