// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::ai::client::OpenAiClient;
use crate::ai::images::{collect_image_urls, resolve_images};
use crate::ai::prompt::{build_messages, AnalysisProfile};
use crate::ai::schema::openai_insights_schema;
use crate::domain::models::insights::{AIInsights, AnalysisOutcome};
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// 一次轮询的结论
#[derive(Debug)]
pub enum BatchPoll {
    /// 还在跑（validating / in_progress / finalizing），原样携带状态
    Pending(String),
    /// 完成，按 custom_id（即 blog_id）给出每条结论
    Completed(HashMap<String, AnalysisOutcome>),
    /// 供应商侧终止（failed / expired / cancelled）
    Dead(String),
}

/// 组装一行 Batch API 请求
pub fn build_request_line(custom_id: &str, model: &str, messages: Value) -> Value {
    serde_json::json!({
        "custom_id": custom_id,
        "method": "POST",
        "url": "/v1/chat/completions",
        "body": {
            "model": model,
            "messages": messages,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "ai_insights",
                    "strict": true,
                    "schema": openai_insights_schema(),
                },
            },
        },
    })
}

/// 提交一个批次
///
/// 为每个档案下载图片、组装请求行，整体作为一个 JSONL 文件上传，
/// 创建 24 小时窗口的批处理。返回 batch_id
pub async fn submit_batch(
    client: &OpenAiClient,
    profiles: &[AnalysisProfile],
    model: &str,
    system_prompt: &str,
) -> Result<String> {
    if profiles.is_empty() {
        return Err(anyhow!("Cannot submit empty batch"));
    }

    let http = reqwest::Client::new();
    let mut lines: Vec<String> = Vec::with_capacity(profiles.len());

    for profile in profiles {
        let image_map = if profile.text_only {
            HashMap::new()
        } else {
            let urls = collect_image_urls(profile.blog.avatar_url.as_deref(), &profile.posts);
            resolve_images(&http, &urls).await
        };

        let messages = build_messages(system_prompt, profile, &image_map);
        let line = build_request_line(&profile.blog.id.to_string(), model, messages);
        lines.push(serde_json::to_string(&line)?);

        debug!(
            "Prepared batch request for blog {} (@{}, {} posts, {} images)",
            profile.blog.id,
            profile.blog.username,
            profile.posts.len(),
            image_map.len()
        );
    }

    let jsonl = lines.join("\n").into_bytes();
    let file_id = client.upload_batch_file(jsonl).await?;
    let batch_id = client.create_batch(&file_id).await?;

    info!("Submitted batch {} with {} profiles", batch_id, profiles.len());
    Ok(batch_id)
}

/// 轮询批处理状态，完成时下载并解析结果
pub async fn poll_batch(client: &OpenAiClient, batch_id: &str) -> Result<BatchPoll> {
    let batch = client.retrieve_batch(batch_id).await?;

    if let Some(counts) = &batch.request_counts {
        info!(
            "Poll batch {}: status={}, completed={}/{}, failed={}",
            batch_id, batch.status, counts.completed, counts.total, counts.failed
        );
    } else {
        info!("Poll batch {}: status={}", batch_id, batch.status);
    }

    if batch.is_dead() {
        return Ok(BatchPoll::Dead(batch.status));
    }
    if !batch.is_completed() {
        return Ok(BatchPoll::Pending(batch.status));
    }

    let mut outcomes: HashMap<String, AnalysisOutcome> = HashMap::new();

    if let Some(output_file_id) = &batch.output_file_id {
        let text = client.file_content(output_file_id).await?;
        for (custom_id, outcome) in parse_output_file(&text) {
            outcomes.insert(custom_id, outcome);
        }
    }

    // error file 里是 API 侧整体失败的请求
    if let Some(error_file_id) = &batch.error_file_id {
        let text = client.file_content(error_file_id).await?;
        for custom_id in parse_error_file(&text) {
            outcomes
                .entry(custom_id)
                .or_insert(AnalysisOutcome::ProviderError);
        }
    }

    Ok(BatchPoll::Completed(outcomes))
}

/// 解析输出文件（JSONL，每行对应一个原始请求）
pub fn parse_output_file(text: &str) -> Vec<(String, AnalysisOutcome)> {
    let mut results = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(parsed) = parse_result_line(line) {
            results.push(parsed);
        }
    }
    results
}

/// 解析一行结果
///
/// 结论三分：Success / Refusal / ProviderError。
/// custom_id 缺失的行没有归属，跳过
pub fn parse_result_line(line: &str) -> Option<(String, AnalysisOutcome)> {
    let data: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            error!("Malformed JSONL line in output file: {}", e);
            return None;
        }
    };

    let custom_id = match data.get("custom_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            error!("JSONL line missing custom_id, skipping");
            return None;
        }
    };

    let response = match data.get("response") {
        Some(r) if !r.is_null() => r,
        _ => {
            error!("Null response for {}", custom_id);
            return Some((custom_id, AnalysisOutcome::ProviderError));
        }
    };

    // status_code = 0/null 是供应商内部故障
    let status_code = response.get("status_code").and_then(Value::as_i64);
    match status_code {
        None | Some(0) => {
            error!("Internal provider failure for {}: status_code={:?}", custom_id, status_code);
            return Some((custom_id, AnalysisOutcome::ProviderError));
        }
        Some(code) if code >= 400 => {
            error!("Batch API response error for {}: status={}", custom_id, code);
            return Some((custom_id, AnalysisOutcome::ProviderError));
        }
        _ => {}
    }

    let message = match response
        .get("body")
        .and_then(|b| b.get("choices"))
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|c| c.get("message"))
    {
        Some(m) => m,
        None => {
            warn!("No choices for {}", custom_id);
            return Some((custom_id, AnalysisOutcome::ProviderError));
        }
    };

    // 明确的内容政策拒绝，与传输错误分开处理
    if let Some(refusal) = message.get("refusal").and_then(Value::as_str) {
        if !refusal.is_empty() {
            warn!("AI refusal for {}: {}", custom_id, refusal);
            return Some((custom_id, AnalysisOutcome::Refusal(refusal.to_string())));
        }
    }

    let content_text = match extract_content_text(message) {
        Some(text) => text,
        None => {
            error!("Empty or unsupported message.content for {}", custom_id);
            return Some((custom_id, AnalysisOutcome::ProviderError));
        }
    };

    match serde_json::from_str::<AIInsights>(&content_text) {
        Ok(insights) => match insights.validate() {
            Ok(()) => {
                debug!(
                    "Parsed insights for {}: confidence={}",
                    custom_id, insights.confidence
                );
                Some((custom_id, AnalysisOutcome::Success(Box::new(insights))))
            }
            Err(e) => {
                error!("Insights validation failed for {}: {}", custom_id, e);
                Some((custom_id, AnalysisOutcome::ProviderError))
            }
        },
        Err(e) => {
            error!("Failed to parse AI response for {}: {}", custom_id, e);
            Some((custom_id, AnalysisOutcome::ProviderError))
        }
    }
}

/// 解析错误文件，返回失败请求的 custom_id 列表
pub fn parse_error_file(text: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let data: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                error!("Malformed JSONL line in error file: {}", e);
                continue;
            }
        };
        match data.get("custom_id").and_then(Value::as_str) {
            Some(custom_id) if !custom_id.is_empty() => {
                let error_info = data.get("error").cloned().unwrap_or(Value::Null);
                error!(
                    "Error file entry for {}: {}",
                    custom_id,
                    serde_json::to_string(&error_info).unwrap_or_default()
                );
                ids.push(custom_id.to_string());
            }
            _ => error!("Error JSONL line missing custom_id, skipping"),
        }
    }
    ids
}

/// message.content 可能是字符串或分段数组，统一取文本
fn extract_content_text(message: &Value) -> Option<String> {
    match message.get("content") {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Value::Array(parts)) => {
            let joined: String = parts
                .iter()
                .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            let trimmed = joined.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}
