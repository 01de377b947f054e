// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart;
use serde::Deserialize;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// embedding 模型与维度（语义检索列按该维度建）
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const EMBEDDING_DIMENSIONS: usize = 1536;

/// OpenAI API 客户端
///
/// 覆盖流水线用到的四个面：文件上传、批处理、文件下载、embedding
pub struct OpenAiClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

/// 批处理对象
#[derive(Debug, Clone, Deserialize)]
pub struct BatchInfo {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output_file_id: Option<String>,
    #[serde(default)]
    pub error_file_id: Option<String>,
    #[serde(default)]
    pub request_counts: Option<RequestCounts>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
}

impl BatchInfo {
    /// 批处理已成功完成，结果文件可下载
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }

    /// 供应商侧终止（failed / expired / cancelled）
    pub fn is_dead(&self) -> bool {
        matches!(self.status.as_str(), "failed" | "expired" | "cancelled")
    }
}

#[derive(Debug, Deserialize)]
struct FileObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// 覆盖 API 地址（测试用）
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        Ok(headers)
    }

    /// 上传批处理请求文件（JSONL）
    pub async fn upload_batch_file(&self, jsonl: Vec<u8>) -> Result<String> {
        let url = format!("{}/files", self.base_url);

        let part = multipart::Part::bytes(jsonl)
            .file_name("batch.jsonl")
            .mime_str("application/jsonl")?;
        let form = multipart::Form::new()
            .text("purpose", "batch")
            .part("file", part);

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI file upload error ({}): {}", status, error_text));
        }

        let file: FileObject = response.json().await?;
        debug!(file_id = %file.id, "Batch file uploaded");
        Ok(file.id)
    }

    /// 创建批处理（24 小时完成窗口）
    pub async fn create_batch(&self, input_file_id: &str) -> Result<String> {
        let url = format!("{}/batches", self.base_url);

        let body = serde_json::json!({
            "input_file_id": input_file_id,
            "endpoint": "/v1/chat/completions",
            "completion_window": "24h",
        });

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI batch create error ({}): {}", status, error_text));
        }

        let batch: BatchInfo = response.json().await?;
        Ok(batch.id)
    }

    /// 查询批处理状态
    pub async fn retrieve_batch(&self, batch_id: &str) -> Result<BatchInfo> {
        let url = format!("{}/batches/{}", self.base_url, batch_id);

        let response = self
            .http
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI batch retrieve error ({}): {}", status, error_text));
        }

        Ok(response.json().await?)
    }

    /// 下载文件内容（批处理输出为 JSONL 文本）
    pub async fn file_content(&self, file_id: &str) -> Result<String> {
        let url = format!("{}/files/{}/content", self.base_url, file_id);

        let response = self
            .http
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI file download error ({}): {}", status, error_text));
        }

        Ok(response.text().await?)
    }

    /// 生成 embedding 向量
    ///
    /// 维度必须等于 EMBEDDING_DIMENSIONS，否则视为错误
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);

        let body = serde_json::json!({
            "model": EMBEDDING_MODEL,
            "input": text,
        });

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI embedding error ({}): {}", status, error_text));
        }

        let embed_response: EmbeddingResponse = response.json().await?;
        let vector = embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| anyhow!("No embedding in response"))?;

        if vector.len() != EMBEDDING_DIMENSIONS {
            return Err(anyhow!(
                "Unexpected embedding dimensions: {} (want {})",
                vector.len(),
                EMBEDDING_DIMENSIONS
            ));
        }
        Ok(vector)
    }
}
