// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::ScrapedPost;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::future::join_all;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// 每个档案随请求附带的图片上限
pub const MAX_IMAGES: usize = 10;

/// 单张图片的下载超时
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// 图片大小上限
const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// 收集档案的图片 URL：头像优先，其后帖子缩略图，去重，封顶 MAX_IMAGES
pub fn collect_image_urls(avatar_url: Option<&str>, posts: &[ScrapedPost]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();

    let mut push_unique = |url: &str| {
        if !url.is_empty() && urls.len() < MAX_IMAGES && !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    };

    if let Some(url) = avatar_url {
        push_unique(url);
    }
    for post in posts {
        if let Some(url) = &post.thumbnail_url {
            push_unique(url);
        }
    }

    urls
}

/// 下载一张图片并编码成 data URI，失败返回 None
pub async fn download_image_as_data_uri(
    client: &reqwest::Client,
    url: &str,
) -> Option<String> {
    let response = match client
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .and_then(|r| r.error_for_status())
    {
        Ok(r) => r,
        Err(e) => {
            warn!("[images] Download failed for {}: {}", url, e);
            return None;
        }
    };

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_string())
        .unwrap_or_else(|| "image/jpeg".to_string());
    let mime = if content_type.starts_with("image/") {
        content_type
    } else {
        "image/jpeg".to_string()
    };

    let bytes = match response.bytes().await {
        Ok(b) => b,
        Err(e) => {
            warn!("[images] Body read failed for {}: {}", url, e);
            return None;
        }
    };
    if bytes.len() > MAX_IMAGE_SIZE {
        warn!("[images] Image too large ({} bytes): {}", bytes.len(), url);
        return None;
    }

    Some(format!("data:{};base64,{}", mime, BASE64.encode(&bytes)))
}

/// 并发下载一组图片
///
/// 返回 {原始URL: data URI}，失败的 URL 直接缺席
pub async fn resolve_images(
    client: &reqwest::Client,
    urls: &[String],
) -> HashMap<String, String> {
    let downloads = urls
        .iter()
        .map(|url| download_image_as_data_uri(client, url));
    let results = join_all(downloads).await;

    urls.iter()
        .zip(results)
        .filter_map(|(url, data_uri)| data_uri.map(|d| (url.clone(), d)))
        .collect()
}
