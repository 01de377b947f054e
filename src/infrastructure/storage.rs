// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::ScrapedPost;
use futures::future::join_all;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 图片存储桶
const IMAGES_BUCKET: &str = "blog-images";

/// 单张图片的下载/上传超时
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(15);

/// 下载大小上限
const MAX_DOWNLOAD_SIZE: usize = 10 * 1024 * 1024;

/// 同时进行的上传数上限
const MAX_CONCURRENT_UPLOADS: usize = 4;

/// 对象存储客户端（Supabase Storage REST）
///
/// 把 Instagram CDN 的短时效图片转存为长期可用的公开 URL。
/// 上传并发全局受限，avatar 与缩略图共享同一个信号量
pub struct ImageStorage {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    upload_semaphore: Arc<Semaphore>,
}

impl ImageStorage {
    /// 创建新的对象存储客户端
    pub fn new(supabase_url: &str, service_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: supabase_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            upload_semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_UPLOADS)),
        }
    }

    /// 文件的长期公开 URL
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, IMAGES_BUCKET, path
        )
    }

    /// 下载一张 CDN 图片
    ///
    /// 超时、非图片类型、超出大小上限都按失败处理
    async fn download_image(&self, url: &str) -> Option<(Vec<u8>, String)> {
        let response = match self
            .http
            .get(url)
            .timeout(TRANSFER_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(r) => r,
            Err(e) => {
                warn!("[image_storage] Download failed: {} ({})", url, e);
                return None;
            }
        };

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or("").trim().to_string())
            .unwrap_or_else(|| "image/jpeg".to_string());
        if !content_type.starts_with("image/") {
            warn!("[image_storage] Not an image ({}): {}", content_type, url);
            return None;
        }

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!("[image_storage] Body read failed: {} ({})", url, e);
                return None;
            }
        };
        if bytes.len() > MAX_DOWNLOAD_SIZE {
            warn!(
                "[image_storage] Image too large ({} bytes): {}",
                bytes.len(),
                url
            );
            return None;
        }

        Some((bytes.to_vec(), content_type))
    }

    /// 上传文件（upsert 覆盖同名对象）
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> bool {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, IMAGES_BUCKET, path);

        let result = self
            .http
            .post(&url)
            .timeout(TRANSFER_TIMEOUT)
            .bearer_auth(&self.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                error!(
                    "[image_storage] Upload failed ({}): HTTP {}",
                    path,
                    response.status()
                );
                false
            }
            Err(e) => {
                error!("[image_storage] Upload failed ({}): {}", path, e);
                false
            }
        }
    }

    /// 下载 CDN 图片并转存，返回长期 URL
    async fn download_and_upload(&self, cdn_url: &str, path: &str) -> Option<String> {
        let _permit = self.upload_semaphore.clone().acquire_owned().await.ok()?;

        let (data, content_type) = self.download_image(cdn_url).await?;
        if self.upload(path, data, &content_type).await {
            Some(self.public_url(path))
        } else {
            None
        }
    }

    /// 转存一个档案的图片
    ///
    /// 头像 + 随机抽样的至多 max_thumbnails 张帖子缩略图。
    /// 返回 (头像长期URL, {platform_id: 长期URL})；失败的条目缺席，
    /// 调用方保留原 CDN URL
    pub async fn persist_profile_images(
        &self,
        blog_id: Uuid,
        avatar_cdn_url: Option<&str>,
        posts: &[ScrapedPost],
        max_thumbnails: usize,
    ) -> (Option<String>, HashMap<String, String>) {
        let mut uploads: Vec<(String, String, String)> = Vec::new(); // (kind, platform_id, cdn_url)

        if let Some(url) = avatar_cdn_url {
            uploads.push(("avatar".to_string(), String::new(), url.to_string()));
        }

        let mut candidates: Vec<&ScrapedPost> = posts
            .iter()
            .filter(|p| p.thumbnail_url.is_some() && !p.platform_id.is_empty())
            .collect();
        // ThreadRng 不能跨 await 持有
        {
            let mut rng = rand::thread_rng();
            candidates.shuffle(&mut rng);
        }
        for post in candidates.into_iter().take(max_thumbnails) {
            if let Some(url) = &post.thumbnail_url {
                uploads.push(("post".to_string(), post.platform_id.clone(), url.clone()));
            }
        }

        if uploads.is_empty() {
            return (None, HashMap::new());
        }

        let futures = uploads.iter().map(|(kind, platform_id, cdn_url)| {
            let path = if kind == "avatar" {
                format!("{}/avatar.jpg", blog_id)
            } else {
                format!("{}/post_{}.jpg", blog_id, platform_id)
            };
            async move { self.download_and_upload(cdn_url, &path).await }
        });
        let results = join_all(futures).await;

        let mut avatar_url: Option<String> = None;
        let mut post_urls: HashMap<String, String> = HashMap::new();
        for ((kind, platform_id, _), result) in uploads.iter().zip(results) {
            let Some(url) = result else { continue };
            if kind == "avatar" {
                avatar_url = Some(url);
            } else {
                post_urls.insert(platform_id.clone(), url);
            }
        }

        let total = avatar_url.is_some() as usize + post_urls.len();
        info!(
            "[image_storage] blog={}: persisted {} images",
            blog_id, total
        );
        (avatar_url, post_urls)
    }

    /// 列出桶内指定前缀下的对象名
    pub async fn list(&self, prefix: &str) -> Vec<String> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, IMAGES_BUCKET);
        let body = serde_json::json!({ "prefix": prefix, "limit": 1000 });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .json(&body)
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => r
                .json::<Vec<serde_json::Value>>()
                .await
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|i| i.get("name").and_then(|n| n.as_str()))
                        .map(|s| s.to_string())
                        .collect()
                })
                .unwrap_or_default(),
            Ok(r) => {
                error!("[image_storage] List failed ({}): HTTP {}", prefix, r.status());
                Vec::new()
            }
            Err(e) => {
                error!("[image_storage] List failed ({}): {}", prefix, e);
                Vec::new()
            }
        }
    }

    /// 删除一组对象
    pub async fn remove(&self, paths: &[String]) -> bool {
        if paths.is_empty() {
            return true;
        }
        let url = format!("{}/storage/v1/object/{}", self.base_url, IMAGES_BUCKET);
        let body = serde_json::json!({ "prefixes": paths });

        match self
            .http
            .delete(&url)
            .bearer_auth(&self.service_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => true,
            Ok(r) => {
                error!("[image_storage] Remove failed: HTTP {}", r.status());
                false
            }
            Err(e) => {
                error!("[image_storage] Remove failed: {}", e);
                false
            }
        }
    }

    /// 删除一个博主的全部图片，返回删除数量
    pub async fn delete_blog_images(&self, blog_id: Uuid) -> usize {
        let prefix = blog_id.to_string();
        let files = self.list(&prefix).await;
        if files.is_empty() {
            return 0;
        }

        let paths: Vec<String> = files.iter().map(|f| format!("{}/{}", prefix, f)).collect();
        if self.remove(&paths).await {
            debug!(
                "[image_storage] Deleted {} files for blog={}",
                paths.len(),
                blog_id
            );
            paths.len()
        } else {
            0
        }
    }

    /// 清理孤儿目录：桶里存在但 blogs 表已经没有对应记录的 blog 文件夹
    pub async fn cleanup_orphans(&self, known_blog_ids: &[Uuid]) -> usize {
        let known: HashSet<String> = known_blog_ids.iter().map(|id| id.to_string()).collect();
        let folders = self.list("").await;

        let mut deleted = 0usize;
        for folder in folders {
            if known.contains(&folder) {
                continue;
            }
            let Ok(blog_id) = folder.parse::<Uuid>() else {
                continue;
            };
            deleted += self.delete_blog_images(blog_id).await;
        }

        if deleted > 0 {
            info!("[image_storage] Cleanup removed {} orphaned objects", deleted);
        }
        deleted
    }
}
