// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 全部来自环境变量；键名与变量名一一对应（SCRAPER_PORT → scraper_port）
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// PostgreSQL 连接串
    pub database_url: String,
    /// Supabase 项目地址（对象存储用）
    pub supabase_url: String,
    /// Supabase service role key
    pub supabase_service_key: String,
    /// OpenAI API key（批处理分析 + embedding）
    pub openai_api_key: String,
    /// 抓取后端：hikerapi | instagrapi
    pub scraper_backend: String,
    /// HikerAPI 访问令牌
    pub hikerapi_token: String,
    /// HTTP 面的 bearer token
    pub scraper_api_key: String,
    /// HTTP 监听端口
    pub scraper_port: u16,

    /// 轮询间隔（秒）
    pub worker_poll_interval: u64,
    /// 并发处理的任务数上限
    pub worker_max_concurrent: usize,

    /// 批量提交的最小任务数
    pub batch_min_size: usize,
    /// 最老任务超过该小时数就强制提交
    pub batch_max_age_hours: i64,
    /// 分析模型
    pub batch_model: String,

    /// 重新抓取的新鲜度窗口（天）
    pub rescrape_days: i64,
    /// 每个档案转存的帖子缩略图数量
    pub thumbnails_to_persist: usize,
    /// 提示词包含的帖子数量上限
    pub posts_to_fetch: u64,
    /// 拉取的精选故事数量
    pub highlights_to_fetch: usize,
    /// 每个帖子拉取的评论数
    pub comments_to_fetch: usize,
    /// 拉取评论的帖子数
    pub posts_with_comments: usize,
}

impl Settings {
    /// 从环境变量加载配置
    ///
    /// # 返回值
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 缺少必填项或类型不符
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("scraper_backend", "hikerapi")?
            .set_default("hikerapi_token", "")?
            .set_default("scraper_port", 8001)?
            .set_default("worker_poll_interval", 30)?
            .set_default("worker_max_concurrent", 2)?
            .set_default("batch_min_size", 10)?
            .set_default("batch_max_age_hours", 2)?
            .set_default("batch_model", "gpt-5-mini")?
            .set_default("rescrape_days", 60)?
            .set_default("thumbnails_to_persist", 7)?
            .set_default("posts_to_fetch", 25)?
            .set_default("highlights_to_fetch", 3)?
            .set_default("comments_to_fetch", 10)?
            .set_default("posts_with_comments", 3)?
            .add_source(Environment::default());

        builder.build()?.try_deserialize()
    }
}
