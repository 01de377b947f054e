// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::profile::{DiscoveredProfile, ScrapedProfile};
use async_trait::async_trait;
use thiserror::Error;

/// 抓取错误类型
///
/// 处理器根据错误种类决定队列转移：
/// PrivateAccount / UserNotFound 结束任务且不再链式触发，
/// InsufficientBalance 失败不重试，RateLimited / Transient 带退避重试
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// 私密账号
    #[error("Account is private")]
    PrivateAccount,

    /// 账号不存在或已删除
    #[error("User not found")]
    UserNotFound,

    /// 抓取服务余额耗尽，重试无意义
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// 命中限流
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// 外部服务暂时性故障（5xx 等）
    #[error("Transient error: {0}")]
    Transient(String),

    /// 其他错误
    #[error("Scrape failed: {0}")]
    Other(String),
}

impl ScrapeError {
    /// 判断错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::RateLimited(_) | ScrapeError::Transient(_) => true,
            ScrapeError::InsufficientBalance(_) => false,
            // 未识别的错误按暂时性处理，交给重试预算限制
            ScrapeError::Other(_) => true,
            ScrapeError::PrivateAccount | ScrapeError::UserNotFound => false,
        }
    }
}

/// 抓取引擎特质
///
/// 所有后端都产出同一套规范化结构，处理器不感知具体实现
#[async_trait]
pub trait ScraperEngine: Send + Sync {
    /// 完整抓取一个档案（资料 + 帖子 + 精选故事 + 派生指标）
    async fn scrape_profile(&self, username: &str) -> Result<ScrapedProfile, ScrapeError>;

    /// 按话题标签搜索候选档案
    async fn discover(
        &self,
        hashtag: &str,
        min_followers: i64,
    ) -> Result<Vec<DiscoveredProfile>, ScrapeError>;

    /// 引擎名称
    fn name(&self) -> &'static str;

    /// 账号池统计 (total, available)，健康检查用
    ///
    /// SaaS 后端没有本地账号池，返回 (0, 0)
    fn account_stats(&self) -> (usize, usize) {
        (0, 0)
    }
}
