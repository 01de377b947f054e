// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 每个来源地址每分钟的请求额度
pub const RATE_LIMIT_MAX_REQUESTS: usize = 60;

/// 滑动窗口长度
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// store 超过该规模时触发一次陈旧 IP 清扫
const CLEANUP_THRESHOLD: usize = 1024;

/// 速率限制器
///
/// 进程内滑动窗口，按来源 IP 计数。单进程部署，无需外部存储
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    store: DashMap<IpAddr, Vec<Instant>>,
}

impl RateLimiter {
    /// 创建新的速率限制器实例
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            store: DashMap::new(),
        }
    }

    /// 检查一次请求是否放行
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();

        let allowed = {
            let mut entry = self.store.entry(ip).or_default();
            entry.retain(|t| now.duration_since(*t) < self.window);
            if entry.len() >= self.max_requests {
                false
            } else {
                entry.push(now);
                true
            }
        };

        if self.store.len() > CLEANUP_THRESHOLD {
            let window = self.window;
            self.store
                .retain(|_, timestamps| timestamps.iter().any(|t| now.duration_since(*t) < window));
        }

        allowed
    }
}

/// 速率限制中间件
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !limiter.check(addr.ip()) {
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_blocks_after_quota() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(limiter.check(ip));
        assert!(limiter.check(ip));
        assert!(limiter.check(ip));
        assert!(!limiter.check(ip));
    }

    #[test]
    fn test_limiter_is_per_ip() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let first: IpAddr = "10.0.0.1".parse().unwrap();
        let second: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(first));
        assert!(!limiter.check(first));
        assert!(limiter.check(second));
    }
}
