// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Duration;

/// 队列重试的指数退避计划
///
/// 第 1 次失败后等 5 分钟，第 2 次 15 分钟，第 3 次 45 分钟（底数 3）。
/// attempts 从 1 起计；指数封顶防止溢出
pub fn backoff_delay(attempts: i32) -> Duration {
    let exponent = (attempts.max(1) - 1).min(8) as u32;
    Duration::seconds(300 * 3i64.pow(exponent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(backoff_delay(1).num_minutes(), 5);
        assert_eq!(backoff_delay(2).num_minutes(), 15);
        assert_eq!(backoff_delay(3).num_minutes(), 45);
    }

    #[test]
    fn test_backoff_clamps_low_attempts() {
        assert_eq!(backoff_delay(0).num_minutes(), 5);
        assert_eq!(backoff_delay(-3).num_minutes(), 5);
    }
}
