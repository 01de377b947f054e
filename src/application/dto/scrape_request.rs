// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::sanitize::normalize_username;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 批量抓取请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScrapeRequestDto {
    /// 1..=100 个用户名；去 @、去空白、小写后去重
    #[validate(length(min = 1, max = 100, message = "usernames must contain 1..=100 items"))]
    pub usernames: Vec<String>,
}

impl ScrapeRequestDto {
    /// 规范化并去重后的用户名列表（保持原始顺序）
    pub fn cleaned_usernames(&self) -> Vec<String> {
        let mut cleaned: Vec<String> = Vec::new();
        for raw in &self.usernames {
            let name = normalize_username(raw);
            if !name.is_empty() && !cleaned.contains(&name) {
                cleaned.push(name);
            }
        }
        cleaned
    }
}

/// 单个用户名的处理结果
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeTaskResultDto {
    pub task_id: Option<uuid::Uuid>,
    pub username: String,
    pub blog_id: Option<uuid::Uuid>,
    /// created | skipped | error
    pub status: String,
}

/// POST /api/tasks/scrape 的响应
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResponseDto {
    pub created: usize,
    pub skipped: usize,
    pub tasks: Vec<ScrapeTaskResultDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleaned_usernames_dedupes_and_normalizes() {
        let dto = ScrapeRequestDto {
            usernames: vec![
                "@Blogger1".to_string(),
                " blogger1 ".to_string(),
                "other".to_string(),
            ],
        };
        assert_eq!(dto.cleaned_usernames(), vec!["blogger1", "other"]);
    }

    #[test]
    fn test_validate_rejects_empty_and_oversized() {
        let empty = ScrapeRequestDto { usernames: vec![] };
        assert!(empty.validate().is_err());

        let max = ScrapeRequestDto {
            usernames: (0..100).map(|i| format!("user{}", i)).collect(),
        };
        assert!(max.validate().is_ok());

        let oversized = ScrapeRequestDto {
            usernames: (0..101).map(|i| format!("user{}", i)).collect(),
        };
        assert!(oversized.validate().is_err());
    }
}
