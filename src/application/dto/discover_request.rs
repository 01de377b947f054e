// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

fn default_min_followers() -> i64 {
    1000
}

/// discover 任务创建请求
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverRequestDto {
    /// 话题标签，接受带或不带 #
    pub hashtag: String,
    #[serde(default = "default_min_followers")]
    pub min_followers: i64,
}

impl DiscoverRequestDto {
    /// 去掉前导 # 与空白后的标签；清理后为空则 None
    pub fn cleaned_hashtag(&self) -> Option<String> {
        let cleaned = self.hashtag.trim().trim_start_matches('#').to_string();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

/// POST /api/tasks/discover 的响应
#[derive(Debug, Clone, Serialize)]
pub struct DiscoverResponseDto {
    pub task_id: Option<uuid::Uuid>,
    pub hashtag: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleaned_hashtag_strips_prefix() {
        let dto = DiscoverRequestDto {
            hashtag: "  #travel".to_string(),
            min_followers: 1000,
        };
        assert_eq!(dto.cleaned_hashtag().as_deref(), Some("travel"));
    }

    #[test]
    fn test_cleaned_hashtag_rejects_empty() {
        let dto = DiscoverRequestDto {
            hashtag: "#".to_string(),
            min_followers: 1000,
        };
        assert!(dto.cleaned_hashtag().is_none());
    }
}
