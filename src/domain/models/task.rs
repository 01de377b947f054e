// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 任务实体
///
/// 表示队列中一个待处理的工作单元，与 scrape_tasks 表一一对应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 关联博主ID（discover 任务为空）
    pub blog_id: Option<Uuid>,
    /// 任务类型
    pub task_type: TaskType,
    /// 任务状态
    pub status: TaskStatus,
    /// 任务优先级（数值越小优先级越高）
    pub priority: i32,
    /// 任务负载数据
    pub payload: serde_json::Value,
    /// 已执行次数
    pub attempts: i32,
    /// 最大执行次数
    pub max_attempts: i32,
    /// 最近一次失败信息
    pub error_message: Option<String>,
    /// 下次重试时间（backoff 调度）
    pub next_retry_at: Option<DateTime<FixedOffset>>,
    /// 开始执行时间
    pub started_at: Option<DateTime<FixedOffset>>,
    /// 完成时间
    pub completed_at: Option<DateTime<FixedOffset>>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 任务类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// 完整抓取博主资料
    #[default]
    FullScrape,
    /// AI 批量分析
    AiAnalysis,
    /// 按话题标签发现新博主
    Discover,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskType::FullScrape => write!(f, "full_scrape"),
            TaskType::AiAnalysis => write!(f, "ai_analysis"),
            TaskType::Discover => write!(f, "discover"),
        }
    }
}

impl FromStr for TaskType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_scrape" => Ok(TaskType::FullScrape),
            "ai_analysis" => Ok(TaskType::AiAnalysis),
            "discover" => Ok(TaskType::Discover),
            _ => Err(()),
        }
    }
}

/// 任务状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 待处理
    #[default]
    Pending,
    /// 执行中
    Running,
    /// 已完成（终态）
    Done,
    /// 已失败（终态）
    Failed,
}

impl TaskStatus {
    /// 判断状态是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Done => write!(f, "done"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "running" => Ok(TaskStatus::Running),
            "done" => Ok(TaskStatus::Done),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(()),
        }
    }
}

impl Task {
    /// 创建一个新的待处理任务
    ///
    /// # 参数
    ///
    /// * `blog_id` - 关联博主ID（discover 任务传 None）
    /// * `task_type` - 任务类型
    /// * `priority` - 优先级（越小越先执行）
    /// * `payload` - 任务负载数据
    ///
    /// # 返回值
    ///
    /// 返回新创建的任务实例
    pub fn new(
        blog_id: Option<Uuid>,
        task_type: TaskType,
        priority: i32,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            blog_id,
            task_type,
            status: TaskStatus::Pending,
            priority,
            payload,
            attempts: 0,
            max_attempts: 3,
            error_message: None,
            next_retry_at: None,
            started_at: None,
            completed_at: None,
            created_at: Utc::now().into(),
        }
    }

    /// 读取 payload 中的 batch_id（提交到 AI 批处理后写入）
    pub fn batch_id(&self) -> Option<&str> {
        self.payload.get("batch_id").and_then(|v| v.as_str())
    }

    /// 读取 payload 中的话题标签（discover 任务）
    pub fn hashtag(&self) -> Option<&str> {
        self.payload.get("hashtag").and_then(|v| v.as_str())
    }

    /// 读取 payload 中的最小粉丝数过滤条件（discover 任务）
    pub fn min_followers(&self) -> i64 {
        self.payload
            .get("min_followers")
            .and_then(|v| v.as_i64())
            .unwrap_or(1000)
    }

    /// 读取 payload 中的纯文本重试标记（AI refusal 后的重试链）
    pub fn text_only(&self) -> bool {
        self.payload
            .get("text_only")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// 判断任务是否还有重试额度
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }
}
