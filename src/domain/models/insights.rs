// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// AI 分析结果契约
///
/// 批处理结果按该模式严格校验；未知字段一律拒绝，
/// 避免上游契约漂移悄悄污染下游匹配器
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AIInsights {
    /// 模型的自由分析（先行字段，提升后续字段质量）
    #[serde(default)]
    pub reasoning: String,
    /// 2-3 个词的俄语标签（"фуд-блогер"）
    #[serde(default)]
    pub short_label: String,
    /// 2-3 句的俄语简介
    #[serde(default)]
    pub short_summary: String,
    /// 2-3 段的俄语完整描述
    #[serde(default)]
    pub summary: String,
    /// 从标签词表中挑选的标签（可能包含词表外的值）
    #[serde(default)]
    pub tags: Vec<String>,
    /// 分析置信度，固定 1..5 序数刻度，永远按整数呈现
    #[serde(default = "default_confidence")]
    pub confidence: u8,
    /// 补充说明
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub blogger_profile: BloggerProfile,
    #[serde(default)]
    pub life_situation: LifeSituation,
    #[serde(default)]
    pub lifestyle: Lifestyle,
    #[serde(default)]
    pub content: ContentProfile,
    #[serde(default)]
    pub audience_inference: AudienceInference,
    #[serde(default)]
    pub marketing_value: MarketingValue,
    #[serde(default)]
    pub commercial: CommercialActivity,
    /// AI 拒绝分析时的原因（仅 refusal 路径写入）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal_reason: Option<String>,
}

fn default_confidence() -> u8 {
    3
}

impl AIInsights {
    /// 校验序数字段的取值范围
    ///
    /// serde 不限制数值区间，置信度与品牌安全分在入库前集中校验
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.confidence) {
            return Err(format!("confidence out of range: {}", self.confidence));
        }
        if let Some(score) = self.marketing_value.brand_safety_score {
            if !(1..=5).contains(&score) {
                return Err(format!("brand_safety_score out of range: {}", score));
            }
        }
        Ok(())
    }
}

/// 博主个人画像
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BloggerProfile {
    /// 职业（俄语）
    #[serde(default)]
    pub profession: Option<String>,
    /// 城市（俄语）
    #[serde(default)]
    pub city: Option<String>,
    /// 国家（俄语）
    #[serde(default)]
    pub country: Option<String>,
    /// 页面类型
    #[serde(default)]
    pub page_type: Option<PageType>,
    /// 博主使用的语言
    #[serde(default)]
    pub speaks_languages: Vec<String>,
    /// 是否有经纪人/代理
    #[serde(default)]
    pub has_manager: Option<bool>,
    /// 经纪人联系方式
    #[serde(default)]
    pub manager_contact: Option<String>,
}

/// 生活状况
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LifeSituation {
    #[serde(default)]
    pub has_children: Option<bool>,
    #[serde(default)]
    pub relationship_status: Option<String>,
}

/// 生活方式
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Lifestyle {
    #[serde(default)]
    pub travels_frequently: Option<bool>,
    #[serde(default)]
    pub has_pets: Option<bool>,
    /// 消费水平档位
    #[serde(default)]
    pub lifestyle_level: Option<LifestyleLevel>,
}

/// 内容画像
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ContentProfile {
    /// 顶级分类代码（英文），有序，最多 3 个，首个为主分类
    #[serde(default)]
    pub primary_categories: Vec<String>,
    /// 子分类名（俄语）
    #[serde(default)]
    pub secondary_topics: Vec<String>,
    /// 内容语言
    #[serde(default)]
    pub content_language: Vec<String>,
    #[serde(default)]
    pub content_tone: Option<ContentTone>,
    #[serde(default)]
    pub content_quality: Option<ContentQuality>,
}

/// 受众推断
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AudienceInference {
    #[serde(default)]
    pub estimated_audience_gender: Option<String>,
    #[serde(default)]
    pub estimated_audience_age: Option<String>,
    #[serde(default)]
    pub estimated_audience_geo: Option<String>,
    /// 受众兴趣（俄语）
    #[serde(default)]
    pub audience_interests: Vec<String>,
    /// 互动质量评估
    #[serde(default)]
    pub engagement_quality: Option<EngagementQuality>,
}

/// 营销价值评估
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MarketingValue {
    /// 适合投放的行业（俄语）
    #[serde(default)]
    pub best_fit_industries: Vec<String>,
    /// 不适合的行业（俄语）
    #[serde(default)]
    pub not_suitable_for: Vec<String>,
    #[serde(default)]
    pub collaboration_risk: Option<RiskLevel>,
    /// 品牌安全分，1..5 整数
    #[serde(default)]
    pub brand_safety_score: Option<u8>,
}

/// 商业活动
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CommercialActivity {
    #[serde(default)]
    pub has_brand_collaborations: Option<bool>,
    /// 被推广品牌的类目（俄语）
    #[serde(default)]
    pub detected_brand_categories: Vec<String>,
    /// 被推广品牌名
    #[serde(default)]
    pub detected_brands: Vec<String>,
    /// 长期合作的品牌
    #[serde(default)]
    pub ambassador_brands: Vec<String>,
    #[serde(default)]
    pub ad_frequency: Option<AdFrequency>,
}

/// 页面类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Blog,
    Public,
    Business,
}

/// 内容基调
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentTone {
    Positive,
    Neutral,
    Educational,
    Humor,
    Inspirational,
}

/// 内容质量档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentQuality {
    Low,
    Medium,
    High,
    Professional,
}

impl fmt::Display for ContentQuality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ContentQuality::Low => write!(f, "low"),
            ContentQuality::Medium => write!(f, "medium"),
            ContentQuality::High => write!(f, "high"),
            ContentQuality::Professional => write!(f, "professional"),
        }
    }
}

/// 互动质量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EngagementQuality {
    /// 真实受众的自然互动
    Organic,
    /// 混合
    Mixed,
    /// 疑似刷量
    Suspicious,
}

/// 风险档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// 消费水平档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifestyleLevel {
    Budget,
    Middle,
    Premium,
    Luxury,
}

impl fmt::Display for LifestyleLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LifestyleLevel::Budget => write!(f, "budget"),
            LifestyleLevel::Middle => write!(f, "middle"),
            LifestyleLevel::Premium => write!(f, "premium"),
            LifestyleLevel::Luxury => write!(f, "luxury"),
        }
    }
}

/// 广告投放频率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdFrequency {
    Rare,
    Moderate,
    Frequent,
}

/// 单条批处理结果的解析结论
///
/// 三种结果必须保持可区分：成功、模型明确拒绝、传输或解析失败。
/// 用标签化枚举而不是 Option，reconciler 才不会把拒绝当成错误
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// 合法的 AIInsights 对象
    Success(Box<AIInsights>),
    /// 模型内容政策拒绝，携带原因
    Refusal(String),
    /// 供应商或解析层错误
    ProviderError,
}
