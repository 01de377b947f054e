// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::insights::AIInsights;
use crate::domain::repositories::taxonomy_repository::{
    CategoryAssignment, CategoryRow, TagRow,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// 模糊匹配的相似度下限
pub const FUZZY_CUTOFF: f64 = 0.8;

/// 规范化查找键
///
/// 小写、去掉 `&` 与 `-`、压缩连续空白
pub fn normalize_lookup_key(key: &str) -> String {
    let lowered = key.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c == '&' || c == '-' { ' ' } else { c })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 词表索引
///
/// 不可变快照：每次匹配批次从数据库重建，匹配过程只读
#[derive(Debug, Clone, Default)]
pub struct TaxonomyIndex {
    entries: HashMap<String, Uuid>,
}

impl TaxonomyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, id: Uuid) {
        self.entries.insert(key.into(), id);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 三级查找：精确 → 规范化 → 模糊
    ///
    /// 模糊级在全部键上取相似度最高者，低于 cutoff 返回 None
    pub fn lookup(&self, key: &str, cutoff: f64) -> Option<Uuid> {
        if let Some(id) = self.entries.get(key) {
            return Some(*id);
        }

        let normalized = normalize_lookup_key(key);
        if let Some(id) = self.entries.get(&normalized) {
            return Some(*id);
        }

        let mut best: Option<(f64, Uuid)> = None;
        for (candidate, id) in &self.entries {
            let score = strsim::normalized_levenshtein(&normalized, candidate);
            if score >= cutoff {
                match best {
                    Some((best_score, _)) if best_score >= score => {}
                    _ => best = Some((score, *id)),
                }
            }
        }
        best.map(|(_, id)| id)
    }
}

/// 构建分类索引
///
/// 顶级分类按 code 收录（AI 在 primary_categories 里返回代码），
/// 所有分类再按小写 name 收录（secondary_topics 按名字匹配）
pub fn build_category_index(rows: &[CategoryRow]) -> TaxonomyIndex {
    let mut index = TaxonomyIndex::new();
    for row in rows {
        if row.parent_id.is_none() {
            if let Some(code) = &row.code {
                if !code.is_empty() {
                    index.insert(code.clone(), row.id);
                }
            }
        }
        index.insert(row.name.to_lowercase(), row.id);
    }
    index
}

/// 构建标签索引（小写 name）
pub fn build_tag_index(rows: &[TagRow]) -> TaxonomyIndex {
    let mut index = TaxonomyIndex::new();
    for row in rows {
        index.insert(row.name.to_lowercase(), row.id);
    }
    index
}

/// 分类匹配结果
#[derive(Debug, Clone, Default)]
pub struct CategoryMatch {
    /// 待写入的关联行，首个成功解析的主分类带 is_primary
    pub assignments: Vec<CategoryAssignment>,
    /// 未能解析的原始串（按出现顺序）
    pub unresolved: Vec<String>,
}

/// 规划博主的分类写入
///
/// primary_categories 按序解析，跳过无法解析的；按 category_id 去重；
/// 只有第一个解析成功的条目是主分类。secondary_topics 继续追加，
/// 与主分类集合去重。纯函数 —— 落库由仓库层负责
pub fn plan_categories(insights: &AIInsights, index: &TaxonomyIndex) -> CategoryMatch {
    let mut result = CategoryMatch::default();
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut primary_assigned = false;

    for code in &insights.content.primary_categories {
        match index.lookup(code, FUZZY_CUTOFF) {
            Some(id) => {
                if seen.insert(id) {
                    result.assignments.push(CategoryAssignment {
                        category_id: id,
                        is_primary: !primary_assigned,
                    });
                    primary_assigned = true;
                }
            }
            None => result.unresolved.push(code.clone()),
        }
    }

    for topic in &insights.content.secondary_topics {
        match index.lookup(&topic.to_lowercase(), FUZZY_CUTOFF) {
            Some(id) => {
                if seen.insert(id) {
                    result.assignments.push(CategoryAssignment {
                        category_id: id,
                        is_primary: false,
                    });
                }
            }
            None => result.unresolved.push(topic.clone()),
        }
    }

    result
}

/// 标签匹配结果
#[derive(Debug, Clone, Default)]
pub struct TagMatch {
    pub tag_ids: Vec<Uuid>,
    /// 词表没有覆盖到的标签 —— 按博主记录下来供运营排查
    pub unresolved: Vec<String>,
}

/// 规划博主的标签写入
///
/// 不同写法映射到同一 tag_id 时只保留一个
pub fn plan_tags(insights: &AIInsights, index: &TaxonomyIndex) -> TagMatch {
    let mut result = TagMatch::default();
    let mut seen: HashSet<Uuid> = HashSet::new();

    for tag in &insights.tags {
        match index.lookup(&tag.to_lowercase(), FUZZY_CUTOFF) {
            Some(id) => {
                if seen.insert(id) {
                    result.tag_ids.push(id);
                }
            }
            None => result.unresolved.push(tag.clone()),
        }
    }

    result
}
