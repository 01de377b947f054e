// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod ai_analysis;
pub mod discover;
pub mod full_scrape;
pub mod reconcile;
pub mod worker;

use crate::ai::client::OpenAiClient;
use crate::config::settings::Settings;
use crate::domain::repositories::blog_repository::BlogRepository;
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::repositories::taxonomy_repository::TaxonomyRepository;
use crate::engines::traits::ScraperEngine;
use crate::infrastructure::storage::ImageStorage;
use crate::queue::task_queue::TaskQueue;
use std::sync::Arc;

/// 工作器共享依赖
///
/// 轮询循环、处理器与调度任务共用一份；全部组件线程安全
pub struct WorkerContext {
    pub queue: Arc<dyn TaskQueue>,
    pub tasks: Arc<dyn TaskRepository>,
    pub blogs: Arc<dyn BlogRepository>,
    pub taxonomy: Arc<dyn TaxonomyRepository>,
    pub engine: Arc<dyn ScraperEngine>,
    pub openai: Arc<OpenAiClient>,
    pub storage: Arc<ImageStorage>,
    pub settings: Arc<Settings>,
}
