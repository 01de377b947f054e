// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;

use crate::workers::WorkerContext;
use std::sync::Arc;

/// HTTP 层共享状态
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<WorkerContext>,
}
