// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use blogrs::ai::client::OpenAiClient;
use blogrs::config::settings::Settings;
use blogrs::engines::hiker_engine::{HikerConfig, HikerEngine};
use blogrs::engines::traits::ScraperEngine;
use blogrs::infrastructure::database::connection;
use blogrs::infrastructure::repositories::blog_repo_impl::BlogRepositoryImpl;
use blogrs::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
use blogrs::infrastructure::repositories::taxonomy_repo_impl::TaxonomyRepositoryImpl;
use blogrs::infrastructure::storage::ImageStorage;
use blogrs::presentation::middleware::auth_middleware::AuthState;
use blogrs::presentation::middleware::rate_limit_middleware::{
    RateLimiter, RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW,
};
use blogrs::presentation::{routes, AppState};
use blogrs::queue::scheduler::TaskScheduler;
use blogrs::queue::task_queue::PostgresTaskQueue;
use blogrs::utils::telemetry;
use blogrs::workers::worker::PollingWorker;
use blogrs::workers::WorkerContext;
use migration::{Migrator, MigratorTrait};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// 主函数
///
/// 单进程承载三个协作循环：HTTP 服务、轮询工作器、调度器。
/// 停机信号经 watch 通道广播，工作器带 30 秒宽限排空在途任务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 日志
    telemetry::init_telemetry();
    info!("Starting blogrs...");

    // 2. 配置
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. 数据库连接与迁移
    let db = Arc::new(connection::create_pool(&settings.database_url).await?);
    info!("Database connection established");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. 仓库与队列
    let task_repo = Arc::new(TaskRepositoryImpl::new(db.clone()));
    let blog_repo = Arc::new(BlogRepositoryImpl::new(db.clone()));
    let taxonomy_repo = Arc::new(TaxonomyRepositoryImpl::new(db.clone()));
    let queue = Arc::new(PostgresTaskQueue::new(task_repo.clone()));

    // 5. 抓取引擎
    let engine: Arc<dyn ScraperEngine> = match settings.scraper_backend.as_str() {
        "hikerapi" => {
            if settings.hikerapi_token.is_empty() {
                anyhow::bail!("SCRAPER_BACKEND=hikerapi requires HIKERAPI_TOKEN");
            }
            Arc::new(HikerEngine::new(HikerConfig {
                token: settings.hikerapi_token.clone(),
                highlights_to_fetch: settings.highlights_to_fetch,
                comments_to_fetch: settings.comments_to_fetch,
                posts_with_comments: settings.posts_with_comments,
            }))
        }
        other => {
            anyhow::bail!(
                "Unsupported scraper backend '{}': this build ships the hikerapi backend",
                other
            );
        }
    };
    info!("Using {} scraper backend", engine.name());

    // 6. 外部客户端
    let openai = Arc::new(OpenAiClient::new(&settings.openai_api_key));
    let storage = Arc::new(ImageStorage::new(
        &settings.supabase_url,
        &settings.supabase_service_key,
    ));

    let ctx = Arc::new(WorkerContext {
        queue: queue.clone(),
        tasks: task_repo.clone(),
        blogs: blog_repo.clone(),
        taxonomy: taxonomy_repo.clone(),
        engine,
        openai,
        storage,
        settings: settings.clone(),
    });

    // 7. 停机信号
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        });
    }

    // 8. 调度器与轮询工作器
    let scheduler_handles = TaskScheduler::new(ctx.clone()).start();

    let worker = PollingWorker::new(ctx.clone());
    let worker_shutdown = shutdown_rx.clone();
    let worker_handle = tokio::spawn(async move {
        worker.run(worker_shutdown).await;
    });

    // 9. HTTP 服务
    let app = routes::build_router(
        AppState { ctx: ctx.clone() },
        AuthState {
            api_key: Arc::new(settings.scraper_api_key.clone()),
        },
        Arc::new(RateLimiter::new(RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW)),
    );

    let addr = format!("0.0.0.0:{}", settings.scraper_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let mut server_shutdown = shutdown_rx.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = server_shutdown.changed().await;
    })
    .await?;

    // 10. 排空工作器，停掉调度器
    if let Err(e) = worker_handle.await {
        error!("Worker task join failed: {}", e);
    }
    for handle in scheduler_handles {
        handle.abort();
    }

    info!("blogrs stopped gracefully");
    Ok(())
}

/// 等待 SIGINT / SIGTERM
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                error!("Unable to register SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
