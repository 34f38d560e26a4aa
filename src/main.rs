// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{Context, Result};
use clap::Parser;
use docsearch::app::{create_router, AppState, VERSION};
use docsearch::config::Settings;
use docsearch::services::elasticsearch::ElasticsearchEngine;
use docsearch::services::engine::SearchEngine;
use docsearch::services::logging::init_tracing;
use docsearch::services::search::SearchClient;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real environment variables still apply
    let _ = dotenvy::dotenv();

    let settings = Settings::parse();
    init_tracing();

    tracing::info!(version = VERSION, "Starting docsearch");

    let engine: Arc<dyn SearchEngine> = Arc::new(
        ElasticsearchEngine::new(&settings.elasticsearch())
            .context("Failed to configure Elasticsearch client")?,
    );

    // The service must not accept traffic without a working engine connection
    let search_client = SearchClient::connect(engine, settings.default_index.clone())
        .await
        .context("Failed to connect to Elasticsearch")?;

    let info = search_client
        .info()
        .await
        .context("Failed to read Elasticsearch cluster info")?;
    tracing::info!(
        cluster = %info.cluster_name,
        version = %info.version,
        "Elasticsearch cluster reachable"
    );

    search_client
        .ensure_index(None)
        .await
        .with_context(|| format!("Failed to prepare index '{}'", settings.default_index))?;

    let search_client = Arc::new(search_client);
    let app = create_router(AppState::new(search_client.clone()));

    let addr = settings.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(%addr, "docsearch v{} listening", VERSION);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Shutting down");
    // Last reference to the engine handle; its connection pool closes here
    drop(search_client);
    tracing::info!("Search engine connection closed");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
