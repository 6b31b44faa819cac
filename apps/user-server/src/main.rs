// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process::ExitCode, sync::Arc};

use orion_user_server::{
    api::router,
    auth::TrustClassifier,
    config::ServiceConfig,
    programs::HttpProgramDirectory,
    state::AppState,
    store::InMemoryStore,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(config.log_format) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    if config.service_token.is_none() {
        tracing::warn!("GATEWAY_SERVICE_TOKEN is not set; service-to-service calls are disabled");
    }

    let programs = match HttpProgramDirectory::new(&config.program_service) {
        Ok(programs) => programs,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build Program service client");
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(InMemoryStore::with_default_roles())
        .with_classifier(TrustClassifier::new(
            config.public_paths.clone(),
            config.service_token.clone(),
        ))
        .with_programs(Arc::new(programs))
        .with_user_settings(config.users.clone());
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.bind_addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        addr = %config.bind_addr,
        program_service = %config.program_service.base_url,
        "Orion user service listening (docs at /docs)"
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shut down");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
