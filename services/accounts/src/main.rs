use std::sync::Arc;

use anyhow::Context;
use sea_orm::Database;
use tracing::info;

use tessera_core::config::Config;
use tessera_core::tracing::init_tracing;
use tessera_proto::account::account_service_server::AccountServiceServer;

use tessera_accounts::config::AccountsConfig;
use tessera_accounts::consumer::{ConfirmationConsumer, ConfirmationTopic};
use tessera_accounts::grpc_server::AccountsGrpcServer;
use tessera_accounts::infra::db::DbCoordinator;
use tessera_accounts::infra::kafka::spawn_confirmation_worker;
use tessera_accounts::router::build_router;
use tessera_accounts::state::AppState;
use tessera_accounts::usecase::Registry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AccountsConfig::from_env().context("failed to load configuration")?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let registry = Arc::new(Registry::new(DbCoordinator { db }));
    let state = AppState::new(Arc::clone(&registry));

    // Confirmation consumers
    let consumer = Arc::new(ConfirmationConsumer::new(Arc::clone(&registry)));
    for topic in ConfirmationTopic::ALL {
        spawn_confirmation_worker(
            config.kafka_brokers.clone(),
            config.app_name.clone(),
            topic,
            Arc::clone(&consumer),
        );
    }

    // gRPC server
    let grpc_server = AccountsGrpcServer {
        state: state.clone(),
    };
    let grpc_addr: std::net::SocketAddr = format!("0.0.0.0:{}", config.accounts_grpc_port)
        .parse()
        .context("invalid gRPC address")?;
    let grpc_timeout = config.request_timeout();
    tokio::spawn(async move {
        info!("accounts gRPC server listening on {grpc_addr}");
        if let Err(e) = tonic::transport::Server::builder()
            .timeout(grpc_timeout)
            .add_service(AccountServiceServer::new(grpc_server))
            .serve(grpc_addr)
            .await
        {
            tracing::error!(error = %e, "gRPC server error");
        }
    });

    // HTTP server
    let router = build_router(state, config.request_timeout());
    let http_addr = format!("0.0.0.0:{}", config.accounts_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    info!("accounts service listening on {http_addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
