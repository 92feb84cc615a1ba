use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use works_qtree_backend::{
    app_state::{mark_started, AppConfig, AppState, LogFormat},
    router::create_app_router,
    shutdown::shutdown_signal,
};

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "works_qtree_backend={level},tower_http={level},axum=info",
            level = config.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    mark_started();

    let config = AppConfig::from_env()?;
    init_tracing(&config);

    info!(
        environment = ?config.environment,
        backend = ?config.data_backend,
        "Starting works & q-trees backend"
    );

    let address = config.bind_address();
    let state = AppState::new(config).await?;
    let app = create_app_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!(address = %address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.graceful_shutdown().await;
    Ok(())
}
