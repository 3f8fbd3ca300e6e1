use std::net::SocketAddr;

use anyhow::Result;
use medicheck_api::{build_app, ApiConfig};
use medicheck_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("medicheck_api");

    let config = ApiConfig::from_env();
    let app = build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(
        bind = %config.bind,
        model = %config.ollama.model,
        ollama_url = %config.ollama.base_url,
        persistent = config.database_url.is_some(),
        trust_forwarded = config.trust_forwarded,
        "medicheck api started"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
