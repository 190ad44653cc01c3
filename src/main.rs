use std::sync::Arc;

use axum::Router;
use pdf_mindmap::{
    api,
    app_state::AppState,
    config::AppConfig,
    llm::OpenAiCompletion,
    premium::LlamaParseClient,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Cargar configuración (.env incluido) e inicializar logging
    let cfg = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Backends externos: LLM y parser premium
    let completion = Arc::new(OpenAiCompletion::from_config(&cfg));
    let premium = Arc::new(LlamaParseClient::new(
        &cfg.llama_cloud_base_url,
        cfg.llama_poll_interval,
        cfg.llama_max_wait,
    ));

    // 3. Estado compartido y router
    let app_state = AppState::new(cfg.clone(), completion, premium);
    let mut app = api::create_router(app_state);

    match &cfg.static_dir {
        Some(dir) if dir.is_dir() => {
            info!("Sirviendo el frontend desde {}", dir.display());
            app = app.fallback_service(ServeDir::new(dir));
        }
        Some(dir) => warn!("STATIC_DIR {} no es un directorio; se ignora", dir.display()),
        None => {}
    }

    let app: Router = app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    // 4. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&cfg.server_addr).await?;
    info!("🚀 Servidor escuchando en http://{}", cfg.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
