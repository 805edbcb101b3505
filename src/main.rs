use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use network_backend::{
    config::settings::Settings,
    router,
    store::PgStore,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("network_backend=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;

    let app_state = match settings.database_url.as_deref() {
        Some(database_url) => {
            let store = PgStore::connect(database_url, settings.database_max_connections).await?;
            info!("database connected");
            if settings.run_migrations {
                store.migrate().await?;
                info!("migrations applied");
            }
            AppState::new(store, settings.clone())
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            AppState::in_memory(settings.clone())
        }
    };

    let app = router(app_state);

    info!("Server running on http://localhost:{}", settings.port);

    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
