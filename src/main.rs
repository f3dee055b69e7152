use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bibliolend::config::{Config, LibraryConfig};
use bibliolend::infrastructure::{AppState, SeaOrmKeyValueStore};
use bibliolend::{db, seed, server};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bibliolend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize database
    let db = db::init_db(&config.database_url)
        .await
        .expect("Failed to initialize database");
    let store = Arc::new(SeaOrmKeyValueStore::new(db));

    let library_config = LibraryConfig::load_or_fallback(&config.library_config_source).await;
    tracing::info!(
        "User code prefix: {}",
        library_config.user_code_prefix
    );

    let state = AppState::new(store, &config, library_config)
        .expect("Failed to initialize application state");

    if config.seed_demo {
        tracing::info!("Seeding demo data...");
        match seed::seed_demo_data(&state.repo, &state.library_config).await {
            Ok(true) => tracing::info!("Demo data seeded successfully."),
            Ok(false) => {}
            Err(e) => tracing::error!("Failed to seed data: {}", e),
        }
    }

    let app = server::build_router(state, &config.cors_allowed_origins);

    // Find available port
    let port = server::find_available_port(config.port).expect("Failed to find available port");
    if port != config.port {
        tracing::warn!(
            "Preferred port {} was not available, using port {} instead",
            config.port,
            port
        );
    }

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("bibliolend server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
