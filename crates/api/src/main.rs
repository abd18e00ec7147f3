use std::net::SocketAddr;
use std::sync::Arc;

use api::{create_app, init_metrics, AppState};
use domain::attendance::CheckInWindow;
use events::LogPublisher;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Check for --migrate-only flag
    let migrate_only = std::env::args().any(|arg| arg == "--migrate-only");

    // Initialize Prometheus metrics
    let metrics_handle = init_metrics();
    tracing::info!("Prometheus metrics initialized");

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    // Create database pool
    let pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Database migrations complete");

    // Exit early if only running migrations
    if migrate_only {
        tracing::info!("Migration-only mode, exiting");
        return;
    }

    // Get remaining configuration
    let jwt_secret = std::env::var("JWT_SECRET").ok();
    let event_bus_name =
        std::env::var("EVENT_BUS_NAME").unwrap_or_else(|_| "scheduling-events".to_string());
    let check_in_window = CheckInWindow {
        before_minutes: env_minutes("CHECKIN_WINDOW_BEFORE_MINUTES", 15),
        after_minutes: env_minutes("CHECKIN_WINDOW_AFTER_MINUTES", 15),
    };

    // Create app state
    let publisher = Arc::new(LogPublisher::new(event_bus_name));
    let state = AppState::new(pool, jwt_secret, publisher, check_in_window, metrics_handle);

    // Create the app
    let app = create_app(state);

    // Get port from environment or default to 8080
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn env_minutes(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
