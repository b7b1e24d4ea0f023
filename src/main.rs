use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use daylist_backend::api::router;
use daylist_backend::config::Config;
use daylist_backend::db::mysql::MySqlRepository;
use daylist_backend::state::AppState;
use daylist_backend::storage::s3::S3Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "daylist_backend=debug,tower_http=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let options = MySqlConnectOptions::new()
        .host(&config.database.host)
        .username(&config.database.user)
        .password(&config.database.password)
        .database(&config.database.database)
        .port(config.database.port)
        .ssl_mode(MySqlSslMode::Required);

    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let store = S3Store::connect(config.storage.bucket, config.storage.region).await;

    let state = AppState {
        repo: Arc::new(MySqlRepository::new(pool)),
        store: Arc::new(store),
    };

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
