use migration::{Migrator, MigratorTrait};
use sea_orm::ConnectOptions;
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "fintrack={level},server={level},engine={level},tower_http={level}",
            level = settings.app.level
        ))
        .init();

    // The secret is read once here; rotating it requires a restart and
    // invalidates every outstanding session.
    let tokens = engine::TokenIssuer::new(settings.auth.jwt_secret.as_bytes()).inspect_err(
        |err| tracing::error!("invalid auth settings: {err}"),
    )?;

    let db = parse_database(&settings.server.database)
        .await
        .inspect_err(|err| tracing::error!("failed to initialize database: {err}"))?;

    let engine = engine::Engine::builder()
        .database(db)
        .token_issuer(tokens)
        .build()
        .await?;

    let listener =
        tokio::net::TcpListener::bind((settings.server.bind.as_str(), settings.server.port))
            .await
            .inspect_err(|err| tracing::error!("failed to bind server listener: {err}"))?;

    server::run_with_listener(engine, listener).await?;
    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let mut options = match config {
        Database::Memory => ConnectOptions::new("sqlite::memory:"),
        Database::Sqlite(path) => ConnectOptions::new(format!("sqlite:{}?mode=rwc", path)),
    };
    if matches!(config, Database::Memory) {
        // Every pooled connection would otherwise get its own empty database.
        options.max_connections(1);
    }
    options.sqlx_logging(false);

    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
