mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use blog_api::AppStateInner;
use blog_db::{Database, Gateway, Row, UsersGateway};

use crate::config::{AdminSeed, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog=debug,blog_db=debug,blog_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);
    if !config.foreign_keys {
        warn!("Foreign key enforcement disabled");
        db.set_foreign_keys(false)?;
    }

    if let Some(admin) = &config.admin {
        seed_admin(&UsersGateway::new(Arc::clone(&db)), admin)?;
    }

    let state = Arc::new(AppStateInner::new(db, config.jwt_secret.clone()));

    let app = blog_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Blog server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn seed_admin(users: &UsersGateway, admin: &AdminSeed) -> blog_db::Result<()> {
    let login = admin.login.to_ascii_lowercase();
    if users.fetch_where("login", login.as_str())?.is_some() {
        return Ok(());
    }

    let id = users.insert(
        Row::new()
            .with("login", login)
            .with("password", admin.password.as_str())
            .with("username", admin.name.as_str()),
    )?;
    info!("Seeded admin user {} ({})", admin.login, id);
    Ok(())
}
