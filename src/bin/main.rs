use actix_web::middleware::Logger;
use actix_web::{web, HttpServer};
use tracing_subscriber::EnvFilter;

use gazette::config::Settings;
use gazette::core::db::{init_demo_data, setup_database};
use gazette::models::SessionRepo;
use gazette::{build_app, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gazette=info,actix_web=info")),
        )
        .init();

    let settings = Settings::from_env();
    let pool = setup_database(&settings).await?;

    if settings.seed_demo {
        init_demo_data(&pool).await?;
    }
    let purged = SessionRepo::purge_expired(&pool, settings.session_hours).await?;
    if purged > 0 {
        tracing::info!(purged, "expired sessions removed");
    }

    tokio::fs::create_dir_all(&settings.media_dir).await?;

    let bind_addr = settings.bind_addr.clone();
    let state = web::Data::new(AppState::new(pool, settings));

    tracing::info!("Server listening on http://{}", bind_addr);

    HttpServer::new(move || build_app(state.clone()).wrap(Logger::default()))
        .bind(&bind_addr)?
        .run()
        .await?;

    Ok(())
}
