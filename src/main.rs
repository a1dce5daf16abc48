//! Music Catalog - a catalog API for artists, tracks and playlists
//!
//! Artists and their top tracks can be imported from the Spotify Web API.

mod api;
mod config;
mod core;
mod db;
mod error;
mod models;
mod plugins;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::api::AppState;
use crate::config::Settings;
use crate::db::DbEngine;
use crate::plugins::spotify::SpotifyClient;

/// Music Catalog API server
#[derive(Parser, Debug)]
#[command(name = "music-catalog")]
#[command(version)]
#[command(about = "A music catalog API with Spotify top-track import")]
struct Args {
    /// Host address to bind to (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Path to a settings file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("{},sqlx=warn,hyper=warn", log_level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("Music Catalog v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }

    start_server(settings).await
}

async fn start_server(settings: Settings) -> Result<()> {
    let jwt = settings.jwt()?;

    info!("Opening database {}", settings.database_url);
    let db = DbEngine::connect(&settings.database_url).await?;

    let spotify = settings.spotify();
    if spotify.client_id.is_empty() || spotify.client_secret.is_empty() {
        tracing::warn!("Spotify credentials are not set, imports will fail");
    }
    let catalog = SpotifyClient::new(&spotify)?;

    let state = actix_web::web::Data::new(AppState {
        db,
        jwt,
        catalog: Arc::new(catalog),
    });

    let addr = format!("{}:{}", settings.host, settings.port);
    info!("Server listening on http://{}", addr);

    use actix_cors::Cors;
    use actix_web::{middleware, App, HttpServer};

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(api::json_config())
            .app_data(api::query_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(api::configure)
    })
    .bind(&addr)
    .with_context(|| format!("Failed to bind {}", addr))?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
