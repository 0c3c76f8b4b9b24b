use std::sync::Arc;

use brainbuddy::config::Config;
use brainbuddy::gateway::Gateway;
use brainbuddy::session::SessionTable;
use brainbuddy::store::PgStore;
use brainbuddy::streak::SystemClock;
use brainbuddy::transcript::TranscriptFetcher;
use brainbuddy::{app, AppState};
use clap::{Arg, Command};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::{TcpListener, UnixListener};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("brainbuddy=info,tower_http=info")),
        )
        .init();

    let matches = Command::new("brainbuddy-server")
        .about("BrainBuddy API server")
        .arg(
            Arg::new("port")
                .default_value("8090")
                .value_parser(clap::value_parser!(u16))
                .help("TCP port to listen on"),
        )
        .arg(
            Arg::new("unix")
                .long("unix")
                .value_name("PATH")
                .help("Listen on a Unix socket instead of a TCP port"),
        )
        .get_matches();

    let config = Config::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    info!("Database ready");

    if !config.gemini.is_configured() {
        warn!("GEMINI_API_KEY is not set; generative endpoints will serve fallback content");
    }

    let state = AppState {
        store: Arc::new(PgStore::new(db.clone())),
        identity: Arc::new(SessionTable::new(db)),
        gateway: Gateway::from_config(&config.gemini),
        clock: Arc::new(SystemClock),
        transcripts: TranscriptFetcher::new()?,
    };

    let frontend = config
        .frontend_dir
        .is_dir()
        .then_some(config.frontend_dir.as_path());
    if frontend.is_none() {
        warn!(dir = %config.frontend_dir.display(), "front-end directory not found; serving the API only");
    }

    let app = app(state, frontend);
    info!("Initialized routes");

    if let Some(socket_path) = matches.get_one::<String>("unix") {
        // delete the file before binding
        tokio::fs::remove_file(socket_path).await.ok();
        let listener = UnixListener::bind(socket_path)?;

        info!("Starting server on Unix socket: {}", socket_path);
        axum::serve(listener, app.into_make_service()).await?;
    } else {
        let port = matches.get_one::<u16>("port").copied().unwrap_or(8090);
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;

        info!("Starting server on port {}", port);
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}
