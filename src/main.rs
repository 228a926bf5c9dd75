//! game-chapters-back binary entrypoint wiring the REST API, the image relay and storage.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use game_chapters_back::{
    config::AppConfig,
    dao::{
        game_store::{GameStore, memory::MemoryGameStore},
        storage::StorageError,
    },
    routes,
    services::{
        image_relay::{ImageRelay, ImgbbClient},
        storage_supervisor,
    },
    state::{AppState, SharedState},
};

const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";

#[derive(Debug, Clone, Copy)]
enum Backend {
    #[cfg(feature = "mongo-store")]
    Mongo,
    #[cfg(feature = "couch-store")]
    Couch,
    Memory,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let backend = select_backend()?;
    info!(?backend, ?config, "starting with configuration");

    let http = reqwest::Client::builder()
        .build()
        .context("building HTTP client")?;
    let image_host = ImgbbClient::new(http, config.image_host_endpoint.as_str());
    let relay = ImageRelay::new(Arc::new(image_host), config.imgbb_api_key.clone());
    let app_state = AppState::new(config, relay);

    spawn_storage(app_state.clone(), backend).await;
    let app = routes::router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Read `STORAGE_BACKEND`, defaulting to the first compiled-in database.
fn select_backend() -> anyhow::Result<Backend> {
    let requested = env::var(STORAGE_BACKEND_ENV)
        .ok()
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    let backend = match requested.as_deref() {
        #[cfg(feature = "mongo-store")]
        None | Some("mongo") | Some("mongodb") => Backend::Mongo,
        #[cfg(all(not(feature = "mongo-store"), feature = "couch-store"))]
        None => Backend::Couch,
        #[cfg(not(any(feature = "mongo-store", feature = "couch-store")))]
        None => Backend::Memory,
        #[cfg(feature = "couch-store")]
        Some("couch") | Some("couchdb") => Backend::Couch,
        Some("memory") => Backend::Memory,
        Some(other) => bail!("unsupported {STORAGE_BACKEND_ENV} `{other}`"),
    };
    Ok(backend)
}

/// Install the memory store directly, or hand database backends to the supervisor.
async fn spawn_storage(state: SharedState, backend: Backend) {
    match backend {
        #[cfg(feature = "mongo-store")]
        Backend::Mongo => {
            use game_chapters_back::dao::game_store::mongodb::{MongoConfig, MongoGameStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoGameStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStore>)
            }));
        }
        #[cfg(feature = "couch-store")]
        Backend::Couch => {
            use game_chapters_back::dao::game_store::couchdb::{CouchConfig, CouchGameStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = CouchConfig::from_env()?;
                let store = CouchGameStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStore>)
            }));
        }
        Backend::Memory => {
            info!("using in-memory storage; data is lost on restart");
            state.set_game_store(Arc::new(MemoryGameStore::new())).await;
        }
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
