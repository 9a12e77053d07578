use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slide_library::{
    api,
    asset_store::{self as assets, AssetStore},
    auth::GoogleAuth,
    catalog::{CatalogStore, LocalCatalog, SheetsCatalog},
    config::{AssetBackend, CatalogBackend, Config},
    library::Library,
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "slide-library starting");

    let config = Config::load()?;

    // One authenticated client shared by every Google backend. A failure here
    // stops startup: nothing can be read or written without it.
    let auth = if config.needs_google_auth() {
        let source = GoogleAuth::source_from(config.credentials_file.as_deref());
        let auth = GoogleAuth::new(source, &config.google_scopes()).await?;
        info!(scopes = ?config.google_scopes(), "Authenticated with Google");
        Some(Arc::new(auth))
    } else {
        None
    };
    let google = || {
        auth.clone()
            .ok_or_else(|| anyhow::anyhow!("Google credentials required by configuration"))
    };

    // Initialize catalog backend
    let catalog: Arc<dyn CatalogStore> = match config.catalog.backend {
        CatalogBackend::Sheets => {
            info!(sheet_id = %config.catalog.sheet_id, "Using Google Sheets catalog");
            Arc::new(SheetsCatalog::new(google()?)?)
        }
        CatalogBackend::Local => {
            let store = LocalCatalog::open(&config.catalog.data_dir)?;
            store.ensure_header(
                &config.catalog.sheet_id,
                &config.catalog.append_range,
                &config.catalog.row_layout.headers(),
            )?;
            info!("Using local catalog at: {}", config.catalog.data_dir);
            Arc::new(store)
        }
    };

    // Initialize asset store backend
    let mut local_assets = None;
    let asset_store: Arc<dyn AssetStore> = match config.assets.backend {
        AssetBackend::Drive => {
            info!(folder = ?config.assets.destination, "Using Google Drive asset backend");
            Arc::new(assets::DriveStore::new(google()?, config.assets.share_publicly)?)
        }
        AssetBackend::Gcs => {
            let bucket = config
                .assets
                .gcs_bucket
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("GCS_BUCKET is required when ASSET_BACKEND=gcs"))?;
            info!("Using GCS asset backend, bucket: {}", bucket);
            Arc::new(assets::GcsStore::new(
                google()?,
                bucket,
                config.assets.share_publicly,
            )?)
        }
        AssetBackend::Local => {
            let store = Arc::new(assets::LocalStore::new(
                &config.assets.local_storage_path,
                &config.assets.public_base_url,
            )?);
            info!(
                "Using local asset backend at: {}",
                config.assets.local_storage_path
            );
            local_assets = Some(Arc::clone(&store));
            store
        }
    };

    if config.policy.append_on_upload_failure {
        info!(
            placeholder = %config.policy.placeholder_link,
            "Entries are recorded even when the upload fails"
        );
    }

    let library = Library::new(
        catalog,
        asset_store,
        config.catalog.clone(),
        config.assets.destination.clone(),
        config.policy.clone(),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        library,
        local_assets,
    });

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on: {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
