use std::{process, sync::Arc};

use blogboard::{
    application::{
        error::AppError,
        services::{AppServices, ServiceLimits},
    },
    config,
    infra::{
        db::DocumentRepositories,
        error::InfraError,
        http::{self, ApiState, ListingDefaults},
        identity::StoreIdentityProvider,
        media::FsImageStore,
        store::memory::MemoryDocumentStore,
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = Arc::new(load_store(&settings).await?);
    let repositories = Arc::new(DocumentRepositories::new(store.clone()));
    let images = Arc::new(
        FsImageStore::new(
            settings.media.directory.clone(),
            &settings.media.public_base_url,
        )
        .map_err(|err| AppError::from(InfraError::from(err)))?,
    );

    let services = AppServices::new(
        repositories,
        Arc::new(StoreIdentityProvider::new(store.clone())),
        images.clone(),
        ServiceLimits {
            max_image_bytes: settings.media.max_image_bytes,
            min_password_length: settings.auth.min_password_length,
        },
    )
    .with_admin_emails(settings.auth.admin_emails.clone());
    let state = ApiState {
        services,
        images,
        listing: ListingDefaults {
            posts_per_page: settings.listing.posts_per_page,
            admin_posts_per_page: settings.listing.admin_posts_per_page,
            comments_per_page: settings.listing.comments_per_page,
        },
    };

    let result = serve_http(&settings, state).await;

    if let Some(path) = settings.store.snapshot_path.as_ref() {
        match store.save_snapshot(path).await {
            Ok(()) => info!(path = %path.display(), "store snapshot saved"),
            Err(err) => {
                error!(path = %path.display(), error = %err, "store snapshot could not be saved");
                result?;
                return Err(AppError::from(InfraError::store(err.to_string())));
            }
        }
    }

    result
}

async fn load_store(settings: &config::Settings) -> Result<MemoryDocumentStore, AppError> {
    match settings.store.snapshot_path.as_ref() {
        Some(path) => {
            let store = MemoryDocumentStore::load_snapshot(path)
                .await
                .map_err(|err| AppError::from(InfraError::store(err.to_string())))?;
            info!(path = %path.display(), "store snapshot loaded");
            Ok(store)
        }
        None => Ok(MemoryDocumentStore::new()),
    }
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let body_limit = http::body_limit_for(settings.media.max_image_bytes);
    let router = http::build_router(state, body_limit);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    let shutdown = Arc::new(Notify::new());
    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { server_shutdown.notified().await })
            .await
    });

    tokio::select! {
        joined = &mut server => return flatten_server_result(joined),
        () = shutdown_signal() => {}
    }

    info!("shutdown requested, draining connections");
    shutdown.notify_one();
    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(joined) => flatten_server_result(joined),
        Err(_) => {
            warn!(
                timeout_secs = settings.server.graceful_shutdown.as_secs(),
                "graceful shutdown timed out"
            );
            Ok(())
        }
    }
}

fn flatten_server_result(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::from(InfraError::from(err))),
        Err(err) => Err(AppError::unexpected(format!("server error: {err}"))),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
