use std::{process, sync::Arc, time::Duration};

use tagfeed::{
    application::error::AppError,
    application::upstream::PostsSource,
    cache::{CacheConfig, CacheState},
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        upstream::HatchwaysClient,
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
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to load configuration: {err}"
        )))
    })?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let client = HatchwaysClient::new(&settings.upstream)?;
    let source: Arc<dyn PostsSource> = Arc::new(client);

    let cache = settings
        .cache
        .enabled
        .then(|| CacheState::new(CacheConfig::from(&settings.cache)));

    info!(
        upstream = %settings.upstream.base_url,
        cache_enabled = cache.is_some(),
        cache_ttl_secs = settings.cache.ttl.as_secs(),
        "starting aggregation server"
    );

    let router = http::build_router(HttpState::new(source, cache));
    serve_http(&settings.server, router).await
}

async fn serve_http(
    server: &config::ServerSettings,
    router: axum::Router,
) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %server.addr, "listening");

    let stop = Arc::new(Notify::new());
    let stopped = Arc::clone(&stop);
    let serving = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { stopped.notified().await })
        .into_future();
    let mut serving = std::pin::pin!(serving);

    tokio::select! {
        result = &mut serving => {
            return result.map_err(|err| AppError::from(InfraError::from(err)));
        }
        () = shutdown_signal() => {}
    }

    info!(
        grace_secs = server.graceful_shutdown.as_secs(),
        "shutdown requested, draining connections"
    );
    stop.notify_one();

    drain(serving, server.graceful_shutdown).await
}

async fn drain<F>(serving: F, grace: Duration) -> Result<(), AppError>
where
    F: Future<Output = std::io::Result<()>>,
{
    match tokio::time::timeout(grace, serving).await {
        Ok(result) => result.map_err(|err| AppError::from(InfraError::from(err))),
        Err(_) => {
            warn!(
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out, dropping open connections"
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
