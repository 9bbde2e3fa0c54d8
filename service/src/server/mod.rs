//! Server construction and middleware wiring.

mod state_builders;

pub use state_builders::AppState;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::{info, warn};

use crate::Trace;
use crate::inbound::http::error::{json_config, query_config};
use crate::inbound::http::health::{live, ready};
use crate::inbound::http::{spec, tasks};
use crate::inbound::ws;
use crate::outbound::persistence::PoolError;

/// Failures while starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Pool bounds were rejected.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// The OpenAPI document could not be rendered.
    #[error("failed to render the OpenAPI document: {0}")]
    Spec(#[from] serde_json::Error),
    /// Binding or running the listener failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The application with every route, extractor config and middleware.
pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppState {
        health,
        http,
        ws: ws_state,
        database,
        spec: document,
        settings,
    } = state;
    let messages = settings.error_messages().clone();

    App::new()
        .app_data(json_config(messages.clone()))
        .app_data(query_config(messages))
        .app_data(health)
        .app_data(http)
        .app_data(ws_state)
        .app_data(database)
        .app_data(document)
        .wrap(Trace)
        .route(settings.spec_route(), web::get().to(spec::spec))
        .configure(tasks::configure)
        .service(ws::ws_entry)
        .service(ready)
        .service(live)
}

/// Bind the configured address and mark the service ready.
///
/// Signal handling is left to [`run`], which closes sockets before the
/// listener drains.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(state: AppState) -> std::io::Result<Server> {
    let bind_addr = state.settings.bind_addr();
    let factory_state = state.clone();
    let server = HttpServer::new(move || build_app(factory_state.clone()))
        .bind(&bind_addr)?
        .disable_signals()
        .run();

    info!(host = %bind_addr.0, port = bind_addr.1, "listening");
    state.health.mark_ready();
    Ok(server)
}

/// Serve until SIGINT or SIGTERM, then shut down gracefully.
///
/// # Errors
///
/// Returns a [`ServerError`] when binding or running the listener fails.
pub async fn run(state: AppState) -> Result<(), ServerError> {
    let server = create_server(state.clone())?;
    let handle = server.handle();
    let shutdown_state = state.clone();
    actix_web::rt::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested");
        shutdown_state.shutdown().await;
        handle.stop(true).await;
    });
    server.await?;
    state.database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(error) => warn!(error = %error, "SIGTERM handler unavailable"),
        }
    }
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
