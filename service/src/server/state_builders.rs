//! Builds the shared adapter state from resolved settings.

use std::sync::Arc;

use actix_web::web;
use tracing::info;

use crate::inbound::http::health::HealthState;
use crate::inbound::http::spec::SpecDocument;
use crate::inbound::http::state::HttpState;
use crate::inbound::ws::WsState;
use crate::outbound::InMemoryTaskRepository;
use crate::outbound::persistence::Database;
use crate::settings::ServiceSettings;

use super::ServerError;

/// Everything the application factory clones into each worker.
#[derive(Clone)]
pub struct AppState {
    /// Liveness and readiness flags.
    pub health: web::Data<HealthState>,
    /// Task handlers' dependencies.
    pub http: web::Data<HttpState>,
    /// Sockets, channels and RPC methods.
    pub ws: web::Data<WsState>,
    /// Lazily connected database container.
    pub database: web::Data<Database>,
    /// Rendered OpenAPI document.
    pub spec: web::Data<SpecDocument>,
    /// Settings the state was built from.
    pub settings: ServiceSettings,
}

impl AppState {
    /// Assemble adapter state; the database pool is created lazily.
    ///
    /// # Errors
    ///
    /// Fails when the pool bounds are invalid or the OpenAPI document cannot
    /// be rendered.
    pub fn build(settings: &ServiceSettings) -> Result<Self, ServerError> {
        let pool = settings.pool_config()?;
        if let Some(pool) = &pool {
            info!(database = %pool.redacted_url(), "database configured");
        }
        let http = HttpState::new(
            settings.error_messages().clone(),
            settings.pagination_limits(),
            Arc::new(InMemoryTaskRepository::new()),
        );
        let ws = WsState::default();
        info!(methods = ?ws.rpc.names(), "rpc methods registered");
        Ok(Self {
            health: web::Data::new(HealthState::new()),
            http: web::Data::new(http),
            ws: web::Data::new(ws),
            database: web::Data::new(Database::new(pool)),
            spec: web::Data::new(SpecDocument::build()?),
            settings: settings.clone(),
        })
    }

    /// Fail probes, close every socket and release the pool.
    pub async fn shutdown(&self) {
        self.health.mark_unhealthy();
        self.ws.sockets.close_all().await;
        self.database.close().await;
        info!("shutdown complete");
    }
}
