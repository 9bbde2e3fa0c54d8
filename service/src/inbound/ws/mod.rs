//! WebSocket inbound adapter speaking the JSON RPC protocol.
//!
//! Responsibilities:
//! - upgrade `/ws` requests and assign each connection a socket id
//! - run the per-connection session loop on the actix runtime
//! - route RPC calls to [`rpc::RpcRegistry`] and fan out channel events

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha224};
use tracing::error;

mod session;

pub mod channels;
pub mod messages;
pub mod rpc;
pub mod sockets;
pub mod state;

pub use state::WsState;

/// Hex SHA-224 of `"<remote> - <started>"`.
pub fn socket_id(remote: &str, started: DateTime<Utc>) -> String {
    let key = format!(
        "{remote} - {}",
        started.to_rfc3339_opts(SecondsFormat::Micros, true)
    );
    hex::encode(Sha224::digest(key.as_bytes()))
}

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorBadRequest("Unable to open websocket connection")
    })?;

    let remote = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_owned();
    let id = socket_id(&remote, Utc::now());
    let state = state.get_ref().clone();
    actix_web::rt::spawn(session::serve_socket(state, id, session, messages));
    Ok(response)
}
