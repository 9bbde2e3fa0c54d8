//! Inbound adapters: the REST surface and the WebSocket RPC endpoint.

pub mod http;
pub mod ws;
