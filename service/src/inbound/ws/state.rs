//! Shared WebSocket adapter state.

use std::sync::Arc;

use super::channels::Channels;
use super::rpc::RpcRegistry;
use super::sockets::Sockets;

/// Dependency bundle shared by every WebSocket session.
#[derive(Debug, Clone)]
pub struct WsState {
    /// Connected sessions.
    pub sockets: Arc<Sockets>,
    /// Pub/sub subscriptions.
    pub channels: Arc<Channels>,
    /// Callable methods.
    pub rpc: Arc<RpcRegistry>,
}

impl WsState {
    /// State answering calls with `rpc`.
    pub fn new(rpc: RpcRegistry) -> Self {
        Self {
            sockets: Arc::new(Sockets::new()),
            channels: Arc::new(Channels::new()),
            rpc: Arc::new(rpc),
        }
    }
}

impl Default for WsState {
    fn default() -> Self {
        Self::new(RpcRegistry::with_builtins())
    }
}
