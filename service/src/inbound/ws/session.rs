//! Per-connection WebSocket loop.
//!
//! The server pings every 5s and drops a client after 10s of silence; tests
//! shorten both. Each text frame is answered with exactly one reply frame,
//! and channel events queued on the outbox are written in between.

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

use crate::domain::TraceId;

use super::channels::{self, Outbox};
use super::rpc::RpcContext;
use super::state::WsState;

#[cfg(not(test))]
const PING_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const PING_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const IDLE_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const IDLE_TIMEOUT: Duration = Duration::from_millis(100);

/// Register the socket, serve it until it ends, then forget it.
pub(super) async fn serve_socket(
    state: WsState,
    socket_id: String,
    session: Session,
    stream: MessageStream,
) {
    let (outbox, inbox) = channels::outbox();
    state.sockets.add(&socket_id, session.clone()).await;
    info!(%socket_id, "websocket connected");

    let mut connection = Connection {
        state,
        socket_id,
        outbox,
        session,
        last_seen: Instant::now(),
    };
    let end = connection.pump(stream, inbox).await;
    connection.finish(end).await;
}

/// Why a connection loop stopped.
enum End {
    ClientClosed(Option<CloseReason>),
    StreamEnded,
    Idle,
    BadFrame(ProtocolError),
    SendFailed(Closed),
}

impl End {
    /// Close frame to send back, if the socket is still writable.
    fn close_reason(&self) -> Option<Option<CloseReason>> {
        match self {
            Self::ClientClosed(reason) => Some(reason.clone()),
            Self::Idle => Some(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            Self::BadFrame(_) => Some(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            Self::StreamEnded | Self::SendFailed(_) => None,
        }
    }
}

struct Connection {
    state: WsState,
    socket_id: String,
    outbox: Outbox,
    session: Session,
    last_seen: Instant,
}

impl Connection {
    async fn pump(
        &mut self,
        mut stream: MessageStream,
        mut inbox: mpsc::Receiver<String>,
    ) -> End {
        let mut pings = time::interval(PING_INTERVAL);
        loop {
            let step = tokio::select! {
                _ = pings.tick() => self.ping().await,
                frame = stream.recv() => match frame {
                    Some(Ok(message)) => self.receive(message).await,
                    Some(Err(error)) => Err(End::BadFrame(error)),
                    None => Err(End::StreamEnded),
                },
                Some(event) = inbox.recv() => self.session.text(event).await.map_err(End::SendFailed),
            };
            if let Err(end) = step {
                return end;
            }
        }
    }

    async fn ping(&mut self) -> Result<(), End> {
        if self.last_seen.elapsed() > IDLE_TIMEOUT {
            return Err(End::Idle);
        }
        self.session.ping(b"").await.map_err(End::SendFailed)
    }

    async fn receive(&mut self, message: Message) -> Result<(), End> {
        self.last_seen = Instant::now();
        match message {
            Message::Text(text) => TraceId::scope(TraceId::generate(), self.answer(&text)).await,
            Message::Ping(payload) => self.session.pong(&payload).await.map_err(End::SendFailed),
            Message::Close(reason) => Err(End::ClientClosed(reason)),
            Message::Binary(_) => {
                debug!(socket_id = %self.socket_id, "ignoring binary frame");
                Ok(())
            }
            Message::Pong(_) | Message::Continuation(_) | Message::Nop => Ok(()),
        }
    }

    async fn answer(&mut self, text: &str) -> Result<(), End> {
        let ctx = RpcContext {
            socket_id: &self.socket_id,
            outbox: &self.outbox,
            sockets: &self.state.sockets,
            channels: &self.state.channels,
        };
        let reply = match self.state.rpc.dispatch(&ctx, text).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(error = %error, "failed to encode rpc reply");
                return Ok(());
            }
        };
        self.session.text(reply).await.map_err(End::SendFailed)
    }

    async fn finish(self, end: End) {
        let socket_id = &self.socket_id;
        match &end {
            End::Idle => warn!(%socket_id, "websocket idle; closing"),
            End::BadFrame(error) => warn!(%socket_id, error = %error, "websocket protocol error"),
            End::SendFailed(error) => warn!(%socket_id, error = %error, "websocket send failed"),
            End::ClientClosed(_) | End::StreamEnded => {}
        }
        if let Some(reason) = end.close_reason() {
            if let Err(error) = self.session.close(reason).await {
                debug!(%socket_id, error = %error, "websocket already closed");
            }
        }
        self.state.channels.remove_socket(socket_id).await;
        self.state.sockets.remove(socket_id).await;
        info!(%socket_id, "websocket disconnected");
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
