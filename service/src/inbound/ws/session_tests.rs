//! WebSocket session handler tests.

use super::*;
use crate::inbound::ws;
use actix_web::{App, HttpServer, dev::Server, dev::ServerHandle, web};
use awc::{BoxedSocket, ws::Codec, ws::Frame, ws::Message};
use futures_util::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

#[fixture]
async fn running_server() -> (String, Server, WsState) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let ws_state = WsState::default();
    let app_state = ws_state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .service(ws::ws_entry)
    })
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    (format!("http://{addr}"), server, ws_state)
}

async fn connect(url: &str) -> Socket {
    let (_resp, socket) = awc::Client::default()
        .ws(format!("{url}/ws"))
        .connect()
        .await
        .expect("websocket connect");
    socket
}

#[fixture]
async fn ws_client(
    #[future] running_server: (String, Server, WsState),
) -> (Socket, String, ServerHandle, WsState) {
    let (url, server, state) = running_server.await;
    let handle = server.handle();
    actix_web::rt::spawn(server);
    let socket = connect(&url).await;
    (socket, url, handle, state)
}

/// Next text frame as JSON, answering server pings on the way.
async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json"),
            Frame::Ping(payload) => socket
                .send(Message::Pong(payload))
                .await
                .expect("send pong"),
            Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

/// Skip heartbeats without answering them and return the close reason.
async fn close_frame(socket: &mut Socket) -> Option<CloseReason> {
    while let Some(frame) = socket.next().await {
        match frame.expect("frame") {
            Frame::Ping(_) | Frame::Pong(_) => {}
            Frame::Close(reason) => return reason,
            other => panic!("unexpected frame before close: {other:?}"),
        }
    }
    None
}

async fn call(socket: &mut Socket, frame: Value) -> Value {
    socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("send text");
    next_json(socket).await
}

#[rstest]
#[actix_rt::test]
async fn answers_rpc_calls(#[future] ws_client: (Socket, String, ServerHandle, WsState)) {
    let (mut socket, _url, _server, _state) = ws_client.await;
    let reply = call(
        &mut socket,
        json!({ "id": "1", "method": "echo", "payload": { "x": 1 } }),
    )
    .await;
    assert_eq!(reply, json!({ "id": "1", "method": "echo", "response": { "x": 1 } }));
}

#[rstest]
#[actix_rt::test]
async fn malformed_frames_keep_the_connection_open(
    #[future] ws_client: (Socket, String, ServerHandle, WsState),
) {
    let (mut socket, _url, _server, _state) = ws_client.await;
    socket
        .send(Message::Text("not-json".into()))
        .await
        .expect("send text");
    let reply = next_json(&mut socket).await;
    assert_eq!(reply, json!({ "error": { "message": "JSON string expected" } }));

    let reply = call(&mut socket, json!({ "id": "2", "method": "server_info" })).await;
    assert_eq!(reply["response"]["sockets"], 1);
}

#[rstest]
#[actix_rt::test]
async fn binary_frames_are_ignored(#[future] ws_client: (Socket, String, ServerHandle, WsState)) {
    let (mut socket, _url, _server, _state) = ws_client.await;
    socket
        .send(Message::Binary(vec![0xde, 0xad, 0xbe, 0xef].into()))
        .await
        .expect("send binary");

    let reply = call(
        &mut socket,
        json!({ "id": "3", "method": "echo", "payload": { "still": "here" } }),
    )
    .await;
    assert_eq!(reply["id"], "3");
    assert_eq!(reply["response"], json!({ "still": "here" }));
}

#[rstest]
#[actix_rt::test]
async fn oversized_frames_close_with_a_protocol_error(
    #[future] ws_client: (Socket, String, ServerHandle, WsState),
) {
    let (mut socket, _url, _server, _state) = ws_client.await;
    socket
        .send(Message::Text("x".repeat(128 * 1024).into()))
        .await
        .expect("send oversized text");

    let reason = close_frame(&mut socket).await.expect("close reason");
    assert_eq!(reason.code, CloseCode::Protocol);
}

#[rstest]
#[actix_rt::test]
async fn channel_events_reach_other_sockets(
    #[future] ws_client: (Socket, String, ServerHandle, WsState),
) {
    let (mut publisher, url, _server, _state) = ws_client.await;
    let mut subscriber = connect(&url).await;

    let reply = call(
        &mut subscriber,
        json!({ "id": "s", "method": "subscribe", "payload": { "channel": "news", "event": "hello" } }),
    )
    .await;
    assert_eq!(reply["response"]["event"], "hello");

    let reply = call(
        &mut publisher,
        json!({
            "id": "p",
            "method": "publish",
            "payload": { "channel": "news", "event": "hello", "data": "world" }
        }),
    )
    .await;
    assert_eq!(reply["response"]["delivered"], 1);

    let event = next_json(&mut subscriber).await;
    assert_eq!(event, json!({ "channel": "news", "event": "hello", "data": "world" }));
}

#[rstest]
#[actix_rt::test]
async fn disconnects_forget_the_socket(
    #[future] ws_client: (Socket, String, ServerHandle, WsState),
) {
    let (mut socket, _url, _server, state) = ws_client.await;
    call(
        &mut socket,
        json!({ "id": "s", "method": "subscribe", "payload": { "channel": "news" } }),
    )
    .await;
    assert_eq!(state.sockets.count().await, 1);

    socket
        .send(Message::Close(None))
        .await
        .expect("send close");
    drop(socket);

    tokio::time::timeout(Duration::from_secs(2), async {
        while state.sockets.count().await > 0 || !state.channels.names().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("socket cleaned up");
}

#[rstest]
#[actix_rt::test]
async fn shutdown_closes_every_socket(
    #[future] ws_client: (Socket, String, ServerHandle, WsState),
) {
    let (mut socket, _url, _server, state) = ws_client.await;
    call(&mut socket, json!({ "id": "1", "method": "server_info" })).await;
    state.sockets.close_all().await;

    let reason = close_frame(&mut socket).await.expect("close reason");
    assert_eq!(reason.code, CloseCode::Away);
}

#[rstest]
#[actix_rt::test]
async fn silent_clients_are_dropped(#[future] ws_client: (Socket, String, ServerHandle, WsState)) {
    let (mut socket, _url, _server, _state) = ws_client.await;
    let close = tokio::time::timeout(IDLE_TIMEOUT * 20, close_frame(&mut socket))
        .await
        .expect("idle socket closed in time")
        .expect("close reason");

    assert_eq!(close.code, CloseCode::Normal);
    assert_eq!(close.description.as_deref(), Some("heartbeat timeout"));
}
