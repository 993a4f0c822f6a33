use crate::state::AppState;
use crate::websocket::message_types::{
    ClientFrame, ConnectionState, ServerFrame, UNKNOWN_MESSAGE_TYPE,
};
use crate::websocket::{ConnectionId, ConnectionRegistry, Identity};
use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub user_name: Option<String>,
    pub user_role: Option<String>,
}

// Payload delivered to this connection via the registry
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct Deliver(String);

/// One WebSocket connection, scoped to a single session
struct WsConnection {
    session_id: String,
    connection_id: ConnectionId,
    identity: Option<Identity>,
    registry: ConnectionRegistry,
    /// Occupancy captured at registration, reported once in `connection_status`
    occupancy_at_connect: usize,
    /// Receiver half of the registry channel; consumed when the actor starts
    rx: Option<UnboundedReceiver<String>>,
    hb: Instant,
}

impl WsConnection {
    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(
                    session_id = %act.session_id,
                    "WebSocket heartbeat failed, disconnecting"
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

/// Drain the registry channel into a sink until the channel closes. The sink
/// must accept every payload; a burst is never dropped or severed here.
async fn relay(mut rx: UnboundedReceiver<String>, mut sink: impl FnMut(String)) {
    while let Some(payload) = rx.recv().await {
        sink(payload);
    }
}

/// Greet a freshly registered connection, then announce it to everyone
/// already in the room. The joiner gets exactly one `connection_status`
/// unicast and never its own `user_joined`; anonymous connections are not
/// announced.
pub(crate) async fn announce_join(
    registry: &ConnectionRegistry,
    session_id: &str,
    connection_id: ConnectionId,
    identity: Option<Identity>,
    active_users: usize,
) {
    let status = ServerFrame::ConnectionStatus {
        status: ConnectionState::Connected,
        session_id: session_id.to_string(),
        active_users,
    };
    if let Some(json) = status.encode() {
        registry.unicast(session_id, connection_id, &json).await;
    }

    if let Some(identity) = identity {
        let joined = ServerFrame::UserJoined {
            user_name: identity.name,
            role: identity.role,
        };
        if let Some(json) = joined.encode() {
            registry
                .broadcast(session_id, &json, Some(connection_id))
                .await;
        }
    }
}

/// Deregister a connection, then tell the remaining members. `user_left` is
/// emitted only for identified connections and only after the handle is gone.
pub(crate) async fn announce_leave(
    registry: &ConnectionRegistry,
    session_id: &str,
    connection_id: ConnectionId,
    identity: Option<Identity>,
) {
    registry.disconnect(session_id, connection_id).await;

    if let Some(identity) = identity {
        let left = ServerFrame::UserLeft {
            user_name: identity.name,
            role: identity.role,
        };
        if let Some(json) = left.encode() {
            registry.broadcast(session_id, &json, None).await;
        }
    }
}

/// Validate one inbound frame and route it: live edits fan out to the rest
/// of the room, execution requests and protocol errors are answered on the
/// sender's own connection. Never closes the connection.
pub(crate) async fn dispatch_frame(
    registry: &ConnectionRegistry,
    session_id: &str,
    sender: ConnectionId,
    text: &str,
) {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(ClientFrame::CodeUpdate {
            problem_id,
            code,
            cursor_position,
        }) => {
            let frame = ServerFrame::CodeUpdate {
                problem_id,
                code,
                cursor_position,
            };
            if let Some(json) = frame.encode() {
                registry.broadcast(session_id, &json, Some(sender)).await;
            }
        }
        Ok(ClientFrame::ProblemChange { problem_id }) => {
            let frame = ServerFrame::ProblemChange { problem_id };
            if let Some(json) = frame.encode() {
                registry.broadcast(session_id, &json, Some(sender)).await;
            }
        }
        Ok(ClientFrame::RunCode { problem_id, .. }) => {
            // No execution collaborator wired in; answer the sender only.
            let frame = ServerFrame::CodeResult {
                problem_id,
                success: false,
                output: None,
                error: Some("Code execution is not available".to_string()),
                test_results: None,
            };
            if let Some(json) = frame.encode() {
                registry.unicast(session_id, sender, &json).await;
            }
        }
        Err(e) => {
            tracing::debug!(session_id, error = %e, "rejected malformed frame");
            let frame = ServerFrame::Error {
                message: format!("unrecognized message: {e}"),
                code: Some(UNKNOWN_MESSAGE_TYPE.to_string()),
            };
            if let Some(json) = frame.encode() {
                registry.unicast(session_id, sender, &json).await;
            }
        }
    }
}

impl Actor for WsConnection {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            session_id = %self.session_id,
            connection_id = ?self.connection_id,
            "WebSocket connection started"
        );

        self.hb(ctx);

        // Bridge the registry channel into this actor. `do_send` bypasses
        // the mailbox capacity, so a queued burst can never sever delivery
        // while the socket stays open.
        if let Some(rx) = self.rx.take() {
            let addr = ctx.address();
            actix::spawn(relay(rx, move |payload| addr.do_send(Deliver(payload))));
        }

        let registry = self.registry.clone();
        let session_id = self.session_id.clone();
        let connection_id = self.connection_id;
        let identity = self.identity.clone();
        let active_users = self.occupancy_at_connect;

        actix::spawn(async move {
            announce_join(&registry, &session_id, connection_id, identity, active_users).await;
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            session_id = %self.session_id,
            connection_id = ?self.connection_id,
            "WebSocket connection stopped"
        );

        // Actix calls stopped() once, so the disconnect path runs exactly
        // once per connection.
        let registry = self.registry.clone();
        let session_id = self.session_id.clone();
        let connection_id = self.connection_id;
        let identity = self.identity.take();

        actix::spawn(async move {
            announce_leave(&registry, &session_id, connection_id, identity).await;
        });
    }
}

impl Handler<Deliver> for WsConnection {
    type Result = ();

    fn handle(&mut self, msg: Deliver, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsConnection {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                let registry = self.registry.clone();
                let session_id = self.session_id.clone();
                let sender = self.connection_id;
                let text = text.to_string();

                actix::spawn(async move {
                    dispatch_frame(&registry, &session_id, sender, &text).await;
                });
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("Binary WebSocket messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::info!(
                    session_id = %self.session_id,
                    ?reason,
                    "WebSocket close message received"
                );
                ctx.stop();
            }
            Err(e) => {
                // Transport error: fatal for this connection only, never
                // reported back to the failed peer.
                tracing::warn!(session_id = %self.session_id, error = %e, "WebSocket protocol error");
                ctx.stop();
            }
            _ => {}
        }
    }
}

/// GET /ws/{session_id}?user_name=&user_role=
///
/// Persistent connection scoped to one session. `user_name`/`user_role` are
/// self-asserted display data; identity is attached only when both are
/// present.
#[get("/ws/{session_id}")]
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    session_id: web::Path<String>,
    query: web::Query<WsParams>,
) -> Result<HttpResponse, Error> {
    let session_id = session_id.into_inner();
    let params = query.into_inner();

    let identity = match (params.user_name, params.user_role) {
        (Some(name), Some(role)) => Some(Identity { name, role }),
        _ => None,
    };

    let (connection_id, rx, occupancy) = state.registry.connect(&session_id).await;

    let conn = WsConnection {
        session_id: session_id.clone(),
        connection_id,
        identity,
        registry: state.registry.clone(),
        occupancy_at_connect: occupancy,
        rx: Some(rx),
        hb: Instant::now(),
    };

    match ws::start(conn, &req, stream) {
        Ok(resp) => Ok(resp),
        Err(e) => {
            // Handshake failed after registration; roll the connection back.
            state.registry.disconnect(&session_id, connection_id).await;
            Err(e)
        }
    }
}
