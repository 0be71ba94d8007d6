//! Per-message handlers and the handshake state machine.
//!
//! The dispatch table is a dense `Vec<Option<Handler>>` indexed by `OFPT_*`: a numeric
//! code indexes a flat vec of boxed-future handlers, and a missing entry is itself
//! meaningful (an undecoded-but-legitimate kind, logged and ignored rather than fatal).

use std::sync::OnceLock;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::codec::flow_mod::FlowMod;
use crate::codec::multipart::MultipartKind;
use crate::codec::{self, Barrier, Echo, FeaturesRequest, Hello, OfMessage};
use crate::connection::{ConnState, Connection, PortCollection};
use crate::events::ControllerEvent;

pub type Handler = fn(&mut Connection, OfMessage) -> BoxFuture<'_, anyhow::Result<()>>;

fn table() -> &'static Vec<Option<Handler>> {
    static TABLE: OnceLock<Vec<Option<Handler>>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t: Vec<Option<Handler>> = vec![None; codec::OFPT_METER_MOD as usize + 1];
        t[codec::OFPT_HELLO as usize] = Some(|c, m| handle_hello(c, m).boxed());
        t[codec::OFPT_ERROR as usize] = Some(|c, m| handle_error(c, m).boxed());
        t[codec::OFPT_ECHO_REQUEST as usize] = Some(|c, m| handle_echo_request(c, m).boxed());
        t[codec::OFPT_ECHO_REPLY as usize] = Some(|c, m| handle_noop(c, m).boxed());
        t[codec::OFPT_FEATURES_REPLY as usize] = Some(|c, m| handle_features_reply(c, m).boxed());
        t[codec::OFPT_PACKET_IN as usize] = Some(|c, m| handle_packet_in(c, m).boxed());
        t[codec::OFPT_PORT_STATUS as usize] = Some(|c, m| handle_port_status(c, m).boxed());
        t[codec::OFPT_FLOW_REMOVED as usize] = Some(|c, m| handle_flow_removed(c, m).boxed());
        t[codec::OFPT_BARRIER_REPLY as usize] = Some(|c, m| handle_barrier_reply(c, m).boxed());
        t[codec::OFPT_MULTIPART_REPLY as usize] = Some(|c, m| handle_multipart_reply(c, m).boxed());
        t
    })
}

/// Runs the handler registered for `msg`'s kind. A kind with no registered handler
/// (including every kind this crate's minimal codec doesn't decode, carried as
/// [`OfMessage::Unparsed`]) is logged and otherwise ignored — the distilled spec's
/// "abort on unhandled" guidance targets malformed frames, which never reach here
/// (those are rejected earlier, in [`crate::framing`]).
pub async fn dispatch(conn: &mut Connection, msg: OfMessage) -> anyhow::Result<()> {
    let kind = msg.kind();
    match table().get(kind as usize).copied().flatten() {
        Some(handler) => handler(conn, msg).await,
        None => {
            tracing::debug!(connection = %conn.id(), kind, "no handler for message kind, ignoring");
            Ok(())
        }
    }
}

pub async fn send_hello(conn: &mut Connection) {
    conn.send(OfMessage::Hello { xid: 0, body: Hello }).await;
    conn.state = ConnState::HelloSent;
}

async fn handle_noop(_conn: &mut Connection, _msg: OfMessage) -> anyhow::Result<()> {
    Ok(())
}

async fn handle_hello(conn: &mut Connection, _msg: OfMessage) -> anyhow::Result<()> {
    if conn.state != ConnState::HelloSent {
        return Ok(());
    }
    let xid = conn.next_xid();
    conn.send(OfMessage::FeaturesRequest { xid, body: FeaturesRequest }).await;
    conn.state = ConnState::FeaturesPending;
    Ok(())
}

async fn handle_echo_request(conn: &mut Connection, msg: OfMessage) -> anyhow::Result<()> {
    if let OfMessage::EchoRequest { xid, body } = msg {
        conn.send(OfMessage::EchoReply { xid, body: Echo { data: body.data } }).await;
    }
    Ok(())
}

async fn handle_features_reply(conn: &mut Connection, msg: OfMessage) -> anyhow::Result<()> {
    let OfMessage::FeaturesReply { body, .. } = msg else { return Ok(()) };

    // A second FEATURES_REPLY on a connection already up: attach to the existing
    // nexus and re-raise FeaturesReceived without repeating the table-miss install.
    if conn.state == ConnState::Up && conn.connect_time.is_some() {
        conn.shared.set_dpid(body.datapath_id).await;
        conn.features = Some(body.clone());
        let dpid = conn.shared.dpid().await.unwrap_or(0);
        conn.shared
            .raise(ControllerEvent::FeaturesReceived { connection_id: conn.id(), dpid, features: body })
            .await;
        return Ok(());
    }

    if conn.state != ConnState::FeaturesPending {
        return Ok(());
    }
    conn.shared.set_dpid(body.datapath_id).await;
    conn.features = Some(body.clone());

    let table_id = 0;
    let flow_xid = conn.next_xid();
    conn.send(OfMessage::FlowMod { xid: flow_xid, body: FlowMod::table_miss(table_id) }).await;

    let barrier_xid = conn.next_xid();
    conn.send(OfMessage::BarrierRequest { xid: barrier_xid, body: Barrier }).await;
    conn.state = ConnState::InstallingMiss { barrier_xid };
    Ok(())
}

async fn handle_barrier_reply(conn: &mut Connection, msg: OfMessage) -> anyhow::Result<()> {
    let xid = msg.xid();
    if let ConnState::InstallingMiss { barrier_xid } = conn.state {
        if xid == barrier_xid {
            finish_connecting(conn).await;
            return Ok(());
        }
    }
    let dpid = conn.shared.dpid().await.unwrap_or(0);
    conn.shared.raise(ControllerEvent::BarrierIn { connection_id: conn.id(), dpid, xid }).await;
    Ok(())
}

/// Completes the handshake: resolves a nexus via the arbiter, tells it about the new
/// connection, and raises `ConnectionUp`/`FeaturesReceived` exactly once.
async fn finish_connecting(conn: &mut Connection) {
    if let Some(nexus) = conn.arbiter.get_nexus(conn).await {
        conn.shared.set_nexus(nexus.clone()).await;
        nexus.connect(conn).await;
    }
    // OFPT_FEATURES_REPLY carries no port list in 1.3; the port table starts empty and
    // is built up from OFPT_PORT_STATUS (and, for an application that wants the full
    // picture up front, an OFPMP_PORT_DESC multipart request it can issue once up).
    conn.ports = PortCollection::new();
    conn.connect_time = Some(std::time::Instant::now());
    conn.state = ConnState::Up;

    let dpid = conn.shared.dpid().await.unwrap_or(0);
    conn.shared.raise(ControllerEvent::ConnectionUp { connection_id: conn.id(), dpid }).await;
    if let Some(features) = conn.features.clone() {
        conn.shared
            .raise(ControllerEvent::FeaturesReceived { connection_id: conn.id(), dpid, features })
            .await;
    }
}

/// The handshake did not complete cleanly; tear the connection down.
async fn fail_connect(conn: &mut Connection) {
    tracing::warn!(connection = %conn.id(), "handshake failed, disconnecting");
    conn.state = ConnState::Disconnected;
    conn.disconnect().await;
}

async fn handle_error(conn: &mut Connection, msg: OfMessage) -> anyhow::Result<()> {
    let OfMessage::Error { xid, body } = msg else { return Ok(()) };
    if let ConnState::InstallingMiss { barrier_xid } = conn.state {
        if xid == barrier_xid {
            if body.is_bad_type() {
                finish_connecting(conn).await;
            } else {
                fail_connect(conn).await;
            }
            return Ok(());
        }
    }
    if body.should_log() {
        tracing::warn!(
            connection = %conn.id(),
            error_type = body.error_type,
            code = body.code,
            "received OFPT_ERROR"
        );
    }
    let dpid = conn.shared.dpid().await;
    conn.shared.raise(ControllerEvent::ErrorIn { connection_id: conn.id(), dpid, error: body }).await;
    Ok(())
}

async fn handle_packet_in(conn: &mut Connection, msg: OfMessage) -> anyhow::Result<()> {
    let OfMessage::PacketIn { body, .. } = msg else { return Ok(()) };
    if conn.state != ConnState::Up {
        return Ok(());
    }
    let dpid = conn.shared.dpid().await.unwrap_or(0);
    conn.shared.raise(ControllerEvent::PacketIn { connection_id: conn.id(), dpid, packet: body }).await;
    Ok(())
}

async fn handle_port_status(conn: &mut Connection, msg: OfMessage) -> anyhow::Result<()> {
    let OfMessage::PortStatus { body, .. } = msg else { return Ok(()) };
    if conn.state != ConnState::Up {
        return Ok(());
    }
    conn.ports.apply_status(body.reason, body.port.clone());
    let dpid = conn.shared.dpid().await.unwrap_or(0);
    conn.shared
        .raise(ControllerEvent::PortStatus { connection_id: conn.id(), dpid, status: body })
        .await;
    Ok(())
}

async fn handle_flow_removed(conn: &mut Connection, msg: OfMessage) -> anyhow::Result<()> {
    let OfMessage::FlowRemoved { body, .. } = msg else { return Ok(()) };
    if conn.state != ConnState::Up {
        return Ok(());
    }
    let dpid = conn.shared.dpid().await.unwrap_or(0);
    conn.shared.raise(ControllerEvent::FlowRemoved { connection_id: conn.id(), dpid, flow: body }).await;
    Ok(())
}

async fn handle_multipart_reply(conn: &mut Connection, msg: OfMessage) -> anyhow::Result<()> {
    let OfMessage::MultipartReply { xid, body } = msg else { return Ok(()) };
    if conn.state != ConnState::Up {
        return Ok(());
    }
    let kind: MultipartKind = body.kind();
    if let Some(assembled) = conn.multipart.ingest(xid, &body) {
        let dpid = conn.shared.dpid().await.unwrap_or(0);
        conn.shared
            .raise(ControllerEvent::MultipartAssembled { connection_id: conn.id(), dpid, kind, body: assembled })
            .await;
    }
    Ok(())
}
