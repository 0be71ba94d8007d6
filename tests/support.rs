use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use openflow_core::codec::{self, Barrier, FeaturesReply, Hello, UnpackFn};
use openflow_core::{Arbiter, Connection, ControllerEvent, Nexus, OfMessage, RaisedEvent};

/// A loopback TCP pair standing in for a real switch socket: `Connection` is built
/// directly on `tokio::net::TcpStream` (not a generic duplex stream) so its deferred
/// send path can observe real `WouldBlock`s, so tests drive it over an ephemeral
/// loopback listener rather than an in-process duplex pair.
pub async fn loopback_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback listener");
    let addr = listener.local_addr().expect("local_addr");
    let connect = TcpStream::connect(addr);
    let (accepted, connected) = tokio::join!(listener.accept(), connect);
    let (server, _) = accepted.expect("accept loopback connection");
    let client = connected.expect("connect to loopback listener");
    (server, client)
}

/// Reads/writes whole OpenFlow frames off a raw socket, playing the role of the switch
/// side of the handshake in tests.
pub struct FrameReader {
    stream: TcpStream,
    buf: Vec<u8>,
    table: Vec<Option<UnpackFn>>,
}

impl FrameReader {
    pub fn new(stream: TcpStream) -> Self {
        FrameReader { stream, buf: Vec::new(), table: codec::unpacker_table() }
    }

    pub async fn next(&mut self) -> OfMessage {
        loop {
            if let Ok(Some((msg, consumed))) = openflow_core::framing::next_frame(&self.buf, &self.table) {
                self.buf.drain(..consumed);
                return msg;
            }
            let mut chunk = [0u8; 4096];
            let n = self.stream.read(&mut chunk).await.expect("read from loopback socket");
            assert!(n > 0, "peer closed before a full frame arrived");
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    pub async fn send(&mut self, msg: &OfMessage) {
        self.stream.write_all(&msg.pack()).await.expect("write to loopback socket");
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.expect("write raw bytes to loopback socket");
    }
}

/// A [`Nexus`] that forwards every event onto an unbounded channel for the test to
/// assert against.
pub struct RecordingNexus {
    events: mpsc::UnboundedSender<ControllerEvent>,
}

#[async_trait]
impl Nexus for RecordingNexus {
    async fn raise_event_no_errors(&self, event: ControllerEvent) -> Option<RaisedEvent> {
        let _ = self.events.send(event);
        None
    }

    async fn connect(&self, _con: &Connection) {}

    async fn disconnect(&self, _dpid: Option<u64>) {}
}

pub struct SingleNexusArbiter(pub Arc<dyn Nexus>);

#[async_trait]
impl Arbiter for SingleNexusArbiter {
    async fn get_nexus(&self, _con: &Connection) -> Option<Arc<dyn Nexus>> {
        Some(self.0.clone())
    }
}

/// Builds an `Arbiter` wired to a fresh `RecordingNexus`, returning both the arbiter and
/// the event receiver.
pub fn recording_arbiter() -> (Arc<dyn Arbiter>, mpsc::UnboundedReceiver<ControllerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let nexus: Arc<dyn Nexus> = Arc::new(RecordingNexus { events: tx });
    (Arc::new(SingleNexusArbiter(nexus)), rx)
}

/// Spawns a `Connection` over the server half of a loopback pair, returning the client
/// half as a `FrameReader` for the test to play "switch" against.
pub async fn spawn_connection(arbiter: Arc<dyn Arbiter>) -> FrameReader {
    let (server, client) = loopback_pair().await;
    let deferred = openflow_core::deferred::DeferredSender::spawn();
    let unpackers = Arc::new(codec::unpacker_table());
    let peer = server.peer_addr().expect("peer_addr");
    let conn = Connection::new(server, peer, arbiter, deferred, unpackers, None);
    tokio::spawn(conn.run());
    FrameReader::new(client)
}

/// Drives `switch` through HELLO/FEATURES/table-miss/BARRIER to a live connection,
/// returning the datapath id the (fabricated) switch reported.
pub async fn complete_handshake(switch: &mut FrameReader, datapath_id: u64) -> u64 {
    switch.next().await; // HELLO
    switch.send(&OfMessage::Hello { xid: 0, body: Hello }).await;

    let features_xid = match switch.next().await {
        OfMessage::FeaturesRequest { xid, .. } => xid,
        other => panic!("expected FEATURES_REQUEST, got {other:?}"),
    };
    switch
        .send(&OfMessage::FeaturesReply {
            xid: features_xid,
            body: FeaturesReply { datapath_id, n_buffers: 0, n_tables: 1, auxiliary_id: 0, capabilities: 0 },
        })
        .await;

    switch.next().await; // table-miss FLOW_MOD
    let barrier_xid = match switch.next().await {
        OfMessage::BarrierRequest { xid, .. } => xid,
        other => panic!("expected BARRIER_REQUEST, got {other:?}"),
    };
    switch.send(&OfMessage::BarrierReply { xid: barrier_xid, body: Barrier }).await;
    datapath_id
}
