//! A single OpenFlow TCP connection: ownership split between the task that reads and
//! dispatches ([`Connection`]) and the state the [`DeferredSender`](crate::deferred::DeferredSender)
//! worker also needs in order to call send/disconnect ([`ConnectionShared`]).
//!
//! A `Connection` exclusively owns its socket read half, receive buffer, multipart
//! reassembly buffer, and port table; `ConnectionShared` is the `Arc`-shared slice
//! (write half, disconnected flag, dpid, nexus, event publisher) the deferred sender
//! also touches.

pub mod multipart_buffer;
pub mod ports;
pub mod state;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex as AsyncMutex, RwLock as AsyncRwLock};

use crate::codec::{FeaturesReply, OfMessage, UnpackFn};
use crate::deferred::DeferredSender;
use crate::events::{Arbiter, ControllerEvent, Nexus, NullNexus, Publisher};
use crate::pcap::PcapWriter;

pub use multipart_buffer::MultipartBuffer;
pub use ports::PortCollection;
pub use state::ConnState;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> ConnectionId {
        ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The slice of connection state a [`DeferredSender`] needs in order to queue writes
/// and tear a connection down on socket failure, without touching the read-side state
/// that belongs exclusively to the owning [`Connection`] task.
pub struct ConnectionShared {
    id: ConnectionId,
    peer: std::net::SocketAddr,
    write_half: AsyncMutex<OwnedWriteHalf>,
    disconnected: AtomicBool,
    disconnection_raised: AtomicBool,
    dpid: AsyncRwLock<Option<u64>>,
    nexus: AsyncRwLock<Arc<dyn Nexus>>,
    events: Publisher,
    deferred: Arc<DeferredSender>,
    pcap: Option<Arc<PcapWriter>>,
    self_ref: std::sync::Weak<ConnectionShared>,
}

impl ConnectionShared {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> std::net::SocketAddr {
        self.peer
    }

    pub fn events(&self) -> &Publisher {
        &self.events
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    pub async fn dpid(&self) -> Option<u64> {
        *self.dpid.read().await
    }

    pub async fn set_dpid(&self, dpid: u64) {
        *self.dpid.write().await = Some(dpid);
    }

    pub async fn set_nexus(&self, nexus: Arc<dyn Nexus>) {
        *self.nexus.write().await = nexus;
    }

    pub async fn nexus(&self) -> Arc<dyn Nexus> {
        self.nexus.read().await.clone()
    }

    /// Raises `event` through the nexus, then (unless halted) notifies local
    /// subscribers.
    pub async fn raise(&self, event: ControllerEvent) {
        let nexus = self.nexus().await;
        let raised = nexus.raise_event_no_errors(event.clone()).await;
        if !raised.map(|r| r.halt).unwrap_or(false) {
            self.events.publish(&event);
        }
    }

    /// Sends one message. If the deferred sender already owns this connection's write
    /// half (it is mid-drain for a prior backlog), the message is queued instead of
    /// written directly, preserving submission order.
    pub async fn send(&self, msg: OfMessage) {
        if self.is_disconnected() {
            return;
        }
        let bytes = msg.pack();
        if let Some(pcap) = &self.pcap {
            pcap.record_outbound(&bytes).await;
        }
        let self_arc = self.self_ref.upgrade().expect("ConnectionShared outlives its own weak ref");
        if self.deferred.sending() {
            self.deferred.enqueue(self.id, self_arc, bytes);
            return;
        }
        let mut guard = self.write_half.lock().await;
        match guard.try_write(&bytes) {
            Ok(n) if n == bytes.len() => {}
            Ok(n) => {
                drop(guard);
                self.deferred.enqueue(self.id, self_arc, bytes[n..].to_vec());
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                drop(guard);
                self.deferred.enqueue(self.id, self_arc, bytes);
            }
            Err(e) => {
                tracing::warn!(connection = %self.id, error = %e, "direct send failed");
                drop(guard);
                self.disconnect(false).await;
            }
        }
    }

    /// Waits for the write half to report writable, for use by the deferred sender's
    /// readiness multiplexing. Held only across the `writable()` await, not across the
    /// following write attempt, so a concurrent direct [`ConnectionShared::send`] can
    /// still interleave — acceptable because `sending()` keeps the two paths from
    /// racing on the same connection in practice.
    pub(crate) async fn writable(&self) -> std::io::Result<()> {
        self.write_half.lock().await.writable().await
    }

    /// Attempts to drain as much of `chunk` as the socket accepts right now, returning
    /// the number of bytes written.
    pub(crate) async fn try_write_chunk(&self, chunk: &[u8]) -> std::io::Result<usize> {
        self.write_half.lock().await.try_write(chunk)
    }

    /// Tears the connection down. `defer_event` suppresses the `ConnectionDown` event
    /// (used on the reconnect path, where a new connection replaces rather than removes
    /// a dpid).
    pub async fn disconnect(&self, defer_event: bool) {
        if self.disconnected.swap(true, Ordering::SeqCst) {
            return;
        }
        let dpid = self.dpid().await;
        let nexus = self.nexus().await;
        nexus.disconnect(dpid).await;
        if !defer_event && !self.disconnection_raised.swap(true, Ordering::SeqCst) {
            self.raise(ControllerEvent::ConnectionDown { connection_id: self.id, dpid }).await;
        }
        self.deferred.kill(self.id);
        let mut guard = self.write_half.lock().await;
        let _ = guard.shutdown().await;
    }
}

/// A single OpenFlow connection, owned exclusively by the task running [`Connection::run`].
pub struct Connection {
    pub shared: Arc<ConnectionShared>,
    pub state: ConnState,
    pub features: Option<FeaturesReply>,
    pub ports: PortCollection,
    pub multipart: MultipartBuffer,
    pub next_xid: u32,
    pub idle_time: Instant,
    pub connect_time: Option<Instant>,
    pub arbiter: Arc<dyn Arbiter>,
    read_half: OwnedReadHalf,
    recv_buf: Vec<u8>,
    unpackers: Arc<Vec<Option<UnpackFn>>>,
}

impl Connection {
    pub fn new(
        stream: tokio::net::TcpStream,
        peer: std::net::SocketAddr,
        arbiter: Arc<dyn Arbiter>,
        deferred: Arc<DeferredSender>,
        unpackers: Arc<Vec<Option<UnpackFn>>>,
        pcap: Option<Arc<PcapWriter>>,
    ) -> Connection {
        let (read_half, write_half) = stream.into_split();
        let id = ConnectionId::next();
        let shared = Arc::new_cyclic(|self_ref| ConnectionShared {
            id,
            peer,
            write_half: AsyncMutex::new(write_half),
            disconnected: AtomicBool::new(false),
            disconnection_raised: AtomicBool::new(false),
            dpid: AsyncRwLock::new(None),
            nexus: AsyncRwLock::new(Arc::new(NullNexus) as Arc<dyn Nexus>),
            events: Publisher::new(),
            deferred,
            pcap,
            self_ref: self_ref.clone(),
        });
        Connection {
            shared,
            state: ConnState::PreHello,
            features: None,
            ports: PortCollection::new(),
            multipart: MultipartBuffer::new(),
            next_xid: 1,
            idle_time: Instant::now(),
            connect_time: None,
            arbiter,
            read_half,
            recv_buf: Vec::new(),
            unpackers,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.shared.id()
    }

    /// The next locally generated transaction id (FEATURES_REQUEST, the table-miss
    /// FLOW_MOD, and its BARRIER_REQUEST all come from this sequence).
    pub fn next_xid(&mut self) -> u32 {
        let xid = self.next_xid;
        self.next_xid = self.next_xid.wrapping_add(1);
        xid
    }

    pub async fn send(&self, msg: OfMessage) {
        self.shared.send(msg).await;
    }

    pub async fn disconnect(&self) {
        self.shared.disconnect(false).await;
    }

    /// Drives this connection until the socket closes or a framing violation is
    /// encountered. Grounded in `tcp.rs::process_socket`'s readable()/try_read loop.
    pub async fn run(mut self) {
        crate::dispatch::send_hello(&mut self).await;
        loop {
            if self.shared.is_disconnected() {
                return;
            }
            if let Err(e) = self.read_half.readable().await {
                tracing::debug!(connection = %self.id(), error = %e, "socket no longer readable");
                self.shared.disconnect(false).await;
                return;
            }
            let mut buf = [0u8; 65536];
            match self.read_half.try_read(&mut buf) {
                Ok(0) => {
                    tracing::info!(connection = %self.id(), "peer closed connection");
                    self.shared.disconnect(false).await;
                    return;
                }
                Ok(n) => {
                    self.idle_time = Instant::now();
                    if let Some(pcap) = self.shared.pcap.clone() {
                        pcap.record_inbound(&buf[..n]).await;
                    }
                    self.recv_buf.extend_from_slice(&buf[..n]);
                    if let Err(e) = self.drain_frames().await {
                        tracing::warn!(connection = %self.id(), error = %e, "framing violation");
                        self.shared.disconnect(false).await;
                        return;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {
                    tracing::debug!(connection = %self.id(), "connection reset by peer");
                    self.shared.disconnect(false).await;
                    return;
                }
                Err(e) => {
                    tracing::warn!(connection = %self.id(), error = %e, "read error");
                    self.shared.disconnect(false).await;
                    return;
                }
            }
        }
    }

    async fn drain_frames(&mut self) -> anyhow::Result<()> {
        loop {
            match crate::framing::next_frame(&self.recv_buf, &self.unpackers) {
                Ok(None) => return Ok(()),
                Ok(Some((msg, consumed))) => {
                    self.recv_buf.drain(..consumed);
                    if let Err(e) = crate::dispatch::dispatch(self, msg.clone()).await {
                        tracing::error!(
                            connection = %self.id(),
                            error = %e,
                            kind = msg.kind(),
                            "unhandled error processing OpenFlow message"
                        );
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
