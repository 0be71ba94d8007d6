//! The connection/nexus event bus: every dispatch handler
//! that completes a handshake step or decodes an application message raises a
//! [`ControllerEvent`] through the connection's [`Nexus`] before (optionally) telling
//! its own local subscribers.
//!
//! One enum with a payload per variant covers every message kind that can raise a
//! connection event; multipart replies collapse further into a single
//! `MultipartAssembled` carrying a [`MultipartKind`] tag rather than one event type per
//! `OFPMP_*` code, since nothing downstream branches on the Rust type of the event,
//! only on its kind.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::codec::multipart::MultipartKind;
use crate::codec::{ErrorMsg, FeaturesReply, FlowRemoved, PacketIn, PortStatus};
use crate::connection::{Connection, ConnectionId};

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    ConnectionUp {
        connection_id: ConnectionId,
        dpid: u64,
    },
    ConnectionDown {
        connection_id: ConnectionId,
        dpid: Option<u64>,
    },
    FeaturesReceived {
        connection_id: ConnectionId,
        dpid: u64,
        features: FeaturesReply,
    },
    PacketIn {
        connection_id: ConnectionId,
        dpid: u64,
        packet: PacketIn,
    },
    PortStatus {
        connection_id: ConnectionId,
        dpid: u64,
        status: PortStatus,
    },
    FlowRemoved {
        connection_id: ConnectionId,
        dpid: u64,
        flow: FlowRemoved,
    },
    ErrorIn {
        connection_id: ConnectionId,
        dpid: Option<u64>,
        error: ErrorMsg,
    },
    BarrierIn {
        connection_id: ConnectionId,
        dpid: u64,
        xid: u32,
    },
    MultipartAssembled {
        connection_id: ConnectionId,
        dpid: u64,
        kind: MultipartKind,
        body: Vec<u8>,
    },
}

/// Result of handing an event to the global [`Nexus`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RaisedEvent {
    /// When true, the connection-local [`Publisher`] is not notified — a handler's way
    /// of claiming an event so local subscribers don't see it too.
    pub halt: bool,
}

/// The host runtime's global event sink and dpid registry.
#[async_trait]
pub trait Nexus: Send + Sync {
    async fn raise_event_no_errors(&self, event: ControllerEvent) -> Option<RaisedEvent>;
    async fn connect(&self, con: &Connection);
    async fn disconnect(&self, dpid: Option<u64>);
}

/// Resolves which [`Nexus`] should own a newly accepted connection. Production hosts
/// typically return a single shared nexus; tests can return per-connection fakes.
#[async_trait]
pub trait Arbiter: Send + Sync {
    async fn get_nexus(&self, con: &Connection) -> Option<std::sync::Arc<dyn Nexus>>;
}

/// A [`Nexus`] that drops every event and tracks nothing; used before the handshake
/// arbiter has produced a real one, and by tests that don't care about nexus behavior.
pub struct NullNexus;

#[async_trait]
impl Nexus for NullNexus {
    async fn raise_event_no_errors(&self, _event: ControllerEvent) -> Option<RaisedEvent> {
        None
    }
    async fn connect(&self, _con: &Connection) {}
    async fn disconnect(&self, _dpid: Option<u64>) {}
}

/// Per-connection local subscriber list, notified after the global nexus has had first
/// look at an event and didn't halt it.
#[derive(Default)]
pub struct Publisher {
    listeners: Mutex<Vec<Box<dyn Fn(&ControllerEvent) + Send + Sync>>>,
}

impl Publisher {
    pub fn new() -> Self {
        Publisher::default()
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&ControllerEvent) + Send + Sync + 'static,
    {
        self.listeners.lock().unwrap().push(Box::new(listener));
    }

    pub fn publish(&self, event: &ControllerEvent) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener(event);
        }
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("subscribers", &self.listeners.lock().unwrap().len())
            .finish()
    }
}
