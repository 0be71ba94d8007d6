//! An OpenFlow 1.3 controller front-end core: TCP accept, HELLO/FEATURES handshake
//! (including table-miss flow install and the barrier that confirms it landed), wire
//! framing, message dispatch, multi-part reply reassembly, and a deferred, ordered
//! send path — plus the connection/nexus event bus application code hangs handlers off
//! of. Topology, flow semantics above the table-miss entry, and earlier OpenFlow
//! versions are out of scope; see the crate's design notes for the full rationale.

pub mod codec;
pub mod config;
pub mod connection;
pub mod deferred;
pub mod dispatch;
pub mod events;
pub mod framing;
pub mod pcap;
pub mod tcp;

pub use codec::OfMessage;
pub use config::{launch, AlwaysRunning, ControllerConfig, ControllerHandle, HostSignals};
pub use connection::{Connection, ConnectionId, ConnectionShared, PortCollection};
pub use events::{Arbiter, ControllerEvent, Nexus, NullNexus, RaisedEvent};
pub use tcp::OfTcpListener;
