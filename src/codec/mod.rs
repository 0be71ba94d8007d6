//! Minimal OpenFlow 1.3 message codec.
//!
//! Stands in for an externally supplied wire-format library (grounded in the retrieved
//! `ofpkt` crate's `Packet`/`PacketRepr` split and in `libopenflow_04.py`'s struct
//! layout): just enough `pack`/`unpack` to drive the handshake, echo, port status,
//! error, and multipart flows this core exercises. Application code that needs richer
//! message bodies extends [`OfMessage`] and the unpacker table the same way.

pub mod barrier;
pub mod echo;
pub mod error_msg;
pub mod features;
pub mod flow_mod;
pub mod flow_removed;
pub mod header;
pub mod hello;
pub mod multipart;
pub mod packet_in;
pub mod port;

pub use header::{Header, OFP_HEADER_LEN, OFP_VERSION};

pub const OFPT_HELLO: u8 = 0;
pub const OFPT_ERROR: u8 = 1;
pub const OFPT_ECHO_REQUEST: u8 = 2;
pub const OFPT_ECHO_REPLY: u8 = 3;
pub const OFPT_EXPERIMENTER: u8 = 4;
pub const OFPT_FEATURES_REQUEST: u8 = 5;
pub const OFPT_FEATURES_REPLY: u8 = 6;
pub const OFPT_GET_CONFIG_REQUEST: u8 = 7;
pub const OFPT_GET_CONFIG_REPLY: u8 = 8;
pub const OFPT_SET_CONFIG: u8 = 9;
pub const OFPT_PACKET_IN: u8 = 10;
pub const OFPT_FLOW_REMOVED: u8 = 11;
pub const OFPT_PORT_STATUS: u8 = 12;
pub const OFPT_PACKET_OUT: u8 = 13;
pub const OFPT_FLOW_MOD: u8 = 14;
pub const OFPT_GROUP_MOD: u8 = 15;
pub const OFPT_PORT_MOD: u8 = 16;
pub const OFPT_TABLE_MOD: u8 = 17;
pub const OFPT_MULTIPART_REQUEST: u8 = 18;
pub const OFPT_MULTIPART_REPLY: u8 = 19;
pub const OFPT_BARRIER_REQUEST: u8 = 20;
pub const OFPT_BARRIER_REPLY: u8 = 21;
pub const OFPT_QUEUE_GET_CONFIG_REQUEST: u8 = 22;
pub const OFPT_QUEUE_GET_CONFIG_REPLY: u8 = 23;
pub const OFPT_ROLE_REQUEST: u8 = 24;
pub const OFPT_ROLE_REPLY: u8 = 25;
pub const OFPT_GET_ASYNC_REQUEST: u8 = 26;
pub const OFPT_GET_ASYNC_REPLY: u8 = 27;
pub const OFPT_SET_ASYNC: u8 = 28;
pub const OFPT_METER_MOD: u8 = 29;

pub use barrier::Barrier;
pub use echo::Echo;
pub use error_msg::ErrorMsg;
pub use features::{FeaturesReply, FeaturesRequest};
pub use flow_mod::FlowMod;
pub use flow_removed::FlowRemoved;
pub use hello::Hello;
pub use multipart::MultipartMsg;
pub use packet_in::PacketIn;
pub use port::{MacAddr, Port, PortStatus};

/// A fully decoded OpenFlow message, header plus body.
///
/// Message kinds this crate has no business interpreting (`OFPT_PACKET_OUT`,
/// `OFPT_GROUP_MOD`, `OFPT_ROLE_*`, ...) are carried as [`OfMessage::Unparsed`] so they
/// can still be forwarded through the event bus by an application-level `Nexus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfMessage {
    Hello { xid: u32, body: Hello },
    Error { xid: u32, body: ErrorMsg },
    EchoRequest { xid: u32, body: Echo },
    EchoReply { xid: u32, body: Echo },
    FeaturesRequest { xid: u32, body: FeaturesRequest },
    FeaturesReply { xid: u32, body: FeaturesReply },
    FlowMod { xid: u32, body: FlowMod },
    PacketIn { xid: u32, body: PacketIn },
    FlowRemoved { xid: u32, body: FlowRemoved },
    PortStatus { xid: u32, body: PortStatus },
    MultipartRequest { xid: u32, body: MultipartMsg },
    MultipartReply { xid: u32, body: MultipartMsg },
    BarrierRequest { xid: u32, body: Barrier },
    BarrierReply { xid: u32, body: Barrier },
    Unparsed { kind: u8, xid: u32, body: Vec<u8> },
}

impl OfMessage {
    pub fn xid(&self) -> u32 {
        match self {
            OfMessage::Hello { xid, .. }
            | OfMessage::Error { xid, .. }
            | OfMessage::EchoRequest { xid, .. }
            | OfMessage::EchoReply { xid, .. }
            | OfMessage::FeaturesRequest { xid, .. }
            | OfMessage::FeaturesReply { xid, .. }
            | OfMessage::FlowMod { xid, .. }
            | OfMessage::PacketIn { xid, .. }
            | OfMessage::FlowRemoved { xid, .. }
            | OfMessage::PortStatus { xid, .. }
            | OfMessage::MultipartRequest { xid, .. }
            | OfMessage::MultipartReply { xid, .. }
            | OfMessage::BarrierRequest { xid, .. }
            | OfMessage::BarrierReply { xid, .. }
            | OfMessage::Unparsed { xid, .. } => *xid,
        }
    }

    pub fn kind(&self) -> u8 {
        match self {
            OfMessage::Hello { .. } => OFPT_HELLO,
            OfMessage::Error { .. } => OFPT_ERROR,
            OfMessage::EchoRequest { .. } => OFPT_ECHO_REQUEST,
            OfMessage::EchoReply { .. } => OFPT_ECHO_REPLY,
            OfMessage::FeaturesRequest { .. } => OFPT_FEATURES_REQUEST,
            OfMessage::FeaturesReply { .. } => OFPT_FEATURES_REPLY,
            OfMessage::FlowMod { .. } => OFPT_FLOW_MOD,
            OfMessage::PacketIn { .. } => OFPT_PACKET_IN,
            OfMessage::FlowRemoved { .. } => OFPT_FLOW_REMOVED,
            OfMessage::PortStatus { .. } => OFPT_PORT_STATUS,
            OfMessage::MultipartRequest { .. } => OFPT_MULTIPART_REQUEST,
            OfMessage::MultipartReply { .. } => OFPT_MULTIPART_REPLY,
            OfMessage::BarrierRequest { .. } => OFPT_BARRIER_REQUEST,
            OfMessage::BarrierReply { .. } => OFPT_BARRIER_REPLY,
            OfMessage::Unparsed { kind, .. } => *kind,
        }
    }

    /// Packs this message into a full wire frame (header included).
    pub fn pack(&self) -> Vec<u8> {
        let mut body = Vec::new();
        match self {
            OfMessage::Hello { body: b, .. } => b.write(&mut body),
            OfMessage::Error { body: b, .. } => b.write(&mut body),
            OfMessage::EchoRequest { body: b, .. } | OfMessage::EchoReply { body: b, .. } => {
                b.write(&mut body)
            }
            OfMessage::FeaturesRequest { body: b, .. } => b.write(&mut body),
            OfMessage::FeaturesReply { body: b, .. } => b.write(&mut body),
            OfMessage::FlowMod { body: b, .. } => b.write(&mut body),
            OfMessage::MultipartRequest { body: b, .. } | OfMessage::MultipartReply { body: b, .. } => {
                b.write(&mut body)
            }
            OfMessage::BarrierRequest { body: b, .. } | OfMessage::BarrierReply { body: b, .. } => {
                b.write(&mut body)
            }
            OfMessage::PacketIn { body: b, .. } => b.write(&mut body),
            OfMessage::FlowRemoved { body: b, .. } => b.write(&mut body),
            OfMessage::PortStatus { body: b, .. } => b.write(&mut body),
            OfMessage::Unparsed { body: b, .. } => body.extend_from_slice(b),
        }
        header::frame(self.kind(), self.xid(), &body)
    }
}

/// Decodes one message body (`buf` excludes the 8-byte header) given its `kind`/`xid`.
pub type UnpackFn = fn(kind: u8, xid: u32, buf: &[u8]) -> OfMessage;

fn unpack_hello(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::Hello { xid, body: Hello::parse(buf) }
}
fn unpack_error(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::Error { xid, body: ErrorMsg::parse(buf) }
}
fn unpack_echo_request(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::EchoRequest { xid, body: Echo::parse(buf) }
}
fn unpack_echo_reply(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::EchoReply { xid, body: Echo::parse(buf) }
}
fn unpack_features_request(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::FeaturesRequest { xid, body: FeaturesRequest::parse(buf) }
}
fn unpack_features_reply(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::FeaturesReply { xid, body: FeaturesReply::parse(buf) }
}
fn unpack_packet_in(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    // first 16 bytes precede the match; the match header carries its own length.
    let match_len = byteorder::BigEndian::read_u16(&buf[18..20]) as usize;
    OfMessage::PacketIn { xid, body: PacketIn::parse(&buf[16..], match_len) }
}
fn unpack_flow_removed(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::FlowRemoved { xid, body: FlowRemoved::parse(buf) }
}
fn unpack_port_status(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::PortStatus { xid, body: PortStatus::parse(buf) }
}
fn unpack_multipart_request(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::MultipartRequest { xid, body: MultipartMsg::parse(buf) }
}
fn unpack_multipart_reply(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::MultipartReply { xid, body: MultipartMsg::parse(buf) }
}
fn unpack_barrier_request(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::BarrierRequest { xid, body: Barrier::parse(buf) }
}
fn unpack_barrier_reply(_kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::BarrierReply { xid, body: Barrier::parse(buf) }
}
fn unpack_unparsed(kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    OfMessage::Unparsed { kind, xid, body: buf.to_vec() }
}

/// Dense dispatch table indexed by `OFPT_*`, mirroring the handler table in
/// [`crate::dispatch`] — a numeric code indexes a flat vec rather than a match arm.
pub fn unpacker_table() -> Vec<Option<UnpackFn>> {
    let mut table: Vec<Option<UnpackFn>> = vec![None; OFPT_METER_MOD as usize + 1];
    table[OFPT_HELLO as usize] = Some(unpack_hello);
    table[OFPT_ERROR as usize] = Some(unpack_error);
    table[OFPT_ECHO_REQUEST as usize] = Some(unpack_echo_request);
    table[OFPT_ECHO_REPLY as usize] = Some(unpack_echo_reply);
    table[OFPT_FEATURES_REQUEST as usize] = Some(unpack_features_request);
    table[OFPT_FEATURES_REPLY as usize] = Some(unpack_features_reply);
    table[OFPT_PACKET_IN as usize] = Some(unpack_packet_in);
    table[OFPT_FLOW_REMOVED as usize] = Some(unpack_flow_removed);
    table[OFPT_PORT_STATUS as usize] = Some(unpack_port_status);
    table[OFPT_MULTIPART_REQUEST as usize] = Some(unpack_multipart_request);
    table[OFPT_MULTIPART_REPLY as usize] = Some(unpack_multipart_reply);
    table[OFPT_BARRIER_REQUEST as usize] = Some(unpack_barrier_request);
    table[OFPT_BARRIER_REPLY as usize] = Some(unpack_barrier_reply);
    table
}

/// Unpacks any `OFPT_*` kind, falling back to [`OfMessage::Unparsed`] for kinds the
/// table above doesn't carry a decoder for (still a legitimate, forwardable message).
pub fn unpack(table: &[Option<UnpackFn>], kind: u8, xid: u32, buf: &[u8]) -> OfMessage {
    match table.get(kind as usize).copied().flatten() {
        Some(f) => f(kind, xid, buf),
        None => unpack_unparsed(kind, xid, buf),
    }
}
