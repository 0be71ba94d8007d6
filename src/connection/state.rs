//! Explicit handshake state machine: an enum of named states rather than a scatter of
//! boolean flags, so each handler can assert exactly which step it expects to run at.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// HELLO not yet sent.
    PreHello,
    /// HELLO sent, waiting for the switch's HELLO.
    HelloSent,
    /// FEATURES_REQUEST sent, waiting for FEATURES_REPLY.
    FeaturesPending,
    /// FEATURES_REPLY received, table-miss flow sent, waiting on the matching
    /// `BARRIER_REPLY` (or the one tolerated `OFPET_BAD_REQUEST`/`OFPBRC_BAD_TYPE`).
    InstallingMiss { barrier_xid: u32 },
    /// Handshake complete; connection is live and forwarding events.
    Up,
    /// Socket closed or handshake failed; no further sends are attempted.
    Disconnected,
}
