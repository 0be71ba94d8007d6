//! Turns an accumulating byte buffer into a stream of [`OfMessage`]s.
//!
//! Read-fragment / record-marking style: wait for a complete header, check it, then
//! wait for the body length it declares. Adapted from RFC 5531's 4-byte record markers
//! to the fixed 8-byte OpenFlow header carrying its own length.

use thiserror::Error;

use crate::codec::{self, OfMessage, UnpackFn, OFP_HEADER_LEN, OFP_VERSION};

/// Largest frame this core accepts before treating the stream as corrupt. OpenFlow
/// caps message length at 16 bits; this is simply that ceiling.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("unsupported OpenFlow version {found:#x}, expected {expected:#x}")]
    BadVersion { found: u8, expected: u8 },
    #[error("frame length {found} is smaller than the header size {min}")]
    TooShort { found: u16, min: usize },
    #[error("frame length {found} exceeds the maximum of {max}")]
    TooLong { found: u16, max: usize },
}

/// Attempts to pull exactly one complete message off the front of `buf`.
///
/// Returns `Ok(None)` when `buf` doesn't yet hold a full frame (the caller should wait
/// for more bytes). Returns `Ok(Some((message, consumed)))` on success, where
/// `consumed` is the number of bytes to drain from the front of `buf`. A malformed
/// header is a [`FrameError`] and always fatal to the connection.
pub fn next_frame(
    buf: &[u8],
    unpackers: &[Option<UnpackFn>],
) -> Result<Option<(OfMessage, usize)>, FrameError> {
    if buf.len() < OFP_HEADER_LEN {
        return Ok(None);
    }
    let header = codec::Header::parse(&buf[..OFP_HEADER_LEN]);
    // A HELLO's version field is advisory, not a hard requirement: a switch speaking a
    // different OpenFlow version still sends a well-formed HELLO, and the handshake
    // itself is the place to negotiate or reject it, not the framer.
    if header.version != OFP_VERSION && header.kind != codec::OFPT_HELLO {
        return Err(FrameError::BadVersion { found: header.version, expected: OFP_VERSION });
    }
    let length = header.length as usize;
    if length < OFP_HEADER_LEN {
        return Err(FrameError::TooShort { found: header.length, min: OFP_HEADER_LEN });
    }
    if length > MAX_FRAME_LEN {
        return Err(FrameError::TooLong { found: header.length, max: MAX_FRAME_LEN });
    }
    if buf.len() < length {
        return Ok(None);
    }
    let body = &buf[OFP_HEADER_LEN..length];
    let message = codec::unpack(unpackers, header.kind, header.xid, body);
    Ok(Some((message, length)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_header_waits_for_more_bytes() {
        let table = codec::unpacker_table();
        assert_eq!(next_frame(&[0x04, 0x00, 0x00], &table), Ok(None));
    }

    #[test]
    fn incomplete_body_waits_for_more_bytes() {
        let table = codec::unpacker_table();
        let frame = codec::header::frame(codec::OFPT_ECHO_REQUEST, 1, &[1, 2, 3, 4]);
        assert_eq!(next_frame(&frame[..frame.len() - 1], &table), Ok(None));
    }

    #[test]
    fn rejects_bad_version() {
        let table = codec::unpacker_table();
        let mut frame = codec::header::frame(codec::OFPT_ECHO_REQUEST, 0, &[]);
        frame[0] = 0x01;
        assert_eq!(
            next_frame(&frame, &table),
            Err(FrameError::BadVersion { found: 0x01, expected: OFP_VERSION })
        );
    }

    #[test]
    fn tolerates_bad_version_on_hello() {
        let table = codec::unpacker_table();
        let mut frame = codec::header::frame(codec::OFPT_HELLO, 0, &[]);
        frame[0] = 0x01;
        let (msg, consumed) = next_frame(&frame, &table).unwrap().unwrap();
        assert_eq!(consumed, frame.len());
        assert!(matches!(msg, OfMessage::Hello { .. }));
    }

    #[test]
    fn rejects_length_shorter_than_header() {
        let table = codec::unpacker_table();
        let mut frame = codec::header::frame(codec::OFPT_HELLO, 0, &[]);
        frame[3] = 4;
        assert_eq!(
            next_frame(&frame, &table),
            Err(FrameError::TooShort { found: 4, min: OFP_HEADER_LEN })
        );
    }

    #[test]
    fn decodes_one_frame_and_reports_consumed_length() {
        let table = codec::unpacker_table();
        let frame = codec::header::frame(codec::OFPT_ECHO_REQUEST, 9, &[0xaa, 0xbb]);
        let (msg, consumed) = next_frame(&frame, &table).unwrap().unwrap();
        assert_eq!(consumed, frame.len());
        match msg {
            OfMessage::EchoRequest { xid, body } => {
                assert_eq!(xid, 9);
                assert_eq!(body.data, vec![0xaa, 0xbb]);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
