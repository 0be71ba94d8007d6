//! The 8-byte header common to every OpenFlow message.
//!
//! ```text
//! +--------+--------+--------+--------+
//! |version |  type  |     length      |
//! +--------+--------+--------+--------+
//! |                xid                |
//! +--------+--------+--------+--------+
//! ```

use byteorder::{BigEndian, ByteOrder};

pub const OFP_VERSION: u8 = 0x04;
pub const OFP_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub kind: u8,
    pub length: u16,
    pub xid: u32,
}

impl Header {
    pub fn parse(buf: &[u8]) -> Header {
        Header {
            version: buf[0],
            kind: buf[1],
            length: BigEndian::read_u16(&buf[2..4]),
            xid: BigEndian::read_u32(&buf[4..8]),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.version);
        out.push(self.kind);
        let mut lenbuf = [0u8; 2];
        BigEndian::write_u16(&mut lenbuf, self.length);
        out.extend_from_slice(&lenbuf);
        let mut xidbuf = [0u8; 4];
        BigEndian::write_u32(&mut xidbuf, self.xid);
        out.extend_from_slice(&xidbuf);
    }
}

/// Prepends a header for `kind`/`xid` sized for `body`, returning the full wire frame.
pub fn frame(kind: u8, xid: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(OFP_HEADER_LEN + body.len());
    let header = Header {
        version: OFP_VERSION,
        kind,
        length: (OFP_HEADER_LEN + body.len()) as u16,
        xid,
    };
    header.write(&mut out);
    out.extend_from_slice(body);
    out
}
