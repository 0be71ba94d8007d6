//! `OFPT_MULTIPART_REQUEST` / `OFPT_MULTIPART_REPLY` bodies.
//!
//! Multipart replies that enumerate repeated records (flow stats, port stats, group
//! stats, group/meter features, table features, ...) are reassembled by concatenating
//! every fragment's body; the two replies that carry one scalar struct (desc,
//! aggregate stats) keep only the first fragment's body and discard the rest.
//! [`MultipartKind::is_list`] is the single place that distinguishes the two.

use byteorder::{BigEndian, ByteOrder};

pub const OFPMP_DESC: u16 = 0;
pub const OFPMP_FLOW: u16 = 1;
pub const OFPMP_AGGREGATE: u16 = 2;
pub const OFPMP_TABLE: u16 = 3;
pub const OFPMP_PORT_STATS: u16 = 4;
pub const OFPMP_QUEUE: u16 = 5;
pub const OFPMP_GROUP: u16 = 6;
pub const OFPMP_GROUP_DESC: u16 = 7;
pub const OFPMP_GROUP_FEATURES: u16 = 8;
pub const OFPMP_METER: u16 = 9;
pub const OFPMP_METER_CONFIG: u16 = 10;
pub const OFPMP_METER_FEATURES: u16 = 11;
pub const OFPMP_TABLE_FEATURES: u16 = 12;
pub const OFPMP_PORT_DESC: u16 = 13;
pub const OFPMP_EXPERIMENTER: u16 = 0xffff;

pub const OFPMPF_REPLY_MORE: u16 = 1 << 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultipartKind(pub u16);

impl MultipartKind {
    /// Whether fragments of this kind should be concatenated (a list of records) or
    /// whether only the first fragment's body is kept (a single scalar struct).
    pub fn is_list(self) -> bool {
        !matches!(self.0, OFPMP_DESC | OFPMP_AGGREGATE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartMsg {
    pub mp_type: u16,
    pub flags: u16,
    pub body: Vec<u8>,
}

impl MultipartMsg {
    pub fn parse(buf: &[u8]) -> MultipartMsg {
        MultipartMsg {
            mp_type: BigEndian::read_u16(&buf[0..2]),
            flags: BigEndian::read_u16(&buf[2..4]),
            body: buf[8..].to_vec(),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let mut hdr = [0u8; 8];
        BigEndian::write_u16(&mut hdr[0..2], self.mp_type);
        BigEndian::write_u16(&mut hdr[2..4], self.flags);
        out.extend_from_slice(&hdr);
        out.extend_from_slice(&self.body);
    }

    pub fn has_more(&self) -> bool {
        self.flags & OFPMPF_REPLY_MORE != 0
    }

    pub fn kind(&self) -> MultipartKind {
        MultipartKind(self.mp_type)
    }
}
