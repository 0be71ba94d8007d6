//! `OFPT_ERROR`.

use byteorder::{BigEndian, ByteOrder};

pub const OFPET_HELLO_FAILED: u16 = 0;
pub const OFPET_BAD_REQUEST: u16 = 1;
pub const OFPET_BAD_ACTION: u16 = 2;
pub const OFPET_BAD_INSTRUCTION: u16 = 3;
pub const OFPET_BAD_MATCH: u16 = 4;
pub const OFPET_FLOW_MOD_FAILED: u16 = 5;

pub const OFPBRC_BAD_VERSION: u16 = 0;
pub const OFPBRC_BAD_TYPE: u16 = 1;
pub const OFPBRC_BAD_MULTIPART: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMsg {
    pub error_type: u16,
    pub code: u16,
    pub data: Vec<u8>,
}

impl ErrorMsg {
    pub fn parse(buf: &[u8]) -> ErrorMsg {
        ErrorMsg {
            error_type: BigEndian::read_u16(&buf[0..2]),
            code: BigEndian::read_u16(&buf[2..4]),
            data: buf[4..].to_vec(),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let mut hdr = [0u8; 4];
        BigEndian::write_u16(&mut hdr[0..2], self.error_type);
        BigEndian::write_u16(&mut hdr[2..4], self.code);
        out.extend_from_slice(&hdr);
        out.extend_from_slice(&self.data);
    }

    /// True if this is the "I don't understand that message type" reply, treated as a
    /// benign end to the table-miss barrier wait.
    pub fn is_bad_type(&self) -> bool {
        self.error_type == OFPET_BAD_REQUEST && self.code == OFPBRC_BAD_TYPE
    }

    /// Whether this error is worth a log line on its own, outside the tolerated
    /// bad-type reply during the table-miss barrier wait, which is never noisy.
    pub fn should_log(&self) -> bool {
        !self.is_bad_type()
    }
}
