//! `OFPT_PACKET_IN` — buffer_id/total_len/reason/table_id/cookie header, match, and the
//! captured frame. The OXM match is treated as an opaque blob; nothing in this core
//! inspects match fields.

use byteorder::{BigEndian, ByteOrder};

use super::flow_mod::Match;

pub const OFPR_NO_MATCH: u8 = 0;
pub const OFPR_ACTION: u8 = 1;
pub const OFPR_INVALID_TTL: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    pub buffer_id: u32,
    pub total_len: u16,
    pub reason: u8,
    pub table_id: u8,
    pub cookie: u64,
    pub data: Vec<u8>,
}

impl PacketIn {
    /// `buf` starts right after the fixed 16-byte prefix and the (variable-length) OXM
    /// match; the caller has already located `match_len` via the match header.
    pub fn parse(buf: &[u8], match_len: usize) -> PacketIn {
        let buffer_id = BigEndian::read_u32(&buf[0..4]);
        let total_len = BigEndian::read_u16(&buf[4..6]);
        let reason = buf[6];
        let table_id = buf[7];
        let cookie = BigEndian::read_u64(&buf[8..16]);
        let match_padded = (match_len + 7) / 8 * 8;
        let data_start = 16 + match_padded + 2; // 2 bytes of pad after match
        let data = buf.get(data_start..).map(|d| d.to_vec()).unwrap_or_default();
        PacketIn {
            buffer_id,
            total_len,
            reason,
            table_id,
            cookie,
            data,
        }
    }

    /// Writes the fixed prefix, an empty OXM match, the two pad bytes that follow it,
    /// then the captured frame.
    pub fn write(&self, out: &mut Vec<u8>) {
        let mut hdr = [0u8; 16];
        BigEndian::write_u32(&mut hdr[0..4], self.buffer_id);
        BigEndian::write_u16(&mut hdr[4..6], self.total_len);
        hdr[6] = self.reason;
        hdr[7] = self.table_id;
        BigEndian::write_u64(&mut hdr[8..16], self.cookie);
        out.extend_from_slice(&hdr);
        Match.write(out);
        out.extend_from_slice(&[0u8; 2]);
        out.extend_from_slice(&self.data);
    }
}
