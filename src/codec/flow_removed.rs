//! `OFPT_FLOW_REMOVED`.

use byteorder::{BigEndian, ByteOrder};

use super::flow_mod::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive)]
pub enum FlowRemovedReason {
    IdleTimeout = 0,
    HardTimeout = 1,
    Delete = 2,
    GroupDelete = 3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRemoved {
    pub cookie: u64,
    pub priority: u16,
    pub reason: u8,
    pub table_id: u8,
    pub duration_sec: u32,
    pub duration_nsec: u32,
    pub packet_count: u64,
    pub byte_count: u64,
}

impl FlowRemoved {
    pub fn parse(buf: &[u8]) -> FlowRemoved {
        FlowRemoved {
            cookie: BigEndian::read_u64(&buf[0..8]),
            priority: BigEndian::read_u16(&buf[8..10]),
            reason: buf[10],
            table_id: buf[11],
            duration_sec: BigEndian::read_u32(&buf[12..16]),
            duration_nsec: BigEndian::read_u32(&buf[16..20]),
            packet_count: BigEndian::read_u64(&buf[32..40]),
            byte_count: BigEndian::read_u64(&buf[40..48]),
        }
    }

    /// Writes the fixed prefix (idle/hard timeout left zero, this core never sets
    /// them), an empty OXM match, then the counters.
    pub fn write(&self, out: &mut Vec<u8>) {
        let mut hdr = [0u8; 24];
        BigEndian::write_u64(&mut hdr[0..8], self.cookie);
        BigEndian::write_u16(&mut hdr[8..10], self.priority);
        hdr[10] = self.reason;
        hdr[11] = self.table_id;
        BigEndian::write_u32(&mut hdr[12..16], self.duration_sec);
        BigEndian::write_u32(&mut hdr[16..20], self.duration_nsec);
        out.extend_from_slice(&hdr);
        Match.write(out);
        let mut tail = [0u8; 16];
        BigEndian::write_u64(&mut tail[0..8], self.packet_count);
        BigEndian::write_u64(&mut tail[8..16], self.byte_count);
        out.extend_from_slice(&tail);
    }
}
