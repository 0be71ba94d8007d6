//! `OFPT_FEATURES_REQUEST` (empty) / `OFPT_FEATURES_REPLY` (`ofp_switch_features`).

use byteorder::{BigEndian, ByteOrder};

pub const OFPC_FLOW_STATS: u32 = 1 << 0;
pub const OFPC_TABLE_STATS: u32 = 1 << 1;
pub const OFPC_PORT_STATS: u32 = 1 << 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeaturesRequest;

impl FeaturesRequest {
    pub fn parse(_buf: &[u8]) -> FeaturesRequest {
        FeaturesRequest
    }

    pub fn write(&self, _out: &mut Vec<u8>) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturesReply {
    pub datapath_id: u64,
    pub n_buffers: u32,
    pub n_tables: u8,
    pub auxiliary_id: u8,
    pub capabilities: u32,
}

impl FeaturesReply {
    pub fn parse(buf: &[u8]) -> FeaturesReply {
        FeaturesReply {
            datapath_id: BigEndian::read_u64(&buf[0..8]),
            n_buffers: BigEndian::read_u32(&buf[8..12]),
            n_tables: buf[12],
            auxiliary_id: buf[13],
            capabilities: BigEndian::read_u32(&buf[16..20]),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 24];
        BigEndian::write_u64(&mut buf[0..8], self.datapath_id);
        BigEndian::write_u32(&mut buf[8..12], self.n_buffers);
        buf[12] = self.n_tables;
        buf[13] = self.auxiliary_id;
        BigEndian::write_u32(&mut buf[16..20], self.capabilities);
        out.extend_from_slice(&buf);
    }
}
