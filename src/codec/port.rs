//! `ofp_port` and `OFPT_PORT_STATUS`.

use byteorder::{BigEndian, ByteOrder};
use std::fmt;

pub const OFP_PORT_LEN: usize = 64;
pub const OFP_MAX_PORT_NAME_LEN: usize = 16;

pub const OFPP_MAX: u32 = 0xffff_ff00;
pub const OFPP_CONTROLLER: u32 = 0xffff_fffd;
pub const OFPP_ANY: u32 = 0xffff_ffff;

pub const OFPPC_PORT_DOWN: u32 = 1 << 0;
pub const OFPPC_NO_RECV: u32 = 1 << 2;
pub const OFPPC_NO_FWD: u32 = 1 << 5;
pub const OFPPC_NO_PACKET_IN: u32 = 1 << 6;

pub const OFPPS_LINK_DOWN: u32 = 1 << 0;
pub const OFPPS_BLOCKED: u32 = 1 << 1;
pub const OFPPS_LIVE: u32 = 1 << 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// `OFPT_PORT_STATUS` reason codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive)]
pub enum PortStatusReason {
    Add = 0,
    Delete = 1,
    Modify = 2,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Port {
    pub port_no: u32,
    pub hw_addr: MacAddr,
    pub name: String,
    pub config: u32,
    pub state: u32,
    pub curr: u32,
    pub advertised: u32,
    pub supported: u32,
    pub peer: u32,
    pub curr_speed: u32,
    pub max_speed: u32,
}

impl Port {
    pub fn parse(buf: &[u8]) -> Port {
        let port_no = BigEndian::read_u32(&buf[0..4]);
        let mut hw_addr = [0u8; 6];
        hw_addr.copy_from_slice(&buf[8..14]);
        let name_bytes = &buf[16..16 + OFP_MAX_PORT_NAME_LEN];
        let nul = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
        let name = String::from_utf8_lossy(&name_bytes[..nul]).into_owned();
        Port {
            port_no,
            hw_addr: MacAddr(hw_addr),
            name,
            config: BigEndian::read_u32(&buf[32..36]),
            state: BigEndian::read_u32(&buf[36..40]),
            curr: BigEndian::read_u32(&buf[40..44]),
            advertised: BigEndian::read_u32(&buf[44..48]),
            supported: BigEndian::read_u32(&buf[48..52]),
            peer: BigEndian::read_u32(&buf[52..56]),
            curr_speed: BigEndian::read_u32(&buf[56..60]),
            max_speed: BigEndian::read_u32(&buf[60..64]),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.resize(start + OFP_PORT_LEN, 0);
        let buf = &mut out[start..];
        BigEndian::write_u32(&mut buf[0..4], self.port_no);
        buf[8..14].copy_from_slice(&self.hw_addr.0);
        let name_bytes = self.name.as_bytes();
        let n = name_bytes.len().min(OFP_MAX_PORT_NAME_LEN - 1);
        buf[16..16 + n].copy_from_slice(&name_bytes[..n]);
        BigEndian::write_u32(&mut buf[32..36], self.config);
        BigEndian::write_u32(&mut buf[36..40], self.state);
        BigEndian::write_u32(&mut buf[40..44], self.curr);
        BigEndian::write_u32(&mut buf[44..48], self.advertised);
        BigEndian::write_u32(&mut buf[48..52], self.supported);
        BigEndian::write_u32(&mut buf[52..56], self.peer);
        BigEndian::write_u32(&mut buf[56..60], self.curr_speed);
        BigEndian::write_u32(&mut buf[60..64], self.max_speed);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortStatus {
    pub reason: u8,
    pub port: Port,
}

impl PortStatus {
    pub fn parse(buf: &[u8]) -> PortStatus {
        PortStatus {
            reason: buf[0],
            port: Port::parse(&buf[8..8 + OFP_PORT_LEN]),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.resize(start + 8, 0); // reason + 7 bytes pad
        out[start] = self.reason;
        self.port.write(out);
    }
}
