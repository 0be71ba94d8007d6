//! `OFPT_FLOW_MOD` — enough of `ofp_flow_mod`/OXM match/instructions to install the
//! table-miss flow entry the handshake needs.

use byteorder::{BigEndian, ByteOrder};

use super::port::OFPP_CONTROLLER;

pub const OFPFC_ADD: u8 = 0;
pub const OFPFC_MODIFY: u8 = 1;
pub const OFPFC_MODIFY_STRICT: u8 = 2;
pub const OFPFC_DELETE: u8 = 3;
pub const OFPFC_DELETE_STRICT: u8 = 4;

pub const OFPIT_APPLY_ACTIONS: u16 = 4;

pub const OFPAT_OUTPUT: u16 = 0;

pub const OFPCML_NO_BUFFER: u16 = 0xffff;

pub const OFP_NO_BUFFER: u32 = 0xffff_ffff;

pub const OFPMT_OXM: u16 = 1;

/// `ofp_match` with an empty OXM field list — matches every packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match;

impl Match {
    pub fn write(&self, out: &mut Vec<u8>) {
        // type=OFPMT_OXM, length=4 (header only), padded to a multiple of 8.
        let mut hdr = [0u8; 8];
        BigEndian::write_u16(&mut hdr[0..2], OFPMT_OXM);
        BigEndian::write_u16(&mut hdr[2..4], 4);
        out.extend_from_slice(&hdr);
    }

    pub fn buffer_len(&self) -> usize {
        8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Output { port: u32, max_len: u16 },
}

impl Action {
    pub fn write(&self, out: &mut Vec<u8>) {
        match self {
            Action::Output { port, max_len } => {
                let mut buf = [0u8; 16];
                BigEndian::write_u16(&mut buf[0..2], OFPAT_OUTPUT);
                BigEndian::write_u16(&mut buf[2..4], 16);
                BigEndian::write_u32(&mut buf[4..8], *port);
                BigEndian::write_u16(&mut buf[8..10], *max_len);
                out.extend_from_slice(&buf);
            }
        }
    }

    pub fn buffer_len(&self) -> usize {
        16
    }

    pub fn output_to_controller() -> Action {
        Action::Output {
            port: OFPP_CONTROLLER,
            max_len: OFPCML_NO_BUFFER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub actions: Vec<Action>,
}

impl Instruction {
    pub fn apply_actions(actions: Vec<Action>) -> Instruction {
        Instruction { actions }
    }

    fn buffer_len(&self) -> usize {
        8 + self.actions.iter().map(Action::buffer_len).sum::<usize>()
    }

    fn write(&self, out: &mut Vec<u8>) {
        let mut hdr = [0u8; 8];
        BigEndian::write_u16(&mut hdr[0..2], OFPIT_APPLY_ACTIONS);
        BigEndian::write_u16(&mut hdr[2..4], self.buffer_len() as u16);
        out.extend_from_slice(&hdr);
        for action in &self.actions {
            action.write(out);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowMod {
    pub cookie: u64,
    pub table_id: u8,
    pub command: u8,
    pub priority: u16,
    pub buffer_id: u32,
    pub out_port: u32,
    pub out_group: u32,
    pub flags: u16,
    pub mat: Match,
    pub instructions: Vec<Instruction>,
}

impl FlowMod {
    /// The table-miss entry installed right after FEATURES_REPLY: match-all, priority 1
    /// (as low as a real flow entry gets; 0 is reserved for the table-miss semantics
    /// itself), apply-actions output:CONTROLLER.
    pub fn table_miss(table_id: u8) -> FlowMod {
        FlowMod {
            cookie: 0,
            table_id,
            command: OFPFC_ADD,
            priority: 1,
            buffer_id: OFP_NO_BUFFER,
            out_port: OFPP_CONTROLLER,
            out_group: 0xffff_ffff,
            flags: 0,
            mat: Match,
            instructions: vec![Instruction::apply_actions(vec![Action::output_to_controller()])],
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let mut hdr = [0u8; 40];
        BigEndian::write_u64(&mut hdr[0..8], self.cookie);
        BigEndian::write_u64(&mut hdr[8..16], 0); // cookie_mask
        hdr[16] = self.table_id;
        hdr[17] = self.command;
        BigEndian::write_u16(&mut hdr[18..20], 0); // idle_timeout
        BigEndian::write_u16(&mut hdr[20..22], 0); // hard_timeout
        BigEndian::write_u16(&mut hdr[22..24], self.priority);
        BigEndian::write_u32(&mut hdr[24..28], self.buffer_id);
        BigEndian::write_u32(&mut hdr[28..32], self.out_port);
        BigEndian::write_u32(&mut hdr[32..36], self.out_group);
        BigEndian::write_u16(&mut hdr[36..38], self.flags);
        out.extend_from_slice(&hdr);
        self.mat.write(out);
        for ins in &self.instructions {
            ins.write(out);
        }
    }
}
