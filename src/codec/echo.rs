//! `OFPT_ECHO_REQUEST` / `OFPT_ECHO_REPLY` — arbitrary opaque payload, echoed back verbatim.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Echo {
    pub data: Vec<u8>,
}

impl Echo {
    pub fn parse(buf: &[u8]) -> Echo {
        Echo { data: buf.to_vec() }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.data);
    }
}
