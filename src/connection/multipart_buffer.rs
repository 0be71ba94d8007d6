//! Reassembles `OFPT_MULTIPART_REPLY` fragments into one logical reply body.

use crate::codec::multipart::MultipartKind;
use crate::codec::MultipartMsg;

#[derive(Debug, Default)]
pub struct MultipartBuffer {
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
    xid: u32,
    kind: MultipartKind,
    body: Vec<u8>,
}

impl MultipartBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one fragment. Returns `Some(body)` once the fragment that clears
    /// `OFPMPF_REPLY_MORE` arrives, at which point the transaction is complete:
    /// `body` is the concatenation of every fragment's body for list-shaped replies
    /// (flow/port/group stats, ...) or just the first fragment's body for scalar
    /// replies (desc, aggregate, ...), per [`MultipartKind::is_list`].
    pub fn ingest(&mut self, xid: u32, msg: &MultipartMsg) -> Option<Vec<u8>> {
        let kind = msg.kind();
        match &mut self.pending {
            Some(p) if p.xid == xid && p.kind == kind => {
                if kind.is_list() {
                    p.body.extend_from_slice(&msg.body);
                }
            }
            _ => {
                self.pending = Some(Pending { xid, kind, body: msg.body.clone() });
            }
        }
        if msg.has_more() {
            None
        } else {
            self.pending.take().map(|p| p.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::multipart::{OFPMPF_REPLY_MORE, OFPMP_AGGREGATE, OFPMP_FLOW};

    fn fragment(mp_type: u16, more: bool, body: Vec<u8>) -> MultipartMsg {
        MultipartMsg { mp_type, flags: if more { OFPMPF_REPLY_MORE } else { 0 }, body }
    }

    #[test]
    fn single_fragment_list_reply_returns_immediately() {
        let mut buf = MultipartBuffer::new();
        let got = buf.ingest(1, &fragment(OFPMP_FLOW, false, vec![1, 2, 3]));
        assert_eq!(got, Some(vec![1, 2, 3]));
    }

    #[test]
    fn list_reply_concatenates_fragments() {
        let mut buf = MultipartBuffer::new();
        assert_eq!(buf.ingest(1, &fragment(OFPMP_FLOW, true, vec![1, 2])), None);
        assert_eq!(buf.ingest(1, &fragment(OFPMP_FLOW, false, vec![3, 4])), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn scalar_reply_keeps_only_first_fragment() {
        let mut buf = MultipartBuffer::new();
        assert_eq!(buf.ingest(1, &fragment(OFPMP_AGGREGATE, true, vec![0xaa])), None);
        assert_eq!(
            buf.ingest(1, &fragment(OFPMP_AGGREGATE, false, vec![0xbb])),
            Some(vec![0xaa])
        );
    }

    #[test]
    fn unrelated_xid_resets_the_pending_transaction() {
        let mut buf = MultipartBuffer::new();
        assert_eq!(buf.ingest(1, &fragment(OFPMP_FLOW, true, vec![1])), None);
        // A reply for a different xid arrives (e.g. after a retry) — start fresh.
        assert_eq!(buf.ingest(2, &fragment(OFPMP_FLOW, false, vec![9])), Some(vec![9]));
    }
}
