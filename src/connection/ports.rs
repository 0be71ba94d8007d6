//! Baseline + delta port table.
//!
//! A `PortCollection` either stands alone (the ports reported in `FEATURES_REPLY`) or
//! layers on top of a `baseline` with a small overlay of adds/deletes/modifies applied
//! since, so a `PortStatus` event handler can diff "ports before" against "ports after"
//! without copying the whole table on every status message.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::codec::port::PortStatusReason;
use crate::codec::{MacAddr, Port};

#[derive(Debug, Clone, Default)]
pub struct PortCollection {
    baseline: Option<Arc<PortCollection>>,
    overrides: HashMap<u32, Port>,
    deleted: HashSet<u32>,
}

impl PortCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_features(ports: Vec<Port>) -> Self {
        let overrides = ports.into_iter().map(|p| (p.port_no, p)).collect();
        PortCollection { baseline: None, overrides, deleted: HashSet::new() }
    }

    pub fn get(&self, port_no: u32) -> Option<Port> {
        if self.deleted.contains(&port_no) {
            return None;
        }
        if let Some(p) = self.overrides.get(&port_no) {
            return Some(p.clone());
        }
        self.baseline.as_ref().and_then(|b| b.get(port_no))
    }

    /// Resolves a port by MAC address, walking this overlay's adds/modifies first and
    /// falling back to the baseline, the same way [`PortCollection::get`] resolves by
    /// port number — a baseline entry whose port number has since been overridden or
    /// deleted here never surfaces, even if it happens to carry a matching address.
    pub fn get_by_mac(&self, mac: MacAddr) -> Option<Port> {
        if let Some(p) = self.overrides.values().find(|p| p.hw_addr == mac) {
            return Some(p.clone());
        }
        self.baseline.as_ref().and_then(|b| {
            b.get_by_mac(mac)
                .filter(|p| !self.deleted.contains(&p.port_no) && !self.overrides.contains_key(&p.port_no))
        })
    }

    /// Resolves a port by name, with the same overlay-then-baseline precedence as
    /// [`PortCollection::get_by_mac`].
    pub fn get_by_name(&self, name: &str) -> Option<Port> {
        if let Some(p) = self.overrides.values().find(|p| p.name == name) {
            return Some(p.clone());
        }
        self.baseline.as_ref().and_then(|b| {
            b.get_by_name(name)
                .filter(|p| !self.deleted.contains(&p.port_no) && !self.overrides.contains_key(&p.port_no))
        })
    }

    /// Flattens baseline + overlay into one map. Used for iteration and for collapsing
    /// a chain of deltas back into a standalone table.
    pub fn all(&self) -> HashMap<u32, Port> {
        let mut result = match &self.baseline {
            Some(b) => b.all(),
            None => HashMap::new(),
        };
        for deleted in &self.deleted {
            result.remove(deleted);
        }
        for (port_no, port) in &self.overrides {
            result.insert(*port_no, port.clone());
        }
        result
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies one `OFPT_PORT_STATUS` update to the overlay, returning the port's prior
    /// state (if it had one) so callers can raise an event carrying both.
    pub fn apply_status(&mut self, reason: u8, port: Port) -> Option<Port> {
        let prev = self.get(port.port_no);
        if reason == PortStatusReason::Delete as u8 {
            self.overrides.remove(&port.port_no);
            self.deleted.insert(port.port_no);
        } else {
            self.deleted.remove(&port.port_no);
            self.overrides.insert(port.port_no, port);
        }
        prev
    }

    /// Chains a new overlay on top of this collection (used when a reconnect or a
    /// config change needs to track further deltas without losing the current view).
    pub fn chained(self: &Arc<Self>) -> PortCollection {
        PortCollection { baseline: Some(self.clone()), overrides: HashMap::new(), deleted: HashSet::new() }
    }

    /// Returns an independent clone layered on the same baseline.
    pub fn copy(&self) -> PortCollection {
        self.clone()
    }

    /// Collapses baseline + overlay into a single standalone table, dropping delta
    /// history. Used once a handshake completes and FEATURES_REPLY's ports become the
    /// new ground truth.
    pub fn flatten(&self) -> PortCollection {
        PortCollection { baseline: None, overrides: self.all(), deleted: HashSet::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(no: u32, name: &str) -> Port {
        Port {
            port_no: no,
            hw_addr: MacAddr([0, 0, 0, 0, 0, no as u8]),
            name: name.to_string(),
            config: 0,
            state: 0,
            curr: 0,
            advertised: 0,
            supported: 0,
            peer: 0,
            curr_speed: 0,
            max_speed: 0,
        }
    }

    #[test]
    fn from_features_lists_all_ports() {
        let pc = PortCollection::from_features(vec![port(1, "eth0"), port(2, "eth1")]);
        assert_eq!(pc.len(), 2);
        assert_eq!(pc.get(1).unwrap().name, "eth0");
    }

    #[test]
    fn overlay_delete_hides_baseline_port() {
        let base = Arc::new(PortCollection::from_features(vec![port(1, "eth0")]));
        let mut overlay = base.chained();
        let prev = overlay.apply_status(PortStatusReason::Delete as u8, port(1, "eth0"));
        assert_eq!(prev.unwrap().name, "eth0");
        assert!(overlay.get(1).is_none());
        assert_eq!(overlay.len(), 0);
    }

    #[test]
    fn overlay_add_is_visible_without_mutating_baseline() {
        let base = Arc::new(PortCollection::from_features(vec![port(1, "eth0")]));
        let mut overlay = base.chained();
        overlay.apply_status(PortStatusReason::Add as u8, port(2, "eth1"));
        assert_eq!(overlay.len(), 2);
        assert_eq!(base.len(), 1);
    }

    #[test]
    fn copy_preserves_baseline_chain() {
        let base = Arc::new(PortCollection::from_features(vec![port(1, "eth0")]));
        let overlay = base.chained();
        let copied = overlay.copy();
        assert_eq!(copied.get(1).unwrap().name, "eth0");
    }

    #[test]
    fn resolves_same_port_by_number_mac_and_name() {
        let pc = PortCollection::from_features(vec![port(1, "p1")]);
        let by_no = pc.get(1).unwrap();
        let by_mac = pc.get_by_mac(MacAddr([0, 0, 0, 0, 0, 1])).unwrap();
        let by_name = pc.get_by_name("p1").unwrap();
        assert_eq!(by_no.port_no, 1);
        assert_eq!(by_mac.port_no, 1);
        assert_eq!(by_name.port_no, 1);
    }

    #[test]
    fn overlay_rename_is_visible_by_new_name_not_old() {
        let base = Arc::new(PortCollection::from_features(vec![port(1, "eth0")]));
        let mut overlay = base.chained();
        overlay.apply_status(PortStatusReason::Modify as u8, port(1, "eth0-renamed"));
        assert!(overlay.get_by_name("eth0").is_none());
        assert_eq!(overlay.get_by_name("eth0-renamed").unwrap().port_no, 1);
        // the baseline itself is untouched
        assert_eq!(base.get_by_name("eth0").unwrap().port_no, 1);
    }

    #[test]
    fn overlay_delete_hides_baseline_port_by_mac_and_name() {
        let base = Arc::new(PortCollection::from_features(vec![port(1, "eth0")]));
        let mut overlay = base.chained();
        overlay.apply_status(PortStatusReason::Delete as u8, port(1, "eth0"));
        assert!(overlay.get_by_mac(MacAddr([0, 0, 0, 0, 0, 1])).is_none());
        assert!(overlay.get_by_name("eth0").is_none());
    }

    #[test]
    fn flatten_collapses_chain() {
        let base = Arc::new(PortCollection::from_features(vec![port(1, "eth0")]));
        let mut overlay = base.chained();
        overlay.apply_status(PortStatusReason::Modify as u8, port(1, "eth0-renamed"));
        let flat = overlay.flatten();
        assert_eq!(flat.get(1).unwrap().name, "eth0-renamed");
        assert_eq!(flat.len(), 1);
    }
}
