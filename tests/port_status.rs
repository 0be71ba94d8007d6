mod support;

use std::time::Duration;

use tokio::time::timeout;

use openflow_core::codec::port::PortStatusReason;
use openflow_core::codec::{MacAddr, Port, PortStatus};
use openflow_core::{ControllerEvent, OfMessage};
use support::{complete_handshake, recording_arbiter, spawn_connection};

fn port(no: u32, name: &str) -> Port {
    Port {
        port_no: no,
        hw_addr: MacAddr::default(),
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

#[tokio::test]
async fn port_status_add_is_forwarded_as_an_event_while_up() {
    let (arbiter, mut events) = recording_arbiter();
    let mut switch = spawn_connection(arbiter).await;
    complete_handshake(&mut switch, 1).await;

    // ConnectionUp, FeaturesReceived
    for _ in 0..2 {
        timeout(Duration::from_secs(1), events.recv()).await.expect("handshake event timeout");
    }

    switch
        .send(&OfMessage::PortStatus {
            xid: 0,
            body: PortStatus { reason: PortStatusReason::Add as u8, port: port(3, "eth3") },
        })
        .await;

    match timeout(Duration::from_secs(1), events.recv()).await.expect("event timeout").expect("channel closed") {
        ControllerEvent::PortStatus { status, .. } => {
            assert_eq!(status.port.port_no, 3);
            assert_eq!(status.port.name, "eth3");
        }
        other => panic!("expected PortStatus event, got {other:?}"),
    }
}
