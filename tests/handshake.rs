mod support;

use std::time::Duration;

use tokio::time::timeout;

use openflow_core::codec::error_msg::{OFPBRC_BAD_TYPE, OFPET_BAD_REQUEST};
use openflow_core::codec::{Barrier, ErrorMsg, FeaturesReply, Hello};
use openflow_core::{ControllerEvent, OfMessage};
use support::{recording_arbiter, spawn_connection};

async fn next_event(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ControllerEvent>) -> ControllerEvent {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("event timeout")
        .expect("event channel closed")
}

#[tokio::test]
async fn full_handshake_installs_table_miss_and_raises_up_once() {
    let (arbiter, mut events) = recording_arbiter();
    let mut switch = spawn_connection(arbiter).await;

    match switch.next().await {
        OfMessage::Hello { .. } => {}
        other => panic!("expected HELLO first, got {other:?}"),
    }
    switch.send(&OfMessage::Hello { xid: 0, body: Hello }).await;

    let features_request_xid = match switch.next().await {
        OfMessage::FeaturesRequest { xid, .. } => xid,
        other => panic!("expected FEATURES_REQUEST, got {other:?}"),
    };
    switch
        .send(&OfMessage::FeaturesReply {
            xid: features_request_xid,
            body: FeaturesReply { datapath_id: 0x42, n_buffers: 256, n_tables: 1, auxiliary_id: 0, capabilities: 0 },
        })
        .await;

    match switch.next().await {
        OfMessage::FlowMod { .. } => {}
        other => panic!("expected the table-miss FLOW_MOD, got {other:?}"),
    }
    let barrier_xid = match switch.next().await {
        OfMessage::BarrierRequest { xid, .. } => xid,
        other => panic!("expected BARRIER_REQUEST, got {other:?}"),
    };
    switch.send(&OfMessage::BarrierReply { xid: barrier_xid, body: Barrier }).await;

    match next_event(&mut events).await {
        ControllerEvent::ConnectionUp { dpid, .. } => assert_eq!(dpid, 0x42),
        other => panic!("expected ConnectionUp, got {other:?}"),
    }
    match next_event(&mut events).await {
        ControllerEvent::FeaturesReceived { dpid, features, .. } => {
            assert_eq!(dpid, 0x42);
            assert_eq!(features.n_tables, 1);
        }
        other => panic!("expected FeaturesReceived, got {other:?}"),
    }

    assert!(
        timeout(Duration::from_millis(100), events.recv()).await.is_err(),
        "handshake must raise ConnectionUp/FeaturesReceived exactly once"
    );
}

#[tokio::test]
async fn bad_type_error_during_barrier_wait_is_tolerated() {
    let (arbiter, mut events) = recording_arbiter();
    let mut switch = spawn_connection(arbiter).await;

    switch.next().await; // HELLO
    switch.send(&OfMessage::Hello { xid: 0, body: Hello }).await;
    let features_xid = match switch.next().await {
        OfMessage::FeaturesRequest { xid, .. } => xid,
        other => panic!("expected FEATURES_REQUEST, got {other:?}"),
    };
    switch
        .send(&OfMessage::FeaturesReply {
            xid: features_xid,
            body: FeaturesReply { datapath_id: 7, n_buffers: 0, n_tables: 1, auxiliary_id: 0, capabilities: 0 },
        })
        .await;
    switch.next().await; // FLOW_MOD
    let barrier_xid = match switch.next().await {
        OfMessage::BarrierRequest { xid, .. } => xid,
        other => panic!("expected BARRIER_REQUEST, got {other:?}"),
    };

    // The switch doesn't understand BARRIER_REQUEST and replies with the one error
    // kind that's tolerated instead of failing the connect.
    switch
        .send(&OfMessage::Error {
            xid: barrier_xid,
            body: ErrorMsg { error_type: OFPET_BAD_REQUEST, code: OFPBRC_BAD_TYPE, data: vec![] },
        })
        .await;

    match next_event(&mut events).await {
        ControllerEvent::ConnectionUp { dpid, .. } => assert_eq!(dpid, 7),
        other => panic!("expected ConnectionUp despite the tolerated error, got {other:?}"),
    }
}

#[tokio::test]
async fn unrelated_error_during_barrier_wait_fails_the_connect() {
    let (arbiter, mut events) = recording_arbiter();
    let mut switch = spawn_connection(arbiter).await;

    switch.next().await; // HELLO
    switch.send(&OfMessage::Hello { xid: 0, body: Hello }).await;
    let features_xid = match switch.next().await {
        OfMessage::FeaturesRequest { xid, .. } => xid,
        other => panic!("expected FEATURES_REQUEST, got {other:?}"),
    };
    switch
        .send(&OfMessage::FeaturesReply {
            xid: features_xid,
            body: FeaturesReply { datapath_id: 9, n_buffers: 0, n_tables: 1, auxiliary_id: 0, capabilities: 0 },
        })
        .await;
    switch.next().await; // FLOW_MOD
    let barrier_xid = match switch.next().await {
        OfMessage::BarrierRequest { xid, .. } => xid,
        other => panic!("expected BARRIER_REQUEST, got {other:?}"),
    };

    switch
        .send(&OfMessage::Error {
            xid: barrier_xid,
            body: ErrorMsg { error_type: OFPET_BAD_REQUEST, code: 99, data: vec![] },
        })
        .await;

    // No ConnectionUp/FeaturesReceived should ever arrive; the connection is dropped.
    assert!(
        timeout(Duration::from_millis(200), events.recv()).await.is_err(),
        "a non-tolerated error during the barrier wait must not complete the handshake"
    );
}
