mod support;

use std::time::Duration;

use tokio::time::timeout;

use openflow_core::codec::multipart::{OFPMPF_REPLY_MORE, OFPMP_AGGREGATE, OFPMP_FLOW};
use openflow_core::codec::MultipartMsg;
use openflow_core::{ControllerEvent, OfMessage};
use support::{complete_handshake, recording_arbiter, spawn_connection};

async fn next_event(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ControllerEvent>) -> ControllerEvent {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("event timeout")
        .expect("event channel closed")
}

async fn drain_handshake_events(events: &mut tokio::sync::mpsc::UnboundedReceiver<ControllerEvent>) {
    next_event(events).await; // ConnectionUp
    next_event(events).await; // FeaturesReceived
}

#[tokio::test]
async fn multi_fragment_list_reply_is_concatenated_into_one_event() {
    let (arbiter, mut events) = recording_arbiter();
    let mut switch = spawn_connection(arbiter).await;
    complete_handshake(&mut switch, 1).await;
    drain_handshake_events(&mut events).await;

    let xid = 100;
    switch
        .send(&OfMessage::MultipartRequest {
            xid,
            body: MultipartMsg { mp_type: OFPMP_FLOW, flags: 0, body: vec![] },
        })
        .await;
    switch
        .send(&OfMessage::MultipartReply {
            xid,
            body: MultipartMsg { mp_type: OFPMP_FLOW, flags: OFPMPF_REPLY_MORE, body: vec![1, 2, 3] },
        })
        .await;
    switch
        .send(&OfMessage::MultipartReply {
            xid,
            body: MultipartMsg { mp_type: OFPMP_FLOW, flags: 0, body: vec![4, 5, 6] },
        })
        .await;

    match next_event(&mut events).await {
        ControllerEvent::MultipartAssembled { kind, body, .. } => {
            assert_eq!(kind.0, OFPMP_FLOW);
            assert_eq!(body, vec![1, 2, 3, 4, 5, 6]);
        }
        other => panic!("expected MultipartAssembled, got {other:?}"),
    }
}

#[tokio::test]
async fn scalar_reply_only_keeps_the_first_fragment() {
    let (arbiter, mut events) = recording_arbiter();
    let mut switch = spawn_connection(arbiter).await;
    complete_handshake(&mut switch, 2).await;
    drain_handshake_events(&mut events).await;

    let xid = 7;
    switch
        .send(&OfMessage::MultipartReply {
            xid,
            body: MultipartMsg { mp_type: OFPMP_AGGREGATE, flags: OFPMPF_REPLY_MORE, body: vec![0xaa] },
        })
        .await;
    switch
        .send(&OfMessage::MultipartReply {
            xid,
            body: MultipartMsg { mp_type: OFPMP_AGGREGATE, flags: 0, body: vec![0xbb] },
        })
        .await;

    match next_event(&mut events).await {
        ControllerEvent::MultipartAssembled { kind, body, .. } => {
            assert_eq!(kind.0, OFPMP_AGGREGATE);
            assert_eq!(body, vec![0xaa]);
        }
        other => panic!("expected MultipartAssembled, got {other:?}"),
    }
}
