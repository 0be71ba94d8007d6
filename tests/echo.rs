mod support;

use std::time::Duration;

use tokio::time::timeout;

use openflow_core::codec::Echo;
use openflow_core::OfMessage;
use support::{recording_arbiter, spawn_connection};

#[tokio::test]
async fn echo_request_is_answered_with_the_same_payload_before_handshake_completes() {
    let (arbiter, _events) = recording_arbiter();
    let mut switch = spawn_connection(arbiter).await;

    switch.next().await; // HELLO

    switch
        .send(&OfMessage::EchoRequest { xid: 55, body: Echo { data: vec![1, 2, 3, 4] } })
        .await;

    let reply = timeout(Duration::from_secs(1), switch.next()).await.expect("echo reply timeout");
    match reply {
        OfMessage::EchoReply { xid, body } => {
            assert_eq!(xid, 55);
            assert_eq!(body.data, vec![1, 2, 3, 4]);
        }
        other => panic!("expected ECHO_REPLY, got {other:?}"),
    }
}
