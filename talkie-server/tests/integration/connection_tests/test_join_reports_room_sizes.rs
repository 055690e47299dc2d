use talkie_core::SignalMessage;

use crate::init_tracing;
use crate::utils::{TestClient, TestServer};

#[tokio::test]
async fn test_join_reports_room_sizes() {
    init_tracing();
    let server = TestServer::start().await;

    let mut alice = TestClient::connect(&server.ws_url())
        .await
        .expect("alice connect");
    let size = alice.join("R1", "alice").await.expect("alice join");
    assert_eq!(size, 1, "first joiner sees an empty room");

    let mut bob = TestClient::connect(&server.ws_url())
        .await
        .expect("bob connect");
    let size = bob.join("R1", "bob").await.expect("bob join");
    assert_eq!(size, 2, "second joiner sees the first");

    // The first participant learns about the newcomer.
    let notice = alice.recv().await.expect("user-joined notice");
    assert_eq!(
        notice,
        SignalMessage::UserJoined {
            user_id: "bob".into(),
            room_size: 2,
        }
    );

    assert_eq!(server.registry.room_size(&"R1".into()), Some(2));

    alice.close().await.expect("alice close");
    bob.close().await.expect("bob close");
}
