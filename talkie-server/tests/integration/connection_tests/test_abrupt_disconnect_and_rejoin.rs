use talkie_core::SignalMessage;

use crate::init_tracing;
use crate::utils::{TestClient, TestServer};

#[tokio::test]
async fn test_abrupt_disconnect_and_rejoin() {
    init_tracing();
    let server = TestServer::start().await;

    let mut alice = TestClient::connect(&server.ws_url())
        .await
        .expect("alice connect");
    alice.join("R1", "alice").await.expect("alice join");

    let mut bob = TestClient::connect(&server.ws_url())
        .await
        .expect("bob connect");
    bob.join("R1", "bob").await.expect("bob join");
    alice.recv().await.expect("user-joined notice");

    // Alice's browser crashes: no leave frame, no close handshake.
    alice.drop_abruptly();

    let notice = bob.recv().await.expect("user-left notice");
    assert_eq!(
        notice,
        SignalMessage::UserLeft {
            user_id: "alice".into(),
            room_size: 1,
        }
    );

    // The room survives with Bob alone in it.
    assert_eq!(server.registry.room_size(&"R1".into()), Some(1));

    // Alice rejoins under the same id within her backoff window.
    let mut alice = TestClient::connect(&server.ws_url())
        .await
        .expect("alice reconnect");
    let size = alice.join("R1", "alice").await.expect("alice rejoin");
    assert_eq!(size, 2);
    assert_eq!(server.registry.room_size(&"R1".into()), Some(2));
}
