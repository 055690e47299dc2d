use serde_json::json;
use talkie_core::SignalMessage;

use crate::init_tracing;
use crate::utils::{TestClient, TestServer};

/// Rooms are nominally two-party, but a third joiner must not crash the
/// flow: it becomes one more broadcast target.
#[tokio::test]
async fn test_third_joiner_still_routed() {
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
    alice.recv().await.expect("user-joined");

    let mut carol = TestClient::connect(&server.ws_url())
        .await
        .expect("carol connect");
    let size = carol.join("R1", "carol").await.expect("carol join");
    assert_eq!(size, 3);

    alice.recv().await.expect("user-joined for carol");
    bob.recv().await.expect("user-joined for carol");

    carol
        .send(&SignalMessage::Offer {
            room_id: "R1".into(),
            offer: json!({"type": "offer", "sdp": "v=0"}),
            from: None,
        })
        .await
        .expect("send offer");

    for client in [&mut alice, &mut bob] {
        let SignalMessage::Offer { from, .. } = client.recv().await.expect("offer") else {
            panic!("expected forwarded offer");
        };
        assert_eq!(from, Some("carol".into()));
    }
}
