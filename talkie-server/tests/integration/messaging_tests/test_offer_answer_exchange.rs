use serde_json::json;
use talkie_core::SignalMessage;

use crate::init_tracing;
use crate::utils::{TestClient, TestServer};

/// The full two-party signaling exchange: offer over, answer back, ICE both
/// ways, every forwarded frame stamped with its sender.
#[tokio::test]
async fn test_offer_answer_exchange() {
    init_tracing();
    let server = TestServer::start().await;

    let mut alice = TestClient::connect(&server.ws_url())
        .await
        .expect("alice connect");
    assert_eq!(alice.join("R1", "alice").await.expect("alice join"), 1);

    let mut bob = TestClient::connect(&server.ws_url())
        .await
        .expect("bob connect");
    assert_eq!(bob.join("R1", "bob").await.expect("bob join"), 2);
    alice.recv().await.expect("user-joined notice");

    // Alice (initiator) presses push-to-talk and sends her offer.
    alice
        .send(&SignalMessage::Offer {
            room_id: "R1".into(),
            offer: json!({"type": "offer", "sdp": "v=0\r\no=alice"}),
            from: None,
        })
        .await
        .expect("send offer");

    let SignalMessage::Offer { offer, from, .. } = bob.recv().await.expect("offer") else {
        panic!("expected forwarded offer");
    };
    assert_eq!(from, Some("alice".into()));
    assert_eq!(offer["sdp"], "v=0\r\no=alice");

    // Bob answers.
    bob.send(&SignalMessage::Answer {
        room_id: "R1".into(),
        answer: json!({"type": "answer", "sdp": "v=0\r\no=bob"}),
        from: None,
    })
    .await
    .expect("send answer");

    let SignalMessage::Answer { answer, from, .. } = alice.recv().await.expect("answer") else {
        panic!("expected forwarded answer");
    };
    assert_eq!(from, Some("bob".into()));
    assert_eq!(answer["sdp"], "v=0\r\no=bob");

    // ICE flows symmetrically; the payload passes through untouched.
    let candidate = json!({
        "candidate": "candidate:0 1 UDP 2122252543 192.0.2.1 54321 typ host",
        "sdpMid": "0",
        "sdpMLineIndex": 0,
    });
    alice
        .send(&SignalMessage::IceCandidate {
            room_id: "R1".into(),
            candidate: candidate.clone(),
            from: None,
        })
        .await
        .expect("send candidate");

    let SignalMessage::IceCandidate {
        candidate: received,
        from,
        ..
    } = bob.recv().await.expect("candidate")
    else {
        panic!("expected forwarded candidate");
    };
    assert_eq!(from, Some("alice".into()));
    assert_eq!(received, candidate);

    alice.close().await.expect("alice close");
    bob.close().await.expect("bob close");
}
