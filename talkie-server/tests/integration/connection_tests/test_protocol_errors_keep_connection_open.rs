use serde_json::json;
use talkie_core::SignalMessage;

use crate::init_tracing;
use crate::utils::{TestClient, TestServer};

#[tokio::test]
async fn test_protocol_errors_keep_connection_open() {
    init_tracing();
    let server = TestServer::start().await;

    let mut client = TestClient::connect(&server.ws_url())
        .await
        .expect("connect");

    // Malformed JSON framing.
    client.send_raw("{definitely not json").await.expect("send");
    assert!(matches!(
        client.recv().await.expect("error reply"),
        SignalMessage::Error { .. }
    ));

    // Unknown message kind.
    client
        .send_raw(r#"{"type":"shout","roomId":"R1"}"#)
        .await
        .expect("send");
    assert!(matches!(
        client.recv().await.expect("error reply"),
        SignalMessage::Error { .. }
    ));

    // Signaling before join.
    client
        .send(&SignalMessage::Offer {
            room_id: "R1".into(),
            offer: json!({"sdp": "v=0"}),
            from: None,
        })
        .await
        .expect("send");
    assert!(matches!(
        client.recv().await.expect("error reply"),
        SignalMessage::Error { .. }
    ));

    // Join with an empty room id.
    client
        .send(&SignalMessage::Join {
            room_id: "".into(),
            user_id: "alice".into(),
        })
        .await
        .expect("send");
    assert!(matches!(
        client.recv().await.expect("error reply"),
        SignalMessage::Error { .. }
    ));

    // None of the violations closed the transport: a valid join still works.
    let size = client.join("R1", "alice").await.expect("join after errors");
    assert_eq!(size, 1);

    client.close().await.expect("close");
}
