use serde_json::Value;

use crate::init_tracing;
use crate::utils::{TestClient, TestServer};

/// Hits the debug API over real HTTP so routing, path extraction, and the
/// 404 path are all exercised.
#[tokio::test]
async fn test_rooms_debug_api() {
    init_tracing();
    let server = TestServer::start().await;
    let base = format!("http://{}", server.addr);

    let mut alice = TestClient::connect(&server.ws_url())
        .await
        .expect("alice connect");
    alice.join("R1", "alice").await.expect("alice join");

    let mut bob = TestClient::connect(&server.ws_url())
        .await
        .expect("bob connect");
    bob.join("R2", "bob").await.expect("bob join");

    let rooms: Value = reqwest::get(format!("{base}/api/rooms"))
        .await
        .expect("list rooms")
        .json()
        .await
        .expect("rooms json");
    let rooms = rooms.as_array().expect("rooms array");
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0]["roomId"], "R1");
    assert_eq!(rooms[0]["participants"], 1);
    assert_eq!(rooms[1]["roomId"], "R2");

    let detail: Value = reqwest::get(format!("{base}/api/rooms/R1"))
        .await
        .expect("room detail")
        .json()
        .await
        .expect("detail json");
    assert_eq!(detail["roomId"], "R1");
    let participants = detail["participants"].as_array().expect("participants");
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["userId"], "alice");
    assert_eq!(participants[0]["connected"], true);

    let missing = reqwest::get(format!("{base}/api/rooms/nope"))
        .await
        .expect("missing room request");
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    alice.close().await.expect("alice close");
    bob.close().await.expect("bob close");
}
