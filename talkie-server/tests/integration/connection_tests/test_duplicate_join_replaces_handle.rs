use crate::init_tracing;
use crate::utils::{TestClient, TestServer};

#[tokio::test]
async fn test_duplicate_join_replaces_handle() {
    init_tracing();
    let server = TestServer::start().await;

    let mut first = TestClient::connect(&server.ws_url())
        .await
        .expect("first connect");
    first.join("R1", "alice").await.expect("first join");

    // Same user id from a second tab: last writer wins, no double count.
    let mut second = TestClient::connect(&server.ws_url())
        .await
        .expect("second connect");
    let size = second.join("R1", "alice").await.expect("second join");
    assert_eq!(size, 1);
    assert_eq!(server.registry.room_size(&"R1".into()), Some(1));

    // The stale connection going away must not evict the replacement.
    first.drop_abruptly();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(server.registry.room_size(&"R1".into()), Some(1));

    second.close().await.expect("second close");
}
