use std::net::SocketAddr;
use std::sync::Arc;
use talkie_server::{ConnectionRegistry, app};

/// A signaling server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Arc<ConnectionRegistry>,
}

impl TestServer {
    pub async fn start() -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let router = app(registry.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local addr");

        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { addr, registry }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/voice", self.addr)
    }
}
