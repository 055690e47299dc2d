use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use talkie_core::SignalMessage;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A raw signaling client over tokio-tungstenite, used to exercise the
/// wire protocol exactly as a browser would.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _) = connect_async(url)
            .await
            .context("Failed to connect to signaling server")?;
        Ok(Self { ws })
    }

    pub async fn send(&mut self, msg: &SignalMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.send_raw(&json).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws
            .send(Message::Text(text.to_string()))
            .await
            .context("Failed to send frame")?;
        Ok(())
    }

    /// Next signaling frame, skipping non-text traffic.
    pub async fn recv(&mut self) -> Result<SignalMessage> {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .context("Timed out waiting for a frame")?
                .context("Connection closed")?
                .context("Transport error")?;

            match msg {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(_) => bail!("Server closed the connection"),
                _ => continue,
            }
        }
    }

    /// Sends `join` and waits for the `joined` ack, returning the room size.
    pub async fn join(&mut self, room: &str, user: &str) -> Result<usize> {
        self.send(&SignalMessage::Join {
            room_id: room.into(),
            user_id: user.into(),
        })
        .await?;

        match self.recv().await? {
            SignalMessage::Joined { room_size, .. } => Ok(room_size),
            other => bail!("Expected joined ack, got {:?}", other),
        }
    }

    /// Clean close with a WebSocket close frame.
    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await.context("Failed to close")?;
        Ok(())
    }

    /// Drops the TCP stream without a close handshake, simulating a crash
    /// or network loss.
    pub fn drop_abruptly(self) {
        drop(self.ws);
    }
}
