//! Frame transports between the embedded client and the host bridge.
//!
//! The host speaks JSON frames tagged by `op`:
//!
//! ```text
//! {"op":"handshake","v":1,"encoding":"json","client_id":"..","frame_id":".."}
//! {"op":"frame","cmd":"AUTHORIZE","nonce":"..","args":{..}}
//! {"op":"frame","cmd":"DISPATCH","evt":"READY","data":{..}}
//! {"op":"close","code":1000,"message":".."}
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::{Mutex, mpsc};

use crate::sdk::BridgeError;
use crate::types::{ClientId, FrameId};

pub const PROTOCOL_VERSION: u32 = 1;

/// A single message on the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeFrame {
    Handshake {
        v: u32,
        encoding: String,
        client_id: ClientId,
        frame_id: FrameId,
    },
    Frame(CommandFrame),
    Close {
        #[serde(default)]
        code: Option<i64>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl BridgeFrame {
    pub fn handshake(client_id: ClientId, frame_id: FrameId) -> Self {
        Self::Handshake {
            v: PROTOCOL_VERSION,
            encoding: "json".to_string(),
            client_id,
            frame_id,
        }
    }
}

/// Command, response or event frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandFrame {
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Bidirectional frame channel to the host.
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    async fn send(&self, frame: BridgeFrame) -> Result<(), BridgeError>;

    /// Next frame from the host. `BridgeError::Closed` once the peer is gone.
    async fn recv(&self) -> Result<BridgeFrame, BridgeError>;
}

/// In-process transport built on unbounded channels.
///
/// `ChannelTransport::pair` returns two connected ends; one is handed to
/// the SDK and the other plays the host.
pub struct ChannelTransport {
    outgoing: mpsc::UnboundedSender<BridgeFrame>,
    incoming: Mutex<mpsc::UnboundedReceiver<BridgeFrame>>,
}

impl ChannelTransport {
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            Self {
                outgoing: a_tx,
                incoming: Mutex::new(b_rx),
            },
            Self {
                outgoing: b_tx,
                incoming: Mutex::new(a_rx),
            },
        )
    }
}

#[async_trait]
impl BridgeTransport for ChannelTransport {
    async fn send(&self, frame: BridgeFrame) -> Result<(), BridgeError> {
        self.outgoing
            .send(frame)
            .map_err(|_| BridgeError::Closed(None))
    }

    async fn recv(&self) -> Result<BridgeFrame, BridgeError> {
        self.incoming
            .lock()
            .await
            .recv()
            .await
            .ok_or(BridgeError::Closed(None))
    }
}

/// Newline-delimited JSON frames over a byte stream (stdin/stdout for the
/// CLI, duplex pipes in tests).
pub struct LineTransport<R, W> {
    reader: Mutex<Lines<BufReader<R>>>,
    writer: Mutex<W>,
}

impl<R, W> LineTransport<R, W>
where
    R: tokio::io::AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(BufReader::new(reader).lines()),
            writer: Mutex::new(writer),
        }
    }
}

impl LineTransport<tokio::io::Stdin, tokio::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

#[async_trait]
impl<R, W> BridgeTransport for LineTransport<R, W>
where
    R: tokio::io::AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, frame: BridgeFrame) -> Result<(), BridgeError> {
        let mut line =
            serde_json::to_string(&frame).map_err(|e| BridgeError::Protocol(e.to_string()))?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))
    }

    async fn recv(&self) -> Result<BridgeFrame, BridgeError> {
        let mut reader = self.reader.lock().await;
        loop {
            let line = reader
                .next_line()
                .await
                .map_err(|e| BridgeError::Transport(e.to_string()))?
                .ok_or(BridgeError::Closed(None))?;

            if line.trim().is_empty() {
                continue;
            }
            return serde_json::from_str(&line).map_err(|e| BridgeError::Protocol(e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_wire_format() {
        let frame = BridgeFrame::Frame(CommandFrame {
            cmd: "AUTHORIZE".to_string(),
            nonce: Some("n1".to_string()),
            args: Some(serde_json::json!({"scope": []})),
            ..Default::default()
        });
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"op": "frame", "cmd": "AUTHORIZE", "nonce": "n1", "args": {"scope": []}})
        );
    }

    #[test]
    fn test_handshake_wire_format() {
        let frame = BridgeFrame::handshake(ClientId::new("c"), FrameId::new("f"));
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"op": "handshake", "v": 1, "encoding": "json", "client_id": "c", "frame_id": "f"})
        );
    }

    #[test]
    fn test_close_frame_without_fields() {
        let frame: BridgeFrame = serde_json::from_str(r#"{"op":"close"}"#).unwrap();
        assert_eq!(
            frame,
            BridgeFrame::Close {
                code: None,
                message: None
            }
        );
    }

    #[tokio::test]
    async fn test_channel_pair_round_trip() {
        let (client, host) = ChannelTransport::pair();
        client
            .send(BridgeFrame::Close {
                code: Some(1000),
                message: None,
            })
            .await
            .unwrap();

        let received = host.recv().await.unwrap();
        assert!(matches!(received, BridgeFrame::Close { code: Some(1000), .. }));
    }

    #[tokio::test]
    async fn test_channel_closed_when_peer_dropped() {
        let (client, host) = ChannelTransport::pair();
        drop(host);
        assert_eq!(client.recv().await, Err(BridgeError::Closed(None)));
    }

    #[tokio::test]
    async fn test_line_transport_over_duplex() {
        let (client_io, host_io) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client_io);
        let (host_read, host_write) = tokio::io::split(host_io);

        let client = LineTransport::new(client_read, client_write);
        let host = LineTransport::new(host_read, host_write);

        client
            .send(BridgeFrame::handshake(ClientId::new("c"), FrameId::new("f")))
            .await
            .unwrap();
        let received = host.recv().await.unwrap();
        assert!(matches!(received, BridgeFrame::Handshake { .. }));
    }

    #[tokio::test]
    async fn test_line_transport_rejects_garbage() {
        let (client_io, mut host_io) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client_io);
        let client = LineTransport::new(client_read, client_write);

        host_io.write_all(b"\n{not json}\n").await.unwrap();
        let err = client.recv().await.unwrap_err();
        assert!(matches!(err, BridgeError::Protocol(_)));
    }
}
