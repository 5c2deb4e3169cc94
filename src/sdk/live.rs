//! Host SDK backed by the real host bridge.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::sdk::transport::{BridgeFrame, BridgeTransport, CommandFrame};
use crate::sdk::{
    AuthenticateParams, AuthenticatedSession, AuthorizeParams, AuthorizeResponse, BridgeError,
    HostSdk, SdkMode,
};
use crate::types::{AccessToken, ClientId, FrameId};

const CMD_DISPATCH: &str = "DISPATCH";
const CMD_AUTHORIZE: &str = "AUTHORIZE";
const CMD_AUTHENTICATE: &str = "AUTHENTICATE";
const EVT_READY: &str = "READY";
const EVT_ERROR: &str = "ERROR";

pub struct LiveSdk {
    client_id: ClientId,
    frame_id: FrameId,
    transport: Arc<dyn BridgeTransport>,
    ready: OnceCell<()>,
    /// Held for a whole command round trip so responses are read in order.
    exchange: Mutex<()>,
}

impl LiveSdk {
    pub fn new(client_id: ClientId, frame_id: FrameId, transport: Arc<dyn BridgeTransport>) -> Self {
        Self {
            client_id,
            frame_id,
            transport,
            ready: OnceCell::new(),
            exchange: Mutex::new(()),
        }
    }

    pub fn frame_id(&self) -> &FrameId {
        &self.frame_id
    }

    async fn handshake(&self) -> Result<(), BridgeError> {
        let _guard = self.exchange.lock().await;
        info!("Starting host handshake for frame {}", self.frame_id);

        self.transport
            .send(BridgeFrame::handshake(
                self.client_id.clone(),
                self.frame_id.clone(),
            ))
            .await?;

        loop {
            match self.transport.recv().await? {
                BridgeFrame::Frame(frame)
                    if frame.cmd == CMD_DISPATCH && frame.evt.as_deref() == Some(EVT_READY) =>
                {
                    debug!("Host bridge is ready");
                    return Ok(());
                }
                BridgeFrame::Close { message, .. } => return Err(BridgeError::Closed(message)),
                other => debug!("Ignoring frame before READY: {:?}", other),
            }
        }
    }

    async fn command(&self, cmd: &str, args: Value) -> Result<Value, BridgeError> {
        self.ready().await?;

        let _guard = self.exchange.lock().await;
        let nonce = Uuid::new_v4().to_string();
        debug!("Sending {} command (nonce {})", cmd, nonce);

        self.transport
            .send(BridgeFrame::Frame(CommandFrame {
                cmd: cmd.to_string(),
                nonce: Some(nonce.clone()),
                args: Some(args),
                ..Default::default()
            }))
            .await?;

        loop {
            match self.transport.recv().await? {
                BridgeFrame::Frame(frame) if frame.nonce.as_deref() == Some(nonce.as_str()) => {
                    if frame.evt.as_deref() == Some(EVT_ERROR) {
                        let err = command_error(frame.data);
                        warn!("{} command rejected by host: {}", cmd, err);
                        return Err(err);
                    }
                    return Ok(frame.data.unwrap_or(Value::Null));
                }
                BridgeFrame::Close { message, .. } => return Err(BridgeError::Closed(message)),
                other => debug!("Ignoring unrelated frame while awaiting {}: {:?}", cmd, other),
            }
        }
    }
}

fn command_error(data: Option<Value>) -> BridgeError {
    let data = data.unwrap_or(Value::Null);
    BridgeError::Command {
        code: data.get("code").and_then(Value::as_i64).unwrap_or(0),
        message: data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

fn parse<T: DeserializeOwned>(cmd: &str, data: Value) -> Result<T, BridgeError> {
    serde_json::from_value(data)
        .map_err(|e| BridgeError::Protocol(format!("invalid {} response: {}", cmd, e)))
}

#[async_trait]
impl HostSdk for LiveSdk {
    fn mode(&self) -> SdkMode {
        SdkMode::Live
    }

    async fn ready(&self) -> Result<(), BridgeError> {
        self.ready.get_or_try_init(|| self.handshake()).await?;
        Ok(())
    }

    async fn authorize(&self, params: AuthorizeParams) -> Result<AuthorizeResponse, BridgeError> {
        let args =
            serde_json::to_value(&params).map_err(|e| BridgeError::Protocol(e.to_string()))?;
        let data = self.command(CMD_AUTHORIZE, args).await?;
        parse(CMD_AUTHORIZE, data)
    }

    async fn authenticate(
        &self,
        access_token: &AccessToken,
    ) -> Result<Option<AuthenticatedSession>, BridgeError> {
        let args = serde_json::to_value(AuthenticateParams {
            access_token: access_token.clone(),
        })
        .map_err(|e| BridgeError::Protocol(e.to_string()))?;

        match self.command(CMD_AUTHENTICATE, args).await? {
            Value::Null => Ok(None),
            data => parse(CMD_AUTHENTICATE, data).map(Some),
        }
    }
}
