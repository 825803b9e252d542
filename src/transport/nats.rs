use super::channel::{TransportChannel, TransportEvent};
use super::messages::{EncodedChunkMessage, ErrorPayload, ReplyPayload};
use anyhow::{Context, Result};
use async_nats::Client;
use futures::stream::StreamExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// NATS-backed transport channel
///
/// Subjects are scoped per session:
/// - outbound `voice.audio_chunk.<session>` and `voice.end_audio.<session>`
/// - inbound `voice.audio_reply.<session>` and `voice.error.<session>`
///
/// Reconnection and backoff are the client library's concern; we only
/// surface its connect/disconnect notifications as transport events.
pub struct NatsTransport {
    client: Client,
    session_id: String,
}

impl NatsTransport {
    /// Connect and wire up inbound event dispatch
    ///
    /// Returns the transport (outbound half) and the receiver of inbound
    /// transport events (connection lifecycle, replies, errors).
    pub async fn connect(
        url: &str,
        session_id: String,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>)> {
        info!("connecting to {}", url);

        let (events_tx, events_rx) = mpsc::channel(32);

        let conn_tx = events_tx.clone();
        let client = async_nats::ConnectOptions::new()
            .event_callback(move |event| {
                let conn_tx = conn_tx.clone();
                async move {
                    let mapped = match event {
                        async_nats::Event::Connected => Some(TransportEvent::Connected),
                        async_nats::Event::Disconnected => Some(TransportEvent::Disconnected),
                        other => {
                            warn!("connection event: {}", other);
                            None
                        }
                    };
                    if let Some(ev) = mapped {
                        let _ = conn_tx.send(ev).await;
                    }
                }
            })
            .connect(url)
            .await
            .context("failed to connect to NATS")?;

        info!("connected");

        // Replies
        let mut reply_sub = client
            .subscribe(format!("voice.audio_reply.{}", session_id))
            .await
            .context("failed to subscribe to replies")?;
        let reply_tx = events_tx.clone();
        tokio::spawn(async move {
            while let Some(msg) = reply_sub.next().await {
                match serde_json::from_slice::<ReplyPayload>(&msg.payload) {
                    Ok(reply) => {
                        if reply_tx.send(TransportEvent::Reply(reply)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("failed to parse reply message: {}", e),
                }
            }
        });

        // Service errors
        let mut error_sub = client
            .subscribe(format!("voice.error.{}", session_id))
            .await
            .context("failed to subscribe to errors")?;
        let error_tx = events_tx;
        tokio::spawn(async move {
            while let Some(msg) = error_sub.next().await {
                match serde_json::from_slice::<ErrorPayload>(&msg.payload) {
                    Ok(err) => {
                        if error_tx.send(TransportEvent::Error(err)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("failed to parse error message: {}", e),
                }
            }
        });

        Ok((Self { client, session_id }, events_rx))
    }
}

#[async_trait::async_trait]
impl TransportChannel for NatsTransport {
    async fn send_chunk(&self, msg: EncodedChunkMessage) -> Result<()> {
        let subject = format!("voice.audio_chunk.{}", self.session_id);
        let payload = serde_json::to_vec(&msg)?;
        self.client
            .publish(subject, payload.into())
            .await
            .context("failed to publish audio chunk")?;
        Ok(())
    }

    async fn send_end_of_utterance(&self) -> Result<()> {
        let subject = format!("voice.end_audio.{}", self.session_id);
        self.client
            .publish(subject, "{}".into())
            .await
            .context("failed to publish end of utterance")?;
        Ok(())
    }
}
