//! Broadcast transports
//!
//! A transport turns "subscribe to topic X" into a stream of text frames.
//! `SseTransport` talks to the backend's event stream over HTTP;
//! `ChannelTransport` is an in-process hub used by tests and demos.

use futures::stream::{BoxStream, StreamExt};
use smartask_common::config::ClientConfig;
use std::future::Future;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

/// Subscription failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Could not reach the broadcast endpoint
    #[error("connect failed: {0}")]
    Connect(String),

    /// Endpoint refused the subscription
    #[error("subscription rejected with status {0}")]
    Status(u16),

    /// Established stream broke
    #[error("stream error: {0}")]
    Stream(String),

    /// Receiver fell behind and frames were skipped
    #[error("lagged behind by {0} frames")]
    Lagged(u64),
}

/// Frames of one subscription, in arrival order
pub type FrameStream = BoxStream<'static, Result<String, TransportError>>;

/// Publish/subscribe transport carrying text frames
pub trait BroadcastTransport: Send {
    /// Start receiving frames published to `topic`
    ///
    /// Frames published before the subscription is established are not seen.
    fn subscribe(
        &mut self,
        topic: &str,
    ) -> impl Future<Output = Result<FrameStream, TransportError>> + Send;
}

/// Frame as carried by a [`ChannelTransport`] hub
#[derive(Debug, Clone)]
struct TopicFrame {
    topic: String,
    payload: String,
}

/// In-process broadcast hub
///
/// Every clone shares the same channel; `publish` reaches every live
/// subscription on the matching topic.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: broadcast::Sender<TopicFrame>,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a frame; returns the number of subscriptions it reached
    pub fn publish(&self, topic: &str, payload: impl Into<String>) -> usize {
        let frame = TopicFrame {
            topic: topic.to_string(),
            payload: payload.into(),
        };
        self.tx.send(frame).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl BroadcastTransport for ChannelTransport {
    async fn subscribe(&mut self, topic: &str) -> Result<FrameStream, TransportError> {
        let topic = topic.to_string();
        let stream = BroadcastStream::new(self.tx.subscribe()).filter_map(move |item| {
            let wanted = topic.clone();
            async move {
                match item {
                    Ok(frame) if frame.topic == wanted => Some(Ok(frame.payload)),
                    Ok(_) => None,
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        Some(Err(TransportError::Lagged(skipped)))
                    }
                }
            }
        });
        Ok(stream.boxed())
    }
}

/// Server-sent events subscription
///
/// Issues `GET <stream_url>?topic=<topic>` and yields the joined `data:`
/// lines of each event as one frame.
pub struct SseTransport {
    http_client: reqwest::Client,
    stream_url: String,
}

impl SseTransport {
    pub fn new(stream_url: &str) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .user_agent(crate::api::USER_AGENT)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self {
            http_client,
            stream_url: stream_url.to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(&config.stream_url)
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }
}

impl BroadcastTransport for SseTransport {
    async fn subscribe(&mut self, topic: &str) -> Result<FrameStream, TransportError> {
        debug!(url = %self.stream_url, topic, "Opening event stream");
        let response = self
            .http_client
            .get(&self.stream_url)
            .query(&[("topic", topic)])
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Event stream rejected subscription");
            return Err(TransportError::Status(status.as_u16()));
        }
        info!(url = %self.stream_url, topic, "Event stream open");

        let mut bytes = Box::pin(response.bytes_stream());
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::default();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for frame in decoder.push(&chunk) {
                            yield Ok(frame);
                        }
                    }
                    Err(e) => {
                        yield Err(TransportError::Stream(e.to_string()));
                        break;
                    }
                }
            }
        };
        Ok(stream.boxed())
    }
}

/// Incremental `text/event-stream` parser
///
/// Only `data` fields are kept; comments (keep-alives) and the `event`,
/// `id` and `retry` fields are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed raw bytes; returns every event completed by this chunk
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=end).collect();
            let decoded = String::from_utf8_lossy(&raw[..end]);
            let line = decoded.strip_suffix('\r').unwrap_or(&decoded);

            if line.is_empty() {
                if !self.data.is_empty() {
                    frames.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            if field == "data" {
                self.data.push(value.to_string());
            }
        }

        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_joins_data_lines() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push(b"event: results\ndata: [1,\ndata: 2]\n\n");
        assert_eq!(frames, vec!["[1,\n2]"]);
    }

    #[test]
    fn test_decoder_handles_split_chunks_and_crlf() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert!(decoder.push(b":1}\r\n").is_empty());
        let frames = decoder.push(b"\r\n");
        assert_eq!(frames, vec![r#"{"a":1}"#]);
    }

    #[test]
    fn test_decoder_skips_comments_and_empty_events() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push(b": keep-alive\n\nid: 4\n\ndata:x\n\n");
        assert_eq!(frames, vec!["x"]);
    }

    #[tokio::test]
    async fn test_channel_transport_filters_by_topic() {
        let hub = ChannelTransport::new(16);
        let mut transport = hub.clone();
        let mut frames = transport.subscribe("/topic/comparison/all").await.unwrap();

        assert_eq!(hub.publish("/topic/other", "ignored"), 1);
        hub.publish("/topic/comparison/all", "[]");

        let first = frames.next().await.unwrap().unwrap();
        assert_eq!(first, "[]");
    }

    #[tokio::test]
    async fn test_channel_publish_without_subscribers() {
        let hub = ChannelTransport::new(4);
        assert_eq!(hub.publish("/topic/comparison/all", "[]"), 0);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
