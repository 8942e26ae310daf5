//! Streaming chat completion support.
//!
//! A [`ChatCompletionStream`] is a live, exclusively-owned consumption of
//! one streaming response. It can be driven one chunk at a time with
//! [`recv`](ChatCompletionStream::recv), pushed through a callback with
//! [`for_each`](ChatCompletionStream::for_each), or converted into a lazy
//! [`Stream`] with [`into_stream`](ChatCompletionStream::into_stream).

use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::ClientError;
use crate::model::{LogProbs, ToolCall};
use crate::sse::SseDecoder;

/// One incremental chunk of a streaming chat completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,

    /// Unix timestamp of creation.
    pub created: i64,

    pub model: String,

    pub choices: Vec<StreamChoice>,
}

/// A streaming choice carrying one delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    pub index: u32,

    pub delta: StreamDelta,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<LogProbs>,

    /// Set on the final delta of a choice; absent before that.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// An incremental message fragment.
///
/// All fields are optional; a delta may carry only a role, only a content
/// fragment, or only tool call fragments.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StreamDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Open,
    Exhausted,
    Errored,
    Closed,
}

/// A live streaming session over one HTTP response.
///
/// The session exclusively owns the underlying connection. It is exhausted
/// once the server sends the `[DONE]` sentinel; a transport fault or an
/// unparseable frame makes it terminal instead, after which every call
/// returns [`ClientError::StreamTerminated`]. Dropping the session, or
/// calling [`close`](ChatCompletionStream::close), releases the connection.
///
/// # Example
/// ```no_run
/// # use vultr_inference::{ChatCompletionRequest, Client, Message};
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// # let client = Client::new("key")?;
/// # let request = ChatCompletionRequest::new("model", vec![Message::user("hi")]);
/// let mut stream = client.create_chat_completion_stream(&request).await?;
/// while let Some(chunk) = stream.recv().await? {
///     if let Some(text) = chunk.choices.first().and_then(|c| c.delta.content.as_deref()) {
///         print!("{text}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChatCompletionStream {
    bytes: Option<ByteStream>,
    decoder: SseDecoder,
    state: StreamState,
}

impl ChatCompletionStream {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self::from_bytes(Box::pin(response.bytes_stream()))
    }

    fn from_bytes(bytes: ByteStream) -> Self {
        Self {
            bytes: Some(bytes),
            decoder: SseDecoder::new(),
            state: StreamState::Open,
        }
    }

    /// Receive the next chunk.
    ///
    /// Returns `Ok(Some(chunk))` for each data event and `Ok(None)` once
    /// the stream is exhausted; asking again after exhaustion keeps
    /// returning `Ok(None)`. Chunks are delivered in exact arrival order.
    ///
    /// A transport fault or an unparseable frame ends the session: the
    /// error is returned once, and every call after that yields
    /// [`ClientError::StreamTerminated`].
    ///
    /// This is an async suspension point; callers may race it against
    /// `tokio::time::timeout` or `select!` to cancel an in-flight read.
    /// Aborted reads surface as transport errors, never as a clean end.
    pub async fn recv(&mut self) -> Result<Option<ChatCompletionChunk>, ClientError> {
        match self.state {
            StreamState::Open => {}
            StreamState::Exhausted => return Ok(None),
            StreamState::Errored | StreamState::Closed => {
                return Err(ClientError::StreamTerminated);
            }
        }

        match self.next_payload().await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(chunk) => Ok(Some(chunk)),
                Err(source) => {
                    warn!("unparseable stream payload, terminating session");
                    self.fail();
                    Err(ClientError::Parse { source, payload })
                }
            },
            Ok(None) => {
                debug!("stream exhausted");
                self.state = StreamState::Exhausted;
                self.bytes = None;
                Ok(None)
            }
            Err(e) => {
                self.fail();
                Err(e)
            }
        }
    }

    /// Pull bytes until the decoder yields a payload, the sentinel is seen,
    /// or the transport ends.
    async fn next_payload(&mut self) -> Result<Option<String>, ClientError> {
        loop {
            if let Some(payload) = self.decoder.next_payload() {
                return Ok(Some(payload));
            }
            if self.decoder.is_done() {
                return Ok(None);
            }

            let Some(bytes) = self.bytes.as_mut() else {
                return Ok(None);
            };

            match bytes.next().await {
                Some(Ok(chunk)) => self.decoder.feed(&chunk),
                Some(Err(e)) => return Err(ClientError::Http(e)),
                None => {
                    // Transport EOF without a sentinel: flush any trailing
                    // unterminated line, then report exhaustion.
                    self.bytes = None;
                    return Ok(self.decoder.finish());
                }
            }
        }
    }

    fn fail(&mut self) {
        self.state = StreamState::Errored;
        self.bytes = None;
    }

    /// Drive the stream to completion, invoking `consumer` once per chunk.
    ///
    /// Stops at the first consumer error and returns it verbatim; the
    /// consumer is never invoked again after failing. Transport and parse
    /// faults are converted into `E` via `From`. Returns `Ok(())` at
    /// end-of-stream. The connection is released when this returns.
    ///
    /// # Example
    /// ```no_run
    /// # use vultr_inference::{ChatCompletionRequest, Client, ClientError, Message};
    /// # async fn run() -> Result<(), ClientError> {
    /// # let client = Client::new("key")?;
    /// # let request = ChatCompletionRequest::new("model", vec![Message::user("hi")]);
    /// let stream = client.create_chat_completion_stream(&request).await?;
    /// stream
    ///     .for_each(|chunk| {
    ///         println!("{:?}", chunk.choices.first().map(|c| &c.delta));
    ///         Ok::<_, ClientError>(())
    ///     })
    ///     .await
    /// # }
    /// ```
    pub async fn for_each<F, E>(mut self, mut consumer: F) -> Result<(), E>
    where
        F: FnMut(ChatCompletionChunk) -> Result<(), E>,
        E: From<ClientError>,
    {
        loop {
            match self.recv().await {
                Ok(Some(chunk)) => consumer(chunk)?,
                Ok(None) => return Ok(()),
                Err(e) => return Err(E::from(e)),
            }
        }
    }

    /// Convert into a lazy [`Stream`] of chunks.
    ///
    /// The stream ends after the first error; the session is terminal at
    /// that point and is not polled further.
    pub fn into_stream(self) -> impl Stream<Item = Result<ChatCompletionChunk, ClientError>> + Send {
        stream::unfold(self, |mut session| async move {
            match session.recv().await {
                Ok(Some(chunk)) => Some((Ok(chunk), session)),
                Ok(None) => None,
                Err(ClientError::StreamTerminated) => None,
                Err(e) => Some((Err(e), session)),
            }
        })
    }

    /// Release the underlying connection.
    ///
    /// Idempotent and legal in any state, including mid-consumption; other
    /// sessions are unaffected. Subsequent [`recv`](Self::recv) calls
    /// return [`ClientError::StreamTerminated`].
    pub fn close(&mut self) {
        self.bytes = None;
        self.state = StreamState::Closed;
    }
}

impl std::fmt::Debug for ChatCompletionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionStream")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
