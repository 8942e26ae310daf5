//! # vultr-inference
//!
//! Async Rust client for the Vultr Serverless Inference API.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Chat completions, with a retrieval-augmented (RAG) variant
//! - Streaming via Server-Sent Events, with pull-, push- and
//!   `Stream`-based consumption
//! - Vector store collections, items and files
//! - Image generation, text-to-speech, usage and request log endpoints
//! - Type-safe request/response models with eager parameter validation
//!
//! ## Example
//! ```no_run
//! use vultr_inference::{ChatCompletionRequest, Client, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("your-api-key")?;
//!
//!     let request = ChatCompletionRequest::new(
//!         "llama2-13b-chat-Q5_K_M",
//!         vec![Message::user("Hello!")],
//!     )
//!     .with_max_tokens(256);
//!
//!     let response = client.create_chat_completion(&request).await?;
//!     println!("{}", response.choices[0].message.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! Streaming sessions can be driven one chunk at a time:
//! ```no_run
//! # use vultr_inference::{accumulate, ChatCompletionRequest, Client, Message};
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let client = Client::new("your-api-key")?;
//! # let request = ChatCompletionRequest::new("model", vec![Message::user("Hi")]);
//! let mut stream = client.create_chat_completion_stream(&request).await?;
//! let mut chunks = Vec::new();
//!
//! while let Some(chunk) = stream.recv().await? {
//!     chunks.push(chunk);
//! }
//!
//! // The accumulated stream is equivalent to a non-streaming response.
//! if let Some(response) = accumulate(&chunks) {
//!     println!("{}", response.choices[0].message.content);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! or pushed through a callback that can stop the stream early by
//! returning an error, which is handed back verbatim.

pub mod accumulate;
pub mod client;
mod http;
pub mod model;
pub mod options;
pub mod sse;
pub mod streaming;

// Re-exports for convenience
pub use accumulate::{accumulate, accumulate_content};
pub use client::{Client, ClientError};
pub use model::{
    ChatCompletionRequest, ChatCompletionResponse, Choice, Message, RagChatCompletionRequest,
    Usage,
};
pub use options::{ClientConfig, SecretString};
pub use streaming::{ChatCompletionChunk, ChatCompletionStream, StreamChoice, StreamDelta};
