//! Request and response models for the inference API.

use serde::{Deserialize, Serialize};

use crate::client::ClientError;

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// `"system"`, `"user"`, `"assistant"` or `"tool"`.
    pub role: String,

    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    /// Create a message with an arbitrary role.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            tool_calls: None,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,

    #[serde(rename = "type")]
    pub call_type: String,

    pub function: FunctionCall,
}

/// Function name and serialized arguments inside a [`ToolCall`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Request body for a chat completion.
///
/// Optional sampling parameters are absent unless set; use the `with_*`
/// methods to fill them in. Range checks run in [`validate`](Self::validate),
/// which the client invokes before any request leaves the process.
///
/// # Example
/// ```rust
/// use vultr_inference::{ChatCompletionRequest, Message};
///
/// let request = ChatCompletionRequest::new(
///     "llama2-13b-chat-Q5_K_M",
///     vec![Message::user("Hello!")],
/// )
/// .with_max_tokens(512)
/// .with_temperature(0.7);
///
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatCompletionRequest {
    pub model: String,

    pub messages: Vec<Message>,

    /// Forced to `true` by the streaming endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Number of parallel choices to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    /// Sampling temperature (0.0 - 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Nucleus sampling parameter (0.0 - 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<bool>,

    /// Number of top log probabilities to return per token (0 - 20).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<u32>,
}

impl ChatCompletionRequest {
    /// Create a request with the required fields.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            ..Self::default()
        }
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the number of choices to generate.
    pub fn with_n(mut self, n: u32) -> Self {
        self.n = Some(n);
        self
    }

    /// Set the seed for deterministic outputs.
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the top-p value for nucleus sampling.
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the frequency penalty.
    pub fn with_frequency_penalty(mut self, penalty: f64) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    /// Set the presence penalty.
    pub fn with_presence_penalty(mut self, penalty: f64) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    /// Set the stop sequences.
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Enable log probabilities, optionally with a top-k count.
    pub fn with_logprobs(mut self, top_logprobs: Option<u32>) -> Self {
        self.logprobs = Some(true);
        self.top_logprobs = top_logprobs;
        self
    }

    /// Check all numeric parameters against their documented ranges.
    pub fn validate(&self) -> Result<(), ClientError> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ClientError::Validation(format!(
                    "temperature must be between 0.0 and 2.0, got {t}"
                )));
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(ClientError::Validation(format!(
                    "top_p must be between 0.0 and 1.0, got {p}"
                )));
            }
        }
        if let Some(p) = self.frequency_penalty {
            if !(-2.0..=2.0).contains(&p) {
                return Err(ClientError::Validation(format!(
                    "frequency_penalty must be between -2.0 and 2.0, got {p}"
                )));
            }
        }
        if let Some(p) = self.presence_penalty {
            if !(-2.0..=2.0).contains(&p) {
                return Err(ClientError::Validation(format!(
                    "presence_penalty must be between -2.0 and 2.0, got {p}"
                )));
            }
        }
        if let Some(k) = self.top_logprobs {
            if k > 20 {
                return Err(ClientError::Validation(format!(
                    "top_logprobs must be between 0 and 20, got {k}"
                )));
            }
        }
        Ok(())
    }
}

/// Request body for a retrieval-augmented chat completion.
///
/// Identical to [`ChatCompletionRequest`] on the wire, plus the vector
/// store collection to retrieve context from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagChatCompletionRequest {
    /// Vector store collection used for retrieval.
    pub collection: String,

    #[serde(flatten)]
    pub chat: ChatCompletionRequest,
}

impl RagChatCompletionRequest {
    /// Create a RAG request around an existing chat request.
    pub fn new(collection: impl Into<String>, chat: ChatCompletionRequest) -> Self {
        Self {
            collection: collection.into(),
            chat,
        }
    }

    /// Check all numeric parameters against their documented ranges.
    pub fn validate(&self) -> Result<(), ClientError> {
        self.chat.validate()
    }
}

/// Log probability information for one generated token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogProb {
    pub token: String,

    pub logprob: f64,

    #[serde(default)]
    pub bytes: Vec<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<Vec<TopLogProb>>,
}

/// One of the most likely alternatives for a token position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopLogProb {
    pub token: String,

    pub logprob: f64,

    #[serde(default)]
    pub bytes: Vec<i32>,
}

/// Log probabilities for the generated content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogProbs {
    #[serde(default)]
    pub content: Vec<LogProb>,
}

/// A completed choice in a chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,

    pub message: Message,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<LogProbs>,

    pub finish_reason: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Usage {
    pub completion_tokens: u32,
    pub prompt_tokens: u32,
    pub total_tokens: u32,
}

/// Response from the chat completion endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,

    /// Unix timestamp of creation.
    pub created: i64,

    pub model: String,

    pub choices: Vec<Choice>,

    #[serde(default)]
    pub usage: Usage,
}

/// Request body for text-to-speech generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsRequest {
    pub model: String,
    pub input: String,
    pub voice: String,
}

/// A vector store collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreCollection {
    pub id: String,
    pub name: String,
    pub created: String,
}

/// Request to create a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
}

/// Response from creating a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCollectionResponse {
    pub collection: VectorStoreCollection,
}

/// Request to rename a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCollectionRequest {
    pub name: String,
}

/// Response from updating a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCollectionResponse {
    pub collection: VectorStoreCollection,
}

/// Request to search a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub input: String,
}

/// A single search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub created: String,
    pub content: String,
}

/// Response from searching a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,

    #[serde(default)]
    pub usage: Usage,
}

/// An item stored in a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionItem {
    pub id: String,

    pub created: String,

    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Response from listing collection items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItemsResponse {
    pub items: Vec<CollectionItem>,
}

/// Request to add an item to a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_chunk: Option<bool>,
}

/// Response from adding an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemResponse {
    pub item: CollectionItem,

    #[serde(default)]
    pub usage: Usage,
}

/// Response from fetching an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetItemResponse {
    pub item: CollectionItem,
}

/// Request to update an item's description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub description: String,
}

/// Response from updating an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemResponse {
    pub item: CollectionItem,
}

/// A file attached to a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionFile {
    pub id: String,

    pub filename: String,

    /// `"enqueued"`, `"processing"`, `"completed"` or `"failed"`.
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub items: u32,

    #[serde(default)]
    pub tokens: u32,
}

/// Response from listing collection files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesResponse {
    pub files: Vec<CollectionFile>,
}

/// Response from uploading a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFileResponse {
    pub file: CollectionFile,
}

/// Response from fetching a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetFileResponse {
    pub file: CollectionFile,
}

/// Request body for image generation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImageGenerationRequest {
    pub prompt: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,

    /// `"url"` or `"b64_json"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl ImageGenerationRequest {
    /// Create a request from a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the image model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the number of images to generate.
    pub fn with_n(mut self, n: u32) -> Self {
        self.n = Some(n);
        self
    }

    /// Set the response format.
    pub fn with_response_format(mut self, format: impl Into<String>) -> Self {
        self.response_format = Some(format.into());
        self
    }

    /// Set the image size.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }
}

/// One generated image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Response from image generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationResponse {
    pub created: i64,
    pub data: Vec<ImageData>,
}

/// Usage totals for one month.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonthlyUsage {
    pub chat: f64,
    pub tts: f64,
    pub tts_sm: f64,
    pub image: f64,
    pub image_sm: f64,
}

/// Response from the usage endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageResponse {
    pub current_month: MonthlyUsage,
    pub previous_month: MonthlyUsage,
}

/// A logged API request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLog {
    pub timestamp: String,
    pub method: String,
    pub endpoint: String,
    pub request_headers: String,
    pub request_body: String,
    pub response_body: String,
    pub response_code: u16,
}

/// Response from the request log endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLogsResponse {
    pub requests: Vec<RequestLog>,
}

/// Query parameters for the request log endpoint.
#[derive(Debug, Clone, Default)]
pub struct RequestLogsQuery {
    /// Window length in minutes: 15, 30, 45 or 60.
    pub period: u32,

    /// UTC timestamp in ISO 8601 format to anchor the window.
    pub timestamp: Option<String>,

    /// Filter by endpoint name.
    pub endpoint: Option<String>,
}

impl RequestLogsQuery {
    /// Query for the last `period` minutes.
    pub fn new(period: u32) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("period", self.period.to_string())];
        if let Some(timestamp) = &self.timestamp {
            pairs.push(("timestamp", timestamp.clone()));
        }
        if let Some(endpoint) = &self.endpoint {
            pairs.push(("endpoint", endpoint.clone()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("be brief").role, "system");
        assert_eq!(Message::user("hi").role, "user");
        assert_eq!(Message::assistant("hello").role, "assistant");
        assert!(Message::user("hi").tool_calls.is_none());
    }

    #[test]
    fn test_request_builder_chain() {
        let request = ChatCompletionRequest::new("test-model", vec![Message::user("hi")])
            .with_max_tokens(100)
            .with_temperature(0.5)
            .with_seed(42)
            .with_stop(vec!["\n".to_string()]);

        assert_eq!(request.model, "test-model");
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.5));
        assert_eq!(request.seed, Some(42));
        assert!(request.stream.is_none());
    }

    #[test]
    fn test_unset_fields_not_serialized() {
        let request = ChatCompletionRequest::new("m", vec![Message::user("hi")]);
        let value = serde_json::to_value(&request).unwrap();
        let object = value.as_object().unwrap();

        assert!(object.contains_key("model"));
        assert!(object.contains_key("messages"));
        assert!(!object.contains_key("temperature"));
        assert!(!object.contains_key("stream"));
        assert!(!object.contains_key("stop"));
    }

    #[test]
    fn test_rag_request_flattens_chat_fields() {
        let request = RagChatCompletionRequest::new(
            "docs",
            ChatCompletionRequest::new("m", vec![Message::user("hi")]).with_max_tokens(5),
        );
        let value = serde_json::to_value(&request).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["collection"], "docs");
        assert_eq!(object["model"], "m");
        assert_eq!(object["max_tokens"], 5);
    }

    #[test]
    fn test_validate_accepts_boundaries() {
        let request = ChatCompletionRequest::new("m", vec![])
            .with_temperature(2.0)
            .with_top_p(1.0)
            .with_frequency_penalty(-2.0)
            .with_presence_penalty(2.0)
            .with_logprobs(Some(20));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let too_hot = ChatCompletionRequest::new("m", vec![]).with_temperature(2.1);
        assert!(matches!(
            too_hot.validate(),
            Err(ClientError::Validation(_))
        ));

        let bad_top_p = ChatCompletionRequest::new("m", vec![]).with_top_p(1.5);
        assert!(bad_top_p.validate().is_err());

        let bad_penalty = ChatCompletionRequest::new("m", vec![]).with_frequency_penalty(-2.5);
        assert!(bad_penalty.validate().is_err());

        let bad_logprobs = ChatCompletionRequest::new("m", vec![]).with_logprobs(Some(21));
        assert!(bad_logprobs.validate().is_err());
    }

    #[test]
    fn test_response_deserializes_without_usage() {
        let json = r#"{
            "id": "chat-1",
            "created": 1640995200,
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "hi"},
                "finish_reason": "stop"
            }]
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.usage, Usage::default());
        assert_eq!(response.choices[0].message.content, "hi");
    }

    #[test]
    fn test_request_logs_query_pairs() {
        let query = RequestLogsQuery {
            period: 30,
            timestamp: Some("2024-01-01T00:00:00Z".to_string()),
            endpoint: None,
        };

        let pairs = query.to_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("period", "30".to_string()));
        assert_eq!(pairs[1].0, "timestamp");
    }
}
