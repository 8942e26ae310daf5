//! API client and error types.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::http::{add_extra_headers, build_http_client};
use crate::model::{
    AddFileResponse, AddItemRequest, AddItemResponse, ChatCompletionRequest,
    ChatCompletionResponse, CreateCollectionRequest, CreateCollectionResponse, GetFileResponse,
    GetItemResponse, ImageGenerationRequest, ImageGenerationResponse, ListFilesResponse,
    ListItemsResponse, RagChatCompletionRequest, RequestLogsQuery, RequestLogsResponse,
    SearchRequest, SearchResponse, TtsRequest, UpdateCollectionRequest, UpdateCollectionResponse,
    UpdateItemRequest, UpdateItemResponse, UsageResponse,
};
use crate::options::{ClientConfig, SecretString};
use crate::streaming::{ChatCompletionChunk, ChatCompletionStream};

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network failure, timeout, or cancellation of the underlying request.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the API.
    #[error("API error ({status}): {message}")]
    Api {
        status: StatusCode,
        message: String,
        error_type: Option<String>,
        code: Option<String>,
    },

    /// A streamed frame could not be parsed; carries the offending payload.
    #[error("invalid stream payload: {source}")]
    Parse {
        source: serde_json::Error,
        payload: String,
    },

    /// The streaming session already hit a fault or was closed.
    #[error("stream terminated")]
    StreamTerminated,

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A request parameter is out of its documented range.
    #[error("invalid request: {0}")]
    Validation(String),
}

/// Structured error body returned by the API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,

    #[serde(rename = "type")]
    error_type: Option<String>,

    code: Option<String>,
}

/// Client for the Vultr Serverless Inference API.
///
/// Cheap to clone; clones share the underlying connection pool.
///
/// # Example
/// ```no_run
/// use vultr_inference::{ChatCompletionRequest, Client, Message};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("your-api-key")?;
///
/// let request = ChatCompletionRequest::new(
///     "llama2-13b-chat-Q5_K_M",
///     vec![Message::user("Hello!")],
/// );
///
/// let response = client.create_chat_completion(&request).await?;
/// println!("{}", response.choices[0].message.content);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    http: reqwest::Client,
}

impl Client {
    /// Create a client with the default endpoint and timeout.
    pub fn new(api_key: impl Into<SecretString>) -> Result<Self, ClientError> {
        Self::with_config(ClientConfig::new(api_key))
    }

    /// Create a client from explicit configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self, ClientError> {
        let http = build_http_client(&config)?;
        Ok(Self { config, http })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn auth_header(&self) -> Result<HeaderValue, ClientError> {
        let mut value =
            HeaderValue::from_str(&format!("Bearer {}", self.config.api_key.expose_secret()))
                .map_err(|_| {
                    ClientError::Config("API key is not a valid header value".to_string())
                })?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Perform one HTTP request with injected authentication and content
    /// negotiation headers. `extra_headers` override the defaults.
    ///
    /// A non-2xx status is classified into [`ClientError::Api`] before any
    /// body consumption by the caller, so an error response is never
    /// mistaken for the start of a valid stream. No retries.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        extra_headers: &[(HeaderName, HeaderValue)],
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.config.base_url, path);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.auth_header()?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in extra_headers {
            headers.insert(name.clone(), value.clone());
        }

        let mut request = self.http.request(method.clone(), &url).headers(headers);
        request = add_extra_headers(request, &self.config.extra_headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, path, "sending request");
        self.execute(request).await
    }

    /// Send a prepared request and classify a non-2xx response.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "request failed");
            return Err(Self::classify_error(status, &body));
        }

        Ok(response)
    }

    /// Turn a non-2xx response into an [`ClientError::Api`], preferring the
    /// structured error body and falling back to the raw text.
    fn classify_error(status: StatusCode, body: &str) -> ClientError {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(api) => ClientError::Api {
                status,
                message: api.message,
                error_type: api.error_type,
                code: api.code,
            },
            Err(_) => ClientError::Api {
                status,
                message: body.to_string(),
                error_type: None,
                code: None,
            },
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send::<()>(Method::GET, path, None, &[]).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.send(Method::POST, path, Some(body), &[]).await?;
        Ok(response.json().await?)
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.send(Method::PUT, path, Some(body), &[]).await?;
        Ok(response.json().await?)
    }

    // --- Chat completions ---

    /// Create a chat completion.
    pub async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ClientError> {
        request.validate()?;
        self.post_json("/chat/completions", request).await
    }

    /// Create a retrieval-augmented chat completion.
    pub async fn create_rag_chat_completion(
        &self,
        request: &RagChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ClientError> {
        request.validate()?;
        self.post_json("/chat/completions/rag", request).await
    }

    /// Open a streaming chat completion session.
    ///
    /// Forces `stream: true` on the request and negotiates an event
    /// stream. The returned session exclusively owns the connection.
    pub async fn create_chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionStream, ClientError> {
        request.validate()?;
        let mut request = request.clone();
        request.stream = Some(true);

        let response = self
            .send(
                Method::POST,
                "/chat/completions",
                Some(&request),
                &[(ACCEPT, HeaderValue::from_static("text/event-stream"))],
            )
            .await?;
        Ok(ChatCompletionStream::new(response))
    }

    /// Open a streaming retrieval-augmented chat completion session.
    pub async fn create_rag_chat_completion_stream(
        &self,
        request: &RagChatCompletionRequest,
    ) -> Result<ChatCompletionStream, ClientError> {
        request.validate()?;
        let mut request = request.clone();
        request.chat.stream = Some(true);

        let response = self
            .send(
                Method::POST,
                "/chat/completions/rag",
                Some(&request),
                &[(ACCEPT, HeaderValue::from_static("text/event-stream"))],
            )
            .await?;
        Ok(ChatCompletionStream::new(response))
    }

    /// Stream a chat completion, invoking `consumer` once per chunk.
    ///
    /// Convenience wrapper over
    /// [`create_chat_completion_stream`](Self::create_chat_completion_stream)
    /// + [`for_each`](ChatCompletionStream::for_each); the session is
    /// closed when this returns, whatever the outcome.
    pub async fn stream_chat_completion<F, E>(
        &self,
        request: &ChatCompletionRequest,
        consumer: F,
    ) -> Result<(), E>
    where
        F: FnMut(ChatCompletionChunk) -> Result<(), E>,
        E: From<ClientError>,
    {
        let stream = self
            .create_chat_completion_stream(request)
            .await
            .map_err(E::from)?;
        stream.for_each(consumer).await
    }

    /// Stream a retrieval-augmented chat completion with a callback.
    pub async fn stream_rag_chat_completion<F, E>(
        &self,
        request: &RagChatCompletionRequest,
        consumer: F,
    ) -> Result<(), E>
    where
        F: FnMut(ChatCompletionChunk) -> Result<(), E>,
        E: From<ClientError>,
    {
        let stream = self
            .create_rag_chat_completion_stream(request)
            .await
            .map_err(E::from)?;
        stream.for_each(consumer).await
    }

    // --- Audio ---

    /// Generate speech audio from text. Returns the raw audio bytes.
    pub async fn create_speech(&self, request: &TtsRequest) -> Result<bytes::Bytes, ClientError> {
        let response = self
            .send(Method::POST, "/audio/speech", Some(request), &[])
            .await?;
        Ok(response.bytes().await?)
    }

    // --- Vector store collections ---

    /// Create a vector store collection.
    pub async fn create_collection(
        &self,
        request: &CreateCollectionRequest,
    ) -> Result<CreateCollectionResponse, ClientError> {
        self.post_json("/vector-stores/collections", request).await
    }

    /// Rename a vector store collection.
    pub async fn update_collection(
        &self,
        collection_id: &str,
        request: &UpdateCollectionRequest,
    ) -> Result<UpdateCollectionResponse, ClientError> {
        self.put_json(&format!("/vector-stores/collections/{collection_id}"), request)
            .await
    }

    /// Search items in a collection.
    pub async fn search_collection(
        &self,
        collection_id: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, ClientError> {
        self.post_json(
            &format!("/vector-stores/collections/{collection_id}/search"),
            request,
        )
        .await
    }

    /// List items in a collection.
    pub async fn list_items(&self, collection_id: &str) -> Result<ListItemsResponse, ClientError> {
        self.get_json(&format!("/vector-stores/collections/{collection_id}/items"))
            .await
    }

    /// Add an item to a collection.
    pub async fn add_item(
        &self,
        collection_id: &str,
        request: &AddItemRequest,
    ) -> Result<AddItemResponse, ClientError> {
        self.post_json(
            &format!("/vector-stores/collections/{collection_id}/items"),
            request,
        )
        .await
    }

    /// Retrieve an item from a collection.
    pub async fn get_item(
        &self,
        collection_id: &str,
        item_id: &str,
    ) -> Result<GetItemResponse, ClientError> {
        self.get_json(&format!(
            "/vector-stores/collections/{collection_id}/items/{item_id}"
        ))
        .await
    }

    /// Update an item's description.
    pub async fn update_item(
        &self,
        collection_id: &str,
        item_id: &str,
        request: &UpdateItemRequest,
    ) -> Result<UpdateItemResponse, ClientError> {
        self.put_json(
            &format!("/vector-stores/collections/{collection_id}/items/{item_id}"),
            request,
        )
        .await
    }

    /// List files attached to a collection.
    pub async fn list_files(&self, collection_id: &str) -> Result<ListFilesResponse, ClientError> {
        self.get_json(&format!("/vector-stores/collections/{collection_id}/files"))
            .await
    }

    /// Upload a file to a collection for ingestion.
    pub async fn add_file(
        &self,
        collection_id: &str,
        filename: &str,
        contents: Vec<u8>,
    ) -> Result<AddFileResponse, ClientError> {
        let url = format!(
            "{}/vector-stores/collections/{collection_id}/files",
            self.config.base_url
        );

        let part = multipart::Part::bytes(contents).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);

        let mut request = self.http.post(&url).header(AUTHORIZATION, self.auth_header()?);
        request = add_extra_headers(request, &self.config.extra_headers);

        debug!(collection_id, filename, "uploading file");
        let response = self.execute(request.multipart(form)).await?;
        Ok(response.json().await?)
    }

    /// Retrieve a file from a collection.
    pub async fn get_file(
        &self,
        collection_id: &str,
        file_id: &str,
    ) -> Result<GetFileResponse, ClientError> {
        self.get_json(&format!(
            "/vector-stores/collections/{collection_id}/files/{file_id}"
        ))
        .await
    }

    // --- Images ---

    /// Generate images from a text prompt.
    pub async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, ClientError> {
        self.post_json("/images/generations", request).await
    }

    // --- Account ---

    /// Retrieve usage totals for the current and previous month.
    pub async fn get_usage(&self) -> Result<UsageResponse, ClientError> {
        self.get_json("/usage").await
    }

    /// Retrieve API request logs for a recent window.
    pub async fn get_request_logs(
        &self,
        query: &RequestLogsQuery,
    ) -> Result<RequestLogsResponse, ClientError> {
        let url = format!("{}/request-logs", self.config.base_url);

        let mut request = self
            .http
            .get(&url)
            .query(&query.to_pairs())
            .header(AUTHORIZATION, self.auth_header()?);
        request = add_extra_headers(request, &self.config.extra_headers);

        let response = self.execute(request).await?;
        Ok(response.json().await?)
    }
}
