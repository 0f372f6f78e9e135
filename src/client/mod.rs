mod session;

pub use session::{Callbacks, ChatEventHandler, SessionOutcome, StreamHandle};

use crate::auth::TokenProvider;
use crate::core::{ChatError, ClientConfig, StreamEndPolicy};
use crate::eventsource::EventSourceExt;
use crate::types::{ChatCompletion, ChatRequest, StreamingChatMessage};
use async_stream::try_stream;
use futures::{Stream, StreamExt};
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Path of the streaming completion endpoint, relative to the base URL
const STREAM_PATH: &str = "/chat/stream";
/// Path of the non-streaming completion endpoint
const COMPLETE_PATH: &str = "/chat/complete";
/// Payload the server sends as its end-of-stream marker
const DONE_SENTINEL: &str = "[DONE]";

/// Typed message stream produced by [`ChatClient::stream`].
pub type MessageStream =
    Pin<Box<dyn Stream<Item = Result<StreamingChatMessage, ChatError>> + Send + 'static>>;

/// Client for the Red Panda chat endpoints
///
/// Holds the HTTP client, settings, and the credential source. One client
/// serves any number of concurrent sessions; each [`start`](Self::start)
/// call owns its own session state, so sessions never interfere.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    config: ClientConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl ChatClient {
    /// Creates a client with the given settings and credential source.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client: Client::new(),
            config,
            tokens,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Starts a streaming session on its own task, dispatching each decoded
    /// record to the handler, and returns the session's cancel handle.
    ///
    /// Exactly one of `on_complete`/`on_error` fires per session, after all
    /// `on_message` calls, unless the handle is cancelled first, in which
    /// case no further callbacks fire at all.
    pub fn start<H>(&self, request: ChatRequest, handler: H) -> StreamHandle
    where
        H: ChatEventHandler,
    {
        let token = CancellationToken::new();
        let session_token = token.clone();
        let client = self.clone();

        let task = tokio::spawn(async move {
            let outcome = session::run_session(
                async move { client.stream(&request).await },
                handler,
                session_token,
            )
            .await;
            debug!("Session finished: {outcome:?}");
            outcome
        });

        StreamHandle::new(token, task)
    }

    /// Streams one chat turn as typed messages.
    ///
    /// The stream ends right after the completion sentinel. Under
    /// [`StreamEndPolicy::Error`], a connection that closes without the
    /// sentinel surfaces an [`ChatError::UnterminatedStream`] item instead.
    /// Malformed records are logged and skipped.
    pub async fn stream(&self, request: &ChatRequest) -> Result<MessageStream, ChatError> {
        let response = self.open_stream(request).await?;
        Ok(interpret_events(response, self.config.stream_end))
    }

    /// Sends one chat turn without streaming and returns the persisted
    /// reply, including summaries of any code blocks the server filed.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, ChatError> {
        debug!(
            "Requesting completion: conversation={} model={}",
            request.conversation_id, request.model
        );
        let builder = self.client.post(self.endpoint(COMPLETE_PATH)).json(request);
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(ChatError::from)?;
        let response = check_status(response).await?;

        response.json::<ChatCompletion>().await.map_err(ChatError::Parse)
    }

    /// Opens the streaming completion request and verifies the status
    /// before any bytes are consumed.
    async fn open_stream(&self, request: &ChatRequest) -> Result<Response, ChatError> {
        debug!(
            "Opening chat stream: conversation={} model={}",
            request.conversation_id, request.model
        );
        let builder = self
            .client
            .post(self.endpoint(STREAM_PATH))
            .header("Accept", "text/event-stream")
            .json(request);
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(ChatError::from)?;

        check_status(response).await
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.tokens.token() {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{base}{path}",
            base = self.config.base_url.trim_end_matches('/')
        )
    }
}

/// Maps a non-success response into a descriptive error, reading any body
/// text the server attached.
async fn check_status(response: Response) -> Result<Response, ChatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ChatError::Authentication(
            "Invalid access token or unauthorized access".to_string(),
        ),
        StatusCode::NOT_FOUND => ChatError::NotFound(message),
        status if status.is_server_error() => ChatError::Server(format!(
            "API request failed with status {status}: {message}"
        )),
        status => ChatError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

/// Turns the response body into typed messages: sentinel recognition,
/// payload parsing with skip-on-failure, and the end-of-stream policy.
fn interpret_events(response: Response, policy: StreamEndPolicy) -> MessageStream {
    Box::pin(try_stream! {
        let mut events = response.events();
        let mut completed = false;

        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if event.data == DONE_SENTINEL {
                        completed = true;
                        break;
                    }
                    match serde_json::from_str::<StreamingChatMessage>(&event.data) {
                        Ok(message) => {
                            debug!(
                                "Stream record: kind={} id={}",
                                message.kind_name(),
                                message.id()
                            );
                            yield message;
                        }
                        // Stray or diagnostic payloads never kill the stream
                        Err(e) => warn!("Skipping malformed stream record: {e}"),
                    }
                }
                Err(e) => Err(ChatError::Stream(e.to_string()))?,
            }
        }

        if !completed && policy == StreamEndPolicy::Error {
            Err(ChatError::UnterminatedStream)?;
        }
    })
}
