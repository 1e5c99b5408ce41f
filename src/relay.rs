use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::Response,
};
use tracing::{debug, error, warn};

use crate::error::AppError;
use crate::metrics::UPSTREAM_FAILURES;
use crate::models::{ChatMessage, CompletionRequest};

/// Client for the upstream chat-completion service.
#[derive(Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl CompletionClient {
    pub fn new(client: reqwest::Client, url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client,
            url,
            model,
            // an empty variable counts as missing
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    /// Fails with a configuration error when no credential was provided.
    pub fn api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .ok_or(AppError::Configuration("COMPLETION_API_KEY"))
    }

    /// Sends the conversation with `system_prompt` prepended and hands the
    /// upstream event stream back untouched.
    ///
    /// The body is forwarded chunk by chunk without parsing. Dropping the
    /// returned response (client gone) drops the upstream stream with it.
    pub async fn relay(
        &self,
        conversation: Vec<ChatMessage>,
        system_prompt: String,
    ) -> Result<Response, AppError> {
        let api_key = self.api_key()?;

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(conversation);

        let request = CompletionRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        debug!(model = %self.model, turns = request.messages.len() - 1, "calling completion service");

        let res = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                UPSTREAM_FAILURES.inc();
                error!(error = %e, url = %self.url, "completion service unreachable");
                AppError::Transport(e)
            })?;

        let status = res.status();
        if !status.is_success() {
            UPSTREAM_FAILURES.inc();
            return Err(match status.as_u16() {
                429 => {
                    warn!(status = 429, "completion service rate limited us");
                    AppError::UpstreamOverloaded
                }
                402 => {
                    warn!(status = 402, "completion service credits exhausted");
                    AppError::UpstreamQuotaExceeded
                }
                code => {
                    let body = res.text().await.unwrap_or_default();
                    error!(status = code, %body, "completion service error");
                    AppError::Upstream { status: code, body }
                }
            });
        }

        let mut response = Response::new(Body::from_stream(res.bytes_stream()));
        *response.status_mut() = StatusCode::OK;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));

        Ok(response)
    }
}
