//! HTTP client for the tutor backend.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tutors_core::backend::{
    ChatBackend, ChatReply, ChatRequest, ConversationSource, HealthCheck, TranslationBackend,
    TranslationRequest, TranslationResponse,
};
use tutors_core::config::ClientConfig;
use tutors_core::error::{Result, TutorsError};
use tutors_core::session::ConversationSnapshot;

const CHAT_PATH: &[&str] = &["api", "chat"];
const TRANSLATE_PATH: &[&str] = &["api", "translate"];
const CONVERSATIONS_PATH: &[&str] = &["api", "conversations"];
const HEALTH_PATH: &[&str] = &["health"];

/// Talks to the chat, translate, conversation and health endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the URL is not an absolute http(s) URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| TutorsError::config(format!("Invalid base URL '{base_url}': {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(TutorsError::config(format!(
                "Base URL must be http or https, got '{}'",
                base_url.scheme()
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;
        tracing::debug!("[HttpBackend] Using {} (timeout {:?})", base_url, timeout);
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.normalized_base_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an endpoint URL; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TutorsError::config(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_json<B, T>(&self, service: &'static str, url: Url, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!("[HttpBackend] POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| transport_error(service, err))?;
        decode(service, response, |status, body| map_http_error(service, status, body)).await
    }

    async fn get_json<T, F>(&self, service: &'static str, url: Url, on_error: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce(StatusCode, &str) -> TutorsError + Send,
    {
        tracing::debug!("[HttpBackend] GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| transport_error(service, err))?;
        decode(service, response, on_error).await
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let url = self.endpoint(CHAT_PATH)?;
        let reply: ChatReply = self.post_json("chat", url, request).await?;
        tracing::info!(
            "[HttpBackend] Chat reply for conversation {}",
            reply.conversation_id
        );
        Ok(reply)
    }
}

#[async_trait]
impl TranslationBackend for HttpBackend {
    async fn translate(&self, request: &TranslationRequest) -> Result<Vec<String>> {
        let url = self.endpoint(TRANSLATE_PATH)?;
        let response: TranslationResponse = self.post_json("translate", url, request).await?;
        tracing::info!(
            "[HttpBackend] Translated {} text(s) {} -> {}",
            response.translated_text.len(),
            request.source_lang,
            request.target_lang
        );
        Ok(response.translated_text)
    }
}

#[async_trait]
impl ConversationSource for HttpBackend {
    async fn fetch_conversation(&self, conversation_id: &str) -> Result<ConversationSnapshot> {
        let mut segments = CONVERSATIONS_PATH.to_vec();
        segments.push(conversation_id);
        let url = self.endpoint(&segments)?;

        self.get_json("conversations", url, |status, body| {
            map_conversation_error(status, body, conversation_id)
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    ok: bool,
}

#[async_trait]
impl HealthCheck for HttpBackend {
    async fn health(&self) -> Result<bool> {
        let url = self.endpoint(HEALTH_PATH)?;
        let response: HealthResponse = self
            .get_json("health", url, |status, body| {
                map_http_error("health", status, body)
            })
            .await?;
        Ok(response.ok)
    }
}

async fn decode<T, F>(service: &'static str, response: Response, on_error: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce(StatusCode, &str) -> TutorsError,
{
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        tracing::warn!("[HttpBackend] {} returned {}", service, status);
        return Err(on_error(status, &body));
    }

    let body = response
        .text()
        .await
        .map_err(|err| transport_error(service, err))?;
    serde_json::from_str(&body).map_err(|err| TutorsError::Serialization {
        format: "JSON".to_string(),
        message: format!("Failed to parse {service} response: {err}"),
    })
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

fn map_http_error(service: &'static str, status: StatusCode, body: &str) -> TutorsError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|wrapper| match wrapper.detail {
            serde_json::Value::String(detail) => detail,
            other => other.to_string(),
        })
        .unwrap_or_else(|_| body.trim().to_string());

    TutorsError::Http {
        service,
        status: status.as_u16(),
        message,
    }
}

/// A missing conversation is `NotFound`; any other failure status is `Http`.
fn map_conversation_error(status: StatusCode, body: &str, conversation_id: &str) -> TutorsError {
    if status == StatusCode::NOT_FOUND {
        TutorsError::not_found("conversation", conversation_id)
    } else {
        map_http_error("conversations", status, body)
    }
}

fn transport_error(service: &'static str, err: reqwest::Error) -> TutorsError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("could not connect: {err}")
    } else {
        err.to_string()
    };
    TutorsError::network(service, message)
}
