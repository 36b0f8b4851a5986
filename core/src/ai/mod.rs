use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, SystemTime};
use thiserror::Error;

use crate::prompt::build_user_content;
use crate::response::{recover_object, ResponseFormatError};

pub mod retry;

use retry::{evaluate_retry, parse_retry_after, RequestFailure, RetryPolicy};

pub const ARK_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Network(String),

    #[error("translation service error: {0}")]
    Service(String),

    #[error("{0}")]
    ResponseFormat(#[from] ResponseFormatError),
}

/// One translation call: a selection payload and a target language in, the
/// translated mapping out.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        system_prompt: &str,
        content: &str,
        language: &str,
    ) -> Result<Map<String, Value>, TranslationError>;
}

/// Chat-completion client for the Volcengine Ark service.
///
/// The configured endpoint id doubles as the model name. Retryable failures
/// back off according to the policy, honoring `Retry-After` when the service
/// sends one.
pub struct ArkClient {
    http: Client,
    base_url: String,
    api_key: String,
    endpoint_id: String,
    retry_policy: RetryPolicy,
}

impl ArkClient {
    pub fn new(api_key: &str, endpoint_id: &str) -> Result<Self, TranslationError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| TranslationError::Network(err.to_string()))?;
        Ok(Self {
            http,
            base_url: ARK_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            endpoint_id: endpoint_id.to_string(),
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

#[async_trait]
impl Translator for ArkClient {
    async fn translate(
        &self,
        system_prompt: &str,
        content: &str,
        language: &str,
    ) -> Result<Map<String, Value>, TranslationError> {
        let user_content = build_user_content(content, language);
        let request = ChatRequest {
            model: &self.endpoint_id,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
            temperature: 0.2,
        };
        let url = format!("{}/chat/completions", self.base_url);

        let mut attempts: u32 = 0;
        loop {
            let response = match self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    let decision =
                        evaluate_retry(RequestFailure::Transport, self.retry_policy, attempts);
                    if !decision.should_retry {
                        return Err(TranslationError::Network(err.to_string()));
                    }
                    log::warn!(
                        "request for {language} failed ({err}), retrying in {:?}",
                        decision.delay
                    );
                    attempts += 1;
                    tokio::time::sleep(decision.delay).await;
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let retry_after = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| parse_retry_after(value, SystemTime::now()));
                let body = response.text().await.unwrap_or_default();
                let decision = evaluate_retry(
                    RequestFailure::Status {
                        status,
                        retry_after,
                    },
                    self.retry_policy,
                    attempts,
                );
                if !decision.should_retry {
                    return Err(TranslationError::Service(extract_service_message(
                        status, &body,
                    )));
                }
                log::warn!(
                    "service answered {status} for {language}, retrying in {:?}",
                    decision.delay
                );
                attempts += 1;
                tokio::time::sleep(decision.delay).await;
                continue;
            }

            let reply = response
                .json::<ChatResponse>()
                .await
                .map_err(|err| TranslationError::Network(err.to_string()))?;
            let content = reply
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| {
                    TranslationError::Service("response contained no choices".to_string())
                })?;
            return Ok(recover_object(&content)?);
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn extract_service_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(|error| error.message)
        .unwrap_or_else(|| body.trim().chars().take(200).collect());
    if detail.is_empty() {
        format!("status {status}")
    } else {
        format!("status {status}: {detail}")
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}
