/// LLM Client — the single point of entry for all model calls in the
/// importer. No other module talks to the Anthropic API directly.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::ModelError;

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Extraction model used unless `ANTHROPIC_MODEL` overrides it.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 2048;
const MAX_ATTEMPTS: u32 = 3;

/// How a failed API response affects the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rate limits, overload, 5xx, network timeouts — retry with backoff.
    Transient,
    /// Credentials rejected — fatal for the whole batch.
    Auth,
    /// Credits/quota exhausted — fatal for the whole batch.
    Quota,
    /// Any other client error — fail this document, no retry.
    Request,
}

/// Pure classification so the retry state machine is testable without a
/// network. `error_type` and `message` come from the API error body when
/// one could be parsed.
pub fn classify(status: u16, error_type: &str, message: &str) -> ErrorClass {
    if status == 401
        || status == 403
        || error_type == "authentication_error"
        || error_type == "permission_error"
    {
        return ErrorClass::Auth;
    }
    let message = message.to_ascii_lowercase();
    if error_type == "billing_error" || message.contains("credit balance") || message.contains("quota")
    {
        return ErrorClass::Quota;
    }
    if status == 429 || status >= 500 {
        return ErrorClass::Transient;
    }
    ErrorClass::Request
}

/// Exponential backoff: 1s, 2s, 4s for attempts 1, 2, 3.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1 << (attempt - 1)))
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl ApiResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type", default)]
    error_type: String,
    message: String,
}

fn parse_api_error(body: &str) -> (String, String) {
    match serde_json::from_str::<ApiError>(body) {
        Ok(e) => (e.error.error_type, e.error.message),
        Err(_) => (String::new(), body.to_string()),
    }
}

/// Seam between the orchestrator and the model. The production
/// implementation is [`LlmClient`]; tests script their own.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Sends one structured-extraction prompt for `document_text` and
    /// returns the raw model output, unparsed.
    async fn extract(&self, document_text: &str) -> Result<String, ModelError>;
}

/// Anthropic Messages client with a bounded timeout and bounded retries.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.llm_timeout_secs))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: config.anthropic_api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Makes the API call, retrying transient failures with exponential
    /// backoff up to `MAX_ATTEMPTS`. Non-transient failures return
    /// immediately; auth and quota failures are marked batch-fatal.
    async fn call(&self, prompt: &str, system: &str) -> Result<String, ModelError> {
        let request_body = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<String> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "model call attempt {} failed, retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    // Network errors and request timeouts are transient.
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            let status = response.status();

            if status.is_success() {
                let api_response: ApiResponse = response.json().await?;
                debug!(
                    input_tokens = api_response.usage.input_tokens,
                    output_tokens = api_response.usage.output_tokens,
                    "model call succeeded"
                );
                let text = api_response.text().ok_or(ModelError::EmptyContent)?;
                return Ok(text.to_string());
            }

            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let (error_type, message) = parse_api_error(&body);

            match classify(code, &error_type, &message) {
                ErrorClass::Transient => {
                    warn!("model API returned {code}: {message}");
                    last_error = Some(format!("status {code}: {message}"));
                }
                ErrorClass::Auth => return Err(ModelError::Auth(message)),
                ErrorClass::Quota => return Err(ModelError::QuotaExceeded(message)),
                ErrorClass::Request => {
                    return Err(ModelError::Api {
                        status: code,
                        message,
                    })
                }
            }
        }

        Err(ModelError::Unavailable {
            attempts: MAX_ATTEMPTS,
            last: last_error.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ModelInvoker for LlmClient {
    async fn extract(&self, document_text: &str) -> Result<String, ModelError> {
        let prompt = prompts::build_extraction_prompt(document_text);
        self.call(&prompt, prompts::EXTRACT_SYSTEM).await
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub(crate) fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
