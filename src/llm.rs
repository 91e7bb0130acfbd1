use async_trait::async_trait;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::parameters::FormatType;
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::prompt::Prompt;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// One JSON-mode completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: Prompt,
    pub temperature: f32,
    pub top_p: f32,
}

impl CompletionRequest {
    pub fn new(prompt: Prompt, temperature: f32) -> Self {
        Self {
            prompt,
            temperature,
            top_p: 1.0,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the raw text of the model's reply.
    async fn complete_json(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 2],
    temperature: f32,
    top_p: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> ChatBody<'a> {
        ChatBody {
            model: &self.model,
            messages: [
                WireMessage {
                    role: "system",
                    content: &request.prompt.system,
                },
                WireMessage {
                    role: "user",
                    content: &request.prompt.user,
                },
            ],
            temperature: request.temperature,
            top_p: request.top_p,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

fn first_choice(completion: ChatCompletion) -> Result<String, LlmError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(LlmError::EmptyResponse)
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete_json(&self, request: CompletionRequest) -> Result<String, LlmError> {
        debug!(model = %self.model, temperature = request.temperature, "sending chat completion");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        first_choice(response.json::<ChatCompletion>().await?)
    }
}

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub fn new(host: String, port: u16, model: String) -> Result<Self, LlmError> {
        check_host(&host)?;
        Ok(Self {
            client: Ollama::new(host, port),
            model,
        })
    }
}

/// `Ollama::new` panics on hosts it cannot attach a port to.
fn check_host(host: &str) -> Result<(), LlmError> {
    match reqwest::Url::parse(host) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(LlmError::InvalidHost(host.to_string())),
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete_json(&self, request: CompletionRequest) -> Result<String, LlmError> {
        debug!(model = %self.model, temperature = request.temperature, "sending ollama chat");

        let options = ModelOptions::default()
            .temperature(request.temperature)
            .top_p(request.top_p);

        let chat = ChatMessageRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(request.prompt.system),
                ChatMessage::user(request.prompt.user),
            ],
        )
        .format(FormatType::Json)
        .options(options);

        let response = self
            .client
            .send_chat_messages(chat)
            .await
            .map_err(|e| LlmError::Ollama(e.to_string()))?;

        if response.message.content.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(response.message.content)
    }
}
