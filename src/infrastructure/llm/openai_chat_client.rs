use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{LanguageModel, LanguageModelError};

pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiChatClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        max_tokens: u32,
        temperature: f32,
        request_timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model,
            max_tokens,
            temperature,
        }
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<String, LanguageModelError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            response_format: json_mode.then(|| ResponseFormat {
                format_type: "json_object",
            }),
        };

        tracing::debug!(model = %self.model, json_mode, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LanguageModelError::ApiRequestFailed(format!("request: {}", e)))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LanguageModelError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LanguageModelError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| LanguageModelError::InvalidResponse(format!("parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LanguageModelError::InvalidResponse("no choices returned".to_string()))
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LanguageModelError> {
        self.chat(system, user, false).await
    }

    async fn complete_json(&self, system: &str, user: &str) -> Result<String, LanguageModelError> {
        self.chat(system, user, true).await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}
