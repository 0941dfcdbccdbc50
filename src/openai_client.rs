use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const COMPLETION_MODEL: &str = "gpt-3.5-turbo-instruct";
const MAX_TOKENS: u32 = 512;

/// Instructional template wrapped around every user question.
const PROMPT_TEMPLATE: &str = "\
You are Citizen AI, a smart assistant for Indian citizens. You help with:
- Indian schemes, smart cities, sustainability, pollution, energy, water, waste
- Always follow Indian laws
User question: {user_question}
Give a helpful, Indian-context answer.";

/// Static replies the chat handler falls back to when the completion call
/// cannot be made.
pub const FALLBACK_RESPONSES: [&str; 3] = [
    "Please visit india.gov.in or contact your local authority.",
    "Consult your nearest government office for proper assistance.",
    "Refer to the official portal for accurate guidance.",
];

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("completion response contained no choices")]
    EmptyResponse,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        OpenAiClient {
            client: Client::new(),
            api_key,
            base_url,
            model: COMPLETION_MODEL.to_string(),
        }
    }

    /// One text-in/text-out completion for the user's question. The caller
    /// decides what to show when this fails; no fallback happens here.
    pub async fn generate_response(&self, user_message: &str) -> Result<String, CompletionError> {
        let prompt = PROMPT_TEMPLATE.replace("{user_question}", user_message);
        let url = format!("{}/v1/completions", self.base_url);

        let request = CompletionRequest {
            model: &self.model,
            prompt: &prompt,
            max_tokens: MAX_TOKENS,
            temperature: 0.7,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .first()
            .map(|choice| choice.text.trim().to_string())
            .ok_or(CompletionError::EmptyResponse)
    }
}
