use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use atelier_config::LlmProviderConfig;

const MAX_ATTEMPTS: usize = 3;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
	System,
	User,
	Assistant,
}
impl ChatRole {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::System => "system",
			Self::User => "user",
			Self::Assistant => "assistant",
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ChatMessage {
	pub role: ChatRole,
	pub content: String,
}
impl ChatMessage {
	pub fn user(content: impl Into<String>) -> Self {
		Self { role: ChatRole::User, content: content.into() }
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self { role: ChatRole::Assistant, content: content.into() }
	}
}

#[derive(Clone, Debug)]
pub struct GenerationRequest {
	pub system_prompt: String,
	pub messages: Vec<ChatMessage>,
	pub temperature: f32,
	pub max_tokens: u32,
}

/// Runs a chat completion and returns the first choice's text.
///
/// Responses without text content are retried; transport and HTTP status errors are not.
pub async fn generate(cfg: &LlmProviderConfig, request: &GenerationRequest) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let body = request_body(cfg, request);

	for _ in 0..MAX_ATTEMPTS {
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		if let Some(content) = parse_completion_text(&json) {
			return Ok(content);
		}
	}

	Err(eyre::eyre!("Generation response has no text content after {MAX_ATTEMPTS} attempts."))
}

fn request_body(cfg: &LlmProviderConfig, request: &GenerationRequest) -> Value {
	let mut messages = Vec::with_capacity(request.messages.len() + 1);

	messages.push(serde_json::json!({ "role": "system", "content": request.system_prompt }));

	for message in &request.messages {
		messages.push(serde_json::json!({ "role": message.role.as_str(), "content": message.content }));
	}

	serde_json::json!({
		"model": cfg.model,
		"temperature": request.temperature,
		"max_tokens": request.max_tokens,
		"messages": messages,
	})
}

fn parse_completion_text(json: &Value) -> Option<String> {
	json.get("choices")
		.and_then(Value::as_array)
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|content| !content.is_empty())
		.map(str::to_string)
}
