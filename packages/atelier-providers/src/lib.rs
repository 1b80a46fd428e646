pub mod embedding;
pub mod generation;

pub use generation::{ChatMessage, ChatRole, GenerationRequest};

use color_eyre::{Result, eyre};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(eyre::eyre!("Default header {key:?} must be a string."));
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Joins a base URL and an endpoint path with exactly one slash between them.
pub fn endpoint(api_base: &str, path: &str) -> String {
	format!("{}/{}", api_base.trim_end_matches('/'), path.trim_start_matches('/'))
}
