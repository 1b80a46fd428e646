use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use atelier_config::EmbeddingProviderConfig;

/// Embeds `texts` in one request, returning vectors in input order.
pub async fn embed(cfg: &EmbeddingProviderConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
	if let Some(idx) = texts.iter().position(|text| text.trim().is_empty()) {
		return Err(eyre::eyre!("Embedding input at index {idx} is empty."));
	}
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let vectors = parse_embedding_response(json)?;

	if vectors.len() != texts.len() {
		return Err(eyre::eyre!(
			"Embedding response has {} vectors for {} inputs.",
			vectors.len(),
			texts.len()
		));
	}

	Ok(vectors)
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json
		.get("data")
		.and_then(Value::as_array)
		.ok_or_else(|| eyre::eyre!("Embedding response is missing data array."))?;
	let mut indexed = Vec::with_capacity(data.len());

	for (position, item) in data.iter().enumerate() {
		let index =
			item.get("index").and_then(Value::as_u64).map(|v| v as usize).unwrap_or(position);
		let values = item
			.get("embedding")
			.and_then(Value::as_array)
			.ok_or_else(|| eyre::eyre!("Embedding item {index} is missing embedding array."))?;
		let vector = values
			.iter()
			.map(|value| {
				value
					.as_f64()
					.map(|number| number as f32)
					.ok_or_else(|| eyre::eyre!("Embedding value must be numeric."))
			})
			.collect::<Result<Vec<_>>>()?;

		indexed.push((index, vector));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn orders_vectors_by_index() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_embedding_response(json).expect("Failed to parse embeddings.");

		assert_eq!(parsed, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
	}

	#[test]
	fn rejects_non_numeric_values() {
		let json = serde_json::json!({ "data": [{ "embedding": ["x"] }] });

		assert!(parse_embedding_response(json).is_err());
	}
}
