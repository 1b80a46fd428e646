use crate::{Error, Result};

/// Renders a vector in pgvector's text form, e.g. `[0.1,0.2]`.
pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8 + 2);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

pub fn parse_pg_vector(text: &str) -> Result<Vec<f32>> {
	let inner = text
		.trim()
		.strip_prefix('[')
		.and_then(|s| s.strip_suffix(']'))
		.ok_or_else(|| Error::CorruptRow("Vector text is not bracketed.".to_string()))?;

	if inner.trim().is_empty() {
		return Ok(Vec::new());
	}

	inner
		.split(',')
		.map(|part| {
			part.trim().parse::<f32>().map_err(|_| {
				Error::CorruptRow("Vector text contains a non-numeric value.".to_string())
			})
		})
		.collect()
}

/// Cosine similarity; zero-length or zero-norm inputs score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() || a.is_empty() {
		return 0.0;
	}

	let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);

	for (x, y) in a.iter().zip(b) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}
