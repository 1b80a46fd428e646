use serde_json::{Map, Value};

/// Finds the first balanced `{...}` object in `text`, ignoring braces inside string literals.
pub fn extract_json_object(text: &str) -> Option<&str> {
	let start = text.find('{')?;
	let mut depth = 0_usize;
	let mut in_string = false;
	let mut escaped = false;

	for (offset, c) in text[start..].char_indices() {
		if in_string {
			match c {
				_ if escaped => escaped = false,
				'\\' => escaped = true,
				'"' => in_string = false,
				_ => {},
			}

			continue;
		}

		match c {
			'"' => in_string = true,
			'{' => depth += 1,
			'}' => {
				depth = depth.checked_sub(1)?;

				if depth == 0 {
					return Some(&text[start..start + offset + 1]);
				}
			},
			_ => {},
		}
	}

	None
}

/// Returns the body of the first fenced code block, with an optional `json` tag stripped.
pub fn fenced_block(text: &str) -> Option<&str> {
	let open = text.find("```")?;
	let after_open = &text[open + 3..];
	let body_start = after_open.find('\n').map(|idx| idx + 1).unwrap_or(0);
	let tag = after_open[..body_start].trim();

	if !tag.is_empty() && !tag.eq_ignore_ascii_case("json") {
		return None;
	}

	let body = &after_open[body_start..];
	let close = body.find("```")?;

	Some(body[..close].trim())
}

/// Parses a JSON object out of free-form model output.
///
/// Tries the whole text, then a fenced block, then the first balanced object.
pub fn parse_lenient_object(text: &str) -> Option<Map<String, Value>> {
	let candidates = [Some(text.trim()), fenced_block(text), extract_json_object(text)];

	candidates
		.into_iter()
		.flatten()
		.find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
			Ok(Value::Object(map)) => Some(map),
			_ => None,
		})
}
