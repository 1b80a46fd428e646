/// Cuts `text` to at most `max_chars` characters, ending with `...` when shortened.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
	if text.chars().count() <= max_chars {
		return text.to_string();
	}
	if max_chars <= 3 {
		return text.chars().take(max_chars).collect();
	}

	let mut out: String = text.chars().take(max_chars - 3).collect();

	out.push_str("...");

	out
}

/// Cuts `text` to its first `max_chars` characters.
pub fn prefix_chars(text: &str, max_chars: usize) -> String {
	text.chars().take(max_chars).collect()
}
