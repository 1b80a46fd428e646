use unicode_segmentation::UnicodeSegmentation;

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub max_chars: usize,
	pub overlap_chars: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
	pub chunk_index: i32,
	pub start_offset: usize,
	pub end_offset: usize,
	pub text: String,
}

/// Splits `text` into chunks of at most `max_chars` characters.
///
/// Chunks end on sentence boundaries when possible, and prefer paragraph breaks in the second half
/// of a chunk. Each chunk after the first repeats up to `overlap_chars` characters of the previous
/// one. A single sentence longer than the budget is hard-split on character boundaries.
pub fn split_text(text: &str, cfg: &ChunkingConfig) -> Vec<Chunk> {
	let max_chars = cfg.max_chars.max(1);
	let overlap_chars = cfg.overlap_chars.min(max_chars.saturating_sub(1));
	let mut chunks = Vec::new();

	if text.trim().is_empty() {
		return chunks;
	}

	let pieces = pieces(text, max_chars);
	let mut current = String::new();
	let mut current_chars = 0_usize;
	let mut current_start = 0_usize;
	let mut last_end = 0_usize;

	for (idx, piece) in pieces {
		let piece_chars = piece.chars().count();

		if current_chars + piece_chars > max_chars && !current.is_empty() {
			let (kept, carry) =
				split_at_paragraph(&current, current_chars, max_chars - piece_chars.min(max_chars));
			let kept_end = current_start + kept.len();

			push_chunk(&mut chunks, current_start, kept_end, kept);

			let carry_chars = carry.chars().count();
			let overlap = tail_chars(kept, overlap_chars.saturating_sub(carry_chars));

			current_start = kept_end - overlap.len();
			current = format!("{overlap}{carry}");
			current_chars = current.chars().count();

			// Overlap never pushes a fresh chunk past the budget.
			while current_chars + piece_chars > max_chars && !current.is_empty() {
				let drop = current.chars().next().map(char::len_utf8).unwrap_or(0);

				current.drain(..drop);
				current_start += drop;
				current_chars -= 1;
			}
		}
		if current.is_empty() {
			current_start = idx;
		}

		current.push_str(piece);

		current_chars += piece_chars;
		last_end = idx + piece.len();
	}

	if !current.trim().is_empty() {
		push_chunk(&mut chunks, current_start, last_end, &current);
	}

	chunks
}

fn push_chunk(chunks: &mut Vec<Chunk>, start: usize, end: usize, text: &str) {
	if text.trim().is_empty() {
		return;
	}

	chunks.push(Chunk {
		chunk_index: chunks.len() as i32,
		start_offset: start,
		end_offset: end,
		text: text.to_string(),
	});
}

/// Sentence pieces with byte offsets; sentences longer than `max_chars` are hard-split.
fn pieces(text: &str, max_chars: usize) -> Vec<(usize, &str)> {
	let mut out = Vec::new();

	for (idx, sentence) in text.split_sentence_bound_indices() {
		if sentence.chars().count() <= max_chars {
			out.push((idx, sentence));

			continue;
		}

		let mut start = 0_usize;
		let mut count = 0_usize;

		for (offset, _) in sentence.char_indices() {
			if count == max_chars {
				out.push((idx + start, &sentence[start..offset]));

				start = offset;
				count = 0;
			}

			count += 1;
		}

		out.push((idx + start, &sentence[start..]));
	}

	out
}

/// Cuts `current` at its last paragraph break past the half-way point, returning the kept prefix
/// and the carried remainder. The remainder never exceeds `max_carry` characters.
fn split_at_paragraph(current: &str, current_chars: usize, max_carry: usize) -> (&str, &str) {
	let Some(break_at) = current.rfind("\n\n") else {
		return (current, "");
	};
	let (kept, carry) = current.split_at(break_at + 2);
	let kept_chars = kept.chars().count();

	if kept_chars * 2 <= current_chars || current_chars - kept_chars > max_carry {
		return (current, "");
	}

	(kept, carry)
}

fn tail_chars(text: &str, chars: usize) -> &str {
	if chars == 0 {
		return "";
	}

	let total = text.chars().count();

	if total <= chars {
		return text;
	}

	let skip = text.char_indices().nth(total - chars).map(|(idx, _)| idx).unwrap_or(text.len());

	&text[skip..]
}
