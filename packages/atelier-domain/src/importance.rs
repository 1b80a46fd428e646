use crate::{MemoryType, ResponderKind};

/// Content length at which the length bonus saturates, in characters.
pub const LENGTH_REFERENCE_CHARS: usize = 500;
pub const MAX_LENGTH_BONUS: f32 = 0.1;

pub fn base_weight(memory_type: MemoryType) -> f32 {
	match memory_type {
		MemoryType::Profile => 0.9,
		MemoryType::Knowledge => 0.8,
		MemoryType::Strategy => 0.7,
		MemoryType::Conversational => 0.5,
	}
}

/// Multiplier for an arbitrary responder id; ids outside the catalogue are neutral.
pub fn responder_multiplier(responder_id: &str) -> f32 {
	responder_id.parse::<ResponderKind>().map(ResponderKind::importance_multiplier).unwrap_or(1.0)
}

pub fn length_bonus(content: &str) -> f32 {
	let chars = content.chars().count();
	let ratio = (chars as f32 / LENGTH_REFERENCE_CHARS as f32).min(1.0);

	ratio * MAX_LENGTH_BONUS
}

/// Retention weight of a memory in `[0, 1]`.
pub fn score(content: &str, memory_type: MemoryType, responder_id: &str) -> f32 {
	let raw = (base_weight(memory_type) + length_bonus(content)) * responder_multiplier(responder_id);

	raw.clamp(0.0, 1.0)
}
