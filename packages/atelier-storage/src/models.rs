use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use atelier_domain::MemoryType;

/// One immutable stored fact about an interaction or a knowledge fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryEntry {
	pub id: Uuid,
	pub memory_type: MemoryType,
	pub responder_id: String,
	pub owner_id: Option<Uuid>,
	pub session_id: Option<String>,
	pub content: String,
	pub summary: Option<String>,
	pub importance: f32,
	pub embedding: Vec<f32>,
	pub category: String,
	pub metadata: Map<String, Value>,
	pub created_at: OffsetDateTime,
	/// Set only on knowledge entries.
	pub document_id: Option<Uuid>,
	/// Set only on knowledge entries.
	pub chunk_index: Option<i32>,
}
impl MemoryEntry {
	/// Checks the invariants every stored entry must satisfy.
	pub fn validate(&self, vector_dim: usize) -> crate::Result<()> {
		if self.content.trim().is_empty() {
			return Err(crate::Error::InvalidArgument("content must be non-empty.".to_string()));
		}
		if !self.importance.is_finite() || !(0.0..=1.0).contains(&self.importance) {
			return Err(crate::Error::InvalidArgument(format!(
				"importance must be in the range 0.0-1.0, got {}.",
				self.importance
			)));
		}
		if self.embedding.len() != vector_dim {
			return Err(crate::Error::InvalidArgument(format!(
				"embedding has {} dimensions, expected {vector_dim}.",
				self.embedding.len()
			)));
		}
		if self.memory_type != MemoryType::Knowledge
			&& (self.document_id.is_some() || self.chunk_index.is_some())
		{
			return Err(crate::Error::InvalidArgument(
				"document_id and chunk_index are only valid on knowledge entries.".to_string(),
			));
		}

		Ok(())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredEntry {
	pub entry: MemoryEntry,
	pub similarity: f32,
}

/// Predicates applied to a similarity search.
#[derive(Clone, Debug, Default)]
pub struct EntryFilter {
	pub memory_type: Option<MemoryType>,
	pub responder_id: Option<String>,
	pub owner_id: Option<Uuid>,
	pub session_id: Option<String>,
	pub min_importance: f32,
}
impl EntryFilter {
	pub fn matches(&self, entry: &MemoryEntry) -> bool {
		entry.importance >= self.min_importance
			&& self.memory_type.is_none_or(|kind| entry.memory_type == kind)
			&& self.responder_id.as_deref().is_none_or(|id| entry.responder_id == id)
			&& self.owner_id.is_none_or(|owner| entry.owner_id == Some(owner))
			&& self.session_id.as_deref().is_none_or(|session| entry.session_id.as_deref() == Some(session))
	}
}

/// The consolidated, mutable record kept per artisan.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtisanProfile {
	pub owner_id: Uuid,
	pub profile_summary: String,
	pub key_insights: Map<String, Value>,
	pub interaction_count: i64,
	pub maturity_snapshot: Map<String, Value>,
	pub embedding: Vec<f32>,
	pub last_interaction_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// Replacement state for a profile. A new profile starts its counter at one; an existing one
/// grows by one only when `increment` is set.
#[derive(Clone, Debug)]
pub struct ProfileUpsert {
	pub owner_id: Uuid,
	pub profile_summary: String,
	pub key_insights: Map<String, Value>,
	pub maturity_snapshot: Map<String, Value>,
	pub embedding: Vec<f32>,
	pub increment: bool,
	pub at: OffsetDateTime,
}
