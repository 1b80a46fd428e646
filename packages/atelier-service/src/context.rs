//! Per-turn context bundle built from persisted memory.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use atelier_domain::{MemoryType, profile_facts, profile_facts::ProfileFacts};
use atelier_providers::{ChatMessage, ChatRole};
use atelier_storage::models::{ArtisanProfile, MemoryEntry};

use crate::{MemoryService, ReadQuery};

pub const PROFILE_MEMORY_QUERY: &str = "onboarding perfil artesanía tipo de artesanía madurez";
pub const TRANSCRIPT_SOURCE: &str = "transcript";
pub const DEGRADED_PROFILE: &str = "profile";
pub const DEGRADED_RECENT: &str = "recent";
pub const DEGRADED_PROFILE_MEMORIES: &str = "profile_memories";

const TRANSCRIPT_IMPORTANCE: f32 = 0.5;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProfileView {
	pub summary: String,
	pub key_insights: Map<String, Value>,
	pub interaction_count: i64,
	pub maturity_snapshot: Map<String, Value>,
}
impl ProfileView {
	/// Adds extracted facts for keys the profile does not already hold.
	fn absorb_facts(&mut self, facts: ProfileFacts) {
		if let Some(craft_type) = facts.craft_type {
			self.key_insights.entry("tipo_artesania").or_insert(Value::String(craft_type));
		}
		if let Some(experience) = facts.experience {
			self.key_insights.entry("experiencia").or_insert(Value::String(experience));
		}
		if let Some(level) = facts.overall_maturity {
			self.maturity_snapshot.entry("general").or_insert(Value::String(level));
		}
	}
}
impl From<ArtisanProfile> for ProfileView {
	fn from(profile: ArtisanProfile) -> Self {
		Self {
			summary: profile.profile_summary,
			key_insights: profile.key_insights,
			interaction_count: profile.interaction_count,
			maturity_snapshot: profile.maturity_snapshot,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecentTurn {
	/// Responder id for stored entries, the utterance role for transcript turns.
	pub role: String,
	pub content: String,
	pub importance: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ContextBundle {
	pub session_id: String,
	pub owner_id: Option<Uuid>,
	pub profile: Option<ProfileView>,
	/// Newest first.
	pub recent_turns: Vec<RecentTurn>,
	/// Oldest first, alternating user and assistant.
	pub conversation_history: Vec<ChatMessage>,
	pub degraded: Vec<String>,
}
impl ContextBundle {
	pub fn has_maturity_snapshot(&self) -> bool {
		self.profile.as_ref().is_some_and(|profile| !profile.maturity_snapshot.is_empty())
	}

	/// Plain-text rendering of the profile for responder prompts.
	pub fn profile_digest(&self) -> String {
		let Some(profile) = self.profile.as_ref() else {
			return "Sin perfil registrado.".to_string();
		};
		let mut lines = vec![format!("Perfil del artesano: {}", profile.summary)];

		if let Some(level) = profile.maturity_snapshot.get("general").and_then(Value::as_str) {
			lines.push(format!("Nivel de madurez general: {level}"));
		}
		for (key, value) in &profile.maturity_snapshot {
			if key == "general" {
				continue;
			}
			if let Some(level) = value.as_str() {
				lines.push(format!("{}: {level}", key.replace('_', " ")));
			}
		}
		for (key, label) in [("tipo_artesania", "Tipo de artesanía"), ("experiencia", "Experiencia")] {
			if let Some(value) = profile.key_insights.get(key).and_then(Value::as_str) {
				lines.push(format!("{label}: {value}"));
			}
		}

		lines.push(format!("Interacciones previas: {}", profile.interaction_count));

		lines.join("\n")
	}
}

pub struct ContextAssembler {
	memory: Arc<MemoryService>,
}
impl ContextAssembler {
	pub fn new(memory: Arc<MemoryService>) -> Self {
		Self { memory }
	}

	/// Builds the bundle for one turn. Every source degrades to empty instead of failing.
	pub async fn assemble(
		&self,
		session_id: &str,
		owner_id: Option<Uuid>,
		transcript: &[ChatMessage],
	) -> ContextBundle {
		let memory_cfg = &self.memory.cfg.memory;
		let mut bundle = ContextBundle {
			session_id: session_id.to_string(),
			owner_id,
			..Default::default()
		};

		if let Some(owner_id) = owner_id {
			match self.memory.get_profile(owner_id).await {
				Ok(profile) => bundle.profile = profile.map(ProfileView::from),
				Err(err) => {
					tracing::warn!(error = %err, owner_id = %owner_id, "Profile lookup failed.");
					bundle.degraded.push(DEGRADED_PROFILE.to_string());
				},
			}
		}

		let recent = match self
			.memory
			.recent_by_session(session_id, owner_id, memory_cfg.recent_turns_limit)
			.await
		{
			Ok(entries) => entries,
			Err(err) => {
				tracing::warn!(error = %err, session_id, "Recent memory lookup failed.");
				bundle.degraded.push(DEGRADED_RECENT.to_string());

				Vec::new()
			},
		};

		let tail = transcript_tail(transcript, memory_cfg.transcript_fallback_limit as usize);

		if recent.is_empty() {
			bundle.recent_turns = tail.iter().rev().map(transcript_turn).collect();
		} else {
			bundle.recent_turns = recent
				.iter()
				.map(|entry| RecentTurn {
					role: entry.responder_id.clone(),
					content: entry.content.clone(),
					importance: entry.importance,
				})
				.collect();
			bundle.conversation_history = history_from_entries(&recent);
		}
		if bundle.conversation_history.is_empty() {
			bundle.conversation_history = tail.to_vec();
		}

		if let (Some(owner_id), Some(profile)) = (owner_id, bundle.profile.as_mut()) {
			let mut query = ReadQuery::new(PROFILE_MEMORY_QUERY, memory_cfg.profile_memory_limit);

			query.memory_type = Some(MemoryType::Profile);
			query.owner_id = Some(owner_id);

			match self.memory.read(&query).await {
				Ok(hits) => {
					let mut facts = ProfileFacts::default();

					for hit in &hits {
						facts.absorb(profile_facts::extract(&hit.entry.content));

						if let Some(summary) = hit.entry.summary.as_deref() {
							facts.absorb(profile_facts::extract(summary));
						}
					}

					profile.absorb_facts(facts);
				},
				Err(err) => {
					tracing::warn!(error = %err, owner_id = %owner_id, "Profile memory lookup failed.");
					bundle.degraded.push(DEGRADED_PROFILE_MEMORIES.to_string());
				},
			}
		}

		tracing::debug!(
			session_id,
			has_profile = bundle.profile.is_some(),
			recent_turns = bundle.recent_turns.len(),
			history = bundle.conversation_history.len(),
			"Context assembled."
		);

		bundle
	}
}

/// Rebuilds chat history, oldest first, from entries returned newest first.
///
/// Only conversational entries take part.
pub fn history_from_entries(entries: &[MemoryEntry]) -> Vec<ChatMessage> {
	let mut history = Vec::with_capacity(entries.len() * 2);
	let turns = entries.iter().rev().filter(|entry| entry.memory_type == MemoryType::Conversational);

	for (idx, entry) in turns.enumerate() {
		let user_input = entry.metadata.get("user_input").and_then(Value::as_str);
		let answer = entry.metadata.get("answer").and_then(Value::as_str);

		match (user_input, answer) {
			(Some(user_input), Some(answer)) => {
				history.push(ChatMessage::user(user_input));
				history.push(ChatMessage::assistant(answer));
			},
			_ => {
				let role = if idx % 2 == 0 { ChatRole::User } else { ChatRole::Assistant };

				history.push(ChatMessage { role, content: entry.content.clone() });
			},
		}
	}

	history
}

fn transcript_tail(transcript: &[ChatMessage], limit: usize) -> &[ChatMessage] {
	&transcript[transcript.len().saturating_sub(limit)..]
}

fn transcript_turn(message: &ChatMessage) -> RecentTurn {
	RecentTurn {
		role: TRANSCRIPT_SOURCE.to_string(),
		content: format!("{}: {}", message.role.as_str(), message.content),
		importance: TRANSCRIPT_IMPORTANCE,
	}
}
