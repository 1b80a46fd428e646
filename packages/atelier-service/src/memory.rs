//! Hierarchical memory: scored entries, similarity reads, and per-artisan profiles.

use std::sync::Arc;

use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use atelier_chunking::ChunkingConfig;
use atelier_config::Config;
use atelier_domain::{MemoryType, importance, text};
use atelier_providers::{ChatMessage, GenerationRequest};
use atelier_storage::{
	MemoryStore,
	models::{ArtisanProfile, EntryFilter, MemoryEntry, ProfileUpsert, ScoredEntry},
};

use crate::{Error, Providers, Result, prompts};

const SUMMARY_TEMPERATURE: f32 = 0.3;
const SUMMARY_MAX_TOKENS: u32 = 100;

#[derive(Clone, Debug)]
pub struct WriteRequest {
	pub memory_type: MemoryType,
	pub responder_id: String,
	pub content: String,
	pub category: String,
	pub owner_id: Option<Uuid>,
	pub session_id: Option<String>,
	pub summary: Option<String>,
	/// Scored from the content when absent.
	pub importance: Option<f32>,
	pub metadata: Map<String, Value>,
}
impl WriteRequest {
	pub fn new(
		memory_type: MemoryType,
		responder_id: impl Into<String>,
		content: impl Into<String>,
		category: impl Into<String>,
	) -> Self {
		Self {
			memory_type,
			responder_id: responder_id.into(),
			content: content.into(),
			category: category.into(),
			owner_id: None,
			session_id: None,
			summary: None,
			importance: None,
			metadata: Map::new(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct ReadQuery {
	pub query: String,
	pub memory_type: Option<MemoryType>,
	pub responder_id: Option<String>,
	pub owner_id: Option<Uuid>,
	pub session_id: Option<String>,
	pub limit: u32,
	pub min_importance: f32,
}
impl ReadQuery {
	pub fn new(query: impl Into<String>, limit: u32) -> Self {
		Self {
			query: query.into(),
			memory_type: None,
			responder_id: None,
			owner_id: None,
			session_id: None,
			limit,
			min_importance: 0.0,
		}
	}
}

/// Replacement state for one artisan profile.
#[derive(Clone, Debug)]
pub struct ProfileUpdate {
	pub owner_id: Uuid,
	pub summary: String,
	pub key_insights: Map<String, Value>,
	pub maturity_snapshot: Map<String, Value>,
	pub increment: bool,
}

#[derive(Clone, Debug)]
pub struct DocumentWrite {
	pub document_id: Uuid,
	pub responder_id: String,
	pub category: String,
	pub text: String,
	pub owner_id: Option<Uuid>,
	pub metadata: Map<String, Value>,
}

pub struct MemoryService {
	pub cfg: Config,
	pub store: Arc<dyn MemoryStore>,
	pub providers: Providers,
}
impl MemoryService {
	pub fn new(cfg: Config, store: Arc<dyn MemoryStore>) -> Self {
		Self::with_providers(cfg, store, Providers::default())
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn MemoryStore>, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}

	/// Persists one entry and returns its id.
	///
	/// Nothing is stored when embedding fails.
	pub async fn write(&self, req: WriteRequest) -> Result<Uuid> {
		if req.content.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "content must be non-empty.".to_string() });
		}

		let importance = req
			.importance
			.unwrap_or_else(|| importance::score(&req.content, req.memory_type, &req.responder_id));

		if !importance.is_finite() || !(0.0..=1.0).contains(&importance) {
			return Err(Error::InvalidRequest {
				message: format!("importance must be in the range 0.0-1.0, got {importance}."),
			});
		}

		let embedding = self.embed_one(&req.content).await?;
		let entry = MemoryEntry {
			id: Uuid::new_v4(),
			memory_type: req.memory_type,
			responder_id: req.responder_id,
			owner_id: req.owner_id,
			session_id: req.session_id,
			content: req.content,
			summary: req.summary,
			importance,
			embedding,
			category: req.category,
			metadata: req.metadata,
			created_at: OffsetDateTime::now_utc(),
			document_id: None,
			chunk_index: None,
		};

		entry.validate(self.vector_dim())?;

		self.store.upsert_entry(&entry).await?;

		tracing::debug!(
			entry_id = %entry.id,
			memory_type = %entry.memory_type,
			responder_id = %entry.responder_id,
			importance = entry.importance,
			"Memory entry stored."
		);

		Ok(entry.id)
	}

	/// Chunks a document and stores every chunk as a knowledge entry, all or nothing.
	///
	/// Returns the entry ids in chunk order.
	pub async fn write_document(&self, req: DocumentWrite) -> Result<Vec<Uuid>> {
		let chunks = atelier_chunking::split_text(
			&req.text,
			&ChunkingConfig {
				max_chars: self.cfg.chunking.chunk_chars as usize,
				overlap_chars: self.cfg.chunking.overlap_chars as usize,
			},
		);

		if chunks.is_empty() {
			return Err(Error::InvalidRequest {
				message: "document text must be non-empty.".to_string(),
			});
		}

		let texts = chunks.iter().map(|chunk| chunk.text.clone()).collect::<Vec<_>>();
		let vectors = self.embed_batch(&texts).await?;
		let now = OffsetDateTime::now_utc();
		let mut entries = Vec::with_capacity(chunks.len());

		for (chunk, embedding) in chunks.into_iter().zip(vectors) {
			let mut metadata = req.metadata.clone();

			metadata.insert("start_offset".to_string(), Value::from(chunk.start_offset));
			metadata.insert("end_offset".to_string(), Value::from(chunk.end_offset));

			let entry = MemoryEntry {
				id: Uuid::new_v4(),
				memory_type: MemoryType::Knowledge,
				responder_id: req.responder_id.clone(),
				owner_id: req.owner_id,
				session_id: None,
				importance: importance::score(
					&chunk.text,
					MemoryType::Knowledge,
					&req.responder_id,
				),
				content: chunk.text,
				summary: None,
				embedding,
				category: req.category.clone(),
				metadata,
				created_at: now,
				document_id: Some(req.document_id),
				chunk_index: Some(chunk.chunk_index),
			};

			entry.validate(self.vector_dim())?;
			entries.push(entry);
		}

		self.store.upsert_entries(&entries).await?;

		Ok(entries.into_iter().map(|entry| entry.id).collect())
	}

	/// Similarity search constrained by the query's filters.
	pub async fn read(&self, query: &ReadQuery) -> Result<Vec<ScoredEntry>> {
		if query.limit == 0 || query.query.trim().is_empty() {
			return Ok(Vec::new());
		}

		let vector = self
			.embed_one(&query.query)
			.await
			.map_err(|err| Error::RetrievalUnavailable { message: err.to_string() })?;
		let filter = EntryFilter {
			memory_type: query.memory_type,
			responder_id: query.responder_id.clone(),
			owner_id: query.owner_id,
			session_id: query.session_id.clone(),
			min_importance: query.min_importance,
		};

		self.store
			.search_entries(&vector, &filter, query.limit)
			.await
			.map_err(|err| Error::RetrievalUnavailable { message: err.to_string() })
	}

	/// Same as [`Self::read`], with retrieval failures logged and reported as no memory.
	pub async fn read_or_empty(&self, query: &ReadQuery) -> Vec<ScoredEntry> {
		match self.read(query).await {
			Ok(entries) => entries,
			Err(err) => {
				tracing::warn!(error = %err, query = %query.query, "Memory read degraded to empty.");

				Vec::new()
			},
		}
	}

	/// Newest entries of one session, without a semantic query.
	pub async fn recent_by_session(
		&self,
		session_id: &str,
		owner_id: Option<Uuid>,
		limit: u32,
	) -> Result<Vec<MemoryEntry>> {
		self.store
			.recent_entries(session_id, owner_id, limit)
			.await
			.map_err(|err| Error::RetrievalUnavailable { message: err.to_string() })
	}

	pub async fn get_profile(&self, owner_id: Uuid) -> Result<Option<ArtisanProfile>> {
		Ok(self.store.get_profile(owner_id).await?)
	}

	/// Writes a profile, re-embedding its summary.
	pub async fn update_profile(&self, update: ProfileUpdate) -> Result<ArtisanProfile> {
		if update.summary.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "profile summary must be non-empty.".to_string(),
			});
		}

		let embedding = self.embed_one(&update.summary).await?;
		let upsert = ProfileUpsert {
			owner_id: update.owner_id,
			profile_summary: update.summary,
			key_insights: update.key_insights,
			maturity_snapshot: update.maturity_snapshot,
			embedding,
			increment: update.increment,
			at: OffsetDateTime::now_utc(),
		};

		Ok(self.store.upsert_profile(&upsert).await?)
	}

	/// Merges `new_insights` into the owner's profile and counts one more interaction.
	///
	/// New keys win on conflict. A missing profile is created with a generic summary.
	pub async fn consolidate_profile(
		&self,
		owner_id: Uuid,
		new_insights: Map<String, Value>,
		interactions: u64,
	) -> Result<ArtisanProfile> {
		let existing = self.get_profile(owner_id).await?;
		let (summary, mut key_insights, maturity_snapshot) = match existing {
			Some(profile) => (profile.profile_summary, profile.key_insights, profile.maturity_snapshot),
			None => (String::new(), Map::new(), Map::new()),
		};
		let summary = if summary.trim().is_empty() {
			format!("Artisan with {interactions} interactions")
		} else {
			summary
		};

		key_insights.extend(new_insights);

		self.update_profile(ProfileUpdate {
			owner_id,
			summary,
			key_insights,
			maturity_snapshot,
			increment: true,
		})
		.await
	}

	/// Asks the generator for a short summary, falling back to truncation.
	///
	/// The result never exceeds `max_chars` characters.
	pub async fn generate_summary(&self, content: &str, max_chars: usize) -> String {
		let request = GenerationRequest {
			system_prompt: prompts::SUMMARY_SYSTEM_PROMPT.to_string(),
			messages: vec![ChatMessage::user(format!(
				"Resume en máximo {max_chars} caracteres:\n\n{content}"
			))],
			temperature: SUMMARY_TEMPERATURE,
			max_tokens: SUMMARY_MAX_TOKENS,
		};

		match self.generate(&request).await {
			Ok(summary) if !summary.trim().is_empty() =>
				text::truncate_with_ellipsis(summary.trim(), max_chars),
			Ok(_) => text::truncate_with_ellipsis(content, max_chars),
			Err(err) => {
				tracing::warn!(error = %err, "Summary generation failed. Falling back to truncation.");

				text::truncate_with_ellipsis(content, max_chars)
			},
		}
	}

	pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
		self.providers
			.generation
			.generate(&self.cfg.providers.llm, request)
			.await
			.map_err(|err| Error::GenerationUnavailable { message: err.to_string() })
	}

	/// Embeds every text, preserving order. Empty texts are rejected before any provider call.
	pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		if texts.iter().any(|text| text.trim().is_empty()) {
			return Err(Error::InvalidRequest {
				message: "embedding input must be non-empty.".to_string(),
			});
		}

		let vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, texts)
			.await
			.map_err(|err| Error::EmbeddingUnavailable { message: err.to_string() })?;

		if vectors.len() != texts.len() {
			return Err(Error::EmbeddingUnavailable {
				message: format!(
					"Embedding provider returned {} vectors for {} inputs.",
					vectors.len(),
					texts.len()
				),
			});
		}

		let dim = self.vector_dim();

		if let Some(bad) = vectors.iter().find(|vector| vector.len() != dim) {
			return Err(Error::EmbeddingUnavailable {
				message: format!("Embedding has {} dimensions, expected {dim}.", bad.len()),
			});
		}

		Ok(vectors)
	}

	async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
		let mut vectors = self.embed_batch(&[text.to_string()]).await?;

		vectors.pop().ok_or_else(|| Error::EmbeddingUnavailable {
			message: "Embedding provider returned no vectors.".to_string(),
		})
	}

	fn vector_dim(&self) -> usize {
		self.cfg.storage.vector_dim as usize
	}
}
