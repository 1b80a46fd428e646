use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub memory: Memory,
	#[serde(default)]
	pub routing: Routing,
	#[serde(default)]
	pub chunking: Chunking,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
	Postgres,
	InMemory,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub backend: StorageBackend,
	pub vector_dim: u32,
	pub postgres: Option<Postgres>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Memory {
	/// Floor applied when responders read their own past memories.
	pub importance_threshold: f32,
	pub recent_turns_limit: u32,
	pub profile_memory_limit: u32,
	pub read_limit: u32,
	/// Consolidate a profile every N interactions of the same owner.
	pub profile_update_interval: u32,
	pub summary_max_chars: u32,
	pub transcript_fallback_limit: u32,
}
impl Default for Memory {
	fn default() -> Self {
		Self {
			importance_threshold: 0.3,
			recent_turns_limit: 5,
			profile_memory_limit: 3,
			read_limit: 10,
			profile_update_interval: 5,
			summary_max_chars: 150,
			transcript_fallback_limit: 10,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Routing {
	pub input_preview_chars: u32,
	pub memory_preview_chars: u32,
	pub memory_preview_count: u32,
	pub fallback_confidence: f32,
	pub temperature: f32,
	pub max_tokens: u32,
	pub reasoning_max_chars: u32,
}
impl Default for Routing {
	fn default() -> Self {
		Self {
			input_preview_chars: 500,
			memory_preview_chars: 200,
			memory_preview_count: 3,
			fallback_confidence: 0.3,
			temperature: 0.3,
			max_tokens: 500,
			reasoning_max_chars: 500,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Chunking {
	pub chunk_chars: u32,
	pub overlap_chars: u32,
}
impl Default for Chunking {
	fn default() -> Self {
		Self { chunk_chars: 1_000, overlap_chars: 200 }
	}
}
