mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chunking, Config, EmbeddingProviderConfig, LlmProviderConfig, Memory, Postgres, Providers,
	Routing, Service, Storage, StorageBackend,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw =
		fs::read_to_string(path).map_err(|err| Error::Read { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config =
		toml::from_str(&raw).map_err(|err| Error::Parse { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.vector_dim == 0 {
		return Err(validation("storage.vector_dim must be greater than zero."));
	}
	if cfg.providers.embedding.dimensions != cfg.storage.vector_dim {
		return Err(validation("providers.embedding.dimensions must match storage.vector_dim."));
	}
	if cfg.storage.backend == StorageBackend::Postgres {
		let Some(postgres) = cfg.storage.postgres.as_ref() else {
			return Err(validation(
				"storage.postgres must be set when storage.backend is postgres.",
			));
		};

		if postgres.dsn.trim().is_empty() {
			return Err(validation("storage.postgres.dsn must be non-empty."));
		}
		if postgres.pool_max_conns == 0 {
			return Err(validation("storage.postgres.pool_max_conns must be greater than zero."));
		}
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm", &cfg.providers.llm.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.providers.llm.max_tokens == 0 {
		return Err(validation("providers.llm.max_tokens must be greater than zero."));
	}

	for (label, value) in [
		("memory.recent_turns_limit", cfg.memory.recent_turns_limit),
		("memory.profile_memory_limit", cfg.memory.profile_memory_limit),
		("memory.read_limit", cfg.memory.read_limit),
		("memory.profile_update_interval", cfg.memory.profile_update_interval),
		("memory.transcript_fallback_limit", cfg.memory.transcript_fallback_limit),
		("routing.input_preview_chars", cfg.routing.input_preview_chars),
		("routing.memory_preview_chars", cfg.routing.memory_preview_chars),
		("routing.max_tokens", cfg.routing.max_tokens),
		("routing.reasoning_max_chars", cfg.routing.reasoning_max_chars),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	// Truncated summaries end with "...", so anything shorter cannot hold text.
	if cfg.memory.summary_max_chars < 4 {
		return Err(validation("memory.summary_max_chars must be at least 4."));
	}

	for (label, value) in [
		("memory.importance_threshold", cfg.memory.importance_threshold),
		("routing.fallback_confidence", cfg.routing.fallback_confidence),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if !cfg.routing.temperature.is_finite() || cfg.routing.temperature < 0.0 {
		return Err(validation("routing.temperature must be a finite number zero or greater."));
	}
	if cfg.chunking.chunk_chars == 0 {
		return Err(validation("chunking.chunk_chars must be greater than zero."));
	}
	if cfg.chunking.overlap_chars >= cfg.chunking.chunk_chars {
		return Err(validation("chunking.overlap_chars must be less than chunking.chunk_chars."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for api_base in [&mut cfg.providers.embedding.api_base, &mut cfg.providers.llm.api_base] {
		let trimmed = api_base.trim().trim_end_matches('/').to_string();

		*api_base = trimmed;
	}

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}

fn validation(message: &str) -> Error {
	Error::Validation { message: message.to_string() }
}
