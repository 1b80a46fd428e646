use std::sync::Arc;

use color_eyre::eyre;

use atelier_config::{Config, StorageBackend};
use atelier_service::{MemoryService, Supervisor};
use atelier_storage::{MemoryStore, db::Db, in_memory::InMemoryStore};

pub struct AppState {
	pub memory: Arc<MemoryService>,
	pub supervisor: Supervisor,
}
impl AppState {
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let store = open_store(&config).await?;
		let memory = Arc::new(MemoryService::new(config, store));
		let supervisor = Supervisor::new(memory.clone());

		Ok(Self { memory, supervisor })
	}
}

pub async fn open_store(config: &Config) -> color_eyre::Result<Arc<dyn MemoryStore>> {
	match config.storage.backend {
		StorageBackend::Postgres => {
			let Some(postgres) = config.storage.postgres.as_ref() else {
				return Err(eyre::eyre!("storage.postgres must be set for the postgres backend."));
			};
			let db = Db::connect(postgres).await?;

			db.ensure_schema(config.storage.vector_dim).await?;

			Ok(Arc::new(db))
		},
		StorageBackend::InMemory => {
			tracing::warn!("Using the in-memory store. Nothing survives this process.");

			Ok(Arc::new(InMemoryStore::new()))
		},
	}
}
