pub mod context;
pub mod counter;
pub mod memory;
pub mod prompts;
pub mod responders;
pub mod routing;
pub mod supervisor;

mod error;

use std::sync::Arc;

pub use atelier_providers::{ChatMessage, ChatRole, GenerationRequest};
pub use atelier_storage::BoxFuture;
pub use context::{ContextAssembler, ContextBundle, ProfileView, RecentTurn};
pub use counter::InteractionCounter;
pub use error::{Error, Result};
pub use memory::{DocumentWrite, MemoryService, ProfileUpdate, ReadQuery, WriteRequest};
pub use responders::{Responder, ResponderOutput, ResponderSet};
pub use routing::RoutingDecision;
pub use supervisor::{Supervisor, TurnOutcome, TurnPhase, TurnRequest, TurnState};

use atelier_config::{EmbeddingProviderConfig, LlmProviderConfig};
use atelier_providers::{embedding, generation};

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a GenerationRequest,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider }
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}
impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a GenerationRequest,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generation::generate(cfg, request))
	}
}
