use std::sync::Arc;

use serde_json::{Map, Value};

use atelier_domain::{MemoryType, ResponderKind, text};
use atelier_providers::{ChatMessage, GenerationRequest};
use atelier_storage::models::ScoredEntry;

use crate::{
	BoxFuture, ContextBundle, MemoryService, ReadQuery, Responder, ResponderOutput, Result,
	WriteRequest, prompts,
};

const HISTORY_MESSAGES: usize = 5;
const ADVISOR_CONFIDENCE: f32 = 0.8;
const MEMORY_PREVIEW_CHARS: usize = 300;
const STRATEGY_IMPORTANCE: f32 = 0.85;
const STRATEGY_QUERY_CHARS: usize = 100;

/// Templated responder backed by one generation call over the assembled context.
pub struct AdvisorResponder {
	kind: ResponderKind,
	memory: Arc<MemoryService>,
}
impl AdvisorResponder {
	pub fn new(kind: ResponderKind, memory: Arc<MemoryService>) -> Self {
		Self { kind, memory }
	}

	async fn run(&self, input: &str, context: &ContextBundle) -> Result<ResponderOutput> {
		let memories = self.relevant_memories(input, context).await;
		let request = GenerationRequest {
			system_prompt: self.system_prompt(context, &memories),
			messages: history_with_input(&context.conversation_history, input),
			temperature: self.memory.cfg.providers.llm.temperature,
			max_tokens: self.memory.cfg.providers.llm.max_tokens,
		};
		let answer = self.memory.generate(&request).await?;
		let mut extra = Map::new();

		extra.insert("memories_used".to_string(), Value::from(memories.len()));

		if self.kind == ResponderKind::Pricing {
			let stored = self.store_strategy(input, &answer, context).await;

			extra.insert("strategy_stored".to_string(), Value::Bool(stored));
		}

		Ok(ResponderOutput {
			answer,
			sources: memories.iter().map(|hit| format!("memory:{}", hit.entry.id)).collect(),
			confidence: ADVISOR_CONFIDENCE,
			extra,
		})
	}

	/// This responder's own past memories for the owner, or the session when there is no owner.
	async fn relevant_memories(&self, input: &str, context: &ContextBundle) -> Vec<ScoredEntry> {
		let memory_cfg = &self.memory.cfg.memory;
		let mut query = ReadQuery::new(input, memory_cfg.read_limit);

		query.responder_id = Some(self.kind.as_str().to_string());
		query.min_importance = memory_cfg.importance_threshold;

		match context.owner_id {
			Some(owner_id) => query.owner_id = Some(owner_id),
			None => query.session_id = Some(context.session_id.clone()),
		}

		self.memory.read_or_empty(&query).await
	}

	fn system_prompt(&self, context: &ContextBundle, memories: &[ScoredEntry]) -> String {
		let memory_lines = if memories.is_empty() {
			"Ninguna.".to_string()
		} else {
			memories
				.iter()
				.map(|hit| {
					format!("- {}", text::truncate_with_ellipsis(&hit.entry.content, MEMORY_PREVIEW_CHARS))
				})
				.collect::<Vec<_>>()
				.join("\n")
		};

		format!(
			"{}\n\nContexto del artesano:\n{}\n\nMemorias relevantes:\n{memory_lines}",
			prompts::advisor_system_prompt(self.kind),
			context.profile_digest(),
		)
	}

	async fn store_strategy(&self, input: &str, answer: &str, context: &ContextBundle) -> bool {
		let content = format!("Consulta de precios: {input}\n\nEstrategia recomendada:\n{answer}");
		let summary = self
			.memory
			.generate_summary(answer, self.memory.cfg.memory.summary_max_chars as usize)
			.await;
		let mut request = WriteRequest::new(
			MemoryType::Strategy,
			ResponderKind::Pricing.as_str(),
			content,
			ResponderKind::Pricing.as_str(),
		);

		request.owner_id = context.owner_id;
		request.session_id = Some(context.session_id.clone());
		request.summary = Some(summary);
		request.importance = Some(STRATEGY_IMPORTANCE);
		request.metadata.insert(
			"query".to_string(),
			Value::String(text::prefix_chars(input, STRATEGY_QUERY_CHARS)),
		);

		match self.memory.write(request).await {
			Ok(_) => true,
			Err(err) => {
				tracing::warn!(
					error = %err,
					session_id = %context.session_id,
					"Failed to store pricing strategy memory."
				);

				false
			},
		}
	}
}
impl Responder for AdvisorResponder {
	fn kind(&self) -> ResponderKind {
		self.kind
	}

	fn process<'a>(
		&'a self,
		input: &'a str,
		context: &'a ContextBundle,
		_metadata: &'a Map<String, Value>,
	) -> BoxFuture<'a, Result<ResponderOutput>> {
		Box::pin(self.run(input, context))
	}
}

fn history_with_input(history: &[ChatMessage], input: &str) -> Vec<ChatMessage> {
	let start = history.len().saturating_sub(HISTORY_MESSAGES);
	let mut messages = history[start..].to_vec();

	messages.push(ChatMessage::user(input));

	messages
}
