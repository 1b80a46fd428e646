//! The per-turn state machine: assemble context, route, dispatch, memorize, consolidate.

use std::{sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use atelier_domain::{MemoryType, text};
use atelier_providers::ChatMessage;

use crate::{
	ContextAssembler, ContextBundle, Error, InteractionCounter, MemoryService, ResponderOutput,
	ResponderSet, Result, RoutingDecision, WriteRequest, counter, routing,
};

const OWNER_CONTEXT_KEYS: [&str; 2] = ["user_id", "owner_id"];
const INSIGHT_QUERY_CHARS: usize = 100;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
	Start,
	Routing,
	Dispatched,
	Memorized,
	ProfileUpdate,
	Done,
	Error,
}
impl TurnPhase {
	/// `Error` is reachable from every non-terminal phase; `Done` and `Error` are terminal.
	pub fn can_advance_to(self, next: Self) -> bool {
		match (self, next) {
			(Self::Done | Self::Error, _) => false,
			(_, Self::Error) => true,
			(Self::Start, Self::Routing)
			| (Self::Routing, Self::Dispatched)
			| (Self::Dispatched, Self::Memorized)
			| (Self::Memorized, Self::ProfileUpdate)
			| (Self::Memorized, Self::Done)
			| (Self::ProfileUpdate, Self::Done) => true,
			_ => false,
		}
	}

	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Done | Self::Error)
	}
}

/// Everything one request threads through the state machine. Discarded after the turn.
#[derive(Clone, Debug)]
pub struct TurnState {
	pub session_id: String,
	pub input: String,
	pub owner_id: Option<Uuid>,
	pub context: Option<ContextBundle>,
	pub decision: Option<RoutingDecision>,
	pub output: Option<ResponderOutput>,
	pub transcript: Vec<ChatMessage>,
	pub started_at: Instant,
	pub elapsed_ms: Option<u64>,
	pub error: Option<String>,
	phase: TurnPhase,
}
impl TurnState {
	pub fn new(
		session_id: impl Into<String>,
		input: impl Into<String>,
		owner_id: Option<Uuid>,
		transcript: Vec<ChatMessage>,
	) -> Self {
		Self {
			session_id: session_id.into(),
			input: input.into(),
			owner_id,
			context: None,
			decision: None,
			output: None,
			transcript,
			started_at: Instant::now(),
			elapsed_ms: None,
			error: None,
			phase: TurnPhase::Start,
		}
	}

	pub fn phase(&self) -> TurnPhase {
		self.phase
	}

	pub fn advance(&mut self, next: TurnPhase) -> Result<()> {
		if !self.phase.can_advance_to(next) {
			return Err(Error::InvalidRequest {
				message: format!("Illegal turn transition from {:?} to {next:?}.", self.phase),
			});
		}

		tracing::trace!(session_id = %self.session_id, from = ?self.phase, to = ?next, "Turn phase advanced.");

		self.phase = next;

		Ok(())
	}

	fn elapsed_now(&self) -> u64 {
		u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TurnRequest {
	pub session_id: String,
	pub input: String,
	#[serde(default)]
	pub owner_id: Option<String>,
	#[serde(default)]
	pub context: Map<String, Value>,
	#[serde(default)]
	pub metadata: Map<String, Value>,
	/// Utterances of this session the caller already holds, oldest first.
	#[serde(default)]
	pub history: Vec<ChatMessage>,
}
impl TurnRequest {
	pub fn new(session_id: impl Into<String>, input: impl Into<String>) -> Self {
		Self { session_id: session_id.into(), input: input.into(), ..Default::default() }
	}

	/// The canonical owner id: the explicit field first, then `user_id`/`owner_id` in the context.
	///
	/// Values that are not UUIDs are ignored.
	pub fn resolve_owner_id(&self) -> Option<Uuid> {
		let raw = self
			.owner_id
			.as_deref()
			.into_iter()
			.chain(
				OWNER_CONTEXT_KEYS
					.iter()
					.filter_map(|key| self.context.get(*key).and_then(Value::as_str)),
			)
			.map(str::trim)
			.find(|value| !value.is_empty())?;

		match Uuid::parse_str(raw) {
			Ok(owner_id) => Some(owner_id),
			Err(err) => {
				tracing::warn!(
					error = %err,
					session_id = %self.session_id,
					owner_id = raw,
					"Ignoring owner id that is not a UUID."
				);

				None
			},
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct TurnOutcome {
	pub session_id: String,
	pub owner_id: Option<Uuid>,
	pub decision: RoutingDecision,
	pub output: ResponderOutput,
	pub elapsed_ms: u64,
	pub phase: TurnPhase,
	/// Routing failure that was absorbed by the fallback decision.
	pub recovered_error: Option<String>,
	pub transcript: Vec<ChatMessage>,
	pub context_degraded: Vec<String>,
	pub memory_id: Option<Uuid>,
	pub profile_consolidated: bool,
}

pub struct Supervisor {
	memory: Arc<MemoryService>,
	assembler: ContextAssembler,
	responders: ResponderSet,
	counter: InteractionCounter,
}
impl Supervisor {
	pub fn new(memory: Arc<MemoryService>) -> Self {
		let responders = ResponderSet::standard(memory.clone());

		Self::with_responders(memory, responders)
	}

	pub fn with_responders(memory: Arc<MemoryService>, responders: ResponderSet) -> Self {
		Self {
			assembler: ContextAssembler::new(memory.clone()),
			memory,
			responders,
			counter: InteractionCounter::new(),
		}
	}

	pub fn memory(&self) -> &Arc<MemoryService> {
		&self.memory
	}

	pub fn counter(&self) -> &InteractionCounter {
		&self.counter
	}

	/// Runs one turn to completion.
	///
	/// Only a responder failure reaches the caller, as [`Error::ProcessingFailed`]. Context,
	/// routing, memory and profile failures degrade and are logged.
	pub async fn process(&self, request: TurnRequest) -> Result<TurnOutcome> {
		if request.session_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "session_id must be non-empty.".to_string() });
		}
		if request.input.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "input must be non-empty.".to_string() });
		}

		let owner_id = request.resolve_owner_id();
		let mut state =
			TurnState::new(&request.session_id, &request.input, owner_id, request.history.clone());
		let bundle = self.assembler.assemble(&state.session_id, owner_id, &state.transcript).await;

		state.advance(TurnPhase::Routing)?;

		let (decision, routing_error) = routing::decide(&self.memory, &state.input, &bundle).await;

		state.error = routing_error.map(|err| err.to_string());

		let responder_id = decision.selected_responder.as_str();
		let Some(responder) = self.responders.get(decision.selected_responder) else {
			state.advance(TurnPhase::Error)?;

			return Err(Error::ProcessingFailed {
				responder: responder_id.to_string(),
				message: "No responder is registered for this id.".to_string(),
			});
		};

		state.advance(TurnPhase::Dispatched)?;

		let output = match responder.process(&state.input, &bundle, &request.metadata).await {
			Ok(output) => output,
			Err(err) => {
				state.advance(TurnPhase::Error)?;

				tracing::warn!(
					error = %err,
					session_id = %state.session_id,
					responder = responder_id,
					"Responder failed."
				);

				return Err(Error::ProcessingFailed {
					responder: responder_id.to_string(),
					message: err.to_string(),
				});
			},
		};

		state.transcript.push(ChatMessage::user(state.input.clone()));
		state.transcript.push(ChatMessage::assistant(output.answer.clone()));
		state.elapsed_ms = Some(state.elapsed_now());
		state.context = Some(bundle);
		state.decision = Some(decision.clone());
		state.output = Some(output.clone());

		let memory_id = self.memorize(&state, &decision, &output, &request.metadata).await;

		state.advance(TurnPhase::Memorized)?;

		let mut profile_consolidated = false;

		if let Some(owner_id) = owner_id {
			let count = self.counter.record(owner_id);

			if counter::is_consolidation_due(count, self.memory.cfg.memory.profile_update_interval) {
				state.advance(TurnPhase::ProfileUpdate)?;

				profile_consolidated = self.consolidate(owner_id, &state, &decision, count).await;
			}
		}

		state.advance(TurnPhase::Done)?;

		let elapsed_ms = state.elapsed_now();

		tracing::info!(
			session_id = %state.session_id,
			responder = responder_id,
			confidence = decision.confidence,
			elapsed_ms,
			"Turn completed."
		);

		Ok(TurnOutcome {
			session_id: state.session_id,
			owner_id,
			decision,
			output,
			elapsed_ms,
			phase: state.phase,
			recovered_error: state.error,
			transcript: state.transcript,
			context_degraded: state.context.map(|bundle| bundle.degraded).unwrap_or_default(),
			memory_id,
			profile_consolidated,
		})
	}

	/// Stores the turn as a conversational memory. Failures are logged and swallowed.
	async fn memorize(
		&self,
		state: &TurnState,
		decision: &RoutingDecision,
		output: &ResponderOutput,
		request_metadata: &Map<String, Value>,
	) -> Option<Uuid> {
		let responder_id = decision.selected_responder.as_str();
		let mut request = WriteRequest::new(
			MemoryType::Conversational,
			responder_id,
			format!("Usuario: {}\nRespuesta ({responder_id}): {}", state.input, output.answer),
			responder_id,
		);

		request.owner_id = state.owner_id;
		request.session_id = Some(state.session_id.clone());
		request.metadata.insert("routing".to_string(), serde_json::json!(decision));
		request.metadata.insert("user_input".to_string(), Value::String(state.input.clone()));
		request.metadata.insert("answer".to_string(), Value::String(output.answer.clone()));
		request
			.metadata
			.insert("execution_time_ms".to_string(), Value::from(state.elapsed_ms.unwrap_or(0)));

		if !request_metadata.is_empty() {
			request.metadata.insert("request".to_string(), Value::Object(request_metadata.clone()));
		}

		match self.memory.write(request).await {
			Ok(id) => Some(id),
			Err(err) => {
				tracing::warn!(
					error = %err,
					session_id = %state.session_id,
					"Failed to store interaction memory."
				);

				None
			},
		}
	}

	async fn consolidate(
		&self,
		owner_id: Uuid,
		state: &TurnState,
		decision: &RoutingDecision,
		count: u64,
	) -> bool {
		let now = OffsetDateTime::now_utc();
		let timestamp = now.format(&Rfc3339).unwrap_or_else(|_| now.unix_timestamp().to_string());
		let responder_id = decision.selected_responder.as_str();
		let mut insights = Map::new();

		insights.insert("last_responder".to_string(), Value::from(responder_id));
		insights.insert("last_query_category".to_string(), Value::from(responder_id));
		insights.insert(
			"recent_interaction".to_string(),
			serde_json::json!({
				"query": text::prefix_chars(&state.input, INSIGHT_QUERY_CHARS),
				"timestamp": timestamp,
			}),
		);

		match self.memory.consolidate_profile(owner_id, insights, count).await {
			Ok(profile) => {
				tracing::info!(
					owner_id = %owner_id,
					interaction_count = profile.interaction_count,
					"Artisan profile consolidated."
				);

				true
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					owner_id = %owner_id,
					"Profile consolidation failed. Will retry at the next interval."
				);

				false
			},
		}
	}
}
