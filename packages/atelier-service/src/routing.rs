//! Responder selection: prompt construction, defensive decision parsing, and fallbacks.

use serde::Serialize;
use serde_json::Value;

use atelier_config::Routing;
use atelier_domain::{ResponderKind, json, onboarding, text};
use atelier_providers::{ChatMessage, GenerationRequest};

use crate::{ContextBundle, Error, MemoryService, Result, prompts};

/// Confidence assumed when the model omits it.
const DEFAULT_CONFIDENCE: f64 = 0.5;
const FOLLOW_UP_MAX_CHARS: usize = 60;
const REFERENTIAL_WORDS: [&str; 7] = ["eso", "esto", "ese", "esa", "aquello", "anterior", "lo"];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoutingDecision {
	pub selected_responder: ResponderKind,
	pub confidence: f32,
	pub reasoning: String,
}
impl RoutingDecision {
	pub fn fallback(confidence: f32, reasoning: impl Into<String>) -> Self {
		Self { selected_responder: ResponderKind::Faq, confidence, reasoning: reasoning.into() }
	}

	pub fn onboarding() -> Self {
		Self {
			selected_responder: ResponderKind::Onboarding,
			confidence: 1.0,
			reasoning: "Input holds the complete onboarding questionnaire.".to_string(),
		}
	}
}

/// Picks a responder for `input`.
///
/// Onboarding payloads always route to onboarding. Generation or parse failures fall back to the
/// catch-all responder and are returned alongside the decision.
pub async fn decide(
	memory: &MemoryService,
	input: &str,
	bundle: &ContextBundle,
) -> (RoutingDecision, Option<Error>) {
	if onboarding::is_onboarding_payload(input) {
		return (RoutingDecision::onboarding(), None);
	}

	let cfg = &memory.cfg.routing;
	let request = GenerationRequest {
		system_prompt: prompts::SUPERVISOR_SYSTEM_PROMPT.to_string(),
		messages: vec![ChatMessage::user(build_routing_prompt(input, bundle, cfg))],
		temperature: cfg.temperature,
		max_tokens: cfg.max_tokens,
	};
	let parsed = match memory.generate(&request).await {
		Ok(completion) => parse_routing_decision(&completion, cfg.reasoning_max_chars as usize)
			.and_then(reject_free_text_onboarding),
		Err(err) => Err(err),
	};

	match parsed {
		Ok(decision) => (decision, None),
		Err(err) => {
			tracing::warn!(
				error = %err,
				session_id = %bundle.session_id,
				"Routing decision unavailable. Falling back to faq."
			);

			let decision =
				RoutingDecision::fallback(cfg.fallback_confidence, format!("Routing fallback: {err}"));

			(decision, Some(err))
		},
	}
}

pub fn build_routing_prompt(input: &str, bundle: &ContextBundle, cfg: &Routing) -> String {
	let mut prompt = format!(
		"Analiza la siguiente solicitud del usuario y determina qué asesor debe procesarla.\n\nSolicitud del usuario: {}",
		preview(input, cfg.input_preview_chars as usize)
	);

	if let Some(profile) = bundle.profile.as_ref() {
		prompt.push_str(&format!(
			"\n\nPerfil del artesano:\n{}\nInteracciones previas: {}",
			profile.summary, profile.interaction_count
		));
	}

	let previews = bundle
		.recent_turns
		.iter()
		.take(cfg.memory_preview_count as usize)
		.collect::<Vec<_>>();

	if !previews.is_empty() {
		prompt.push_str(&format!(
			"\n\nContexto de la conversación actual (últimas {} interacciones):",
			previews.len()
		));

		for (idx, turn) in previews.iter().enumerate() {
			prompt.push_str(&format!(
				"\n{}. {}",
				idx + 1,
				text::prefix_chars(&turn.content, cfg.memory_preview_chars as usize)
			));
		}

		if is_follow_up(input) {
			prompt.push_str(
				"\n\nIMPORTANTE: la solicitud parece una pregunta de seguimiento. Usa el contexto anterior para entender a qué se refiere y elige el mismo asesor si sigue el mismo tema.",
			);
		}
	}

	if bundle.owner_id.is_some() && !bundle.has_maturity_snapshot() {
		prompt.push_str(
			"\n\nNOTA: este artesano aún no completó el diagnóstico de onboarding (16 preguntas, Q1-Q16). Si pregunta por el diagnóstico, elige faq para explicarle cómo completarlo.",
		);
	}

	prompt.push_str("\n\nAsesores disponibles:");

	for kind in ResponderKind::ALL.into_iter().filter(|kind| *kind != ResponderKind::Onboarding) {
		prompt.push_str(&format!("\n- {}: {}", kind.as_str(), kind.description()));
	}

	prompt.push_str("\n\nDevuelve tu decisión en formato JSON.");

	prompt
}

/// Validates the model's JSON decision.
///
/// Accepts `selected_agent` as an alias, clamps confidence to `[0, 1]`, and rejects unknown
/// responders or non-numeric confidence.
pub fn parse_routing_decision(text: &str, reasoning_max_chars: usize) -> Result<RoutingDecision> {
	let Some(map) = json::parse_lenient_object(text) else {
		return Err(malformed("completion holds no JSON object."));
	};
	let selected = map
		.get("selected_responder")
		.or_else(|| map.get("selected_agent"))
		.and_then(Value::as_str)
		.ok_or_else(|| malformed("selected_responder is missing."))?;
	let selected_responder =
		selected.parse::<ResponderKind>().map_err(|err| malformed(&err.to_string()))?;
	let confidence = match map.get("confidence") {
		None | Some(Value::Null) => DEFAULT_CONFIDENCE,
		Some(Value::Number(number)) =>
			number.as_f64().ok_or_else(|| malformed("confidence must be a number."))?,
		Some(Value::String(raw)) =>
			raw.trim().parse::<f64>().map_err(|_| malformed("confidence must be a number."))?,
		Some(_) => return Err(malformed("confidence must be a number.")),
	};

	if !confidence.is_finite() {
		return Err(malformed("confidence must be finite."));
	}

	let reasoning = map
		.get("reasoning")
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|reasoning| !reasoning.is_empty())
		.unwrap_or("No reasoning provided.");

	Ok(RoutingDecision {
		selected_responder,
		confidence: confidence.clamp(0.0, 1.0) as f32,
		reasoning: text::truncate_with_ellipsis(reasoning, reasoning_max_chars),
	})
}

/// Short inputs that lean on earlier turns, such as "¿y eso?".
pub fn is_follow_up(input: &str) -> bool {
	let lowered = input.trim().to_lowercase();

	if lowered.is_empty() || lowered.chars().count() > FOLLOW_UP_MAX_CHARS {
		return false;
	}

	let stripped = lowered.trim_start_matches(['¿', '¡']);

	stripped.starts_with("y ")
		|| lowered
			.split(|c: char| !c.is_alphanumeric())
			.any(|word| REFERENTIAL_WORDS.contains(&word))
}

fn preview(input: &str, max_chars: usize) -> String {
	if input.chars().count() > max_chars {
		format!("{}...", text::prefix_chars(input, max_chars))
	} else {
		input.to_string()
	}
}

/// Onboarding only accepts the questionnaire payload, which never reaches the model.
fn reject_free_text_onboarding(decision: RoutingDecision) -> Result<RoutingDecision> {
	if decision.selected_responder == ResponderKind::Onboarding {
		return Err(malformed("onboarding requires the complete questionnaire payload."));
	}

	Ok(decision)
}

fn malformed(message: &str) -> Error {
	Error::MalformedRoutingDecision { message: message.to_string() }
}
