use uuid::Uuid;

use atelier_domain::MemoryType;
use atelier_service::{
	ChatMessage, ContextAssembler, ReadQuery, TurnRequest, WriteRequest, prompts,
};

use super::{ADVISOR_ANSWER, Harness, ScriptedGenerator};

const FIRST_INPUT: &str = "¿Cuánto cobro por una mochila wayuu grande?";

#[tokio::test]
async fn follow_up_turn_sees_the_previous_turn() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("pricing"));
	let supervisor = harness.supervisor();
	let owner = Uuid::new_v4();
	let mut first = TurnRequest::new("h-1", FIRST_INPUT);

	first.owner_id = Some(owner.to_string());

	let outcome = supervisor.process(first).await.expect("First turn must complete.");

	assert!(outcome.memory_id.is_some());

	let bundle = ContextAssembler::new(harness.memory.clone()).assemble("h-1", Some(owner), &[]).await;

	assert_eq!(
		bundle.conversation_history,
		vec![ChatMessage::user(FIRST_INPUT), ChatMessage::assistant(ADVISOR_ANSWER)]
	);
	assert_eq!(bundle.recent_turns[0].role, "pricing");
	assert!(bundle.recent_turns[0].content.starts_with(&format!("Usuario: {FIRST_INPUT}")));

	let mut second = TurnRequest::new("h-1", "¿y eso?");

	second.owner_id = Some(owner.to_string());

	supervisor.process(second).await.expect("Second turn must complete.");

	let advisor = harness.generator.advisor_requests();
	let last = advisor.last().expect("Expected advisor requests.");

	assert_eq!(last.messages.first(), Some(&ChatMessage::user(FIRST_INPUT)));
	assert_eq!(last.messages.last(), Some(&ChatMessage::user("¿y eso?")));

	let routing = harness.generator.requests_with_prompt(prompts::SUPERVISOR_SYSTEM_PROMPT);
	let prompt = &routing.last().expect("Expected routing requests.").messages[0].content;

	assert!(prompt.contains("pregunta de seguimiento"));
	assert!(prompt.contains("Usuario: ¿Cuánto cobro"));
}

#[tokio::test]
async fn pricing_turn_stores_a_strategy_memory() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("pricing"));
	let owner = Uuid::new_v4();
	let mut request = TurnRequest::new("h-2", FIRST_INPUT);

	request.owner_id = Some(owner.to_string());

	let outcome = harness.supervisor().process(request).await.expect("Turn must complete.");

	assert_eq!(outcome.output.extra.get("strategy_stored"), Some(&serde_json::Value::Bool(true)));

	let mut query = ReadQuery::new("mochila wayuu", 5);

	query.memory_type = Some(MemoryType::Strategy);
	query.owner_id = Some(owner);

	let hits = harness.memory.read(&query).await.expect("Failed to read strategies.");

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].entry.importance, 0.85);
	assert_eq!(hits[0].entry.summary.as_deref(), Some("Estrategia de margen del 30%."));
}

#[tokio::test]
async fn first_turn_falls_back_to_the_transcript() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("faq"));
	let transcript = vec![ChatMessage::user("Hola"), ChatMessage::assistant("¡Bienvenida!")];
	let bundle = ContextAssembler::new(harness.memory.clone()).assemble("h-3", None, &transcript).await;

	assert_eq!(bundle.conversation_history, transcript);
	assert_eq!(bundle.recent_turns.len(), 2);
	assert_eq!(bundle.recent_turns[0].role, "transcript");
	assert_eq!(bundle.recent_turns[0].content, "assistant: ¡Bienvenida!");
}

#[tokio::test]
async fn strategy_summary_respects_configured_length() {
	let mut cfg = super::test_config(5);

	cfg.memory.summary_max_chars = 12;

	let harness = Harness::new(cfg, ScriptedGenerator::routing_to("pricing"));
	let owner = Uuid::new_v4();
	let mut request = TurnRequest::new("h-4", FIRST_INPUT);

	request.owner_id = Some(owner.to_string());

	harness.supervisor().process(request).await.expect("Turn must complete.");

	let mut query = ReadQuery::new("mochila wayuu", 5);

	query.memory_type = Some(MemoryType::Strategy);
	query.owner_id = Some(owner);

	let hits = harness.memory.read(&query).await.expect("Failed to read strategies.");

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].entry.summary.as_deref(), Some("Estrategi..."));
}

#[tokio::test]
async fn session_without_conversational_entries_uses_the_transcript() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("faq"));
	let mut profile_memory = WriteRequest::new(
		MemoryType::Profile,
		"onboarding",
		"Perfil de Onboarding:\nTipo de artesanía: Filigrana",
		"onboarding",
	);

	profile_memory.session_id = Some("h-5".to_string());

	harness.memory.write(profile_memory).await.expect("Failed to store profile memory.");

	let transcript = vec![ChatMessage::user("¿Qué plata uso?"), ChatMessage::assistant("Plata 950.")];
	let bundle = ContextAssembler::new(harness.memory.clone()).assemble("h-5", None, &transcript).await;

	assert_eq!(bundle.recent_turns.len(), 1);
	assert_eq!(bundle.recent_turns[0].role, "onboarding");
	assert_eq!(bundle.conversation_history, transcript);
}
