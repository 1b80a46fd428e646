use uuid::Uuid;

use atelier_domain::MemoryType;
use atelier_service::{Error, ReadQuery, TurnPhase, TurnRequest, WriteRequest};

use super::{ADVISOR_ANSWER, Harness, ScriptedGenerator};

#[tokio::test]
async fn failing_embedder_degrades_reads_and_the_turn_completes() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("legal"));
	let owner = Uuid::new_v4();
	let mut seed = WriteRequest::new(
		MemoryType::Conversational,
		"legal",
		"Registrar la marca cuesta alrededor de un salario mínimo.",
		"legal",
	);

	seed.owner_id = Some(owner);

	harness.memory.write(seed).await.expect("Failed to seed memory.");
	harness.embedding.set_failing(true);

	let query = ReadQuery::new("registro de marca", 5);
	let err = harness.memory.read(&query).await.expect_err("Expected retrieval failure.");

	assert!(matches!(err, Error::RetrievalUnavailable { .. }), "Unexpected error: {err}");
	assert!(harness.memory.read_or_empty(&query).await.is_empty());

	let mut request = TurnRequest::new("d-1", "¿Cuánto cuesta registrar mi marca?");

	request.owner_id = Some(owner.to_string());

	let outcome = harness.supervisor().process(request).await.expect("Turn must complete.");

	assert_eq!(outcome.phase, TurnPhase::Done);
	assert_eq!(outcome.output.answer, ADVISOR_ANSWER);
	assert_eq!(outcome.output.extra.get("memories_used"), Some(&serde_json::Value::from(0)));
	assert!(outcome.memory_id.is_none());
	assert_eq!(harness.store.entry_count(), 1);
}

#[tokio::test]
async fn profile_memory_failure_is_reported_as_degraded() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("faq"));
	let supervisor = harness.supervisor();
	let owner = Uuid::new_v4();
	let mut onboarding = TurnRequest::new("d-2", super::onboarding_payload("Joyería"));

	onboarding.owner_id = Some(owner.to_string());

	supervisor.process(onboarding).await.expect("Onboarding turn must complete.");
	harness.embedding.set_failing(true);

	let mut question = TurnRequest::new("d-3", "¿Qué hago ahora?");

	question.owner_id = Some(owner.to_string());

	let outcome = supervisor.process(question).await.expect("Turn must complete.");

	assert_eq!(outcome.phase, TurnPhase::Done);
	assert_eq!(outcome.context_degraded, vec!["profile_memories".to_string()]);
}
