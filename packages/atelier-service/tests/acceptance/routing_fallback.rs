use atelier_domain::ResponderKind;
use atelier_service::{TurnPhase, TurnRequest, prompts};

use super::{ADVISOR_ANSWER, Harness, ScriptedGenerator};

#[tokio::test]
async fn malformed_routing_output_falls_back_to_faq_and_completes() {
	let harness = Harness::new(
		super::test_config(5),
		ScriptedGenerator::routing_to("legal").with_routing_reply("Creo que legal, sin JSON."),
	);
	let outcome = harness
		.supervisor()
		.process(TurnRequest::new("r-1", "¿Cómo formalizo mi taller?"))
		.await
		.expect("Turn must complete.");

	assert_eq!(outcome.decision.selected_responder, ResponderKind::Faq);
	assert!((outcome.decision.confidence - 0.3).abs() < f32::EPSILON);
	assert_eq!(outcome.phase, TurnPhase::Done);
	assert_eq!(outcome.output.answer, ADVISOR_ANSWER);
	assert!(
		outcome
			.recovered_error
			.as_deref()
			.is_some_and(|err| err.starts_with("Malformed routing decision")),
		"Unexpected recovered error: {:?}",
		outcome.recovered_error
	);
}

#[tokio::test]
async fn unknown_responder_falls_back_to_faq() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("marketing"));
	let outcome = harness
		.supervisor()
		.process(TurnRequest::new("r-2", "Quiero vender más"))
		.await
		.expect("Turn must complete.");

	assert_eq!(outcome.decision.selected_responder, ResponderKind::Faq);
	assert_eq!(outcome.phase, TurnPhase::Done);
}

#[tokio::test]
async fn model_choice_is_honoured_when_well_formed() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("presencia_digital"));
	let outcome = harness
		.supervisor()
		.process(TurnRequest::new("r-3", "¿Cómo mejoro mis fotos para Instagram?"))
		.await
		.expect("Turn must complete.");

	assert_eq!(outcome.decision.selected_responder, ResponderKind::DigitalPresence);
	assert!(outcome.recovered_error.is_none());

	let advisor = harness.generator.advisor_requests();

	assert_eq!(advisor.len(), 1);
	assert_eq!(
		advisor[0].system_prompt.lines().next(),
		prompts::advisor_system_prompt(ResponderKind::DigitalPresence).lines().next()
	);
}

#[tokio::test]
async fn onboarding_payload_bypasses_the_model() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("pricing"));
	let outcome = harness
		.supervisor()
		.process(TurnRequest::new("r-4", super::onboarding_payload("Cerámica")))
		.await
		.expect("Turn must complete.");

	assert_eq!(outcome.decision.selected_responder, ResponderKind::Onboarding);
	assert_eq!(outcome.decision.confidence, 1.0);
	assert!(harness.generator.requests_with_prompt(prompts::SUPERVISOR_SYSTEM_PROMPT).is_empty());
}

#[tokio::test]
async fn model_choosing_onboarding_for_free_text_falls_back_to_faq() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("onboarding"));
	let mut request = TurnRequest::new("r-5", "Quiero empezar el diagnóstico de mi taller");

	request.owner_id = Some(uuid::Uuid::new_v4().to_string());

	let outcome = harness.supervisor().process(request).await.expect("Turn must complete.");

	assert_eq!(outcome.decision.selected_responder, ResponderKind::Faq);
	assert_eq!(outcome.phase, TurnPhase::Done);
	assert_eq!(outcome.output.answer, ADVISOR_ANSWER);
	assert!(
		outcome
			.recovered_error
			.as_deref()
			.is_some_and(|err| err.starts_with("Malformed routing decision")),
		"Unexpected recovered error: {:?}",
		outcome.recovered_error
	);
	assert!(harness.generator.requests_with_prompt(prompts::ONBOARDING_SYSTEM_PROMPT).is_empty());
}
