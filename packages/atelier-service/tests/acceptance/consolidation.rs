use serde_json::Value;
use uuid::Uuid;

use atelier_service::{TurnPhase, TurnRequest};

use super::{Harness, ScriptedGenerator};

#[tokio::test]
async fn consolidation_fires_on_interval_multiples_only() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("faq"));
	let supervisor = harness.supervisor();
	let owner = Uuid::new_v4();
	let mut fired = Vec::new();

	for turn in 1..=11 {
		let mut request = TurnRequest::new("c-1", format!("Pregunta número {turn} sobre mi taller"));

		request.owner_id = Some(owner.to_string());

		let outcome = supervisor.process(request).await.expect("Turn must complete.");

		assert_eq!(outcome.phase, TurnPhase::Done);

		if outcome.profile_consolidated {
			fired.push(turn);
		}
	}

	assert_eq!(fired, vec![5, 10]);
	assert_eq!(supervisor.counter().get(owner), 11);

	let profile = harness
		.memory
		.get_profile(owner)
		.await
		.expect("Failed to load profile.")
		.expect("Profile must exist.");

	assert_eq!(profile.interaction_count, 2);
	assert_eq!(profile.profile_summary, "Artisan with 5 interactions");
	assert_eq!(profile.key_insights.get("last_responder"), Some(&Value::from("faq")));
	assert_eq!(
		profile
			.key_insights
			.get("recent_interaction")
			.and_then(|interaction| interaction.get("query"))
			.and_then(Value::as_str),
		Some("Pregunta número 10 sobre mi taller")
	);
}

#[tokio::test]
async fn consolidation_merges_into_the_onboarding_profile() {
	let harness = Harness::new(super::test_config(2), ScriptedGenerator::routing_to("legal"));
	let supervisor = harness.supervisor();
	let owner = Uuid::new_v4();
	let mut onboarding = TurnRequest::new("c-2", super::onboarding_payload("Marroquinería"));

	onboarding.owner_id = Some(owner.to_string());

	let first = supervisor.process(onboarding).await.expect("Onboarding turn must complete.");

	assert!(!first.profile_consolidated);

	let mut question = TurnRequest::new("c-2", "¿Necesito factura electrónica?");

	question.owner_id = Some(owner.to_string());

	let second = supervisor.process(question).await.expect("Turn must complete.");

	assert!(second.profile_consolidated);

	let profile = harness
		.memory
		.get_profile(owner)
		.await
		.expect("Failed to load profile.")
		.expect("Profile must exist.");

	assert_eq!(profile.interaction_count, 2);
	assert_eq!(profile.profile_summary, "Tejedora con ventas locales y potencial digital.");
	assert_eq!(profile.key_insights.get("tipo_artesania"), Some(&Value::from("Marroquinería")));
	assert_eq!(profile.key_insights.get("last_responder"), Some(&Value::from("legal")));
	assert_eq!(profile.maturity_snapshot.get("general"), Some(&Value::from("Intermedio")));
}

#[tokio::test]
async fn turns_without_owner_never_consolidate() {
	let harness = Harness::new(super::test_config(1), ScriptedGenerator::routing_to("faq"));
	let supervisor = harness.supervisor();

	for turn in 1..=3 {
		let outcome = supervisor
			.process(TurnRequest::new("c-3", format!("Pregunta anónima {turn}")))
			.await
			.expect("Turn must complete.");

		assert!(!outcome.profile_consolidated);
		assert!(outcome.owner_id.is_none());
	}
}

#[tokio::test]
async fn failed_consolidation_is_retried_at_the_next_interval() {
	let harness = Harness::new(super::test_config(2), ScriptedGenerator::routing_to("faq"));
	let supervisor = harness.supervisor();
	let owner = Uuid::new_v4();
	let mut outcomes = Vec::new();

	for turn in 1..=4 {
		harness.embedding.set_failing(turn == 2);

		let mut request = TurnRequest::new("c-4", format!("Consulta {turn} sobre mis bordados"));

		request.owner_id = Some(owner.to_string());

		outcomes.push(supervisor.process(request).await.expect("Turn must complete."));
	}

	assert!(outcomes.iter().all(|outcome| outcome.phase == TurnPhase::Done));
	assert!(!outcomes[1].profile_consolidated);
	assert!(outcomes[1].memory_id.is_none());
	assert!(!outcomes[2].profile_consolidated);
	assert!(outcomes[3].profile_consolidated);

	let profile = harness
		.memory
		.get_profile(owner)
		.await
		.expect("Failed to load profile.")
		.expect("Profile must exist.");

	assert_eq!(profile.interaction_count, 1);
	assert_eq!(profile.profile_summary, "Artisan with 4 interactions");
}
