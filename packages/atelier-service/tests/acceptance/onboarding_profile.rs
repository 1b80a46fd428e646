use serde_json::Value;
use uuid::Uuid;

use atelier_domain::ResponderKind;
use atelier_service::{ContextAssembler, TurnPhase, TurnRequest};

use super::{Harness, ScriptedGenerator};

#[tokio::test]
async fn onboarding_creates_profile_with_maturity_snapshot() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("faq"));
	let owner = Uuid::new_v4();
	let mut request = TurnRequest::new("onb-1", super::onboarding_payload("Tejeduría wayuu"));

	request.owner_id = Some(owner.to_string());

	let outcome =
		harness.supervisor().process(request).await.expect("Onboarding turn must complete.");

	assert_eq!(outcome.decision.selected_responder, ResponderKind::Onboarding);
	assert_eq!(outcome.phase, TurnPhase::Done);
	assert_eq!(outcome.output.extra.get("maturity_level"), Some(&Value::from("Intermedio")));
	assert!(outcome.output.answer.contains("**Nivel de Madurez General:** Intermedio"));

	let profile = harness
		.memory
		.get_profile(owner)
		.await
		.expect("Failed to load profile.")
		.expect("Profile must exist.");

	assert_eq!(profile.interaction_count, 1);
	assert_eq!(profile.profile_summary, "Tejedora con ventas locales y potencial digital.");
	assert_eq!(profile.maturity_snapshot.len(), 5);

	for (key, level) in [
		("identidad_artesanal", "Intermedio"),
		("realidad_comercial", "Inicial"),
		("clientes_y_mercado", "Intermedio"),
		("operacion_y_crecimiento", "Avanzado"),
		("general", "Intermedio"),
	] {
		assert_eq!(profile.maturity_snapshot.get(key), Some(&Value::from(level)), "Key {key}.");
	}

	assert_eq!(profile.key_insights.get("tipo_artesania"), Some(&Value::from("Tejeduría wayuu")));
	assert_eq!(profile.key_insights.get("onboarding_completed"), Some(&Value::Bool(true)));
	assert_eq!(
		profile.key_insights.get("top_priorities").and_then(Value::as_array).map(Vec::len),
		Some(3)
	);
}

#[tokio::test]
async fn next_session_sees_profile_and_onboarding_facts() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("faq"));
	let owner = Uuid::new_v4();
	let mut request = TurnRequest::new("onb-2", super::onboarding_payload("Cerámica"));

	request.context.insert("user_id".to_string(), Value::String(owner.to_string()));

	harness.supervisor().process(request).await.expect("Onboarding turn must complete.");

	let bundle = ContextAssembler::new(harness.memory.clone()).assemble("onb-3", Some(owner), &[]).await;
	let profile = bundle.profile.as_ref().expect("Profile must be loaded.");

	assert!(bundle.has_maturity_snapshot());
	assert!(bundle.degraded.is_empty());
	assert_eq!(profile.key_insights.get("tipo_artesania"), Some(&Value::from("Cerámica")));
	assert!(bundle.profile_digest().contains("Nivel de madurez general: Intermedio"));
	assert!(bundle.recent_turns.is_empty());
}
