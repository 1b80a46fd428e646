use atelier_service::{Error, TurnRequest};

use super::{Harness, ScriptedGenerator};

#[tokio::test]
async fn responder_generation_failure_surfaces_with_responder_id() {
	let harness = Harness::new(
		super::test_config(5),
		ScriptedGenerator::routing_to("legal").with_failing_advisor(),
	);
	let err = harness
		.supervisor()
		.process(TurnRequest::new("f-1", "¿Debo pagar IVA?"))
		.await
		.expect_err("Expected processing failure.");

	match err {
		Error::ProcessingFailed { responder, message } => {
			assert_eq!(responder, "legal");
			assert!(message.starts_with("Generation unavailable"), "Unexpected message: {message}");
		},
		other => panic!("Unexpected error: {other}"),
	}

	assert_eq!(harness.store.entry_count(), 0);
}

#[tokio::test]
async fn blank_input_is_rejected() {
	let harness = Harness::new(super::test_config(5), ScriptedGenerator::routing_to("faq"));
	let err = harness
		.supervisor()
		.process(TurnRequest::new("f-2", "   "))
		.await
		.expect_err("Expected invalid request.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err}");
	assert!(harness.generator.advisor_requests().is_empty());
}
