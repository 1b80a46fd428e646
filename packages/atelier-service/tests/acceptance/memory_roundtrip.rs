use uuid::Uuid;

use atelier_domain::{MemoryType, importance};
use atelier_service::{DocumentWrite, Error, ReadQuery, WriteRequest};
use atelier_storage::MemoryStore;

use super::{Harness, ScriptedGenerator};

fn harness() -> Harness {
	Harness::new(super::test_config(5), ScriptedGenerator::routing_to("faq"))
}

#[tokio::test]
async fn written_entry_is_read_back_by_a_close_query() {
	let harness = harness();
	let owner = Uuid::new_v4();

	for (content, responder) in [
		("Vendo mochilas wayuu tejidas a mano en Riohacha", "producto"),
		("Necesito registrar mi marca ante la superintendencia", "legal"),
		("Publico fotos de cerámica en Instagram cada semana", "presencia_digital"),
	] {
		let mut request = WriteRequest::new(MemoryType::Conversational, responder, content, responder);

		request.owner_id = Some(owner);

		harness.memory.write(request).await.expect("Failed to write memory.");
	}

	let mut query = ReadQuery::new("precio de mochilas wayuu tejidas", 1);

	query.owner_id = Some(owner);

	let hits = harness.memory.read(&query).await.expect("Failed to read memory.");

	assert_eq!(hits.len(), 1);
	assert!(hits[0].entry.content.contains("mochilas wayuu"), "Unexpected hit: {:?}", hits[0].entry);

	query.memory_type = Some(MemoryType::Strategy);

	let filtered = harness.memory.read(&query).await.expect("Failed to read memory.");

	assert!(filtered.is_empty());
}

#[tokio::test]
async fn omitted_importance_is_scored_from_content() {
	let harness = harness();
	let content = "Mi costo por mochila es de 80.000 pesos en materiales.";
	let id = harness
		.memory
		.write(WriteRequest::new(MemoryType::Conversational, "pricing", content, "pricing"))
		.await
		.expect("Failed to write memory.");
	let stored = harness
		.store
		.get_entry(id)
		.await
		.expect("Failed to fetch entry.")
		.expect("Entry must exist.");

	assert_eq!(stored.importance, importance::score(content, MemoryType::Conversational, "pricing"));
	assert_eq!(stored.embedding.len(), super::VECTOR_DIM as usize);
}

#[tokio::test]
async fn recent_by_session_stays_within_the_session() {
	let harness = harness();

	for (session, content) in [("s-1", "primera"), ("s-2", "ajena"), ("s-1", "segunda")] {
		let mut request = WriteRequest::new(MemoryType::Conversational, "faq", content, "faq");

		request.session_id = Some(session.to_string());

		harness.memory.write(request).await.expect("Failed to write memory.");
	}

	let recent = harness.memory.recent_by_session("s-1", None, 10).await.expect("Recent failed.");

	assert_eq!(recent.len(), 2);
	assert!(recent.iter().all(|entry| entry.session_id.as_deref() == Some("s-1")));
	assert_eq!(recent[0].content, "segunda");
}

#[tokio::test]
async fn embedding_failure_aborts_the_write() {
	let harness = harness();

	harness.embedding.set_failing(true);

	let err = harness
		.memory
		.write(WriteRequest::new(MemoryType::Profile, "onboarding", "Tipo de artesanía: Cerámica", "onboarding"))
		.await
		.expect_err("Expected embedding failure.");

	assert!(matches!(err, Error::EmbeddingUnavailable { .. }), "Unexpected error: {err}");
	assert_eq!(harness.store.entry_count(), 0);
}

#[tokio::test]
async fn invalid_writes_are_rejected_before_embedding() {
	let harness = harness();
	let mut out_of_range = WriteRequest::new(MemoryType::Strategy, "pricing", "Margen del 30%", "pricing");

	out_of_range.importance = Some(1.5);

	for request in [out_of_range, WriteRequest::new(MemoryType::Strategy, "pricing", "  ", "pricing")] {
		let err = harness.memory.write(request).await.expect_err("Expected invalid request.");

		assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err}");
	}

	assert_eq!(harness.embedding.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn documents_are_stored_as_ordered_knowledge_chunks() {
	let harness = harness();
	let document_id = Uuid::new_v4();
	let text = "El tejido wayuu usa hilos de algodón. Cada mochila toma entre veinte y treinta días. \
		Los diseños, llamados kanasü, cuentan historias familiares.\n\nPara exportar se requiere \
		registro ante la autoridad aduanera. También conviene certificar el origen de la pieza. \
		Las ferias internacionales exigen catálogo y lista de precios en dólares.";
	let ids = harness
		.memory
		.write_document(DocumentWrite {
			document_id,
			responder_id: "producto".to_string(),
			category: "guia_tejido".to_string(),
			text: text.to_string(),
			owner_id: None,
			metadata: serde_json::Map::new(),
		})
		.await
		.expect("Failed to write document.");

	assert!(ids.len() > 1, "Expected several chunks, got {}.", ids.len());

	for (idx, id) in ids.iter().enumerate() {
		let entry = harness
			.store
			.get_entry(*id)
			.await
			.expect("Failed to fetch chunk.")
			.expect("Chunk must exist.");

		assert_eq!(entry.memory_type, MemoryType::Knowledge);
		assert_eq!(entry.document_id, Some(document_id));
		assert_eq!(entry.chunk_index, Some(idx as i32));
		assert!(entry.content.chars().count() <= 120);
	}

	assert_eq!(harness.embedding.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}
