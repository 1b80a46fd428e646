use serde_json::Map;
use time::OffsetDateTime;
use uuid::Uuid;

use atelier_domain::MemoryType;
use atelier_storage::{
	MemoryStore,
	db::Db,
	models::{EntryFilter, MemoryEntry, ProfileUpsert},
};
use atelier_testkit::TestDatabase;

const VECTOR_DIM: u32 = 4;

async fn bootstrapped() -> Option<(TestDatabase, Db)> {
	let Some(base_dsn) = atelier_testkit::env_dsn() else {
		eprintln!("Skipping Postgres test; set ATELIER_PG_DSN to run it.");

		return None;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = Db::connect(&test_db.postgres_config(2)).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(VECTOR_DIM).await.expect("Failed to ensure schema.");

	Some((test_db, db))
}

fn knowledge_entry(embedding: Vec<f32>, chunk_index: i32) -> MemoryEntry {
	MemoryEntry {
		id: Uuid::new_v4(),
		memory_type: MemoryType::Knowledge,
		responder_id: "legal".to_string(),
		owner_id: None,
		session_id: None,
		content: format!("Chunk {chunk_index} sobre registro de marca."),
		summary: None,
		importance: 0.8,
		embedding,
		category: "registro".to_string(),
		metadata: Map::new(),
		created_at: OffsetDateTime::now_utc(),
		document_id: Some(Uuid::nil()),
		chunk_index: Some(chunk_index),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ATELIER_PG_DSN to run."]
async fn schema_bootstrap_is_repeatable() {
	let Some((test_db, db)) = bootstrapped().await else {
		return;
	};

	db.ensure_schema(VECTOR_DIM).await.expect("Second bootstrap must succeed.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name IN ('memory_entries', 'artisan_profiles')",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ATELIER_PG_DSN to run."]
async fn entries_round_trip_through_vector_search() {
	let Some((test_db, db)) = bootstrapped().await else {
		return;
	};
	let near = knowledge_entry(vec![1.0, 0.0, 0.0, 0.0], 0);
	let far = knowledge_entry(vec![0.0, 1.0, 0.0, 0.0], 1);

	db.upsert_entries(&[near.clone(), far.clone()]).await.expect("Failed to insert entries.");
	db.upsert_entry(&near).await.expect("Re-insert must be a no-op.");

	let filter = EntryFilter { memory_type: Some(MemoryType::Knowledge), ..Default::default() };
	let results = db
		.search_entries(&[0.9, 0.1, 0.0, 0.0], &filter, 5)
		.await
		.expect("Failed to search entries.");

	assert_eq!(results.len(), 2);
	assert_eq!(results[0].entry.id, near.id);
	assert_eq!(results[0].entry.chunk_index, Some(0));
	assert!(results[0].similarity > results[1].similarity);

	let fetched = db.get_entry(far.id).await.expect("Failed to fetch entry.");

	assert_eq!(fetched.map(|entry| entry.embedding), Some(far.embedding));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ATELIER_PG_DSN to run."]
async fn profile_upsert_tracks_interaction_count() {
	let Some((test_db, db)) = bootstrapped().await else {
		return;
	};
	let owner = Uuid::new_v4();
	let mut upsert = ProfileUpsert {
		owner_id: owner,
		profile_summary: "Ceramista en Ráquira".to_string(),
		key_insights: Map::new(),
		maturity_snapshot: Map::new(),
		embedding: vec![0.0, 0.0, 1.0, 0.0],
		increment: false,
		at: OffsetDateTime::now_utc(),
	};
	let created = db.upsert_profile(&upsert).await.expect("Failed to create profile.");

	assert_eq!(created.interaction_count, 1);

	upsert.increment = true;

	let updated = db.upsert_profile(&upsert).await.expect("Failed to update profile.");

	assert_eq!(updated.interaction_count, 2);
	assert_eq!(
		db.get_profile(owner).await.expect("Failed to get profile.").map(|p| p.interaction_count),
		Some(2)
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ATELIER_PG_DSN to run."]
async fn scoped_test_database_is_isolated() {
	let Some(base_dsn) = atelier_testkit::env_dsn() else {
		eprintln!("Skipping Postgres test; set ATELIER_PG_DSN to run it.");

		return;
	};
	let current = atelier_testkit::with_test_db(&base_dsn, |test_db| {
		let name = test_db.name().to_string();
		let cfg = test_db.postgres_config(1);

		async move {
			let db = Db::connect(&cfg)
				.await
				.map_err(|err| atelier_testkit::Error::Message(err.to_string()))?;
			let current: String =
				sqlx::query_scalar("SELECT current_database()").fetch_one(&db.pool).await?;

			assert_eq!(current, name);

			db.pool.close().await;

			Ok(current)
		}
	})
	.await
	.expect("Scoped test database failed.");

	assert!(current.starts_with("atelier_test_"));
}
