use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, QueryBuilder, postgres::PgPoolOptions};
use time::OffsetDateTime;
use uuid::Uuid;

use atelier_domain::MemoryType;

use crate::{
	BoxFuture, Error, MemoryStore, Result,
	models::{ArtisanProfile, EntryFilter, MemoryEntry, ProfileUpsert, ScoredEntry},
	schema,
	vector::{parse_pg_vector, vector_to_pg},
};

const ENTRY_COLUMNS: &str = "\
entry_id,
	memory_type,
	responder_id,
	owner_id,
	session_id,
	content,
	summary,
	importance,
	embedding::text AS embedding,
	category,
	metadata,
	created_at,
	document_id,
	chunk_index";
const PROFILE_COLUMNS: &str = "\
owner_id,
	profile_summary,
	key_insights,
	interaction_count,
	maturity_snapshot,
	embedding::text AS embedding,
	last_interaction_at,
	created_at,
	updated_at";

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &atelier_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self, vector_dim: u32) -> Result<()> {
		let sql = schema::render_schema(vector_dim);
		let lock_id: i64 = 4_171_822;
		// The advisory lock is scoped to this transaction's connection.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}

	async fn insert_entry<'e, E>(executor: E, entry: &MemoryEntry) -> Result<()>
	where
		E: sqlx::Executor<'e, Database = Postgres>,
	{
		sqlx::query(
			"\
INSERT INTO memory_entries (
	entry_id,
	memory_type,
	responder_id,
	owner_id,
	session_id,
	content,
	summary,
	importance,
	embedding,
	category,
	metadata,
	created_at,
	document_id,
	chunk_index
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::text::vector, $10, $11, $12, $13, $14)
ON CONFLICT (entry_id) DO NOTHING",
		)
		.bind(entry.id)
		.bind(entry.memory_type.as_str())
		.bind(entry.responder_id.as_str())
		.bind(entry.owner_id)
		.bind(entry.session_id.as_deref())
		.bind(entry.content.as_str())
		.bind(entry.summary.as_deref())
		.bind(entry.importance)
		.bind(vector_to_pg(&entry.embedding))
		.bind(entry.category.as_str())
		.bind(Value::Object(entry.metadata.clone()))
		.bind(entry.created_at)
		.bind(entry.document_id)
		.bind(entry.chunk_index)
		.execute(executor)
		.await?;

		Ok(())
	}
}
impl MemoryStore for Db {
	fn upsert_entry<'a>(&'a self, entry: &'a MemoryEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(Self::insert_entry(&self.pool, entry))
	}

	fn upsert_entries<'a>(&'a self, entries: &'a [MemoryEntry]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut tx = self.pool.begin().await?;

			for entry in entries {
				Self::insert_entry(&mut *tx, entry).await?;
			}

			tx.commit().await?;

			Ok(())
		})
	}

	fn get_entry<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<Option<MemoryEntry>>> {
		Box::pin(async move {
			let sql = format!("SELECT {ENTRY_COLUMNS}\nFROM memory_entries\nWHERE entry_id = $1");
			let row: Option<EntryRow> =
				sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;

			row.map(MemoryEntry::try_from).transpose()
		})
	}

	fn search_entries<'a>(
		&'a self,
		query: &'a [f32],
		filter: &'a EntryFilter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ScoredEntry>>> {
		Box::pin(async move {
			let mut builder = QueryBuilder::<Postgres>::new("SELECT ");

			builder.push(ENTRY_COLUMNS);
			builder.push(",\n\t(1 - (embedding <=> ");
			builder.push_bind(vector_to_pg(query));
			builder.push("::text::vector))::real AS similarity\nFROM memory_entries\nWHERE importance >= ");
			builder.push_bind(filter.min_importance);

			if let Some(memory_type) = filter.memory_type {
				builder.push(" AND memory_type = ").push_bind(memory_type.as_str());
			}
			if let Some(responder_id) = filter.responder_id.as_ref() {
				builder.push(" AND responder_id = ").push_bind(responder_id.clone());
			}
			if let Some(owner_id) = filter.owner_id {
				builder.push(" AND owner_id = ").push_bind(owner_id);
			}
			if let Some(session_id) = filter.session_id.as_ref() {
				builder.push(" AND session_id = ").push_bind(session_id.clone());
			}

			builder.push("\nORDER BY similarity DESC, importance DESC, created_at DESC, entry_id\nLIMIT ");
			builder.push_bind(i64::from(limit));

			let rows: Vec<ScoredRow> = builder.build_query_as().fetch_all(&self.pool).await?;

			rows.into_iter()
				.map(|row| {
					Ok(ScoredEntry { entry: MemoryEntry::try_from(row.entry)?, similarity: row.similarity })
				})
				.collect()
		})
	}

	fn recent_entries<'a>(
		&'a self,
		session_id: &'a str,
		owner_id: Option<Uuid>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<MemoryEntry>>> {
		Box::pin(async move {
			let sql = format!(
				"\
SELECT {ENTRY_COLUMNS}
FROM memory_entries
WHERE session_id = $1
	AND ($2::uuid IS NULL OR owner_id = $2)
ORDER BY created_at DESC, importance DESC, entry_id
LIMIT $3"
			);
			let rows: Vec<EntryRow> = sqlx::query_as(&sql)
				.bind(session_id)
				.bind(owner_id)
				.bind(i64::from(limit))
				.fetch_all(&self.pool)
				.await?;

			rows.into_iter().map(MemoryEntry::try_from).collect()
		})
	}

	fn get_profile<'a>(&'a self, owner_id: Uuid) -> BoxFuture<'a, Result<Option<ArtisanProfile>>> {
		Box::pin(async move {
			let sql =
				format!("SELECT {PROFILE_COLUMNS}\nFROM artisan_profiles\nWHERE owner_id = $1");
			let row: Option<ProfileRow> =
				sqlx::query_as(&sql).bind(owner_id).fetch_optional(&self.pool).await?;

			row.map(ArtisanProfile::try_from).transpose()
		})
	}

	fn upsert_profile<'a>(
		&'a self,
		upsert: &'a ProfileUpsert,
	) -> BoxFuture<'a, Result<ArtisanProfile>> {
		Box::pin(async move {
			let sql = format!(
				"\
INSERT INTO artisan_profiles (
	owner_id,
	profile_summary,
	key_insights,
	interaction_count,
	maturity_snapshot,
	embedding,
	last_interaction_at,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, 1, $4, $5::text::vector, $6, $6, $6)
ON CONFLICT (owner_id) DO UPDATE
SET
	profile_summary = EXCLUDED.profile_summary,
	key_insights = EXCLUDED.key_insights,
	interaction_count = artisan_profiles.interaction_count + $7,
	maturity_snapshot = EXCLUDED.maturity_snapshot,
	embedding = EXCLUDED.embedding,
	last_interaction_at = EXCLUDED.last_interaction_at,
	updated_at = EXCLUDED.updated_at
RETURNING {PROFILE_COLUMNS}"
			);
			let row: ProfileRow = sqlx::query_as(&sql)
				.bind(upsert.owner_id)
				.bind(upsert.profile_summary.as_str())
				.bind(Value::Object(upsert.key_insights.clone()))
				.bind(Value::Object(upsert.maturity_snapshot.clone()))
				.bind(vector_to_pg(&upsert.embedding))
				.bind(upsert.at)
				.bind(i64::from(upsert.increment))
				.fetch_one(&self.pool)
				.await?;

			ArtisanProfile::try_from(row)
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
	entry_id: Uuid,
	memory_type: String,
	responder_id: String,
	owner_id: Option<Uuid>,
	session_id: Option<String>,
	content: String,
	summary: Option<String>,
	importance: f32,
	embedding: String,
	category: String,
	metadata: Value,
	created_at: OffsetDateTime,
	document_id: Option<Uuid>,
	chunk_index: Option<i32>,
}
impl TryFrom<EntryRow> for MemoryEntry {
	type Error = Error;

	fn try_from(row: EntryRow) -> Result<Self> {
		let memory_type =
			row.memory_type.parse::<MemoryType>().map_err(|err| Error::CorruptRow(err.to_string()))?;

		Ok(Self {
			id: row.entry_id,
			memory_type,
			responder_id: row.responder_id,
			owner_id: row.owner_id,
			session_id: row.session_id,
			content: row.content,
			summary: row.summary,
			importance: row.importance,
			embedding: parse_pg_vector(&row.embedding)?,
			category: row.category,
			metadata: into_object(row.metadata),
			created_at: row.created_at,
			document_id: row.document_id,
			chunk_index: row.chunk_index,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
struct ScoredRow {
	#[sqlx(flatten)]
	entry: EntryRow,
	similarity: f32,
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
	owner_id: Uuid,
	profile_summary: String,
	key_insights: Value,
	interaction_count: i64,
	maturity_snapshot: Value,
	embedding: String,
	last_interaction_at: OffsetDateTime,
	created_at: OffsetDateTime,
	updated_at: OffsetDateTime,
}
impl TryFrom<ProfileRow> for ArtisanProfile {
	type Error = Error;

	fn try_from(row: ProfileRow) -> Result<Self> {
		Ok(Self {
			owner_id: row.owner_id,
			profile_summary: row.profile_summary,
			key_insights: into_object(row.key_insights),
			interaction_count: row.interaction_count,
			maturity_snapshot: into_object(row.maturity_snapshot),
			embedding: parse_pg_vector(&row.embedding)?,
			last_interaction_at: row.last_interaction_at,
			created_at: row.created_at,
			updated_at: row.updated_at,
		})
	}
}

fn into_object(value: Value) -> Map<String, Value> {
	match value {
		Value::Object(map) => map,
		_ => Map::new(),
	}
}
