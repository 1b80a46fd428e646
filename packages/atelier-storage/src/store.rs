use std::{future::Future, pin::Pin};

use uuid::Uuid;

use crate::{
	Result,
	models::{ArtisanProfile, EntryFilter, MemoryEntry, ProfileUpsert, ScoredEntry},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence and nearest-neighbour search over memory entries and artisan profiles.
///
/// Search results are ordered by similarity, then importance, then recency, all descending.
pub trait MemoryStore
where
	Self: Send + Sync,
{
	/// Inserts an entry; re-inserting the same id is a no-op.
	fn upsert_entry<'a>(&'a self, entry: &'a MemoryEntry) -> BoxFuture<'a, Result<()>>;

	/// Inserts all entries or none of them.
	fn upsert_entries<'a>(&'a self, entries: &'a [MemoryEntry]) -> BoxFuture<'a, Result<()>>;

	fn get_entry<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<Option<MemoryEntry>>>;

	fn search_entries<'a>(
		&'a self,
		query: &'a [f32],
		filter: &'a EntryFilter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ScoredEntry>>>;

	/// Entries of one session, newest first, optionally restricted to one owner.
	fn recent_entries<'a>(
		&'a self,
		session_id: &'a str,
		owner_id: Option<Uuid>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<MemoryEntry>>>;

	fn get_profile<'a>(&'a self, owner_id: Uuid) -> BoxFuture<'a, Result<Option<ArtisanProfile>>>;

	fn upsert_profile<'a>(
		&'a self,
		upsert: &'a ProfileUpsert,
	) -> BoxFuture<'a, Result<ArtisanProfile>>;
}
