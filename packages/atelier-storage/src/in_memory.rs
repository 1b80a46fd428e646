use std::{
	cmp::Ordering,
	collections::HashMap,
	sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use uuid::Uuid;

use crate::{
	BoxFuture, MemoryStore, Result,
	models::{ArtisanProfile, EntryFilter, MemoryEntry, ProfileUpsert, ScoredEntry},
	vector::cosine_similarity,
};

/// Process-local store with brute-force cosine search.
#[derive(Debug, Default)]
pub struct InMemoryStore {
	inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
	entries: Vec<MemoryEntry>,
	profiles: HashMap<Uuid, ArtisanProfile>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn entry_count(&self) -> usize {
		self.read().entries.len()
	}

	fn read(&self) -> RwLockReadGuard<'_, Inner> {
		self.inner.read().unwrap_or_else(|err| err.into_inner())
	}

	fn write(&self) -> RwLockWriteGuard<'_, Inner> {
		self.inner.write().unwrap_or_else(|err| err.into_inner())
	}
}
impl Inner {
	fn insert(&mut self, entry: &MemoryEntry) {
		if self.entries.iter().any(|existing| existing.id == entry.id) {
			return;
		}

		self.entries.push(entry.clone());
	}
}
impl MemoryStore for InMemoryStore {
	fn upsert_entry<'a>(&'a self, entry: &'a MemoryEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.write().insert(entry);

			Ok(())
		})
	}

	fn upsert_entries<'a>(&'a self, entries: &'a [MemoryEntry]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut inner = self.write();

			for entry in entries {
				inner.insert(entry);
			}

			Ok(())
		})
	}

	fn get_entry<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<Option<MemoryEntry>>> {
		Box::pin(async move { Ok(self.read().entries.iter().find(|entry| entry.id == id).cloned()) })
	}

	fn search_entries<'a>(
		&'a self,
		query: &'a [f32],
		filter: &'a EntryFilter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ScoredEntry>>> {
		Box::pin(async move {
			let mut scored = self
				.read()
				.entries
				.iter()
				.filter(|entry| filter.matches(entry))
				.map(|entry| ScoredEntry {
					similarity: cosine_similarity(query, &entry.embedding),
					entry: entry.clone(),
				})
				.collect::<Vec<_>>();

			scored.sort_by(|a, b| {
				desc(a.similarity, b.similarity)
					.then_with(|| desc(a.entry.importance, b.entry.importance))
					.then_with(|| b.entry.created_at.cmp(&a.entry.created_at))
					.then_with(|| a.entry.id.cmp(&b.entry.id))
			});
			scored.truncate(limit as usize);

			Ok(scored)
		})
	}

	fn recent_entries<'a>(
		&'a self,
		session_id: &'a str,
		owner_id: Option<Uuid>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<MemoryEntry>>> {
		Box::pin(async move {
			let mut recent = self
				.read()
				.entries
				.iter()
				.filter(|entry| entry.session_id.as_deref() == Some(session_id))
				.filter(|entry| owner_id.is_none_or(|owner| entry.owner_id == Some(owner)))
				.cloned()
				.collect::<Vec<_>>();

			recent.sort_by(|a, b| {
				b.created_at
					.cmp(&a.created_at)
					.then_with(|| desc(a.importance, b.importance))
					.then_with(|| a.id.cmp(&b.id))
			});
			recent.truncate(limit as usize);

			Ok(recent)
		})
	}

	fn get_profile<'a>(&'a self, owner_id: Uuid) -> BoxFuture<'a, Result<Option<ArtisanProfile>>> {
		Box::pin(async move { Ok(self.read().profiles.get(&owner_id).cloned()) })
	}

	fn upsert_profile<'a>(
		&'a self,
		upsert: &'a ProfileUpsert,
	) -> BoxFuture<'a, Result<ArtisanProfile>> {
		Box::pin(async move {
			let mut inner = self.write();
			let profile = inner
				.profiles
				.entry(upsert.owner_id)
				.and_modify(|profile| {
					profile.profile_summary = upsert.profile_summary.clone();
					profile.key_insights = upsert.key_insights.clone();
					profile.maturity_snapshot = upsert.maturity_snapshot.clone();
					profile.embedding = upsert.embedding.clone();
					profile.interaction_count += i64::from(upsert.increment);
					profile.last_interaction_at = upsert.at;
					profile.updated_at = upsert.at;
				})
				.or_insert_with(|| ArtisanProfile {
					owner_id: upsert.owner_id,
					profile_summary: upsert.profile_summary.clone(),
					key_insights: upsert.key_insights.clone(),
					interaction_count: 1,
					maturity_snapshot: upsert.maturity_snapshot.clone(),
					embedding: upsert.embedding.clone(),
					last_interaction_at: upsert.at,
					created_at: upsert.at,
					updated_at: upsert.at,
				});

			Ok(profile.clone())
		})
	}
}

fn desc(a: f32, b: f32) -> Ordering {
	b.total_cmp(&a)
}
