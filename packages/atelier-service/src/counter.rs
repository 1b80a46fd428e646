use std::{
	collections::HashMap,
	sync::{Mutex, PoisonError},
};

use uuid::Uuid;

/// Process-local interaction tally per owner, used only to time profile consolidation.
///
/// Not persisted and not shared between processes.
#[derive(Debug, Default)]
pub struct InteractionCounter {
	counts: Mutex<HashMap<Uuid, u64>>,
}
impl InteractionCounter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Counts one interaction and returns the owner's new total.
	pub fn record(&self, owner_id: Uuid) -> u64 {
		let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
		let count = counts.entry(owner_id).or_insert(0);

		*count += 1;

		*count
	}

	pub fn get(&self, owner_id: Uuid) -> u64 {
		self.counts
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&owner_id)
			.copied()
			.unwrap_or(0)
	}
}

/// True when `count` is a positive multiple of `interval`.
pub fn is_consolidation_due(count: u64, interval: u32) -> bool {
	interval > 0 && count > 0 && count % u64::from(interval) == 0
}
