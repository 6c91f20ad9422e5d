//! Per-repository TTL cache for entities read by id

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

/// Cached value with the time it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
	pub value: T,
	pub stored_at: Instant,
	pub ttl: Duration,
}

impl<T> CacheEntry<T> {
	pub fn new(value: T, ttl: Duration) -> Self {
		Self {
			value,
			stored_at: Instant::now(),
			ttl,
		}
	}

	/// Fresh while `now - stored_at < ttl`
	pub fn is_expired(&self) -> bool {
		self.stored_at.elapsed() >= self.ttl
	}
}

/// Cache size and cumulative hit rate since the last clear
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
	pub size: usize,
	/// Hits over read attempts, 0.0 - 1.0
	pub hit_rate: f64,
}

/// Entities cached by id, owned by one repository instance
///
/// Each id carries a generation that [`invalidate`](Self::invalidate) bumps.
/// A reader takes the generation before fetching and stores the result with
/// [`insert_if_current`](Self::insert_if_current), so a fetch that raced a
/// write never lands in the cache.
pub struct EntityCache<T> {
	entries: DashMap<String, CacheEntry<T>>,
	generations: DashMap<String, u64>,
	ttl: Duration,
	hits: AtomicU64,
	reads: AtomicU64,
}

impl<T: Clone> EntityCache<T> {
	pub fn new(ttl: Duration) -> Self {
		Self {
			entries: DashMap::new(),
			generations: DashMap::new(),
			ttl,
			hits: AtomicU64::new(0),
			reads: AtomicU64::new(0),
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Look up a fresh entry, counting the read towards the hit rate
	///
	/// Expired entries are dropped on the way.
	pub fn get(&self, id: &str) -> Option<T> {
		self.reads.fetch_add(1, Ordering::Relaxed);

		if self
			.entries
			.remove_if(id, |_, entry| entry.is_expired())
			.is_some()
		{
			debug!("Cache entry {} expired", id);
			return None;
		}

		let value = self.entries.get(id).map(|entry| entry.value.clone());
		if value.is_some() {
			self.hits.fetch_add(1, Ordering::Relaxed);
		}
		value
	}

	pub fn insert(&self, id: &str, value: T) {
		if self.ttl.is_zero() {
			return;
		}
		self.entries
			.insert(id.to_string(), CacheEntry::new(value, self.ttl));
	}

	/// Current generation of `id`, taken before fetching it
	pub fn generation(&self, id: &str) -> u64 {
		self.generations.get(id).map_or(0, |generation| *generation)
	}

	/// Store `value` unless `id` was invalidated since `generation` was read
	///
	/// Returns whether the value was stored.
	pub fn insert_if_current(&self, id: &str, value: T, generation: u64) -> bool {
		if self.ttl.is_zero() {
			return false;
		}
		// Holding the generation shard lock orders this against invalidate
		let current = self.generations.entry(id.to_string()).or_insert(0);
		if *current != generation {
			debug!("Skipped caching {}: written while it was being read", id);
			return false;
		}
		self.entries
			.insert(id.to_string(), CacheEntry::new(value, self.ttl));
		true
	}

	pub fn invalidate(&self, id: &str) {
		let mut generation = self.generations.entry(id.to_string()).or_insert(0);
		*generation += 1;
		self.entries.remove(id);
	}

	/// Drop all entries and reset the hit counters
	///
	/// Generations survive so reads in flight still see later writes.
	pub fn clear(&self) {
		self.entries.clear();
		self.hits.store(0, Ordering::Relaxed);
		self.reads.store(0, Ordering::Relaxed);
	}

	/// Number of live entries; expired ones are purged first
	pub fn len(&self) -> usize {
		self.entries.retain(|_, entry| !entry.is_expired());
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn stats(&self) -> CacheStats {
		let reads = self.reads.load(Ordering::Relaxed);
		let hits = self.hits.load(Ordering::Relaxed);
		CacheStats {
			size: self.len(),
			hit_rate: if reads == 0 {
				0.0
			} else {
				hits as f64 / reads as f64
			},
		}
	}
}
