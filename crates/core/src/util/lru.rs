// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashMap, hash::Hash};

use parking_lot::RwLock;

/// Bounded LRU cache shared between threads.
///
/// Lookups promote the entry and therefore take the write lock.
pub struct LruCache<K, V> {
	inner: RwLock<LruCacheInner<K, V>>,
	capacity: usize,
}

struct LruCacheInner<K, V> {
	map: HashMap<K, usize>,
	entries: Vec<Entry<K, V>>,
	head: Option<usize>,
	tail: Option<usize>,
}

struct Entry<K, V> {
	key: K,
	value: V,
	prev: Option<usize>,
	next: Option<usize>,
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
	pub fn new(capacity: usize) -> Self {
		assert!(capacity > 0, "LRU cache capacity must be greater than 0");
		Self {
			inner: RwLock::new(LruCacheInner {
				map: HashMap::with_capacity(capacity),
				entries: Vec::with_capacity(capacity),
				head: None,
				tail: None,
			}),
			capacity,
		}
	}

	/// Get a value and mark it most recently used.
	pub fn get(&self, key: &K) -> Option<V> {
		let mut inner = self.inner.write();
		let idx = *inner.map.get(key)?;
		inner.move_to_front(idx);
		Some(inner.entries[idx].value.clone())
	}

	/// Insert a value. Returns the previous value for `key`, or the evicted
	/// least recently used value when the cache was full.
	pub fn put(&self, key: K, value: V) -> Option<V> {
		let mut inner = self.inner.write();

		if let Some(&idx) = inner.map.get(&key) {
			let old_value = std::mem::replace(&mut inner.entries[idx].value, value);
			inner.move_to_front(idx);
			return Some(old_value);
		}

		let evicted = match inner.tail {
			Some(tail) if inner.entries.len() >= self.capacity => Some(inner.detach(tail).value),
			_ => None,
		};

		let idx = inner.entries.len();
		let old_head = inner.head;
		inner.entries.push(Entry {
			key: key.clone(),
			value,
			prev: None,
			next: old_head,
		});
		if let Some(old_head) = old_head {
			inner.entries[old_head].prev = Some(idx);
		}
		inner.head = Some(idx);
		if inner.tail.is_none() {
			inner.tail = Some(idx);
		}
		inner.map.insert(key, idx);

		evicted
	}

	pub fn clear(&self) {
		let mut inner = self.inner.write();
		inner.map.clear();
		inner.entries.clear();
		inner.head = None;
		inner.tail = None;
	}

	pub fn len(&self) -> usize {
		self.inner.read().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl<K, V> LruCacheInner<K, V>
where
	K: Hash + Eq + Clone,
{
	fn move_to_front(&mut self, idx: usize) {
		if self.head == Some(idx) {
			return;
		}

		self.unlink(idx);

		self.entries[idx].prev = None;
		self.entries[idx].next = self.head;
		if let Some(old_head) = self.head {
			self.entries[old_head].prev = Some(idx);
		}
		self.head = Some(idx);
		if self.tail.is_none() {
			self.tail = Some(idx);
		}
	}

	fn unlink(&mut self, idx: usize) {
		let prev = self.entries[idx].prev;
		let next = self.entries[idx].next;

		match prev {
			Some(p) => self.entries[p].next = next,
			None => self.head = next,
		}
		match next {
			Some(n) => self.entries[n].prev = prev,
			None => self.tail = prev,
		}
	}

	/// Remove the entry at `idx`, patching the links of the entry that
	/// `swap_remove` moves into its place.
	fn detach(&mut self, idx: usize) -> Entry<K, V> {
		self.unlink(idx);
		let entry = self.entries.swap_remove(idx);
		self.map.remove(&entry.key);

		if idx < self.entries.len() {
			let moved_key = self.entries[idx].key.clone();
			self.map.insert(moved_key, idx);

			match self.entries[idx].prev {
				Some(prev) => self.entries[prev].next = Some(idx),
				None => self.head = Some(idx),
			}
			match self.entries[idx].next {
				Some(next) => self.entries[next].prev = Some(idx),
				None => self.tail = Some(idx),
			}
		}

		entry
	}
}
