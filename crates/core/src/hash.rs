// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! xxHash3 hashing used to key compiled executables by expression shape.

use core::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::{self, Xxh3};

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash128(pub u128);

impl From<u128> for Hash128 {
	fn from(value: u128) -> Self {
		Hash128(value)
	}
}

impl From<Hash128> for u128 {
	fn from(hash: Hash128) -> Self {
		hash.0
	}
}

impl Hash for Hash128 {
	fn hash<H: Hasher>(&self, state: &mut H) {
		state.write_u128(self.0)
	}
}

/// Compute xxHash3 128-bit hash of data.
#[inline]
pub fn xxh3_128(data: &[u8]) -> Hash128 {
	Hash128(xxh3::xxh3_128(data))
}

/// Streaming xxh3 hasher usable with any `Hash` implementation.
pub struct ShapeHasher(Xxh3);

impl Default for ShapeHasher {
	fn default() -> Self {
		Self::new()
	}
}

impl ShapeHasher {
	pub fn new() -> Self {
		Self(Xxh3::new())
	}

	pub fn finish128(&self) -> Hash128 {
		Hash128(self.0.digest128())
	}
}

impl Hasher for ShapeHasher {
	fn write(&mut self, bytes: &[u8]) {
		self.0.update(bytes);
	}

	fn finish(&self) -> u64 {
		self.0.digest()
	}
}

/// Hash any value with xxh3-128.
pub fn hash128_of<T: Hash + ?Sized>(value: &T) -> Hash128 {
	let mut hasher = ShapeHasher::new();
	value.hash(&mut hasher);
	hasher.finish128()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_xxh3_128() {
		let data = b"hello world";
		let hash = xxh3_128(data);
		// xxh3_128 should be deterministic
		assert_eq!(hash, xxh3_128(data));
		assert_ne!(hash, xxh3_128(b"different data"));
	}

	#[test]
	fn test_hash128_of_is_structural() {
		assert_eq!(hash128_of(&("a", 1u32)), hash128_of(&("a", 1u32)));
		assert_ne!(hash128_of(&("a", 1u32)), hash128_of(&("a", 2u32)));
	}

	#[test]
	fn test_hash128_conversions() {
		let value: u128 = 123456789;
		let hash = Hash128::from(value);
		assert_eq!(u128::from(hash), value);
	}
}
