// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{fs, io, path::PathBuf};

use parking_lot::Mutex;

/// Destination for the rendering of an executable that failed in debug mode.
pub trait DebugSink: Send + Sync {
	fn persist(&self, name: &str, rendering: &str) -> io::Result<()>;
}

/// Writes each rendering to `<dir>/<name>.txt`.
#[derive(Debug, Clone)]
pub struct FileSink {
	dir: PathBuf,
}

impl FileSink {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
		}
	}

	pub fn path_for(&self, name: &str) -> PathBuf {
		self.dir.join(format!("{name}.txt"))
	}
}

impl DebugSink for FileSink {
	fn persist(&self, name: &str, rendering: &str) -> io::Result<()> {
		fs::create_dir_all(&self.dir)?;
		fs::write(self.path_for(name), rendering)
	}
}

/// Keeps renderings in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
	entries: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Persisted `(name, rendering)` pairs in order.
	pub fn entries(&self) -> Vec<(String, String)> {
		self.entries.lock().clone()
	}
}

impl DebugSink for MemorySink {
	fn persist(&self, name: &str, rendering: &str) -> io::Result<()> {
		self.entries.lock().push((name.to_string(), rendering.to_string()));
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_file_sink_creates_directory() {
		let temp = tempfile::tempdir().unwrap();
		let sink = FileSink::new(temp.path().join("nested").join("debug"));
		sink.persist("conduit_0a", "def conduit_0a(input):\n").unwrap();
		let written = fs::read_to_string(sink.path_for("conduit_0a")).unwrap();
		assert_eq!(written, "def conduit_0a(input):\n");
	}

	#[test]
	fn test_memory_sink() {
		let sink = MemorySink::new();
		sink.persist("a", "one").unwrap();
		sink.persist("b", "two").unwrap();
		assert_eq!(sink.entries(), vec![("a".to_string(), "one".to_string()), ("b".to_string(), "two".to_string())]);
	}
}
