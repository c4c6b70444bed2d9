//! The source pool: an ordered, de-duplicated collection of morphology
//! instances keyed by `(repo, ref, filename)`. Uses an `IndexMap` for the
//! same ordered+keyed need `run_scripts`'s `IndexMap<&str, (Script, bool)>`
//! fills elsewhere in this codebase.

use indexmap::IndexMap;
use serde_derive::Serialize;

use crate::morphology::Morphology;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceKey {
	pub repo: String,
	pub original_ref: String,
	pub filename: String,
}

impl SourceKey {
	pub fn new(repo: impl Into<String>, original_ref: impl Into<String>, filename: impl Into<String>) -> Self {
		Self { repo: repo.into(), original_ref: original_ref.into(), filename: filename.into() }
	}
}

/// A morphology instance bound to a specific (repo, ref, sha1, filename).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
	pub repo: String,
	pub original_ref: String,
	pub filename: String,
	pub sha1: String,
	pub morphology: Morphology,
	pub prefix: String,
}

impl Source {
	pub fn key(&self) -> SourceKey {
		SourceKey::new(self.repo.clone(), self.original_ref.clone(), self.filename.clone())
	}
}

/// Ordered insertion-preserving container of [`Source`]s, uniquely keyed by
/// `(repo, original_ref, filename)`.
#[derive(Debug, Clone, Default)]
pub struct SourcePool {
	sources: IndexMap<SourceKey, Source>,
}

impl SourcePool {
	pub fn new() -> Self {
		Self { sources: IndexMap::new() }
	}

	/// Appends `source` if its identity tuple is unseen; otherwise silently
	/// de-duplicates.
	pub fn add(&mut self, source: Source) {
		let key = source.key();
		self.sources.entry(key).or_insert(source);
	}

	pub fn lookup(&self, repo: &str, original_ref: &str, filename: &str) -> Option<&Source> {
		self.sources.get(&SourceKey::new(repo, original_ref, filename))
	}

	pub fn iter(&self) -> impl Iterator<Item = &Source> {
		self.sources.values()
	}

	pub fn len(&self) -> usize {
		self.sources.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sources.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::morphology::{ChunkMorphology, Morphology};

	fn chunk_source(name: &str) -> Source {
		Source {
			repo: "upstream".into(),
			original_ref: "master".into(),
			filename: format!("{name}.morph"),
			sha1: "deadbeef".into(),
			morphology: Morphology::Chunk(ChunkMorphology {
				name: name.into(),
				description: None,
				chunks: None,
				configure_commands: None,
				build_commands: None,
				test_commands: None,
				install_commands: None,
				build_system: None,
				max_jobs: None,
			}),
			prefix: "/usr".into(),
		}
	}

	#[test]
	fn add_deduplicates_by_identity() {
		let mut pool = SourcePool::new();
		pool.add(chunk_source("a"));
		pool.add(chunk_source("a"));
		assert_eq!(pool.len(), 1);
	}

	#[test]
	fn iteration_preserves_insertion_order() {
		let mut pool = SourcePool::new();
		pool.add(chunk_source("b"));
		pool.add(chunk_source("a"));
		let names: Vec<_> = pool.iter().map(|s| s.morphology.name().to_owned()).collect();
		assert_eq!(names, vec!["b", "a"]);
	}

	#[test]
	fn lookup_by_identity_tuple() {
		let mut pool = SourcePool::new();
		pool.add(chunk_source("a"));
		assert!(pool.lookup("upstream", "master", "a.morph").is_some());
		assert!(pool.lookup("upstream", "master", "missing.morph").is_none());
	}
}
