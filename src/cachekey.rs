//! Deterministic content fingerprints for sources.
//!
//! `sha2`/`hex` produce the fingerprint, the same pairing used for content
//! hashing elsewhere in the broader ecosystem (`twoliter`, `trident`). The
//! resolver treats the computer as an opaque callable behind a small trait,
//! the same dispatch style `RootBuilder`/`ImageBuilder` use elsewhere.

use sha2::{Digest, Sha512};

use crate::source::{Source, SourceKey, SourcePool};

/// A deterministic fingerprint computer over a source's content and its
/// declared dependencies' keys.
pub trait CacheKeyComputer {
	/// `dependency_keys` must already be sorted by the caller for
	/// order-insensitivity across sets.
	fn compute_key(&self, source: &Source, dependency_keys: &[String]) -> String;
}

/// The faithful implementation: a 64-byte `sha2::Sha512` digest, hex-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha512CacheKeyComputer;

impl CacheKeyComputer for Sha512CacheKeyComputer {
	fn compute_key(&self, source: &Source, dependency_keys: &[String]) -> String {
		let mut hasher = Sha512::new();
		let canonical = serde_json::to_string(&source.morphology).unwrap_or_default();
		hasher.update(canonical.as_bytes());
		hasher.update(source.sha1.as_bytes());

		let mut sorted = dependency_keys.to_vec();
		sorted.sort_unstable();
		for key in &sorted {
			hasher.update(key.as_bytes());
		}

		hex::encode(hasher.finalize())
	}
}

/// Computes a cache key per source in `pool`, resolving declared
/// dependencies transitively and deterministically regardless of pool
/// iteration order. Cycles (normally rejected by the resolver) are broken by
/// treating an already-visiting source as contributing no further keys.
pub fn compute_source_cache_keys(pool: &SourcePool, computer: &dyn CacheKeyComputer) -> indexmap::IndexMap<SourceKey, String> {
	use crate::morphology::Morphology;

	let mut memo: indexmap::IndexMap<SourceKey, String> = indexmap::IndexMap::new();
	let mut visiting: std::collections::HashSet<SourceKey> = std::collections::HashSet::new();

	fn resolve(
		pool: &SourcePool,
		computer: &dyn CacheKeyComputer,
		source: &Source,
		memo: &mut indexmap::IndexMap<SourceKey, String>,
		visiting: &mut std::collections::HashSet<SourceKey>,
	) -> String {
		let key = source.key();
		if let Some(existing) = memo.get(&key) {
			return existing.clone();
		}
		if visiting.contains(&key) {
			// A cycle: the resolver will reject this graph outright. Return a
			// placeholder so cache-key computation itself never loops forever.
			return String::new();
		}
		visiting.insert(key.clone());

		let dep_names: Vec<String> = match &source.morphology {
			Morphology::Chunk(_) => Vec::new(),
			Morphology::Stratum(s) => s.build_depends.clone(),
			Morphology::System(s) => s.strata.clone(),
		};

		let mut dependency_keys = Vec::new();
		for name in dep_names {
			if let Some(dep_source) = pool.iter().find(|s| s.morphology.name() == name) {
				dependency_keys.push(resolve(pool, computer, dep_source, memo, visiting));
			}
		}

		let computed = computer.compute_key(source, &dependency_keys);
		visiting.remove(&key);
		memo.insert(key, computed.clone());
		computed
	}

	for source in pool.iter() {
		resolve(pool, computer, source, &mut memo, &mut visiting);
	}

	memo
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
			sha1: format!("sha-{name}"),
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
	fn same_content_yields_same_key() {
		let computer = Sha512CacheKeyComputer;
		let a = chunk_source("a");
		let b = chunk_source("a");
		assert_eq!(computer.compute_key(&a, &[]), computer.compute_key(&b, &[]));
	}

	#[test]
	fn different_sha1_yields_different_key() {
		let computer = Sha512CacheKeyComputer;
		let a = chunk_source("a");
		let mut b = chunk_source("a");
		b.sha1 = "other".into();
		assert_ne!(computer.compute_key(&a, &[]), computer.compute_key(&b, &[]));
	}

	#[test]
	fn dependency_key_order_is_insensitive() {
		let computer = Sha512CacheKeyComputer;
		let a = chunk_source("a");
		let forward = computer.compute_key(&a, &["one".into(), "two".into()]);
		let backward = computer.compute_key(&a, &["two".into(), "one".into()]);
		assert_eq!(forward, backward);
	}
}
