//! The artifact resolver: turns a frozen source pool into an ordered,
//! acyclic dependency graph of build artifacts, via a four-phase algorithm
//! (per-source creation, stratum resolution, system resolution, validation
//! and linkage).
//!
//! The cache-key computer is treated as an opaque callable behind a small
//! trait, the same trait-object dispatch style `RootBuilder`/`ImageBuilder`
//! use elsewhere in this codebase.
//!
//! Artifacts live in a `Vec`-based arena addressed by [`ArtifactId`]; edges
//! are populated only once, at the end of phase 4, never mutated
//! incrementally elsewhere.

use indexmap::IndexMap;
use serde_derive::Serialize;
use thiserror::Error;

use crate::{
	cachekey::{compute_source_cache_keys, CacheKeyComputer},
	morphology::Morphology,
	source::{SourceKey, SourcePool},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
	#[error("stratum `{stratum}` source `{chunk_morph}` has no artifact named `{requested_name}`")]
	UndefinedChunkArtifact { stratum: String, chunk_morph: String, requested_name: String },

	#[error("mutual dependency between `{a}` and `{b}`")]
	MutualDependency { a: String, b: String },

	#[error("stratum `{stratum}` source `{source_name}` depends on `{dependency_name}`, which appears later in the same stratum")]
	DependencyOrder { stratum: String, source_name: String, dependency_name: String },

	#[error("stratum `{stratum}` source `{source_name}` has a `build-depends` field that is not a list of strings")]
	DependencyFormat { stratum: String, source_name: String },

	#[error("stratum `{stratum}` source `{source_name}` references unknown chunk source `{repo}:{reference}:{morph}`")]
	UnknownChunkSource { stratum: String, source_name: String, repo: String, reference: String, morph: String },

	#[error("stratum `{stratum}` build-depends on unknown stratum `{dependency}`")]
	UnknownStratum { stratum: String, dependency: String },

	#[error("system `{system}` references unknown stratum `{stratum}`")]
	UnknownSystemStratum { system: String, stratum: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(usize);

#[derive(Debug, Clone)]
struct ArtifactNode {
	name: String,
	source_key: SourceKey,
	cache_key: String,
	dependencies: Vec<ArtifactId>,
	dependents: Vec<ArtifactId>,
}

/// A lightweight, cloneable reference to an artifact — enough to identify it
/// without exposing raw arena indices or forcing unbounded deep clones of
/// the whole dependency subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactRef {
	pub name: String,
	pub source_key: SourceKey,
}

/// The public, resolved view of an artifact. Dependency/dependent edges are
/// cloned out of the arena as [`ArtifactRef`]s; callers never see raw
/// indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
	pub name: String,
	pub source_key: SourceKey,
	pub cache_key: String,
	pub dependencies: Vec<ArtifactRef>,
	pub dependents: Vec<ArtifactRef>,
}

struct Arena {
	nodes: Vec<ArtifactNode>,
	by_source_and_name: IndexMap<(SourceKey, String), ArtifactId>,
}

impl Arena {
	fn new() -> Self {
		Self { nodes: Vec::new(), by_source_and_name: IndexMap::new() }
	}

	fn get_or_create(&mut self, source_key: &SourceKey, name: &str, cache_key: &str) -> ArtifactId {
		let lookup_key = (source_key.clone(), name.to_owned());
		if let Some(&id) = self.by_source_and_name.get(&lookup_key) {
			return id;
		}
		let id = ArtifactId(self.nodes.len());
		self.nodes.push(ArtifactNode {
			name: name.to_owned(),
			source_key: source_key.clone(),
			cache_key: cache_key.to_owned(),
			dependencies: Vec::new(),
			dependents: Vec::new(),
		});
		self.by_source_and_name.insert(lookup_key, id);
		id
	}

	fn node(&self, id: ArtifactId) -> &ArtifactNode {
		&self.nodes[id.0]
	}

	fn node_mut(&mut self, id: ArtifactId) -> &mut ArtifactNode {
		&mut self.nodes[id.0]
	}

	fn add_dependency(&mut self, from: ArtifactId, to: ArtifactId) {
		if from == to {
			// Self-loops are the documented legal case of a chunk listed twice in
			// a stratum, the second entry depending on the first; silently drop.
			return;
		}
		let deps = &mut self.node_mut(from).dependencies;
		if !deps.contains(&to) {
			deps.push(to);
		}
	}
}

/// Validates a stratum source entry's raw `build-depends` value and turns it
/// into a list of sibling names, or raises `DependencyFormat` if it's present
/// but not a list of strings. The loader deliberately leaves this value
/// untyped (`serde_json::Value`) so this validation — and its error kind —
/// belongs to the resolver, not to parsing.
fn parse_build_depends(stratum: &str, source_name: &str, raw: Option<&serde_json::Value>) -> Result<Option<Vec<String>>, ResolverError> {
	let Some(value) = raw else { return Ok(None) };
	let bad = || ResolverError::DependencyFormat { stratum: stratum.to_owned(), source_name: source_name.to_owned() };
	let items = value.as_array().ok_or_else(bad)?;
	let names = items.iter().map(|item| item.as_str().map(str::to_owned).ok_or_else(bad)).collect::<Result<Vec<_>, _>>()?;
	Ok(Some(names))
}

/// Takes a frozen source pool and emits an ordered sequence of artifact
/// nodes with `dependencies`/`dependents` edges populated, or the first
/// structural error encountered.
pub fn resolve_artifacts(pool: &SourcePool, computer: &dyn CacheKeyComputer) -> Result<Vec<Artifact>, ResolverError> {
	let cache_keys = compute_source_cache_keys(pool, computer);
	let mut arena = Arena::new();
	let mut creation_order: Vec<ArtifactId> = Vec::new();

	// Phase 1: per-source artifact creation. Chunk artifacts with a declared
	// `chunks` mapping are materialized lazily as Phase 2 references them;
	// everything else is created eagerly here, in pool insertion order.
	for source in pool.iter() {
		let key = source.key();
		let cache_key = cache_keys.get(&key).cloned().unwrap_or_default();
		match &source.morphology {
			Morphology::System(s) => {
				let id = arena.get_or_create(&key, &s.name, &cache_key);
				creation_order.push(id);
			},
			Morphology::Stratum(s) => {
				let id = arena.get_or_create(&key, &s.name, &cache_key);
				creation_order.push(id);
			},
			Morphology::Chunk(c) => {
				if c.chunks.is_none() {
					let id = arena.get_or_create(&key, &c.name, &cache_key);
					creation_order.push(id);
				}
				// Non-empty `chunks` mappings are materialized on first reference
				// in Phase 2.
			},
		}
	}

	// Phase 2: stratum resolution.
	let mut stratum_chunk_ids: std::collections::HashMap<SourceKey, Vec<ArtifactId>> = std::collections::HashMap::new();
	for source in pool.iter() {
		let Morphology::Stratum(stratum) = &source.morphology else { continue };
		let stratum_key = source.key();
		let stratum_cache_key = cache_keys.get(&stratum_key).cloned().unwrap_or_default();
		let stratum_id = arena.get_or_create(&stratum_key, &stratum.name, &stratum_cache_key);

		// entry name -> artifact id, in declaration order, for the implicit
		// sibling-ordering rule and for step 4's stratum-depends-on-all-chunks.
		let mut entry_artifacts: Vec<(String, ArtifactId)> = Vec::new();

		for entry in &stratum.sources {
			let chunk_source = pool.lookup(&entry.repo, &entry.reference, &entry.morph).ok_or_else(|| {
				ResolverError::UnknownChunkSource {
					stratum: stratum.name.clone(),
					source_name: entry.name.clone(),
					repo: entry.repo.clone(),
					reference: entry.reference.clone(),
					morph: entry.morph.clone(),
				}
			})?;
			let chunk_key = chunk_source.key();
			let Morphology::Chunk(chunk_morph) = &chunk_source.morphology else {
				return Err(ResolverError::UnknownChunkSource {
					stratum: stratum.name.clone(),
					source_name: entry.name.clone(),
					repo: entry.repo.clone(),
					reference: entry.reference.clone(),
					morph: entry.morph.clone(),
				});
			};

			match &chunk_morph.chunks {
				Some(mapping) if !mapping.contains_key(&entry.name) => {
					return Err(ResolverError::UndefinedChunkArtifact {
						stratum: stratum.name.clone(),
						chunk_morph: chunk_morph.name.clone(),
						requested_name: entry.name.clone(),
					})
				},
				// No `chunks` mapping at all: the chunk produces exactly one
				// artifact, named after the morphology itself.
				None if entry.name != chunk_morph.name => {
					return Err(ResolverError::UndefinedChunkArtifact {
						stratum: stratum.name.clone(),
						chunk_morph: chunk_morph.name.clone(),
						requested_name: entry.name.clone(),
					})
				},
				_ => {},
			}

			let chunk_cache_key = cache_keys.get(&chunk_key).cloned().unwrap_or_default();
			let chunk_id = arena.get_or_create(&chunk_key, &entry.name, &chunk_cache_key);

			entry_artifacts.push((entry.name.clone(), chunk_id));

			let build_depends = parse_build_depends(&stratum.name, &entry.name, entry.build_depends.as_ref())?;

			match build_depends {
				Some(list) => {
					for dep_name in &list {
						let Some(pos) = entry_artifacts.iter().position(|(n, _)| n == dep_name) else {
							return Err(ResolverError::DependencyOrder {
								stratum: stratum.name.clone(),
								source_name: entry.name.clone(),
								dependency_name: dep_name.clone(),
							});
						};
						// must be an earlier entry, not the one just pushed
						if pos + 1 >= entry_artifacts.len() {
							return Err(ResolverError::DependencyOrder {
								stratum: stratum.name.clone(),
								source_name: entry.name.clone(),
								dependency_name: dep_name.clone(),
							});
						}
						arena.add_dependency(chunk_id, entry_artifacts[pos].1);
					}
				},
				None => {
					// Implicit ordering: depends on every prior sibling chunk
					// artifact. `add_dependency` itself drops true self-loops
					// (the same artifact id, i.e. the same chunk name from the
					// same source listed twice in a row).
					for (_, prior_id) in &entry_artifacts[..entry_artifacts.len() - 1] {
						arena.add_dependency(chunk_id, *prior_id);
					}
				},
			}
		}

		// step 4: stratum artifact depends on every chunk artifact produced by
		// this stratum's sources, in declaration order.
		for (_, chunk_id) in &entry_artifacts {
			arena.add_dependency(stratum_id, *chunk_id);
		}
		stratum_chunk_ids.insert(stratum_key.clone(), entry_artifacts.iter().map(|(_, id)| *id).collect());

		// step 5: this stratum's own build-depends strata become dependencies
		// of both the stratum artifact and every chunk artifact it produced.
		for dep_name in &stratum.build_depends {
			let dep_source = pool
				.iter()
				.find(|s| matches!(&s.morphology, Morphology::Stratum(d) if d.name == *dep_name))
				.ok_or_else(|| ResolverError::UnknownStratum { stratum: stratum.name.clone(), dependency: dep_name.clone() })?;
			let dep_key = dep_source.key();
			let Morphology::Stratum(dep_stratum) = &dep_source.morphology else { unreachable!() };
			let dep_cache_key = cache_keys.get(&dep_key).cloned().unwrap_or_default();
			let dep_stratum_id = arena.get_or_create(&dep_key, &dep_stratum.name, &dep_cache_key);

			arena.add_dependency(stratum_id, dep_stratum_id);
			for (_, chunk_id) in &entry_artifacts {
				arena.add_dependency(*chunk_id, dep_stratum_id);
			}
		}
	}

	// Phase 3: system resolution.
	for source in pool.iter() {
		let Morphology::System(system) = &source.morphology else { continue };
		let system_key = source.key();
		let system_cache_key = cache_keys.get(&system_key).cloned().unwrap_or_default();
		let system_id = arena.get_or_create(&system_key, &system.name, &system_cache_key);

		for stratum_name in &system.strata {
			let stratum_source = pool
				.iter()
				.find(|s| matches!(&s.morphology, Morphology::Stratum(d) if d.name == *stratum_name))
				.ok_or_else(|| ResolverError::UnknownSystemStratum { system: system.name.clone(), stratum: stratum_name.clone() })?;
			let stratum_key = stratum_source.key();
			let Morphology::Stratum(stratum) = &stratum_source.morphology else { unreachable!() };
			let stratum_cache_key = cache_keys.get(&stratum_key).cloned().unwrap_or_default();
			let stratum_id = arena.get_or_create(&stratum_key, &stratum.name, &stratum_cache_key);

			arena.add_dependency(system_id, stratum_id);
			// and all its chunk artifacts, directly (not merely transitively
			// through the stratum artifact).
			if let Some(chunk_ids) = stratum_chunk_ids.get(&stratum_key) {
				for &chunk_id in chunk_ids {
					arena.add_dependency(system_id, chunk_id);
				}
			}
		}
	}

	// any artifact materialized lazily during phases 2/3 but not seen during
	// phase 1's eager walk still needs to be present in creation_order.
	for (_, &id) in &arena.by_source_and_name {
		if !creation_order.contains(&id) {
			creation_order.push(id);
		}
	}

	// Phase 4: validation (cycle detection) & dependents linkage.
	detect_cycles(&arena)?;

	let all_ids: Vec<ArtifactId> = (0..arena.nodes.len()).map(ArtifactId).collect();
	for &id in &all_ids {
		let deps = arena.node(id).dependencies.clone();
		for dep in deps {
			let dependents = &mut arena.node_mut(dep).dependents;
			if !dependents.contains(&id) {
				dependents.push(id);
			}
		}
	}

	// Output order: creation order, each artifact after whatever first
	// referenced it. Dependencies do not necessarily precede their
	// dependents here — a stratum created eagerly in phase 1 still precedes
	// chunk artifacts its own sources materialize lazily in phase 2.
	let mut seen = std::collections::HashSet::new();
	let mut ordered_ids = Vec::new();
	for id in creation_order {
		if seen.insert(id) {
			ordered_ids.push(id);
		}
	}

	Ok(ordered_ids.into_iter().map(|id| to_public(&arena, id)).collect())
}

fn to_public(arena: &Arena, id: ArtifactId) -> Artifact {
	let node = arena.node(id);
	Artifact {
		name: node.name.clone(),
		source_key: node.source_key.clone(),
		cache_key: node.cache_key.clone(),
		dependencies: node.dependencies.iter().map(|&d| artifact_ref(arena, d)).collect(),
		dependents: node.dependents.iter().map(|&d| artifact_ref(arena, d)).collect(),
	}
}

fn artifact_ref(arena: &Arena, id: ArtifactId) -> ArtifactRef {
	let node = arena.node(id);
	ArtifactRef { name: node.name.clone(), source_key: node.source_key.clone() }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
	White,
	Grey,
	Black,
}

fn detect_cycles(arena: &Arena) -> Result<(), ResolverError> {
	let mut marks = vec![Mark::White; arena.nodes.len()];

	fn visit(arena: &Arena, id: ArtifactId, marks: &mut [Mark]) -> Result<(), ResolverError> {
		match marks[id.0] {
			Mark::Black => return Ok(()),
			Mark::Grey => unreachable!("grey re-entry handled by caller"),
			Mark::White => {},
		}
		marks[id.0] = Mark::Grey;
		for &dep in &arena.node(id).dependencies {
			match marks[dep.0] {
				Mark::Grey => {
					return Err(ResolverError::MutualDependency { a: arena.node(id).name.clone(), b: arena.node(dep).name.clone() })
				},
				Mark::Black => continue,
				Mark::White => visit(arena, dep, marks)?,
			}
		}
		marks[id.0] = Mark::Black;
		Ok(())
	}

	for id in (0..arena.nodes.len()).map(ArtifactId) {
		if marks[id.0] == Mark::White {
			visit(arena, id, &mut marks)?;
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{cachekey::Sha512CacheKeyComputer, morphology::*, source::Source};

	fn chunk(name: &str, chunks: Option<IndexMap<String, Vec<String>>>) -> Source {
		Source {
			repo: "upstream".into(),
			original_ref: "master".into(),
			filename: format!("{name}.morph"),
			sha1: format!("sha-{name}"),
			morphology: Morphology::Chunk(ChunkMorphology {
				name: name.into(),
				description: None,
				chunks,
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

	fn stratum(name: &str, build_depends: Vec<String>, sources: Vec<StratumSourceEntry>) -> Source {
		Source {
			repo: "upstream".into(),
			original_ref: "master".into(),
			filename: format!("{name}.morph"),
			sha1: format!("sha-{name}"),
			morphology: Morphology::Stratum(StratumMorphology { name: name.into(), description: None, build_depends, sources }),
			prefix: "/usr".into(),
		}
	}

	fn entry(name: &str, morph: &str, build_depends: Option<Vec<String>>) -> StratumSourceEntry {
		StratumSourceEntry {
			name: name.into(),
			morph: format!("{morph}.morph"),
			repo: "upstream".into(),
			reference: "master".into(),
			build_depends: build_depends.map(|names| serde_json::json!(names)),
		}
	}

	fn system(name: &str, strata: Vec<String>) -> Source {
		Source {
			repo: "upstream".into(),
			original_ref: "master".into(),
			filename: format!("{name}.morph"),
			sha1: format!("sha-{name}"),
			morphology: Morphology::System(SystemMorphology { name: name.into(), description: None, strata, arch: "x86_64".into() }),
			prefix: "/usr".into(),
		}
	}

	#[test]
	fn s1_empty_pool() {
		let pool = SourcePool::new();
		let result = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap();
		assert!(result.is_empty());
	}

	#[test]
	fn s2_single_chunk_no_subartifacts() {
		let mut pool = SourcePool::new();
		pool.add(chunk("chunk", None));
		let result = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap();
		assert_eq!(result.len(), 1);
		assert_eq!(result[0].name, "chunk");
		assert!(result[0].dependencies.is_empty());
		assert!(result[0].dependents.is_empty());
		assert!(!result[0].cache_key.is_empty());
	}

	#[test]
	fn s3_chunk_with_two_subartifacts() {
		let mut pool = SourcePool::new();
		let mut mapping = IndexMap::new();
		mapping.insert("chunk-devel".to_owned(), vec!["chunk-devel".to_owned()]);
		mapping.insert("chunk-runtime".to_owned(), vec!["chunk-runtime".to_owned()]);
		pool.add(chunk("chunk", Some(mapping)));
		pool.add(stratum(
			"stratum",
			vec![],
			vec![entry("chunk-devel", "chunk", None), entry("chunk-runtime", "chunk", None)],
		));

		let result = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap();
		assert_eq!(result.len(), 3);

		let by_name = |name: &str| result.iter().find(|a| a.name == name).unwrap();
		let stratum_artifact = by_name("stratum");
		assert_eq!(stratum_artifact.dependencies.len(), 2);
		let runtime = by_name("chunk-runtime");
		assert_eq!(runtime.dependencies.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(), vec!["chunk-devel"]);
		let devel = by_name("chunk-devel");
		assert!(devel.dependencies.is_empty());
	}

	#[test]
	fn s4_invalid_artifact_reference() {
		let mut pool = SourcePool::new();
		pool.add(chunk("chunk", None));
		pool.add(stratum("stratum", vec![], vec![entry("chunk-runtime", "chunk", None)]));
		let err = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap_err();
		assert!(matches!(err, ResolverError::UndefinedChunkArtifact { .. }));
	}

	#[test]
	fn s5_mutual_dependency_between_strata() {
		let mut pool = SourcePool::new();
		pool.add(stratum("a", vec!["b".into()], vec![]));
		pool.add(stratum("b", vec!["a".into()], vec![]));
		let err = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap_err();
		assert!(matches!(err, ResolverError::MutualDependency { .. }));
	}

	#[test]
	fn s6_self_dependency_of_a_chunk() {
		let mut pool = SourcePool::new();
		pool.add(chunk("chunk", None));
		pool.add(stratum(
			"stratum",
			vec![],
			vec![
				entry("chunk", "chunk", None),
				entry("chunk", "chunk", None),
				entry("chunk", "chunk", Some(vec!["chunk".into()])),
			],
		));
		let result = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap();
		assert_eq!(result.len(), 2);
		let by_name = |name: &str| result.iter().find(|a| a.name == name).unwrap();
		assert!(by_name("chunk").dependencies.is_empty());
		assert_eq!(by_name("stratum").dependencies.len(), 1);
	}

	#[test]
	fn dependency_order_error_on_forward_reference() {
		let mut pool = SourcePool::new();
		pool.add(chunk("a", None));
		pool.add(chunk("b", None));
		pool.add(stratum("s", vec![], vec![entry("a", "a", Some(vec!["b".into()])), entry("b", "b", None)]));
		let err = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap_err();
		assert!(matches!(err, ResolverError::DependencyOrder { .. }));
	}

	#[test]
	fn invariant_edges_are_symmetric() {
		let mut pool = SourcePool::new();
		pool.add(chunk("a", None));
		pool.add(stratum("s", vec![], vec![entry("a", "a", None)]));
		let result = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap();
		for a in &result {
			for dep in &a.dependencies {
				let dep_artifact = result.iter().find(|x| x.name == dep.name && x.source_key == dep.source_key).unwrap();
				assert!(dep_artifact.dependents.iter().any(|d| d.name == a.name && d.source_key == a.source_key));
			}
		}
	}

	#[test]
	fn s3_output_order_matches_creation_order_not_topological_order() {
		// stratum is created eagerly in phase 1 (pool order); chunk-devel and
		// chunk-runtime are materialized lazily in phase 2 while resolving the
		// stratum's sources. Output order must reflect that creation order —
		// [stratum, chunk-devel, chunk-runtime] — even though the stratum
		// depends on both chunk artifacts and so would come *last* under a
		// dependency-first topological walk.
		let mut mapping = IndexMap::new();
		mapping.insert("chunk-devel".to_owned(), vec!["chunk-devel".to_owned()]);
		mapping.insert("chunk-runtime".to_owned(), vec!["chunk-runtime".to_owned()]);
		let mut pool = SourcePool::new();
		pool.add(chunk("chunk", Some(mapping)));
		pool.add(stratum(
			"stratum",
			vec![],
			vec![entry("chunk-devel", "chunk", None), entry("chunk-runtime", "chunk", None)],
		));
		let result = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap();
		assert_eq!(result.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(), vec!["stratum", "chunk-devel", "chunk-runtime"]);
	}

	#[test]
	fn unknown_chunk_source_reference() {
		let mut pool = SourcePool::new();
		pool.add(stratum("stratum", vec![], vec![entry("missing", "missing", None)]));
		let err = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap_err();
		assert!(matches!(err, ResolverError::UnknownChunkSource { .. }));
	}

	#[test]
	fn unknown_stratum_build_dependency() {
		let mut pool = SourcePool::new();
		pool.add(stratum("a", vec!["nonexistent".into()], vec![]));
		let err = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap_err();
		assert!(matches!(err, ResolverError::UnknownStratum { .. }));
	}

	#[test]
	fn unknown_system_stratum_reference() {
		let mut pool = SourcePool::new();
		pool.add(system("sys", vec!["nonexistent".into()]));
		let err = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap_err();
		assert!(matches!(err, ResolverError::UnknownSystemStratum { .. }));
	}

	#[test]
	fn malformed_build_depends_is_a_dependency_format_error() {
		let mut pool = SourcePool::new();
		pool.add(chunk("a", None));
		let mut malformed = stratum("s", vec![], vec![]);
		let Morphology::Stratum(s) = &mut malformed.morphology else { unreachable!() };
		s.sources.push(StratumSourceEntry {
			name: "a".into(),
			morph: "a.morph".into(),
			repo: "upstream".into(),
			reference: "master".into(),
			build_depends: Some(serde_json::json!("not-a-list")),
		});
		pool.add(malformed);
		let err = resolve_artifacts(&pool, &Sha512CacheKeyComputer).unwrap_err();
		assert!(matches!(err, ResolverError::DependencyFormat { .. }));
	}
}
