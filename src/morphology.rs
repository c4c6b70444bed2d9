//! Typed representation of chunk / stratum / system morphology documents.
//!
//! Mirrors a load-then-validate split: a raw, mostly-optional
//! [`MorphologyDocument`] is deserialized first, then [`Morphology::from_document`]
//! validates it into one of the three kind-specific shapes.

use std::{fs, path::Path};

use indexmap::IndexMap;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MorphologyError {
	#[error("failed to read morphology file {path}: {source}")]
	Io { path: String, #[source] source: std::io::Error },

	#[error("failed to parse morphology document: {source}")]
	Parse { #[source] source: Box<dyn std::error::Error + Send + Sync> },

	#[error("morphology is missing required field `{field}`")]
	MissingField { field: &'static str },

	#[error("morphology name must not be empty")]
	EmptyName,

	#[error("`{parent}` has no child named `{child}`")]
	ChildNotFound { parent: String, child: String },
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
	Chunk,
	Stratum,
	System,
}

/// The raw, mostly-optional deserialized form of a morphology document: a plain
/// deserialized struct that a `load()` associated function turns into validated
/// types.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct MorphologyDocument {
	pub name: Option<String>,
	pub kind: Option<Kind>,
	pub description: Option<String>,

	// chunk fields
	#[serde(default)]
	pub chunks: Option<IndexMap<String, Vec<String>>>,
	#[serde(default)]
	pub configure_commands: Option<Vec<String>>,
	#[serde(default)]
	pub build_commands: Option<Vec<String>>,
	#[serde(default)]
	pub test_commands: Option<Vec<String>>,
	#[serde(default)]
	pub install_commands: Option<Vec<String>>,
	#[serde(default)]
	pub build_system: Option<String>,
	#[serde(default)]
	pub max_jobs: Option<u32>,

	// stratum fields
	#[serde(default)]
	pub build_depends: Option<Vec<String>>,
	#[serde(default)]
	pub sources: Option<Vec<StratumSourceEntry>>,

	// system fields
	#[serde(default)]
	pub strata: Option<Vec<String>>,
	#[serde(default)]
	pub arch: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StratumSourceEntry {
	pub name: String,
	pub morph: String,
	pub repo: String,
	#[serde(rename = "ref")]
	pub reference: String,
	/// Kept as a raw value, not `Option<Vec<String>>`: the resolver, not this
	/// loader, is responsible for rejecting a `build-depends` that isn't a
	/// list of strings (`ResolverError::DependencyFormat`). Absent (not
	/// merely empty) has different semantics than an empty list; see the
	/// implicit-sibling-ordering rule in the resolver.
	#[serde(default)]
	pub build_depends: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChunkMorphology {
	pub name: String,
	pub description: Option<String>,
	pub chunks: Option<IndexMap<String, Vec<String>>>,
	pub configure_commands: Option<Vec<String>>,
	pub build_commands: Option<Vec<String>>,
	pub test_commands: Option<Vec<String>>,
	pub install_commands: Option<Vec<String>>,
	pub build_system: Option<String>,
	pub max_jobs: Option<u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StratumMorphology {
	pub name: String,
	pub description: Option<String>,
	pub build_depends: Vec<String>,
	pub sources: Vec<StratumSourceEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SystemMorphology {
	pub name: String,
	pub description: Option<String>,
	pub strata: Vec<String>,
	pub arch: String,
}

/// A validated morphology: a tagged variant, not a class hierarchy.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum Morphology {
	Chunk(ChunkMorphology),
	Stratum(StratumMorphology),
	System(SystemMorphology),
}

/// A resolved child reference returned by [`Morphology::lookup_child_by_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child<'a> {
	StratumName(&'a str),
	Source(&'a StratumSourceEntry),
}

impl Morphology {
	pub fn name(&self) -> &str {
		match self {
			Self::Chunk(c) => &c.name,
			Self::Stratum(s) => &s.name,
			Self::System(s) => &s.name,
		}
	}

	pub fn kind(&self) -> Kind {
		match self {
			Self::Chunk(_) => Kind::Chunk,
			Self::Stratum(_) => Kind::Stratum,
			Self::System(_) => Kind::System,
		}
	}

	/// Reads `path`, dispatching on extension (`.json` → `serde_json`, anything
	/// else including the conventional `.morph` suffix → `serde_yaml`).
	pub fn load(path: &Path) -> Result<Self, MorphologyError> {
		let text = fs::read_to_string(path)
			.map_err(|source| MorphologyError::Io { path: path.display().to_string(), source })?;

		let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
		if !is_json {
			if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
				if ext != "morph" && ext != "yaml" && ext != "yml" {
					tracing::warn!(path = %path.display(), ext, "unknown file extension for morphology; trying to parse as YAML");
				}
			} else {
				tracing::warn!(path = %path.display(), "morphology file has no extension; trying to parse as YAML");
			}
		}

		Self::parse(&text, is_json)
	}

	/// Parses morphology document text. `json` selects `serde_json`; otherwise
	/// `serde_yaml` is used.
	pub fn parse(text: &str, json: bool) -> Result<Self, MorphologyError> {
		let doc: MorphologyDocument = if json {
			serde_json::from_str(text).map_err(|source| MorphologyError::Parse { source: Box::new(source) })?
		} else {
			serde_yaml::from_str(text).map_err(|source| MorphologyError::Parse { source: Box::new(source) })?
		};
		Self::from_document(doc)
	}

	pub fn from_document(doc: MorphologyDocument) -> Result<Self, MorphologyError> {
		let name = doc.name.ok_or(MorphologyError::MissingField { field: "name" })?;
		if name.trim().is_empty() {
			return Err(MorphologyError::EmptyName);
		}
		let kind = doc.kind.ok_or(MorphologyError::MissingField { field: "kind" })?;

		Ok(match kind {
			Kind::Chunk => Self::Chunk(ChunkMorphology {
				name,
				description: doc.description,
				chunks: doc.chunks,
				configure_commands: doc.configure_commands,
				build_commands: doc.build_commands,
				test_commands: doc.test_commands,
				install_commands: doc.install_commands,
				build_system: doc.build_system,
				max_jobs: doc.max_jobs,
			}),
			Kind::Stratum => Self::Stratum(StratumMorphology {
				name,
				description: doc.description,
				build_depends: doc.build_depends.unwrap_or_default(),
				sources: doc.sources.unwrap_or_default(),
			}),
			Kind::System => Self::System(SystemMorphology {
				name,
				description: doc.description,
				strata: doc.strata.ok_or(MorphologyError::MissingField { field: "strata" })?,
				arch: doc.arch.ok_or(MorphologyError::MissingField { field: "arch" })?,
			}),
		})
	}

	/// For systems searches `strata`, for strata searches `sources`.
	pub fn lookup_child_by_name(&self, name: &str) -> Result<Child<'_>, MorphologyError> {
		match self {
			Self::System(s) => s
				.strata
				.iter()
				.find(|n| n.as_str() == name)
				.map(|n| Child::StratumName(n))
				.ok_or_else(|| MorphologyError::ChildNotFound { parent: s.name.clone(), child: name.to_owned() }),
			Self::Stratum(s) => s
				.sources
				.iter()
				.find(|entry| entry.name == name)
				.map(Child::Source)
				.ok_or_else(|| MorphologyError::ChildNotFound { parent: s.name.clone(), child: name.to_owned() }),
			Self::Chunk(c) => Err(MorphologyError::ChildNotFound { parent: c.name.clone(), child: name.to_owned() }),
		}
	}

	/// Yields the set of populated top-level fields, used by writers that
	/// persist morphologies.
	pub fn keys(&self) -> Vec<&'static str> {
		let mut out = vec!["name", "kind"];
		match self {
			Self::Chunk(c) => {
				if c.description.is_some() {
					out.push("description");
				}
				if c.chunks.is_some() {
					out.push("chunks");
				}
				if c.configure_commands.is_some() {
					out.push("configure-commands");
				}
				if c.build_commands.is_some() {
					out.push("build-commands");
				}
				if c.test_commands.is_some() {
					out.push("test-commands");
				}
				if c.install_commands.is_some() {
					out.push("install-commands");
				}
				if c.build_system.is_some() {
					out.push("build-system");
				}
				if c.max_jobs.is_some() {
					out.push("max-jobs");
				}
			},
			Self::Stratum(s) => {
				if s.description.is_some() {
					out.push("description");
				}
				out.push("build-depends");
				out.push("sources");
			},
			Self::System(s) => {
				if s.description.is_some() {
					out.push("description");
				}
				out.push("strata");
				out.push("arch");
			},
		}
		out
	}
}
