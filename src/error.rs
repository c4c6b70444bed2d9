//! The crate-wide error enum. Library code (the morphology model, resolver,
//! planner) returns its own component-specific error type; only the CLI
//! binary collapses everything into a `color_eyre::Report` at the binary
//! boundary.

use thiserror::Error;

use crate::{morphology::MorphologyError, partition::PlannerError, resolver::ResolverError};

#[derive(Error, Debug)]
pub enum KatsuError {
	#[error(transparent)]
	Morphology(#[from] MorphologyError),

	#[error(transparent)]
	Resolver(#[from] ResolverError),

	#[error(transparent)]
	Planner(#[from] PlannerError),

	#[error("failed to read {path}: {source}")]
	Io { path: String, #[source] source: std::io::Error },

	#[error("failed to parse {path} as YAML: {source}")]
	Yaml { path: String, #[source] source: serde_yaml::Error },
}
