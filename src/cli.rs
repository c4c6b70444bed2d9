//! The `katsu-graph` CLI front-end: a thin consumer of the library, built as
//! a declarative `clap`-derive struct. Not part of the library's contract —
//! the only place in the crate that touches the filesystem or stdout/stderr
//! besides `Morphology::load`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result, Section};
use sha2::{Digest, Sha512};
use tracing::info;

use morphgraph::{
	cachekey::Sha512CacheKeyComputer,
	morphology::Morphology,
	partition::{self, PartitionDocument},
	resolver::resolve_artifacts,
	source::{Source, SourcePool},
	KatsuError,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct KatsuGraphCli {
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Resolve a set of morphology files into an ordered artifact graph.
	Resolve {
		/// Morphology files (chunk/stratum/system), in any order.
		morphologies: Vec<PathBuf>,

		/// Print the resolved graph as JSON instead of a human-readable list.
		#[arg(long)]
		json: bool,
	},
	/// Resolve a partition document into a fully laid-out plan.
	PlanPartitions {
		/// Partition document (YAML).
		document: PathBuf,

		/// Target disk size, e.g. `4g`.
		#[arg(long)]
		disk_size: String,

		/// Physical sector size in bytes.
		#[arg(long, default_value_t = 512)]
		sector_size: u64,

		/// Print the resolved plan as JSON instead of a human-readable table.
		#[arg(long)]
		json: bool,
	},
}

pub fn run(cli: KatsuGraphCli) -> Result<()> {
	match cli.command {
		Command::Resolve { morphologies, json } => resolve_command(&morphologies, json),
		Command::PlanPartitions { document, disk_size, sector_size, json } => plan_partitions_command(&document, &disk_size, sector_size, json),
	}
}

fn resolve_command(paths: &[PathBuf], json: bool) -> Result<()> {
	let mut pool = SourcePool::new();
	for path in paths {
		info!(path = %path.display(), "loading morphology");
		let morphology = Morphology::load(path).map_err(KatsuError::from)?;
		let content = std::fs::read(path).map_err(|source| KatsuError::Io { path: path.display().to_string(), source })?;
		let sha1 = hex::encode(Sha512::digest(&content));
		let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
		pool.add(Source { repo: "local".into(), original_ref: "workdir".into(), filename, sha1, morphology, prefix: "/".into() });
	}

	let artifacts = resolve_artifacts(&pool, &Sha512CacheKeyComputer)
		.map_err(|e| eyre!(KatsuError::from(e)).note("the artifact graph could not be resolved"))?;

	if json {
		println!("{}", serde_json::to_string_pretty(&artifacts)?);
	} else {
		for artifact in &artifacts {
			println!("{} [{}]", artifact.name, &artifact.cache_key[..16.min(artifact.cache_key.len())]);
			for dep in &artifact.dependencies {
				println!("  depends on {}", dep.name);
			}
		}
	}
	Ok(())
}

fn plan_partitions_command(document_path: &PathBuf, disk_size: &str, sector_size: u64, json: bool) -> Result<()> {
	let text = std::fs::read_to_string(document_path)
		.map_err(|source| KatsuError::Io { path: document_path.display().to_string(), source })?;
	let doc: PartitionDocument = serde_yaml::from_str(&text)
		.map_err(|source| KatsuError::Yaml { path: document_path.display().to_string(), source })?;

	let disk_size_bytes =
		parse_disk_size(disk_size).ok_or_else(|| eyre!("invalid --disk-size `{disk_size}`").suggestion("use a size like `4g` or `512m`"))?;

	let resolved = partition::plan(&doc, disk_size_bytes, sector_size).map_err(|e| eyre!(KatsuError::from(e)))?;

	if json {
		println!("{}", serde_json::to_string_pretty(&resolved)?);
	} else {
		for part in &resolved.by_number {
			println!(
				"partition {}: sectors [{}, {}] format={} mountpoint={}",
				part.number,
				part.start,
				part.end,
				part.format,
				part.mountpoint.as_deref().unwrap_or("-"),
			);
		}
	}
	Ok(())
}

fn parse_disk_size(size: &str) -> Option<u64> {
	let trimmed = size.trim();
	let split_at = trimmed.find(|c: char| !c.is_ascii_digit())?;
	let (digits, suffix) = if split_at == trimmed.len() { (trimmed, "") } else { trimmed.split_at(split_at) };
	let value: u64 = digits.parse().ok()?;
	let factor: u64 = match suffix.to_lowercase().as_str() {
		"" => 1,
		"k" => 1024,
		"m" => 1024 * 1024,
		"g" => 1024 * 1024 * 1024,
		_ => return None,
	};
	value.checked_mul(factor)
}
