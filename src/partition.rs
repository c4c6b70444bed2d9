//! The partition planner: resolves a declarative disk-layout document into a
//! fully validated, sector-aligned partition plan.
//!
//! Document shape: size as `bytesize::ByteSize`, `mountpoint`, `filesystem`.
//! The GPT partition-type GUID table below is the canonical `PartitionType::uuid`
//! lookup, reused verbatim as the default GUID table.

use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

const ALIGNMENT_BYTES: u64 = 4096;
const MIN_START_BYTES: u64 = 1024 * 1024;
const GPT_TRAILING_RESERVE_BYTES: u64 = 16 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
	#[error("unknown partition table format `{0}`, expected dos, mbr, or gpt")]
	BadTableFormat(String),

	#[error("partition number {number} is out of range 1..={max} for format {format}")]
	BadPartitionNumber { number: u32, max: u32, format: String },

	#[error("explicit partition numbers are not allowed on gpt")]
	NumberNotAllowedOnGpt,

	#[error("duplicate partition number {0}")]
	DuplicateNumber(u32),

	#[error("duplicate mountpoint `{0}`")]
	DuplicateMountpoint(String),

	#[error("no partition declares mountpoint \"/\"")]
	NoRootMountpoint,

	#[error("more than one partition declares size: fill")]
	MultipleFill,

	#[error("fill partition would have non-positive size")]
	FillUnderflow,

	#[error("partition layout exceeds usable disk space")]
	Overflow,

	#[error("invalid size string `{0}`")]
	BadSize(String),

	#[error("start offset {0} bytes is below the required 1 MiB minimum")]
	MisalignedStart(u64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
	Dos,
	Mbr,
	Gpt,
}

impl std::str::FromStr for TableFormat {
	type Err = PlannerError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"dos" => Ok(Self::Dos),
			"mbr" => Ok(Self::Mbr),
			"gpt" => Ok(Self::Gpt),
			other => Err(PlannerError::BadTableFormat(other.to_owned())),
		}
	}
}

impl TableFormat {
	fn max_partitions(self) -> u32 {
		match self {
			Self::Dos | Self::Mbr => 4,
			Self::Gpt => 128,
		}
	}

	fn allows_explicit_number(self) -> bool {
		matches!(self, Self::Dos | Self::Mbr)
	}
}

/// A raw partition entry as it appears in the source document, before number
/// assignment and geometry resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionEntry {
	/// `"fill"` or a size string like `512m`.
	pub size: String,
	pub fdisk_type: String,
	pub format: String,
	pub mountpoint: Option<String>,
	#[serde(default)]
	pub boot: bool,
	pub number: Option<u32>,
	#[serde(default)]
	pub files: Vec<String>,
	#[serde(default)]
	pub raw_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionDocument {
	pub partition_table_format: String,
	pub start_offset: u64,
	pub partitions: Vec<PartitionEntry>,
}

/// A fully resolved partition record.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedPartition {
	pub number: u32,
	pub fdisk_type: String,
	pub format: String,
	pub size_bytes: u64,
	pub size_sectors: u64,
	pub start: u64,
	pub end: u64,
	pub boot: bool,
	pub mountpoint: Option<String>,
	pub files: Vec<String>,
	pub raw_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedPlan {
	pub partition_table_format: TableFormat,
	/// Declaration order (layout math relies on this).
	pub by_declaration: Vec<ResolvedPartition>,
	/// Ascending by `number` (on-disk table writers rely on this).
	pub by_number: Vec<ResolvedPartition>,
}

/// Parses a size string (`512m`, `2g`, a bare byte count), trying
/// `bytesize::ByteSize`'s own grammar first and falling back to the
/// one-digit-suffix shorthand disk-layout documents actually use.
fn parse_size_bytes(size: &str) -> Result<u64, PlannerError> {
	let bad = || PlannerError::BadSize(size.to_owned());
	let trimmed = size.trim();
	if trimmed.is_empty() {
		return Err(bad());
	}
	if let Ok(parsed) = trimmed.parse::<bytesize::ByteSize>() {
		return Ok(parsed.as_u64());
	}
	// bytesize wants a space or a full unit name (`512 MiB`); fall back to the
	// bare `<digits><k|m|g>` shorthand morphology documents actually use.
	if !trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
		return Err(bad());
	}
	let split_at = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
	let (digits, suffix) = trimmed.split_at(split_at);
	let value: u64 = digits.parse().map_err(|_| bad())?;
	let factor: u64 = match suffix.to_lowercase().as_str() {
		"" => 1,
		"k" => 1024,
		"m" => 1024 * 1024,
		"g" => 1024 * 1024 * 1024,
		_ => return Err(bad()),
	};
	value.checked_mul(factor).ok_or_else(bad)
}

fn align_up(value: u64, alignment: u64) -> u64 {
	let remainder = value % alignment;
	if remainder == 0 {
		value
	} else {
		value + (alignment - remainder)
	}
}

/// Resolves `doc` into a fully validated [`ResolvedPlan`]. Pure; performs no
/// I/O.
pub fn plan(doc: &PartitionDocument, disk_size_bytes: u64, sector_size_bytes: u64) -> Result<ResolvedPlan, PlannerError> {
	let format: TableFormat = doc.partition_table_format.parse()?;
	let max_partitions = format.max_partitions();

	// step 2: assign partition numbers.
	let mut requested: std::collections::HashSet<u32> = std::collections::HashSet::new();
	for entry in &doc.partitions {
		if let Some(number) = entry.number {
			if !format.allows_explicit_number() {
				return Err(PlannerError::NumberNotAllowedOnGpt);
			}
			if number == 0 || number > max_partitions {
				return Err(PlannerError::BadPartitionNumber { number, max: max_partitions, format: doc.partition_table_format.clone() });
			}
			if !requested.insert(number) {
				return Err(PlannerError::DuplicateNumber(number));
			}
		}
	}

	let mut used = requested.clone();
	let mut numbers = Vec::with_capacity(doc.partitions.len());
	for entry in &doc.partitions {
		let number = match entry.number {
			Some(n) => n,
			None => {
				let mut candidate = 1;
				while used.contains(&candidate) {
					candidate += 1;
				}
				if candidate > max_partitions {
					return Err(PlannerError::BadPartitionNumber { number: candidate, max: max_partitions, format: doc.partition_table_format.clone() });
				}
				used.insert(candidate);
				candidate
			},
		};
		numbers.push(number);
	}

	// step 3: normalize booleans and mountpoints.
	let mut seen_mountpoints: std::collections::HashSet<String> = std::collections::HashSet::new();
	let mut has_root = false;
	for entry in &doc.partitions {
		if let Some(mp) = &entry.mountpoint {
			if !seen_mountpoints.insert(mp.clone()) {
				return Err(PlannerError::DuplicateMountpoint(mp.clone()));
			}
			if mp == "/" {
				has_root = true;
			}
		}
	}
	if !has_root {
		return Err(PlannerError::NoRootMountpoint);
	}

	// step 4: geometry.
	let start = doc.start_offset.checked_mul(512).ok_or(PlannerError::Overflow)? / sector_size_bytes;
	let start_bytes = start.checked_mul(sector_size_bytes).ok_or(PlannerError::Overflow)?;
	if start_bytes < MIN_START_BYTES {
		return Err(PlannerError::MisalignedStart(start_bytes));
	}
	if start_bytes % ALIGNMENT_BYTES != 0 {
		tracing::warn!(start_bytes, "partition start offset is not 4 KiB aligned");
	}

	let trailing_reserve_sectors = match format {
		TableFormat::Gpt => (sector_size_bytes + GPT_TRAILING_RESERVE_BYTES).div_ceil(sector_size_bytes),
		TableFormat::Dos | TableFormat::Mbr => 0,
	};

	let disk_sectors = disk_size_bytes / sector_size_bytes;
	let total_usable = disk_sectors.checked_sub(start).and_then(|v| v.checked_sub(trailing_reserve_sectors)).ok_or(PlannerError::Overflow)?;

	// step 5 & 6: size resolution, at most one fill.
	let mut fill_index = None;
	let mut size_sectors = vec![0u64; doc.partitions.len()];
	let mut size_bytes = vec![0u64; doc.partitions.len()];
	let mut fixed_total = 0u64;

	for (i, entry) in doc.partitions.iter().enumerate() {
		if entry.size.trim() == "fill" {
			if fill_index.is_some() {
				return Err(PlannerError::MultipleFill);
			}
			fill_index = Some(i);
			continue;
		}
		let bytes = parse_size_bytes(&entry.size)?;
		let sectors = bytes.div_ceil(sector_size_bytes);
		let padded = align_up(sectors.checked_mul(sector_size_bytes).ok_or(PlannerError::Overflow)?, ALIGNMENT_BYTES) / sector_size_bytes;
		size_bytes[i] = bytes;
		size_sectors[i] = padded;
		fixed_total = fixed_total.checked_add(padded).ok_or(PlannerError::Overflow)?;
	}

	if let Some(i) = fill_index {
		let remaining = total_usable.checked_sub(fixed_total).ok_or(PlannerError::FillUnderflow)?;
		if remaining == 0 {
			return Err(PlannerError::FillUnderflow);
		}
		size_sectors[i] = remaining;
		size_bytes[i] = remaining.checked_mul(sector_size_bytes).ok_or(PlannerError::Overflow)?;
	}

	// step 7: layout, in declaration order.
	let mut cursor = start;
	let mut by_declaration = Vec::with_capacity(doc.partitions.len());
	for (i, entry) in doc.partitions.iter().enumerate() {
		let sectors = size_sectors[i];
		if sectors == 0 {
			return Err(PlannerError::FillUnderflow);
		}
		let partition_start = cursor;
		let partition_end = partition_start.checked_add(sectors).and_then(|v| v.checked_sub(1)).ok_or(PlannerError::Overflow)?;
		if partition_end > start.checked_add(total_usable).and_then(|v| v.checked_sub(1)).ok_or(PlannerError::Overflow)? {
			return Err(PlannerError::Overflow);
		}
		cursor = cursor.checked_add(sectors).ok_or(PlannerError::Overflow)?;

		by_declaration.push(ResolvedPartition {
			number: numbers[i],
			fdisk_type: entry.fdisk_type.clone(),
			format: entry.format.clone(),
			size_bytes: size_bytes[i],
			size_sectors: sectors,
			start: partition_start,
			end: partition_end,
			boot: entry.boot,
			mountpoint: entry.mountpoint.clone(),
			files: entry.files.clone(),
			raw_files: entry.raw_files.clone(),
		});
	}

	// step 8: emit, sorted by number for downstream table-writers.
	let mut by_number = by_declaration.clone();
	by_number.sort_unstable_by_key(|p| p.number);

	Ok(ResolvedPlan { partition_table_format: format, by_declaration, by_number })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(size: &str, mountpoint: Option<&str>) -> PartitionEntry {
		PartitionEntry {
			size: size.to_owned(),
			fdisk_type: "83".to_owned(),
			format: "ext4".to_owned(),
			mountpoint: mountpoint.map(ToOwned::to_owned),
			boot: false,
			number: None,
			files: vec![],
			raw_files: vec![],
		}
	}

	#[test]
	fn parses_size_strings() {
		assert_eq!(parse_size_bytes("512m").unwrap(), 512 * 1024 * 1024);
		assert_eq!(parse_size_bytes("2g").unwrap(), 2 * 1024 * 1024 * 1024);
		assert_eq!(parse_size_bytes("1024").unwrap(), 1024);
		assert!(parse_size_bytes("nope").is_err());
	}

	#[test]
	fn s7_mbr_three_partitions_with_fill() {
		let doc = PartitionDocument {
			partition_table_format: "mbr".to_owned(),
			start_offset: 2048,
			partitions: vec![
				entry("512m", Some("/boot")),
				entry("fill", Some("/")),
				entry("128m", Some("/var")),
			],
		};
		let resolved = plan(&doc, 4 * 1024 * 1024 * 1024, 512).unwrap();
		assert_eq!(resolved.by_declaration[0].start, 2048);
		assert_eq!(resolved.by_declaration[0].end, 2048 + (512 * 1024 * 1024 / 512) - 1);
		assert_eq!(resolved.by_declaration.iter().map(|p| p.number).collect::<Vec<_>>(), vec![1, 2, 3]);
		let total_usable = 4u64 * 1024 * 1024 * 1024 / 512 - 2048;
		let fixed = (512 * 1024 * 1024 / 512) + align_up(128 * 1024 * 1024, 4096) / 512;
		assert_eq!(resolved.by_declaration[1].size_sectors, total_usable - fixed);
	}

	#[test]
	fn s8_rejects_two_fill_partitions() {
		let doc = PartitionDocument {
			partition_table_format: "mbr".to_owned(),
			start_offset: 2048,
			partitions: vec![entry("fill", Some("/")), entry("fill", Some("/var"))],
		};
		let err = plan(&doc, 4 * 1024 * 1024 * 1024, 512).unwrap_err();
		assert_eq!(err, PlannerError::MultipleFill);
	}

	#[test]
	fn rejects_missing_root_mountpoint() {
		let doc = PartitionDocument {
			partition_table_format: "mbr".to_owned(),
			start_offset: 2048,
			partitions: vec![entry("512m", Some("/boot"))],
		};
		assert_eq!(plan(&doc, 4 * 1024 * 1024 * 1024, 512).unwrap_err(), PlannerError::NoRootMountpoint);
	}

	#[test]
	fn rejects_explicit_number_on_gpt() {
		let mut part = entry("512m", Some("/"));
		part.number = Some(1);
		let doc = PartitionDocument { partition_table_format: "gpt".to_owned(), start_offset: 2048, partitions: vec![part] };
		assert_eq!(plan(&doc, 4 * 1024 * 1024 * 1024, 512).unwrap_err(), PlannerError::NumberNotAllowedOnGpt);
	}

	#[test]
	fn rejects_duplicate_explicit_numbers() {
		let mut a = entry("512m", Some("/"));
		a.number = Some(1);
		let mut b = entry("128m", Some("/var"));
		b.number = Some(1);
		let doc = PartitionDocument { partition_table_format: "mbr".to_owned(), start_offset: 2048, partitions: vec![a, b] };
		assert_eq!(plan(&doc, 4 * 1024 * 1024 * 1024, 512).unwrap_err(), PlannerError::DuplicateNumber(1));
	}

	#[test]
	fn by_number_is_sorted_ascending() {
		let mut a = entry("512m", Some("/"));
		a.number = Some(2);
		let mut b = entry("128m", Some("/var"));
		b.number = Some(1);
		let doc = PartitionDocument { partition_table_format: "mbr".to_owned(), start_offset: 2048, partitions: vec![a, b] };
		let resolved = plan(&doc, 4 * 1024 * 1024 * 1024, 512).unwrap();
		assert_eq!(resolved.by_number.iter().map(|p| p.number).collect::<Vec<_>>(), vec![1, 2]);
		assert_eq!(resolved.by_declaration.iter().map(|p| p.number).collect::<Vec<_>>(), vec![2, 1]);
	}

	#[test]
	fn rejects_unknown_table_format() {
		let doc = PartitionDocument { partition_table_format: "zfs".to_owned(), start_offset: 2048, partitions: vec![] };
		assert!(matches!(plan(&doc, 1024 * 1024 * 1024, 512), Err(PlannerError::BadTableFormat(_))));
	}
}

/// GPT partition-type GUIDs, reused verbatim from the canonical
/// `PartitionType::uuid` table, typed as `uuid::Uuid` the same way a
/// `PartitionType::Guid` variant would carry one.
pub mod gpt_guid {
	use uuid::{uuid, Uuid};

	pub const ROOT_ARM64: Uuid = uuid!("b921b045-1df0-41c3-af44-4c6f280d3fae");
	pub const ROOT_X86_64: Uuid = uuid!("4f68bce3-e8cd-4db1-96e7-fbcaf984b709");
	pub const ESP: Uuid = uuid!("c12a7328-f81f-11d2-ba4b-00a0c93ec93b");
	pub const XBOOTLDR: Uuid = uuid!("bc13c2ff-59e6-4262-a352-b275fd6f7172");
	pub const SWAP: Uuid = uuid!("0657fd6d-a4ab-43c4-84e5-0933c84b4f4f");
	pub const LINUX_GENERIC: Uuid = uuid!("0fc63daf-8483-4772-8e79-3d69d8477de4");

	/// Resolves the root-partition GUID for `arch` (`x86_64` or `aarch64`).
	pub fn root_for_arch(arch: &str) -> Option<Uuid> {
		match arch {
			"x86_64" => Some(ROOT_X86_64),
			"aarch64" => Some(ROOT_ARM64),
			_ => None,
		}
	}
}
