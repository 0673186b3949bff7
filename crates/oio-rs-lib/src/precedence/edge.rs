use std::collections::BTreeMap;

use chrono::NaiveDateTime;

const SECONDS_PER_DAY: i64 = 86_400;

/// Day number since the unix epoch of the game's release, 2002-05-01 12:00:00.
const RELEASE_DAY: i64 = 11_808;

/// Whole days between the release date and `modified`.
///
/// Anything at or before the release date, zeroed dates included, maps to `RELEASE_DAY - 1`
/// so the offset stays positive and such files weigh as very recent ones.
pub fn day_offset(modified: NaiveDateTime) -> i64 {
	let day = modified.and_utc().timestamp().div_euclid(SECONDS_PER_DAY);
	if day <= RELEASE_DAY { RELEASE_DAY - 1 } else { day - RELEASE_DAY }
}

/// The two versions of one file as seen from an edge `A -> B`: `.0` belongs to `A`, `.1` to `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOverlap {
	pub sizes: (u64, u64),
	pub days: (i64, i64),
}

impl FileOverlap {
	pub fn new(sizes: (u64, u64), modified: (NaiveDateTime, NaiveDateTime)) -> Self {
		Self {
			sizes,
			days: (day_offset(modified.0), day_offset(modified.1)),
		}
	}
}

/// Similarity ratios of an edge, one per criterion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratios {
	pub size: f64,
	pub mtime: f64,
	pub file_count: f64,
}

impl Default for Ratios {
	fn default() -> Self {
		Self { size: 1.0, mtime: 1.0, file_count: 1.0 }
	}
}

/// Edge `A -> B`: `A` is installed after `B`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrecedenceEdge {
	pub(crate) files: BTreeMap<String, FileOverlap>,
	pub(crate) ratios: Ratios,
	/// Set once directions are resolved.
	pub(crate) score: Option<f64>,
	/// Only meaningful while breaking cycles.
	pub(crate) weight: u64,
	/// The direction comes from a configured precedence rather than the score.
	pub(crate) forced: bool,
	/// Discarded to break a cycle, kept for reporting only.
	pub(crate) removed: bool,
}

impl PrecedenceEdge {
	/// Conflicting files shared by both archives, by filename.
	pub fn files(&self) -> &BTreeMap<String, FileOverlap> {
		&self.files
	}

	pub fn ratios(&self) -> &Ratios {
		&self.ratios
	}

	pub fn score(&self) -> Option<f64> {
		self.score
	}

	pub fn weight(&self) -> u64 {
		self.weight
	}

	pub fn is_forced(&self) -> bool {
		self.forced
	}

	pub fn is_removed(&self) -> bool {
		self.removed
	}
}
