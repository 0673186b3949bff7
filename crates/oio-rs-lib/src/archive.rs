//! # Archive inspection
//!
//! Lists the files contained in mod archives without extracting them.
//!
//! Listing is format specific and hidden behind [`ArchiveLister`], the rest of the crate only
//! sees the normalized [`FileEntry`] stream produced by [`EntryFilter`].
//!
//! | Format                 | Lister             | Hash              |
//! |------------------------|--------------------|-------------------|
//! | `.zip`                 | [`ZipLister`]      | CRC32 from zip    |
//! | `.tar` `.tar.gz` `.tgz`| [`TarLister`]      | sha256 of content |
//! | `.7z` `.rar`           | [`SevenZipLister`] | CRC from 7z       |

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

mod zip_lister;
pub use zip_lister::ZipLister;
mod tar_lister;
pub use tar_lister::TarLister;
mod sevenzip;
pub use sevenzip::SevenZipLister;
mod discovery;
pub use discovery::discover_archives;
pub use discovery::archive_id;

/// A single file as observed by the core: which archive holds it and what version of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
	pub archive: String,
	/// Lower-cased, `/` separated and relative to the archive's data root.
	pub filename: String,
	pub size: u64,
	pub modified: NaiveDateTime,
	pub hash: String,
}

/// A raw entry of an archive listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
	pub path: String,
	pub size: u64,
	pub modified: NaiveDateTime,
	pub hash: String,
	pub is_dir: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("zip error: {0}")]
	Zip(#[from] zip::result::ZipError),
	/// No lister is able to read this kind of archive.
	#[error("unsupported archive type.")]
	Unsupported,
	/// The archive needs an external tool which is not configured.
	#[error("no archive tool configured for this format.")]
	ToolMissing,
	#[error("archive tool failed: {0}")]
	ToolFailed(String),
	/// The listing ended before a required field of an entry.
	#[error("field `{0}` missing from listing, it may be truncated.")]
	MissingField(&'static str),
	#[error("field `{field}` has invalid value `{value}`.")]
	InvalidField {
		field: &'static str,
		value: String,
	},
}

pub trait ArchiveLister {
	/// Lists every entry of the archive at `path`, directories included.
	fn list(&self, path: &Path) -> Result<Vec<ListedFile>, ListError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
	Zip,
	Tar,
	TarGz,
	SevenZip,
}

impl ArchiveKind {
	fn from_path(path: &Path) -> Option<ArchiveKind> {
		let name = path.file_name()?.to_string_lossy().to_lowercase();
		if name.ends_with(".zip") {
			Some(ArchiveKind::Zip)
		} else if name.ends_with(".tar") {
			Some(ArchiveKind::Tar)
		} else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
			Some(ArchiveKind::TarGz)
		} else if name.ends_with(".7z") || name.ends_with(".rar") {
			Some(ArchiveKind::SevenZip)
		} else {
			None
		}
	}
}

/// Returns if `path` has the extension of a supported archive format.
pub fn is_archive(path: &Path) -> bool {
	ArchiveKind::from_path(path).is_some()
}

/// Dispatches listing to the right [`ArchiveLister`] based on the archive extension.
#[derive(Debug, Default)]
pub struct ListerSet {
	zip: ZipLister,
	tar: TarLister,
	sevenzip: Option<SevenZipLister>,
}

impl ListerSet {
	/// `sevenzip` is the path to a 7-Zip binary, without it `.7z` and `.rar` archives can't be listed.
	pub fn new(sevenzip: Option<PathBuf>) -> Self {
		Self {
			zip: ZipLister,
			tar: TarLister::default(),
			sevenzip: sevenzip.map(SevenZipLister::new),
		}
	}

	pub fn from_config(config: &crate::Config) -> Self {
		Self::new(config.tools.archive.clone())
	}
}

impl ArchiveLister for ListerSet {
	fn list(&self, path: &Path) -> Result<Vec<ListedFile>, ListError> {
		match ArchiveKind::from_path(path) {
			Some(ArchiveKind::Zip) => self.zip.list(path),
			Some(ArchiveKind::Tar) => self.tar.list(path),
			Some(ArchiveKind::TarGz) => self.tar.list_compressed(path),
			Some(ArchiveKind::SevenZip) => self.sevenzip.as_ref().ok_or(ListError::ToolMissing)?.list(path),
			None => Err(ListError::Unsupported),
		}
	}
}

/// Turns raw listings into the [`FileEntry`] stream.
///
/// - Paths are lower-cased and use `/`.
/// - A leading data prefix (eg. `datafiles/`) is stripped.
/// - Entries below an excluded top level directory are dropped.
/// - Directories and empty files are dropped.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
	data_prefixes: Vec<String>,
	excluded_dirs: HashSet<String>,
}

impl EntryFilter {
	pub fn new(data_prefixes: impl IntoIterator<Item = impl AsRef<str>>, excluded_dirs: HashSet<String>) -> Self {
		Self {
			data_prefixes: data_prefixes.into_iter()
				.map(|p| p.as_ref().trim_matches(|c| c == '/' || c == '\\').to_lowercase() + "/")
				.collect(),
			excluded_dirs,
		}
	}

	pub fn from_config(config: &crate::Config) -> Self {
		Self::new(&config.modules.data_prefixes, config.excluded_archive_directories())
	}

	/// Normalizes an entry path, `None` when the entry should be ignored.
	pub fn normalize(&self, raw: &str) -> Option<String> {
		let lowered = raw.replace('\\', "/").to_lowercase();
		let mut path = lowered.trim_start_matches("./").trim_start_matches('/');
		if let Some(stripped) = self.data_prefixes.iter().find_map(|p| path.strip_prefix(p.as_str())) {
			path = stripped;
		}
		if path.is_empty() {
			return None;
		}
		let (first, _) = path.split_once('/').unwrap_or((path, ""));
		if self.excluded_dirs.contains(first) {
			return None;
		}
		Some(path.to_string())
	}

	pub fn entries(&self, archive: &str, listing: Vec<ListedFile>) -> Vec<FileEntry> {
		listing.into_iter()
			.filter(|f| !f.is_dir && f.size > 0)
			.filter_map(|f| {
				let filename = self.normalize(&f.path)?;
				Some(FileEntry { archive: archive.to_string(), filename, size: f.size, modified: f.modified, hash: f.hash })
			})
			.collect()
	}
}

/// Used when an archive holds a timestamp that can't be represented.
pub(crate) fn dos_epoch() -> NaiveDateTime {
	chrono::NaiveDate::from_ymd_opt(1980, 1, 1)
		.and_then(|d| d.and_hms_opt(0, 0, 0))
		.unwrap_or_default()
}
