//! Locating archives on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Finds every supported archive in `source_dir`.
///
/// Subdirectories are only walked when `recurse` is set, which is the case when archives are
/// copied out of a separate source directory. Directories named in `excluded_dirs` (compared
/// lower-cased) are skipped along with everything below them.
///
/// The result is sorted so ingestion, and thus which archive a file version is first seen in, is deterministic.
pub fn discover_archives(source_dir: &Path, recurse: bool, excluded_dirs: &HashSet<String>) -> crate::Result<Vec<PathBuf>> {
	log::debug!("Looking for archives in {}", source_dir.display());

	let walker = walkdir::WalkDir::new(source_dir)
		.min_depth(1)
		.max_depth(if recurse { usize::MAX } else { 1 })
		.sort_by_file_name()
		.into_iter()
		.filter_entry(|e| {
			!(e.file_type().is_dir() && excluded_dirs.contains(&e.file_name().to_string_lossy().to_lowercase()))
		});

	let mut archives = Vec::<PathBuf>::new();
	for entry in walker {
		let entry = entry?;
		if entry.file_type().is_file() && super::is_archive(entry.path()) {
			archives.push(entry.into_path());
		}
	}
	archives.sort();

	log::debug!("Found {} archive(s)", archives.len());
	Ok(archives)
}

/// The identifier of an archive: its path relative to `source_dir` using `/` separators.
pub fn archive_id(source_dir: &Path, archive: &Path) -> String {
	let relative = pathdiff::diff_paths(archive, source_dir).unwrap_or_else(|| archive.to_path_buf());
	relative.components()
		.map(|c| c.as_os_str().to_string_lossy())
		.collect::<Vec<_>>()
		.join("/")
}
