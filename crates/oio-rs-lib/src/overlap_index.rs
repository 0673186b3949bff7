//! Groups file observations from every archive to find the files that archives fight over.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;

use crate::archive::FileEntry;

/// Whole archive figures, gathered while indexing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
	/// Number of indexed (non-empty, non-excluded) files.
	pub file_count: u64,
	/// Uncompressed size of the indexed files in bytes.
	pub total_size: u64,
}

/// One version of a file: the first archive it was seen in with a given hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVersion {
	pub archive: String,
	pub size: u64,
	pub modified: NaiveDateTime,
}

#[derive(Debug, Default)]
pub struct OverlapIndex {
	archives: BTreeMap<String, ArchiveStats>,
	/// filename -> hash -> first version seen
	files: BTreeMap<String, BTreeMap<String, FileVersion>>,
	expected_extensions: Option<HashSet<String>>,
	suspicious: BTreeMap<String, Vec<String>>,
}

impl OverlapIndex {
	pub fn new() -> Self {
		Default::default()
	}

	/// Files with an extension outside of `extensions` will be reported as suspicious.
	pub fn with_expected_extensions(mut self, extensions: HashSet<String>) -> Self {
		self.expected_extensions = Some(extensions);
		self
	}

	/// Makes the archive known to the index even if it holds no usable files.
	pub fn add_archive(&mut self, archive: &str) {
		if !self.archives.contains_key(archive) {
			self.archives.insert(archive.to_string(), ArchiveStats::default());
		}
	}

	/// Records a file observation. Empty files are ignored.
	pub fn add_entry(&mut self, entry: FileEntry) {
		if entry.size == 0 {
			return;
		}
		self.add_archive(&entry.archive);
		if let Some(stats) = self.archives.get_mut(&entry.archive) {
			stats.file_count += 1;
			stats.total_size += entry.size;
		}

		if let Some(expected) = &self.expected_extensions {
			let base = entry.filename.rsplit('/').next().unwrap_or(&entry.filename);
			let extension = base.rsplit_once('.').map_or("", |(_, ext)| ext);
			if !expected.contains(extension) {
				self.suspicious.entry(entry.archive.clone()).or_default().push(entry.filename.clone());
			}
		}

		let versions = self.files.entry(entry.filename).or_default();
		versions.entry(entry.hash).or_insert(FileVersion {
			archive: entry.archive,
			size: entry.size,
			modified: entry.modified,
		});
	}

	pub fn archive_count(&self) -> usize {
		self.archives.len()
	}

	pub fn archives(&self) -> impl Iterator<Item = (&str, &ArchiveStats)> {
		self.archives.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn stats(&self, archive: &str) -> Option<&ArchiveStats> {
		self.archives.get(archive)
	}

	/// Every file which exists in more than one version, along with those versions.
	pub fn overlapping(&self) -> impl Iterator<Item = (&str, Vec<&FileVersion>)> {
		self.files.iter()
			.filter(|(_, versions)| versions.len() > 1)
			.map(|(filename, versions)| (filename.as_str(), versions.values().collect()))
	}

	pub fn has_overlaps(&self) -> bool {
		self.overlapping().next().is_some()
	}

	/// Files with unexpected extensions, per archive.
	pub fn suspicious_files(&self) -> &BTreeMap<String, Vec<String>> {
		&self.suspicious
	}
}

impl Extend<FileEntry> for OverlapIndex {
	fn extend<T: IntoIterator<Item = FileEntry>>(&mut self, iter: T) {
		for entry in iter {
			self.add_entry(entry);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(archive: &str, filename: &str, size: u64, hash: &str) -> FileEntry {
		FileEntry {
			archive: archive.to_string(),
			filename: filename.to_string(),
			size,
			modified: crate::archive::dos_epoch(),
			hash: hash.to_string(),
		}
	}

	#[test]
	fn identical_content_does_not_overlap() {
		let mut index = OverlapIndex::new();
		index.extend([
			entry("a.zip", "meshes/x.nif", 10, "h1"),
			entry("b.zip", "meshes/x.nif", 10, "h1"),
		]);
		assert!(!index.has_overlaps());
		assert_eq!(index.archive_count(), 2);
	}

	#[test]
	fn first_seen_version_wins() {
		let mut index = OverlapIndex::new();
		index.extend([
			entry("a.zip", "meshes/x.nif", 10, "h1"),
			entry("b.zip", "meshes/x.nif", 20, "h2"),
			entry("c.zip", "meshes/x.nif", 30, "h2"),
			entry("c.zip", "meshes/y.nif", 30, "h3"),
		]);
		let overlapping: Vec<_> = index.overlapping().collect();
		assert_eq!(overlapping.len(), 1);
		let (name, versions) = &overlapping[0];
		assert_eq!(*name, "meshes/x.nif");
		let archives: Vec<_> = versions.iter().map(|v| v.archive.as_str()).collect();
		assert_eq!(archives, vec!["a.zip", "b.zip"]);
		assert_eq!(index.stats("c.zip"), Some(&ArchiveStats { file_count: 2, total_size: 60 }));
	}

	#[test]
	fn empty_files_ignored() {
		let mut index = OverlapIndex::new();
		index.add_archive("empty.zip");
		index.extend([
			entry("a.zip", "x.esp", 0, "h1"),
			entry("b.zip", "x.esp", 5, "h2"),
		]);
		assert!(!index.has_overlaps());
		assert_eq!(index.stats("empty.zip"), Some(&ArchiveStats::default()));
		assert_eq!(index.stats("a.zip"), None);
	}

	#[test]
	fn suspicious_extensions_flagged() {
		let mut index = OverlapIndex::new().with_expected_extensions(HashSet::from(["esp".to_string(), "nif".to_string()]));
		index.extend([
			entry("a.zip", "plugin.esp", 5, "h1"),
			entry("a.zip", "readme.txt", 5, "h2"),
			entry("a.zip", "noextension", 5, "h3"),
		]);
		let suspicious = index.suspicious_files();
		assert_eq!(suspicious.get("a.zip"), Some(&vec!["readme.txt".to_string(), "noextension".to_string()]));
	}
}
