//! # Analysis
//!
//! Runs a whole analysis: discovering and listing archives, indexing their files, then building
//! and sorting the precedence graph.
//!
//! # Usage
//! [`Analysis::run()`] does everything from a loaded [`Config`].
//!
//! [`Analysis::from_entries()`] skips the disk entirely and works from an in-memory stream of
//! [`FileEntry`], which is how the graph is exercised in tests.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Instant;

use crate::archive::{self, ArchiveLister, EntryFilter, FileEntry};
use crate::config::{Config, PrecedenceSettings};
use crate::overlap_index::OverlapIndex;
use crate::precedence::{FinishedGraph, PrecedenceGraph};
use crate::Error;

/// Outcome of an analysis with overlapping archives.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
	pub graph: FinishedGraph,
	/// Archive identifiers in installation order.
	pub ordered: Vec<String>,
	/// Archives without any overlap, sorted.
	pub free: Vec<String>,
	/// Files with unexpected extensions per archive.
	pub suspicious: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
pub enum AnalysisStatus {
	/// No two archives hold different versions of a file, there is nothing to order.
	NoOverlaps {
		free: Vec<String>,
		suspicious: BTreeMap<String, Vec<String>>,
	},
	Ordered(AnalysisResult),
}

#[derive(Debug, Clone, Default)]
pub struct Analysis {
	settings: PrecedenceSettings,
	filter: EntryFilter,
	expected_extensions: Option<HashSet<String>>,
}

impl Analysis {
	pub fn new(settings: PrecedenceSettings) -> Self {
		Self { settings, ..Default::default() }
	}

	pub fn from_config(config: &Config) -> Self {
		Self::new(config.precedence_settings())
			.filter(EntryFilter::from_config(config))
			.expected_extensions(config.expected_extensions())
	}

	/// How raw archive listings are normalized.
	pub fn filter(mut self, filter: EntryFilter) -> Self {
		self.filter = filter;
		self
	}

	/// Files with any other extension are reported as suspicious.
	pub fn expected_extensions(mut self, extensions: HashSet<String>) -> Self {
		self.expected_extensions = Some(extensions);
		self
	}

	/// Analyses the archives of the source directory of `config`.
	pub fn run(config: &Config, listers: &dyn ArchiveLister) -> crate::Result<AnalysisStatus> {
		Self::from_config(config).scan(config.source_dir(), !config.is_rename_mode(), &config.excluded_directories(), listers)
	}

	/// Discovers and lists the archives in `source_dir` then analyses them.
	///
	/// # Errors
	/// - [`Error::NoArchives`] when `source_dir` holds no supported archive.
	/// - [`Error::Ingestion`] naming the first archive that couldn't be listed.
	pub fn scan(&self, source_dir: &Path, recurse: bool, excluded_dirs: &HashSet<String>, listers: &dyn ArchiveLister) -> crate::Result<AnalysisStatus> {
		let start = Instant::now();
		let archives = archive::discover_archives(source_dir, recurse, excluded_dirs)?;
		if archives.is_empty() {
			return Err(Error::NoArchives(source_dir.to_path_buf()));
		}

		let mut index = self.new_index();
		for path in &archives {
			let id = archive::archive_id(source_dir, path);
			log::trace!("Listing {}", id);
			let listing = listers.list(path).map_err(|reason| Error::Ingestion { archive: id.clone(), reason })?;
			index.add_archive(&id);
			index.extend(self.filter.entries(&id, listing));
		}
		log::info!("Found {} module archives.", index.archive_count());

		let status = self.order_index(index);
		log::info!("Process time: {:.2}s", start.elapsed().as_secs_f64());
		status
	}

	/// Analyses an in-memory stream of file observations.
	pub fn from_entries(&self, entries: impl IntoIterator<Item = FileEntry>) -> crate::Result<AnalysisStatus> {
		let mut index = self.new_index();
		index.extend(entries);
		self.order_index(index)
	}

	fn new_index(&self) -> OverlapIndex {
		match &self.expected_extensions {
			Some(extensions) => OverlapIndex::new().with_expected_extensions(extensions.clone()),
			None => OverlapIndex::new(),
		}
	}

	fn order_index(&self, index: OverlapIndex) -> crate::Result<AnalysisStatus> {
		let suspicious = index.suspicious_files().clone();

		if !index.has_overlaps() {
			log::info!("There is no overlapping module, nothing to do.");
			let free = index.archives().map(|(id, _)| id.to_string()).collect();
			return Ok(AnalysisStatus::NoOverlaps { free, suspicious });
		}

		let graph = PrecedenceGraph::from_index(&index);
		log::info!("Found {} overlapping module archives.", graph.archive_count());

		let graph = graph
			.score()
			.resolve_directions(&self.settings)
			.break_cycles()?
			.sort()?;

		let ordered = graph.ordered().map(|a| a.id.clone()).collect();
		let free = graph.free().to_vec();
		Ok(AnalysisStatus::Ordered(AnalysisResult { graph, ordered, free, suspicious }))
	}
}
