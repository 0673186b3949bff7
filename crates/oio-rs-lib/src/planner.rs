//! # Planner
//!
//! Turns the installation order into the renames or copies giving each archive a numeric prefix,
//! so sorting the target directory by name gives the installation order.
//!
//! Archives taking part in the order are named `0010-name.7z`, `0020-other.zip`, ... while archives
//! without overlaps only lose any prefix they already had.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Basename of `archive` without its numeric install prefix, `0030-Better Bodies.7z` becomes `Better Bodies.7z`.
pub fn clean_archive_name(archive: &str) -> String {
	static PREFIX: OnceLock<Regex> = OnceLock::new();
	let prefix = PREFIX.get_or_init(|| Regex::new(r"^\d+[ _-]").expect("regex failed to compile."));
	let base = archive.rsplit('/').next().unwrap_or(archive);
	prefix.replace(base, "").into_owned()
}

/// Name given to the archive at `install_index` in the order.
pub fn ordered_archive_name(install_index: usize, archive: &str) -> String {
	format!("{:03}0-{}", install_index + 1, clean_archive_name(archive))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
	/// Archives are renamed where they are.
	Rename,
	/// Archives are copied from a source directory into the target directory.
	Copy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskOperation {
	/// Archive identifier, relative to the source directory.
	pub archive: String,
	/// New file name in the target directory.
	pub new_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DiskOperationError {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("renaming would overwrite {0} archive(s).")]
	WouldOverwrite(usize),
	#[error("archive `{0}` no longer exists.")]
	MissingArchive(PathBuf),
}

/// Every file operation needed to apply an installation order.
#[derive(Debug, Clone)]
pub struct DiskPlan {
	mode: PlanMode,
	source_dir: PathBuf,
	target_dir: PathBuf,
	operations: Vec<DiskOperation>,
	overwritten: Vec<PathBuf>,
}

impl DiskPlan {
	/// Plans the operations for `free` archives and archives `ordered` by install index.
	///
	/// In rename mode archives already carrying the right name are left out.
	pub fn new<'a>(mode: PlanMode, source_dir: &Path, target_dir: &Path, free: &[String], ordered: impl IntoIterator<Item = &'a str>) -> Self {
		let mut free = free.to_vec();
		free.sort();

		let planned = free.into_iter()
			.map(|archive| {
				let new_name = clean_archive_name(&archive);
				DiskOperation { archive, new_name }
			})
			.chain(ordered.into_iter().enumerate().map(|(i, archive)| DiskOperation {
				archive: archive.to_string(),
				new_name: ordered_archive_name(i, archive),
			}));

		let mut operations = Vec::new();
		for op in planned {
			if mode == PlanMode::Rename && op.archive == op.new_name {
				log::debug!("No renaming needed for {}", op.archive);
				continue;
			}
			operations.push(op);
		}

		let overwritten = operations.iter()
			.map(|op| target_dir.join(&op.new_name))
			.filter(|target| target.exists())
			.collect();

		Self {
			mode,
			source_dir: source_dir.to_path_buf(),
			target_dir: target_dir.to_path_buf(),
			operations,
			overwritten,
		}
	}

	pub fn from_config<'a>(config: &crate::Config, free: &[String], ordered: impl IntoIterator<Item = &'a str>) -> Self {
		let mode = if config.is_rename_mode() { PlanMode::Rename } else { PlanMode::Copy };
		Self::new(mode, config.source_dir(), config.target_dir(), free, ordered)
	}

	pub fn mode(&self) -> PlanMode {
		self.mode
	}

	pub fn source_dir(&self) -> &Path {
		&self.source_dir
	}

	pub fn target_dir(&self) -> &Path {
		&self.target_dir
	}

	pub fn operations(&self) -> &[DiskOperation] {
		&self.operations
	}

	/// Existing files the plan would replace.
	pub fn overwritten(&self) -> &[PathBuf] {
		&self.overwritten
	}

	/// `true` when every archive already has the right name.
	pub fn is_empty(&self) -> bool {
		self.operations.is_empty()
	}

	/// Renames or copies every archive, returning the number of operations done.
	///
	/// # Errors
	/// Refuses to start renaming if any archive would be overwritten, as those would be lost.
	pub fn execute(&self) -> Result<usize, DiskOperationError> {
		if self.mode == PlanMode::Rename && !self.overwritten.is_empty() {
			return Err(DiskOperationError::WouldOverwrite(self.overwritten.len()));
		}

		let mut done = 0;
		for op in &self.operations {
			let source = self.source_dir.join(&op.archive);
			let target = self.target_dir.join(&op.new_name);
			if source == target {
				continue;
			}
			if !source.exists() {
				return Err(DiskOperationError::MissingArchive(source));
			}
			match self.mode {
				PlanMode::Rename => {
					log::debug!("Renaming {} to {}", source.display(), target.display());
					std::fs::rename(&source, &target)?;
				},
				PlanMode::Copy => {
					log::debug!("Copying {} to {}", source.display(), target.display());
					std::fs::copy(&source, &target)?;
				},
			}
			done += 1;
		}

		log::info!("{} disk operation(s) done", done);
		Ok(done)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clean_names() {
		assert_eq!(clean_archive_name("0030-Better Bodies.7z"), "Better Bodies.7z");
		assert_eq!(clean_archive_name("12 Patch.zip"), "Patch.zip");
		assert_eq!(clean_archive_name("7_fix.zip"), "fix.zip");
		assert_eq!(clean_archive_name("sub/0010-a.zip"), "a.zip");
		assert_eq!(clean_archive_name("2002Mod.zip"), "2002Mod.zip");
		assert_eq!(clean_archive_name("plain.zip"), "plain.zip");
	}

	#[test]
	fn ordered_names_are_prefixed() {
		assert_eq!(ordered_archive_name(0, "0050-b.zip"), "0010-b.zip");
		assert_eq!(ordered_archive_name(11, "c.7z"), "0120-c.7z");
	}

	#[test]
	fn rename_mode_skips_correct_names() {
		let dir = tempfile::tempdir().unwrap();
		let free = vec!["free.zip".to_string(), "0040-old.zip".to_string()];
		let plan = DiskPlan::new(PlanMode::Rename, dir.path(), dir.path(), &free, ["0010-b.zip", "a.zip"]);
		let ops: Vec<_> = plan.operations().iter().map(|op| (op.archive.as_str(), op.new_name.as_str())).collect();
		assert_eq!(ops, vec![("0040-old.zip", "old.zip"), ("a.zip", "0020-a.zip")]);
		assert!(plan.overwritten().is_empty());
	}

	#[test]
	fn copy_mode_keeps_every_archive() {
		let src = tempfile::tempdir().unwrap();
		let tgt = tempfile::tempdir().unwrap();
		let free = vec!["free.zip".to_string()];
		let plan = DiskPlan::new(PlanMode::Copy, src.path(), tgt.path(), &free, ["sub/b.zip"]);
		let ops: Vec<_> = plan.operations().iter().map(|op| (op.archive.as_str(), op.new_name.as_str())).collect();
		assert_eq!(ops, vec![("free.zip", "free.zip"), ("sub/b.zip", "0010-b.zip")]);
	}

	#[test]
	fn rename_refuses_to_overwrite() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("a.zip"), b"a").unwrap();
		std::fs::write(dir.path().join("0010-a.zip"), b"stale").unwrap();
		let plan = DiskPlan::new(PlanMode::Rename, dir.path(), dir.path(), &[], ["a.zip"]);
		assert_eq!(plan.overwritten(), &[dir.path().join("0010-a.zip")]);
		assert!(matches!(plan.execute(), Err(DiskOperationError::WouldOverwrite(1))));
		assert!(dir.path().join("a.zip").exists());
	}

	#[test]
	fn rename_executes() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("b.zip"), b"b").unwrap();
		std::fs::write(dir.path().join("a.zip"), b"a").unwrap();
		let plan = DiskPlan::new(PlanMode::Rename, dir.path(), dir.path(), &[], ["b.zip", "a.zip"]);
		assert_eq!(plan.execute().unwrap(), 2);
		assert_eq!(std::fs::read(dir.path().join("0010-b.zip")).unwrap(), b"b");
		assert_eq!(std::fs::read(dir.path().join("0020-a.zip")).unwrap(), b"a");
		assert!(!dir.path().join("a.zip").exists());
	}

	#[test]
	fn copy_leaves_sources() {
		let src = tempfile::tempdir().unwrap();
		let tgt = tempfile::tempdir().unwrap();
		std::fs::create_dir(src.path().join("sub")).unwrap();
		std::fs::write(src.path().join("sub/a.zip"), b"a").unwrap();
		let plan = DiskPlan::new(PlanMode::Copy, src.path(), tgt.path(), &[], ["sub/a.zip"]);
		assert_eq!(plan.execute().unwrap(), 1);
		assert!(src.path().join("sub/a.zip").exists());
		assert!(tgt.path().join("0010-a.zip").exists());
	}

	#[test]
	fn missing_archive_is_reported() {
		let dir = tempfile::tempdir().unwrap();
		let plan = DiskPlan::new(PlanMode::Rename, dir.path(), dir.path(), &[], ["gone.zip"]);
		assert!(matches!(plan.execute(), Err(DiskOperationError::MissingArchive(_))));
	}
}
