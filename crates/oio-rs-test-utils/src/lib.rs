//! Various helper functions for testing
//!
//! functions in this module should use results and not use any panics to avoid confusion in callers

use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("zip error: {0}")]
	Zip(#[from] zip::result::ZipError),
	#[error("date can't be stored in a zip archive.")]
	InvalidDate,
}

/// A file to put in a fixture archive.
#[derive(Debug, Clone)]
pub struct FixtureFile {
	pub path: String,
	pub content: Vec<u8>,
	/// `(year, month, day)`, noon is used for the time.
	pub modified: (u16, u8, u8),
}

impl FixtureFile {
	pub fn new(path: &str, content: impl Into<Vec<u8>>) -> Self {
		Self { path: path.to_string(), content: content.into(), modified: (2010, 1, 1) }
	}

	/// A file of `len` bytes all set to `fill`, two files with different `fill` have different hashes.
	pub fn sized(path: &str, len: usize, fill: u8) -> Self {
		Self::new(path, vec![fill; len])
	}

	pub fn modified(mut self, year: u16, month: u8, day: u8) -> Self {
		self.modified = (year, month, day);
		self
	}
}

/// A temporary directory holding archives, removed on drop.
pub struct ModsDir {
	dir: tempfile::TempDir,
}

impl ModsDir {
	pub fn new() -> Result<Self, Error> {
		Ok(Self { dir: tempfile::tempdir()? })
	}

	pub fn path(&self) -> &Path {
		self.dir.path()
	}

	/// Writes a zip archive at `name`, relative to the directory, creating parent directories.
	pub fn add_zip(&self, name: &str, files: &[FixtureFile]) -> Result<PathBuf, Error> {
		let path = self.dir.path().join(name);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}

		let mut writer = zip::ZipWriter::new(std::fs::File::create(&path)?);
		for file in files {
			let (year, month, day) = file.modified;
			let modified = zip::DateTime::from_date_and_time(year, month, day, 12, 0, 0).map_err(|_| Error::InvalidDate)?;
			let options = zip::write::FileOptions::default()
				.compression_method(zip::CompressionMethod::Stored)
				.last_modified_time(modified);
			writer.start_file(file.path.as_str(), options)?;
			writer.write_all(&file.content)?;
		}
		writer.finish()?;
		Ok(path)
	}

	/// Writes a plain file, for things that aren't archives.
	pub fn add_file(&self, name: &str, content: &[u8]) -> Result<PathBuf, Error> {
		let path = self.dir.path().join(name);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&path, content)?;
		Ok(path)
	}

	/// Writes a configuration reading archives from this directory and reports to `out/`.
	///
	/// `extra` is spliced in the top level object, eg. `"mod_coefficients": { "a.zip": 2.0 }`.
	pub fn write_config(&self, extra: &str) -> Result<PathBuf, Error> {
		let target = self.dir.path().display().to_string().replace('\\', "/");
		let mut json = format!(r#"{{
	"modules": {{
		"target_directory": "{target}",
		"expected_datafile_extensions": ["esp", "esm", "nif", "dds", "bsa"]
	}},
	"analysis": {{ "output_dir": "{target}/out" }},
	"criterion_coefficients": {{ "size": 1.0, "mtime": 1.0, "file_count": 1.0 }}"#);
		if !extra.is_empty() {
			json.push_str(",\n\t");
			json.push_str(extra);
		}
		json.push_str("\n}\n");
		self.add_file("oio.json", json.as_bytes())
	}
}
