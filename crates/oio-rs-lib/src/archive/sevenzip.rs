//! Listing through an external 7-Zip binary.
//!
//! `7z l -slt -ba` prints one `Key = Value` line per property with entries separated by blank lines:
//!
//! ```text
//! Path = Data Files/meshes/a.nif
//! Folder = -
//! Size = 1024
//! Packed Size = 512
//! Modified = 2015-03-02 12:00:00
//! CRC = 3A1F09B2
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDateTime;

use super::{ArchiveLister, ListError, ListedFile};

#[derive(Debug, Clone)]
pub struct SevenZipLister {
	program: PathBuf,
}

impl SevenZipLister {
	pub fn new(program: PathBuf) -> Self {
		Self { program }
	}
}

impl ArchiveLister for SevenZipLister {
	fn list(&self, path: &Path) -> Result<Vec<ListedFile>, ListError> {
		log::trace!("Listing {} with {}", path.display(), self.program.display());
		let output = Command::new(&self.program)
			.arg("l")
			.arg("-slt")
			.arg("-ba")
			.arg("-scsUTF-8")
			.arg(path)
			.output()?;

		if !output.status.success() {
			return Err(ListError::ToolFailed(String::from_utf8_lossy(&output.stderr).trim().to_string()));
		}

		parse_technical_listing(&String::from_utf8_lossy(&output.stdout))
	}
}

fn parse_technical_listing(output: &str) -> Result<Vec<ListedFile>, ListError> {
	let mut files = Vec::new();
	let mut current = HashMap::<&str, &str>::new();

	for line in output.lines().map(str::trim).chain(std::iter::once("")) {
		if line.is_empty() {
			if !current.is_empty() {
				if let Some(file) = parse_block(&current)? {
					files.push(file);
				}
				current.clear();
			}
		} else if let Some((key, value)) = line.split_once(" = ") {
			current.insert(key, value);
		} else if let Some(key) = line.strip_suffix(" =") {
			current.insert(key, "");
		}
	}

	Ok(files)
}

fn parse_block(block: &HashMap<&str, &str>) -> Result<Option<ListedFile>, ListError> {
	let path = match block.get("Path") {
		Some(p) if !p.is_empty() => p.to_string(),
		/* Blocks without a path describe the archive itself */
		_ => return Ok(None),
	};

	let is_dir = block.get("Folder").map_or(false, |v| *v == "+") || block.get("Attributes").map_or(false, |v| v.starts_with('D'));
	if is_dir {
		return Ok(Some(ListedFile { path, size: 0, modified: super::dos_epoch(), hash: String::new(), is_dir }));
	}

	let size = block.get("Size").ok_or(ListError::MissingField("Size"))?;
	let size = size.parse::<u64>().map_err(|_| ListError::InvalidField { field: "Size", value: size.to_string() })?;

	let modified = block.get("Modified").ok_or(ListError::MissingField("Modified"))?;
	let modified = parse_modified(modified)?;

	let hash = match block.get("CRC") {
		Some(crc) => crc.to_string(),
		None if size == 0 => String::new(),
		None => return Err(ListError::MissingField("CRC")),
	};

	Ok(Some(ListedFile { path, size, modified, hash, is_dir }))
}

/* 7z may print sub second precision, only the first 19 characters matter. */
fn parse_modified(value: &str) -> Result<NaiveDateTime, ListError> {
	value.get(..19)
		.and_then(|v| NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S").ok())
		.ok_or_else(|| ListError::InvalidField { field: "Modified", value: value.to_string() })
}

#[cfg(test)]
mod tests {
	use super::*;

	const LISTING: &str = "\
Path = Data Files
Folder = +
Size = 0
Modified = 2015-03-02 12:00:00
Attributes = D

Path = Data Files/meshes/a.nif
Folder = -
Size = 1024
Packed Size = 512
Modified = 2015-03-02 12:00:00.1234567
Attributes = A
CRC = 3A1F09B2

Path = Data Files/textures/b.dds
Folder = -
Size = 2048
Modified = 2016-01-10 08:30:00
CRC = 0011AABB
";

	#[test]
	fn parses_listing() {
		let files = parse_technical_listing(LISTING).unwrap();
		assert_eq!(files.len(), 3);
		assert!(files[0].is_dir);
		assert_eq!(files[1].path, "Data Files/meshes/a.nif");
		assert_eq!(files[1].size, 1024);
		assert_eq!(files[1].hash, "3A1F09B2");
		assert_eq!(files[1].modified.to_string(), "2015-03-02 12:00:00");
		assert_eq!(files[2].size, 2048);
	}

	#[test]
	fn truncated_listing_is_an_error() {
		let truncated = "Path = a.nif\nFolder = -\nSize = 10\n";
		assert!(matches!(parse_technical_listing(truncated), Err(ListError::MissingField("Modified"))));
	}

	#[test]
	fn invalid_size_is_an_error() {
		let listing = "Path = a.nif\nSize = lots\nModified = 2015-03-02 12:00:00\nCRC = 00\n";
		assert!(matches!(parse_technical_listing(listing), Err(ListError::InvalidField { field: "Size", .. })));
	}
}
