use std::io::Read;
use std::path::Path;

use super::{ArchiveLister, ListError, ListedFile};

/// Lists tarballs, plain or gzip compressed.
///
/// Tar headers carry no checksum of the content so every file is read and hashed with sha256.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarLister;

impl TarLister {
	pub fn list_compressed(&self, path: &Path) -> Result<Vec<ListedFile>, ListError> {
		log::trace!("Listing compressed tar archive {}", path.display());
		let file = std::fs::File::open(path)?;
		list_entries(flate2::read::GzDecoder::new(std::io::BufReader::new(file)))
	}
}

impl ArchiveLister for TarLister {
	fn list(&self, path: &Path) -> Result<Vec<ListedFile>, ListError> {
		log::trace!("Listing tar archive {}", path.display());
		let file = std::fs::File::open(path)?;
		list_entries(std::io::BufReader::new(file))
	}
}

fn list_entries<R: Read>(reader: R) -> Result<Vec<ListedFile>, ListError> {
	let mut archive = tar::Archive::new(reader);
	let mut files = Vec::new();

	for entry in archive.entries()? {
		let mut entry = entry?;

		let kind = entry.header().entry_type();
		if !kind.is_file() && !kind.is_dir() {
			/* Links and special files can't overwrite anything on their own */
			continue;
		}
		let is_dir = kind.is_dir();
		let size = entry.header().size()?;
		let mtime = entry.header().mtime()?;
		let path = entry.path()?.to_string_lossy().into_owned();

		let modified = i64::try_from(mtime).ok()
			.and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
			.map(|dt| dt.naive_utc())
			.ok_or(ListError::InvalidField { field: "mtime", value: mtime.to_string() })?;

		let hash = if is_dir {
			String::new()
		} else {
			let mut content = Vec::with_capacity(size as usize);
			entry.read_to_end(&mut content)?;
			sha256::digest(content.as_slice())
		};

		files.push(ListedFile { path, size, modified, hash, is_dir });
	}

	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tarball(files: &[(&str, &[u8], u64)]) -> Vec<u8> {
		let mut builder = tar::Builder::new(Vec::new());
		for (path, data, mtime) in files {
			let mut header = tar::Header::new_gnu();
			header.set_size(data.len() as u64);
			header.set_mtime(*mtime);
			header.set_mode(0o644);
			header.set_cksum();
			builder.append_data(&mut header, path, *data).unwrap();
		}
		builder.into_inner().unwrap()
	}

	#[test]
	fn lists_and_hashes_entries() {
		let data = tarball(&[
			("meshes/a.nif", b"first", 1_100_000_000),
			("meshes/b.nif", b"first", 1_100_000_000),
			("textures/c.dds", b"second", 1_200_000_000),
		]);
		let files = list_entries(data.as_slice()).unwrap();
		assert_eq!(files.len(), 3);
		assert_eq!(files[0].path, "meshes/a.nif");
		assert_eq!(files[0].size, 5);
		assert_eq!(files[0].hash, files[1].hash);
		assert_ne!(files[0].hash, files[2].hash);
		assert_eq!(files[2].modified.and_utc().timestamp(), 1_200_000_000);
	}
}
