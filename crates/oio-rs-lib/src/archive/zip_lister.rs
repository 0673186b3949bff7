use std::path::Path;

use chrono::NaiveDateTime;

use super::{ArchiveLister, ListError, ListedFile};

/// Lists zip archives directly, the stored CRC32 is used as the content hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipLister;

impl ArchiveLister for ZipLister {
	fn list(&self, path: &Path) -> Result<Vec<ListedFile>, ListError> {
		log::trace!("Listing zip archive {}", path.display());
		let file = std::fs::File::open(path)?;
		let mut zip = zip::ZipArchive::new(std::io::BufReader::new(file))?;

		let mut files = Vec::with_capacity(zip.len());
		for i in 0..zip.len() {
			let entry = zip.by_index(i)?;
			files.push(ListedFile {
				path: entry.name().to_string(),
				size: entry.size(),
				modified: to_naive(entry.last_modified()),
				hash: format!("{:08X}", entry.crc32()),
				is_dir: entry.is_dir(),
			});
		}
		Ok(files)
	}
}

/* Zip tools are known to write zeroed dates, those fall back to the DOS epoch. */
fn to_naive(dt: zip::DateTime) -> NaiveDateTime {
	chrono::NaiveDate::from_ymd_opt(dt.year().into(), dt.month().into(), dt.day().into())
		.and_then(|d| d.and_hms_opt(dt.hour().into(), dt.minute().into(), dt.second().into()))
		.unwrap_or_else(super::dos_epoch)
}
