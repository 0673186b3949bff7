//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("error walking directory: {0}")]
	WalkDir(#[from] walkdir::Error),
	/// The configuration is missing a value or holds an invalid one.
	#[error("configuration error: {0}")]
	Config(String),
	/// An archive could not be listed or its listing was malformed.
	#[error("archive `{archive}` could not be inspected: {reason}")]
	Ingestion {
		archive: String,
		reason: crate::archive::ListError,
	},
	/// Archive discovery found nothing to work on.
	#[error("no archives found in `{0}`")]
	NoArchives(std::path::PathBuf),
	/// A state the precedence graph should never reach. These are bugs, not user errors.
	#[error("internal error, please report this as a bug: {0}")]
	Internal(String),
}
