//! Run configuration.
//!
//! The configuration lives in a JSON file and is split into sections mirroring
//! the different stages of a run. Once loaded and validated the parts needed by
//! the precedence graph are resolved into a [`PrecedenceSettings`] so the graph
//! never has to touch raw names or the file itself.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::Error;

/// A normalized archive name used to look up per-archive settings.
///
/// This is the lower-cased file name of the archive without any directory
/// components, so `Mods/Better Bodies.7z` and `better bodies.7z` are the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchiveName(String);

impl ArchiveName {
	pub fn new(archive: &str) -> Self {
		let base = archive.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(archive);
		Self(base.to_lowercase())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ArchiveName {
	fn from(value: &str) -> Self {
		ArchiveName::new(value)
	}
}

impl std::fmt::Display for ArchiveName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Outcome of looking up a manual precedence between two archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
	/// The first archive must be installed after the second.
	Precedes,
	/// The second archive must be installed after the first.
	Follows,
	/// Nothing is configured, the score decides.
	Unknown,
}

/// Read-only settings consumed by the precedence graph.
#[derive(Debug, Clone)]
pub struct PrecedenceSettings {
	size_exponent: f64,
	mtime_exponent: f64,
	file_count_exponent: f64,
	coefficients: HashMap<ArchiveName, f64>,
	forced: HashMap<ArchiveName, HashSet<ArchiveName>>,
}

impl Default for PrecedenceSettings {
	fn default() -> Self {
		Self {
			size_exponent: 1.0,
			mtime_exponent: 1.0,
			file_count_exponent: 1.0,
			coefficients: Default::default(),
			forced: Default::default(),
		}
	}
}

impl PrecedenceSettings {
	pub fn exponents(mut self, size: f64, mtime: f64, file_count: f64) -> Self {
		self.size_exponent = size;
		self.mtime_exponent = mtime;
		self.file_count_exponent = file_count;
		self
	}

	pub fn coefficient(mut self, archive: impl Into<ArchiveName>, value: f64) -> Self {
		self.coefficients.insert(archive.into(), value);
		self
	}

	/// `winner` will always be installed after `loser`.
	pub fn force(mut self, winner: impl Into<ArchiveName>, loser: impl Into<ArchiveName>) -> Self {
		self.forced.entry(winner.into()).or_default().insert(loser.into());
		self
	}

	pub fn size_exponent(&self) -> f64 {
		self.size_exponent
	}

	pub fn mtime_exponent(&self) -> f64 {
		self.mtime_exponent
	}

	pub fn file_count_exponent(&self) -> f64 {
		self.file_count_exponent
	}

	/// Per archive multiplier, defaults to `1`.
	pub fn archive_coefficient(&self, archive: &ArchiveName) -> f64 {
		self.coefficients.get(archive).copied().unwrap_or(1.0)
	}

	/// Looks up a manual precedence between `a` and `b`.
	///
	/// When both directions are configured `Follows` wins, [`Config`] rejects such files anyway.
	pub fn verdict(&self, a: &ArchiveName, b: &ArchiveName) -> Verdict {
		if self.forced.get(b).map_or(false, |set| set.contains(a)) {
			Verdict::Follows
		} else if self.forced.get(a).map_or(false, |set| set.contains(b)) {
			Verdict::Precedes
		} else {
			Verdict::Unknown
		}
	}
}

/* Sections */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulesSection {
	/// Where archives are renamed or copied to.
	pub target_directory: PathBuf,
	/// When set, archives are read from here and copied to `target_directory`.
	#[serde(default)]
	pub source_directory: Option<PathBuf>,
	/// Extensions of files expected inside archives, anything else is reported as suspicious.
	pub expected_datafile_extensions: Vec<String>,
	/// Directory names skipped when walking the source directory.
	#[serde(default)]
	pub excluded_directories: Vec<String>,
	/// Top level directories inside archives that are ignored entirely.
	#[serde(default)]
	pub excluded_archive_directories: Vec<String>,
	/// Leading directories stripped from archive entries, such as `datafiles`.
	#[serde(default = "default_data_prefixes")]
	pub data_prefixes: Vec<String>,
}

fn default_data_prefixes() -> Vec<String> {
	vec!["datafiles".to_string()]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsSection {
	/// A 7-Zip compatible binary, used for `.7z` and `.rar` archives.
	#[serde(default)]
	pub archive: Option<PathBuf>,
	/// Graphviz `dot`, used to render the precedence graph to pdf.
	#[serde(default)]
	pub dot: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSection {
	pub output_dir: PathBuf,
	#[serde(default = "default_disk_operations")]
	pub disk_operations: String,
	#[serde(default = "default_suspicious")]
	pub suspicious: String,
	/// Base name of the graph reports, extensions are added per format.
	#[serde(default = "default_overlaps")]
	pub overlaps: String,
}

fn default_disk_operations() -> String { "disk_operations.txt".to_string() }
fn default_suspicious() -> String { "suspicious.txt".to_string() }
fn default_overlaps() -> String { "overlaps".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionCoefficients {
	pub size: f64,
	pub mtime: f64,
	pub file_count: f64,
}

/// The full run configuration, see the module documentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub modules: ModulesSection,
	#[serde(default)]
	pub tools: ToolsSection,
	pub analysis: AnalysisSection,
	pub criterion_coefficients: CriterionCoefficients,
	#[serde(default)]
	pub mod_coefficients: HashMap<String, f64>,
	/// `name -> [names]`, the key is always installed after every listed archive.
	#[serde(default)]
	pub mod_precedences: HashMap<String, Vec<String>>,
}

impl Config {
	/// Parses a configuration and checks its numeric values.
	///
	/// Paths are not touched, see [`Config::prepare_paths`].
	pub fn from_json(json: &str) -> crate::Result<Config> {
		let config: Config = serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid configuration file: {}", e)))?;
		config.check_coefficients()?;
		config.check_precedences()?;
		Ok(config)
	}

	/// Reads, validates and prepares the configuration at `path`.
	pub fn load_from_disk(path: impl AsRef<Path>) -> crate::Result<Config> {
		let path = path.as_ref();
		log::debug!("Loading configuration from {}", path.display());
		let json = std::fs::read_to_string(path).map_err(|e| Error::Config(format!("cannot read `{}`: {}", path.display(), e)))?;
		let mut config = Config::from_json(&json)?;
		config.prepare_paths()?;
		Ok(config)
	}

	fn check_coefficients(&self) -> crate::Result<()> {
		let c = &self.criterion_coefficients;
		for (name, value) in [("size", c.size), ("mtime", c.mtime), ("file_count", c.file_count)] {
			if !value.is_finite() {
				return Err(Error::Config(format!("criterion coefficient `{}` is not a number.", name)));
			}
			if value < 0.0 {
				return Err(Error::Config(format!("criterion coefficient `{}` cannot be lower than 0.", name)));
			}
		}

		for (archive, value) in &self.mod_coefficients {
			if !value.is_finite() {
				return Err(Error::Config(format!("invalid mod coefficient for `{}`.", archive)));
			}
			if *value == 0.0 {
				return Err(Error::Config(format!("mod coefficient for `{}` cannot be 0.", archive)));
			}
		}
		Ok(())
	}

	fn check_precedences(&self) -> crate::Result<()> {
		let settings = self.precedence_settings();
		for (winner, losers) in &self.mod_precedences {
			let winner = ArchiveName::new(winner);
			for loser in losers {
				let loser = ArchiveName::new(loser);
				if winner == loser {
					return Err(Error::Config(format!("`{}` cannot take precedence over itself.", winner)));
				}
				if settings.verdict(&winner, &loser) != Verdict::Precedes {
					return Err(Error::Config(format!("`{}` and `{}` are forced to take precedence over each other.", winner, loser)));
				}
			}
		}
		Ok(())
	}

	/// Makes every path absolute, checks directory access, creates the output
	/// directory and locates the external tools.
	pub fn prepare_paths(&mut self) -> crate::Result<()> {
		self.modules.target_directory = absolute(&self.modules.target_directory)?;
		let target = &self.modules.target_directory;
		let meta = std::fs::metadata(target).map_err(|e| Error::Config(format!("target directory `{}` is not accessible: {}", target.display(), e)))?;
		if !meta.is_dir() {
			return Err(Error::Config(format!("target directory `{}` is not a directory.", target.display())));
		}
		if meta.permissions().readonly() {
			return Err(Error::Config(format!("target directory `{}` is not writable.", target.display())));
		}

		if let Some(source) = self.modules.source_directory.take() {
			let source = absolute(&source)?;
			std::fs::read_dir(&source).map_err(|e| Error::Config(format!("source directory `{}` is not readable: {}", source.display(), e)))?;
			self.modules.source_directory = Some(source);
		}

		self.analysis.output_dir = absolute(&self.analysis.output_dir)?;
		std::fs::create_dir_all(&self.analysis.output_dir).map_err(|e| Error::Config(format!("cannot create output directory `{}`: {}", self.analysis.output_dir.display(), e)))?;

		if let Some(tool) = self.tools.archive.take() {
			self.tools.archive = Some(which::which(&tool).map_err(|_| Error::Config(format!("program `{}` not found.", tool.display())))?);
		}
		if let Some(tool) = self.tools.dot.take() {
			self.tools.dot = Some(which::which(&tool).map_err(|_| Error::Config(format!("program `{}` not found.", tool.display())))?);
		}

		Ok(())
	}

	pub fn target_dir(&self) -> &Path {
		&self.modules.target_directory
	}

	/// Where archives are read from, the target directory unless a source is configured.
	pub fn source_dir(&self) -> &Path {
		self.modules.source_directory.as_deref().unwrap_or(&self.modules.target_directory)
	}

	/// Archives are renamed in place when reading from and writing to the same directory, otherwise copied.
	pub fn is_rename_mode(&self) -> bool {
		self.source_dir() == self.target_dir()
	}

	pub fn output_path(&self, file_name: &str) -> PathBuf {
		self.analysis.output_dir.join(file_name)
	}

	pub fn expected_extensions(&self) -> HashSet<String> {
		self.modules.expected_datafile_extensions.iter()
			.map(|e| e.trim_start_matches('.').to_lowercase())
			.collect()
	}

	pub fn excluded_directories(&self) -> HashSet<String> {
		self.modules.excluded_directories.iter().map(|d| d.to_lowercase()).collect()
	}

	pub fn excluded_archive_directories(&self) -> HashSet<String> {
		self.modules.excluded_archive_directories.iter().map(|d| d.to_lowercase()).collect()
	}

	/// Resolves the settings needed by the precedence graph.
	pub fn precedence_settings(&self) -> PrecedenceSettings {
		let c = &self.criterion_coefficients;
		let mut settings = PrecedenceSettings::default().exponents(c.size, c.mtime, c.file_count);
		for (archive, value) in &self.mod_coefficients {
			settings = settings.coefficient(archive.as_str(), *value);
		}
		for (winner, losers) in &self.mod_precedences {
			for loser in losers {
				settings = settings.force(winner.as_str(), loser.as_str());
			}
		}
		settings
	}
}

/// Expands a leading `~` and makes the path absolute against the working directory.
fn absolute(path: &Path) -> crate::Result<PathBuf> {
	let path = match path.strip_prefix("~") {
		Ok(rest) => {
			let home = std::env::var("HOME").map_err(|_| Error::Config("HOME environment variable not set.".to_string()))?;
			PathBuf::from(home).join(rest)
		},
		Err(_) => path.to_path_buf(),
	};
	if path.is_absolute() {
		Ok(path)
	} else {
		Ok(std::env::current_dir()?.join(path))
	}
}
