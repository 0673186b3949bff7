//! # Reports
//!
//! Plain text and Graphviz renderings of the finished graph, plus the lists of suspicious files
//! and planned disk operations. Everything here only reads the results of an analysis.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::planner::{DiskPlan, PlanMode};

mod text;
pub use text::render_text;
mod graphviz;
pub use graphviz::render_graphviz;

/// Files with unexpected extensions, grouped by archive.
pub fn render_suspicious(suspicious: &BTreeMap<String, Vec<String>>) -> String {
	let mut buff = String::new();
	for (archive, files) in suspicious {
		buff.push_str(&format!("{} :\n", archive));
		for file in files {
			buff.push_str(&format!("\t{}\n", file));
		}
	}
	buff
}

/// What [`DiskPlan::execute()`] is going to do, with a warning listing overwritten files first.
pub fn render_disk_operations(plan: &DiskPlan) -> String {
	let t = "    ";
	let mut buff = String::new();

	if !plan.overwritten().is_empty() {
		match plan.mode() {
			PlanMode::Rename => buff.push_str("ERROR: The following mod archives will be lost during the process:\n\n"),
			PlanMode::Copy => buff.push_str("WARNING: The following mod archives will be overwritten during the process:\n\n"),
		}
		for path in plan.overwritten() {
			buff.push_str(&format!("{}\n", path.display()));
		}
		buff.push('\n');
	}

	buff.push_str("Your mod archives will be ");
	match plan.mode() {
		PlanMode::Rename => buff.push_str("renamed "),
		PlanMode::Copy => buff.push_str(&format!("copied from\n{t}{}\nto\n{t}{}\n", plan.source_dir().display(), plan.target_dir().display())),
	}
	buff.push_str("as follow:\n\n");

	for op in plan.operations() {
		buff.push_str(&format!("{}{t}->{t}{}\n", op.archive, op.new_name));
	}
	buff
}

/// Files written by [`write_reports()`].
#[derive(Debug, Clone, Default)]
pub struct ReportFiles {
	pub overlaps_text: PathBuf,
	pub overlaps_dot: PathBuf,
	/// Only when `dot` is configured and succeeded.
	pub overlaps_pdf: Option<PathBuf>,
	/// Only when suspicious files were found.
	pub suspicious: Option<PathBuf>,
	pub disk_operations: PathBuf,
}

/// Writes every report to the output directory of `config`.
///
/// A failure of `dot` only logs a warning, the pdf is a convenience.
pub fn write_reports(config: &crate::Config, result: &crate::analysis::AnalysisResult, plan: &DiskPlan) -> crate::Result<ReportFiles> {
	let settings = config.precedence_settings();
	let overlaps = config.output_path(&config.analysis.overlaps);
	let mut files = ReportFiles {
		overlaps_text: overlaps.with_extension("txt"),
		overlaps_dot: overlaps.with_extension("dot"),
		disk_operations: config.output_path(&config.analysis.disk_operations),
		..Default::default()
	};

	std::fs::write(&files.overlaps_text, render_text(&result.graph, &crate::planner::clean_archive_name))?;
	std::fs::write(&files.overlaps_dot, render_graphviz(&result.graph, &settings))?;
	if let Some(dot) = &config.tools.dot {
		files.overlaps_pdf = run_dot(dot, &files.overlaps_dot, &overlaps.with_extension("pdf"));
	}

	if !result.suspicious.is_empty() {
		let path = config.output_path(&config.analysis.suspicious);
		std::fs::write(&path, render_suspicious(&result.suspicious))?;
		files.suspicious = Some(path);
	}

	std::fs::write(&files.disk_operations, render_disk_operations(plan))?;

	log::debug!("Reports written to {}", config.analysis.output_dir.display());
	Ok(files)
}

fn run_dot(dot: &Path, input: &Path, output: &Path) -> Option<PathBuf> {
	log::trace!("Running {} on {}", dot.display(), input.display());
	match Command::new(dot).arg("-Tpdf").arg(input).arg("-o").arg(output).output() {
		Ok(out) if out.status.success() => Some(output.to_path_buf()),
		Ok(out) => {
			log::warn!("dot failed: {}", String::from_utf8_lossy(&out.stderr).trim());
			None
		},
		Err(e) => {
			log::warn!("couldn't run dot: {}", e);
			None
		},
	}
}
