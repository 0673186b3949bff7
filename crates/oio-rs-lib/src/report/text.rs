use crate::precedence::{Archive, FinishedGraph};

const TAB: usize = 4;
const MAX_LISTED_FILES: usize = 20;
/// Lines after which the column titles are repeated.
const TITLE_EVERY: usize = 40;

const COL_FS1: usize = 5;
const COL_FS2: usize = 5;
const COL_NSR: usize = 6;
const COL_NTR: usize = 6;
const COL_FCR: usize = 8;
const COL_SCORE: usize = 9;
const COL_FC: usize = 6;
const COL_SIZE: usize = 6;

/// Sizes as at most three digits and a unit: `o`, `K` or `M`.
pub(crate) fn format_size(size: u64) -> String {
	if size < 1_000 {
		format!("{:>3}o", size)
	} else if size < 1_000_000 {
		format!("{:>3}K", size / 1_000)
	} else {
		format!("{:>3}M", size / 1_000_000)
	}
}

fn legend() -> String {
	let t = " ".repeat(TAB);
	[
		"*** Graph of Mod Install Precedence ***\n\n".to_string(),
		"Each mod name is a node.\n".to_string(),
		"Edge directions are from unindented lines to indented ones:\n\n".to_string(),
		"mod1.7z\n".to_string(),
		format!("{t}mod2.7z\n\n"),
		"means mod1 should overwrite files of mod2.\n\n".to_string(),
		"Sizes of overlapping files:\n".to_string(),
		format!("{t}FS1 = File Size from mod1\n"),
		format!("{t}FS2 = File Size from mod2\n"),
		"Values comparing mod1 and mod2:\n".to_string(),
		format!("{t}NSR = Normalized Size Ratio of overlapping files\n"),
		format!("{t}NTR = Normalized modification Time Ratio of overlapping files\n"),
		format!("{t}FCR = File Count Ratio of all files\n"),
		format!("{t}Score = coefficients x NSR^Ws x NTR^Wt x FCR^Wf\n"),
		"Values based on the whole mod:\n".to_string(),
		format!("{t}FC = File Count\n"),
		format!("{t}Size = Total (uncompressed) Size of the mod\n\n"),
	].concat()
}

fn titles(col_file: usize) -> String {
	let width = col_file + COL_FS1 + COL_FS2 + COL_NSR + COL_NTR + COL_FCR + COL_SCORE + COL_FC + COL_SIZE;
	let sep = "-".repeat(width);
	format!("{sep}\n{:<col_file$}{:>COL_FS1$}{:>COL_FS2$}{:>COL_NSR$}{:>COL_NTR$}{:>COL_FCR$}{:>COL_SCORE$}{:>COL_FC$}{:>COL_SIZE$}\n{sep}\n",
		"Mod Filenames and Overlapping Files", "FS1", "FS2", "NSR", "NTR", "FCR", "Score", "FC", "Size")
}

/// Renders the finished graph as a plain text table.
///
/// Each archive with outgoing edges is followed by the archives it overwrites, indented, along
/// with the edge ratios and some of the conflicting files. `display_name` turns archive
/// identifiers into the names shown.
pub fn render_text(graph: &FinishedGraph, display_name: &dyn Fn(&str) -> String) -> String {
	let sources: Vec<&Archive> = graph.archives().into_iter()
		.filter(|a| !graph.outgoing(&a.id).is_empty())
		.collect();

	let longest_source = sources.iter().map(|a| display_name(&a.id).chars().count()).max().unwrap_or(0);
	let longest_target = graph.edges().map(|v| display_name(&v.target.id).chars().count()).max().unwrap_or(0);
	let col_file = longest_source.max(TAB + longest_target);

	let t = " ".repeat(TAB);
	let titles = titles(col_file);
	let mut buff = legend();
	buff.push_str(&titles);

	let mut lines = 0;
	for source in sources {
		if lines > TITLE_EVERY {
			buff.push_str(&titles);
			lines = 0;
		}
		let width = col_file + COL_FS1 + COL_FS2 + COL_NSR + COL_NTR + COL_FCR + COL_SCORE;
		buff.push_str(&format!("{:<width$}{:>COL_FC$}{:>COL_SIZE$}\n", display_name(&source.id), source.file_count, format_size(source.total_size)));
		lines += 1;

		for view in graph.outgoing(&source.id) {
			let edge = view.edge;
			if edge.is_removed() {
				buff.push_str("(discarded overlap:)\n");
			}
			let width = col_file + COL_FS1 + COL_FS2 - TAB;
			let ratios = edge.ratios();
			buff.push_str(&format!("{t}{:<width$}{:>COL_NSR$.2}{:>COL_NTR$.2}{:>COL_FCR$.2}{:>COL_SCORE$.2}{:>COL_FC$}{:>COL_SIZE$}\n",
				display_name(&view.target.id),
				ratios.size,
				ratios.mtime,
				ratios.file_count,
				edge.score().unwrap_or(0.0),
				view.target.file_count,
				format_size(view.target.total_size)));
			lines += 1;

			let width = col_file.saturating_sub(2 * TAB);
			for (filename, overlap) in edge.files().iter().take(MAX_LISTED_FILES) {
				buff.push_str(&format!("{t}{t}{:<width$}{:>COL_FS1$}{:>COL_FS2$}\n", filename, format_size(overlap.sizes.0), format_size(overlap.sizes.1)));
				lines += 1;
			}
			if edge.files().len() > MAX_LISTED_FILES {
				buff.push_str(&format!("{t}{t}[...]\n"));
				lines += 1;
			}
		}
	}
	buff
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::precedence::PrecedenceGraph;

	#[test]
	fn sizes() {
		assert_eq!(format_size(0), "  0o");
		assert_eq!(format_size(999), "999o");
		assert_eq!(format_size(1_500), "  1K");
		assert_eq!(format_size(25_000_000), " 25M");
	}

	#[test]
	fn table_lists_edges_under_sources() {
		let graph = PrecedenceGraph::from_scores(
			&[("a.zip", 1), ("b.zip", 1), ("c.zip", 1)],
			&[("a.zip", "b.zip", 0.5), ("b.zip", "c.zip", 0.3), ("c.zip", "a.zip", 0.4)],
		).break_cycles().unwrap().sort().unwrap();
		let text = render_text(&graph, &|id: &str| id.to_uppercase());

		assert!(text.starts_with("*** Graph of Mod Install Precedence ***"));
		let body = text.split("Size\n").last().unwrap();
		let lines: Vec<&str> = body.lines().filter(|l| !l.starts_with('-')).collect();
		assert!(lines[0].starts_with("A.ZIP"));
		assert!(lines[1].starts_with("    B.ZIP"));
		assert!(lines[1].contains("0.50"));
		assert!(lines[2].starts_with("B.ZIP"));
		assert_eq!(lines[3], "(discarded overlap:)");
		assert!(lines[4].starts_with("    C.ZIP"));
		assert!(lines[5].starts_with("C.ZIP"));
	}
}
