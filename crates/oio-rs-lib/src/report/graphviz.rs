use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::config::PrecedenceSettings;
use crate::precedence::FinishedGraph;

/// Archive basename without its extension.
fn stem(archive: &str) -> &str {
	let base = archive.rsplit('/').next().unwrap_or(archive);
	match base.rsplit_once('.') {
		Some((stem, _)) if !stem.is_empty() => stem,
		_ => base,
	}
}

fn node_id(archive: &str) -> String {
	static NON_WORD: OnceLock<Regex> = OnceLock::new();
	let non_word = NON_WORD.get_or_init(|| Regex::new(r"\W+").expect("regex failed to compile."));
	format!("_{}", non_word.replace_all(stem(archive), "_"))
}

/// Assigns every archive a distinct node identifier, archives sanitized to the same one get a
/// numbered suffix in the order given.
fn node_ids<'a>(archives: impl IntoIterator<Item = &'a str>) -> HashMap<&'a str, String> {
	let mut used = HashSet::new();
	let mut ids = HashMap::new();
	for archive in archives {
		let base = node_id(archive);
		let mut id = base.clone();
		let mut n = 1;
		while !used.insert(id.clone()) {
			n += 1;
			id = format!("{}_{}", base, n);
		}
		ids.insert(archive, id);
	}
	ids
}

/// Replaces the space closest to `pos`, looking at most `max` characters either way, with a line break.
fn break_near(label: &mut [char], pos: usize, max: usize) {
	let left = (pos.saturating_sub(max)..pos.min(label.len())).rev().find(|&i| label[i] == ' ');
	let right = (pos..(pos + max).min(label.len())).find(|&i| label[i] == ' ');
	let at = match (left, right) {
		(Some(l), Some(r)) => if pos - l < r - pos { l } else { r },
		(Some(l), None) => l,
		(None, Some(r)) => r,
		(None, None) => return,
	};
	label[at] = '\n';
}

/// Splits long names over several lines so nodes stay roughly square.
fn wrap_label(name: &str) -> String {
	let mut label: Vec<char> = name.chars().collect();
	let parts = ((label.len() / 2) as f64).sqrt().round().max(1.0) as usize;
	let part = label.len() / parts;
	for i in 1..parts {
		break_near(&mut label, i * part, part);
	}
	label.into_iter().collect()
}

fn escape_html(text: &str) -> String {
	text.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&#x27;")
}

/// Renders the finished graph in the Graphviz `dot` language.
///
/// Discarded edges are red, edges set by a configured precedence green, the width of other
/// edges grows with their score.
pub fn render_graphviz(graph: &FinishedGraph, settings: &PrecedenceSettings) -> String {
	let mut buff = String::from("digraph G {\n");
	let archives = graph.archives();
	let ids = node_ids(archives.iter().map(|a| a.id.as_str()));

	for archive in &archives {
		let label = escape_html(&wrap_label(stem(&archive.id))).replace('\n', "<br/>");
		let coefficient = settings.archive_coefficient(&archive.name);
		let coefficient = if coefficient != 1.0 {
			format!("<br/><font color=\"green\">coeff={}</font>", coefficient)
		} else {
			String::new()
		};
		buff.push_str(&format!("\t{} [label=<{}{}>];\n", ids[archive.id.as_str()], label, coefficient));
	}

	for source in &archives {
		for view in graph.outgoing(&source.id) {
			let (thickness, color) = if view.edge.is_removed() {
				(3.0, ", color=red")
			} else if view.edge.is_forced() {
				(3.0, ", color=green")
			} else {
				let score = view.edge.score().unwrap_or(1.0);
				(((score.ln() + 0.5) * 100.0).round() / 100.0, "")
			};
			buff.push_str(&format!("\t{} -> {} [style=\"setlinewidth({})\"{}];\n", ids[source.id.as_str()], ids[view.target.id.as_str()], thickness, color));
		}
	}

	buff.push_str("}\n");
	buff
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::precedence::PrecedenceGraph;

	#[test]
	fn node_ids_are_sanitized() {
		assert_eq!(node_id("sub/Better Bodies 2.1.7z"), "_Better_Bodies_2_1");
		assert_eq!(node_id("a-b.zip"), "_a_b");
	}

	#[test]
	fn colliding_node_ids_are_numbered() {
		let ids = node_ids(["a-b.zip", "a_b.zip", "sub/a_b.7z", "c.zip"]);
		assert_eq!(ids["a-b.zip"], "_a_b");
		assert_eq!(ids["a_b.zip"], "_a_b_2");
		assert_eq!(ids["sub/a_b.7z"], "_a_b_3");
		assert_eq!(ids["c.zip"], "_c");
	}

	#[test]
	fn same_stem_archives_stay_apart() {
		let graph = PrecedenceGraph::from_scores(
			&[("a.zip", 1), ("sub/a.7z", 2)],
			&[("a.zip", "sub/a.7z", 2.0)],
		).break_cycles().unwrap().sort().unwrap();
		let dot = render_graphviz(&graph, &PrecedenceSettings::default());
		assert!(dot.contains("\t_a [label=<a>];\n"));
		assert!(dot.contains("\t_a_2 [label=<a>];\n"));
		assert!(dot.contains("\t_a -> _a_2 [style=\"setlinewidth(1.19)\"];\n"));
	}

	#[test]
	fn long_labels_are_wrapped() {
		assert_eq!(wrap_label("short"), "short");
		assert_eq!(wrap_label("Better Bodies"), "Better\nBodies");
		let wrapped = wrap_label("The Rise of the Tribe Unmourned Expansion");
		assert!(wrapped.lines().count() > 2);
		assert_eq!(wrapped.replace('\n', " "), "The Rise of the Tribe Unmourned Expansion");
	}

	#[test]
	fn edges_are_styled() {
		let graph = PrecedenceGraph::from_scores(
			&[("a.zip", 1), ("b.zip", 1), ("c.zip", 1)],
			&[("a.zip", "b.zip", 0.5), ("b.zip", "c.zip", 0.3), ("c.zip", "a.zip", 0.4)],
		).break_cycles().unwrap().sort().unwrap();
		let settings = PrecedenceSettings::default().coefficient("c.zip", 2.0);
		let dot = render_graphviz(&graph, &settings);

		assert!(dot.starts_with("digraph G {\n"));
		assert!(dot.contains("\t_c [label=<c<br/><font color=\"green\">coeff=2</font>>];\n"));
		assert!(dot.contains("\t_a [label=<a>];\n"));
		assert!(dot.contains("\t_b -> _c [style=\"setlinewidth(3)\", color=red];\n"));
		/* ln(0.5) + 0.5 = -0.19 */
		assert!(dot.contains("\t_a -> _b [style=\"setlinewidth(-0.19)\"];\n"));
		assert!(dot.ends_with("}\n"));
	}
}
