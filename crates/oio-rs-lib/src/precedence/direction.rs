use petgraph::prelude::*;

use super::*;
use crate::config::{PrecedenceSettings, Verdict};

/// Combined score of an edge `a -> b`, above `1` when `a` should be installed after `b`.
fn edge_score(settings: &PrecedenceSettings, a: &Archive, b: &Archive, ratios: &Ratios) -> f64 {
	settings.archive_coefficient(&a.name) / settings.archive_coefficient(&b.name)
		* ratios.size.powf(settings.size_exponent())
		* ratios.mtime.powf(settings.mtime_exponent())
		* ratios.file_count.powf(settings.file_count_exponent())
}

impl PrecedenceGraph<Scored> {
	/// Keeps at most one direction between every pair of overlapping archives.
	///
	/// A configured precedence always decides. Otherwise an edge survives only when its score
	/// is at least `1`, so a pair where neither direction reaches it loses both edges. Should
	/// both directions reach it the higher score wins, and on an exact tie the edge starting
	/// from the archive with the greater identifier is kept.
	pub fn resolve_directions(mut self, settings: &PrecedenceSettings) -> PrecedenceGraph<Resolved> {
		let mut pairs: Vec<(NodeIndex, NodeIndex)> = self.graph.edge_indices()
			.filter_map(|e| self.graph.edge_endpoints(e))
			.map(|(a, b)| if a < b { (a, b) } else { (b, a) })
			.collect();
		pairs.sort();
		pairs.dedup();

		let mut forced = 0;
		for (a, b) in pairs {
			let forward = self.graph.find_edge(a, b)
				.map(|e| (e, edge_score(settings, &self.graph[a], &self.graph[b], &self.graph[e].ratios)));
			let reverse = self.graph.find_edge(b, a)
				.map(|e| (e, edge_score(settings, &self.graph[b], &self.graph[a], &self.graph[e].ratios)));

			let verdict = settings.verdict(&self.graph[a].name, &self.graph[b].name);
			let keep = match verdict {
				Verdict::Precedes => forward,
				Verdict::Follows => reverse,
				Verdict::Unknown => {
					let forward = forward.filter(|&(_, score)| score >= 1.0);
					let reverse = reverse.filter(|&(_, score)| score >= 1.0);
					match (forward, reverse) {
						(Some(ab), Some(ba)) => {
							if ab.1 > ba.1 || (ab.1 == ba.1 && self.graph[a].id > self.graph[b].id) { Some(ab) } else { Some(ba) }
						},
						(ab, ba) => ab.or(ba),
					}
				},
			};

			for (e, _) in forward.into_iter().chain(reverse) {
				if keep.map(|(k, _)| k) != Some(e) {
					self.graph.remove_edge(e);
				}
			}
			if let Some((e, score)) = keep {
				let edge = &mut self.graph[e];
				edge.score = Some(score);
				edge.forced = verdict != Verdict::Unknown;
				if edge.forced { forced += 1; }
			}
		}

		self.release_isolated_archives();
		log::debug!("Resolved {} overlap direction(s), {} forced", self.graph.edge_count(), forced);
		self.into_state()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::archive::FileEntry;
	use chrono::NaiveDate;

	fn entry(archive: &str, filename: &str, size: u64, day: i64, hash: &str) -> FileEntry {
		FileEntry {
			archive: archive.to_string(),
			filename: filename.to_string(),
			size,
			modified: NaiveDate::from_ymd_opt(2002, 5, 1).unwrap().and_hms_opt(12, 0, 0).unwrap() + chrono::Duration::days(day),
			hash: hash.to_string(),
		}
	}

	fn scored_pair() -> PrecedenceGraph<Scored> {
		let mut index = OverlapIndex::new();
		index.extend([
			entry("old.zip", "x.nif", 100, 100, "h1"),
			entry("new.zip", "x.nif", 200, 200, "h2"),
		]);
		PrecedenceGraph::from_index(&index).score()
	}

	#[test]
	fn higher_score_survives() {
		let graph = scored_pair().resolve_directions(&PrecedenceSettings::default());
		assert_eq!(graph.edge_count(), 1);
		let edge = graph.edge("new.zip", "old.zip").unwrap();
		assert!(edge.score().unwrap() > 1.0);
		assert!(!edge.is_forced());
		assert!(graph.edge("old.zip", "new.zip").is_none());
	}

	#[test]
	fn forced_verdict_overrides_score() {
		let settings = PrecedenceSettings::default().force("old.zip", "new.zip");
		let graph = scored_pair().resolve_directions(&settings);
		assert_eq!(graph.edge_count(), 1);
		let edge = graph.edge("old.zip", "new.zip").unwrap();
		assert!(edge.is_forced());
		assert!(edge.score().unwrap() < 1.0);
	}

	#[test]
	fn coefficient_can_flip_direction() {
		let settings = PrecedenceSettings::default().coefficient("old.zip", 1000.0);
		let graph = scored_pair().resolve_directions(&settings);
		assert!(graph.edge("old.zip", "new.zip").is_some());
		assert!(graph.edge("new.zip", "old.zip").is_none());
	}

	#[test]
	fn negative_coefficient_drops_both_directions() {
		let settings = PrecedenceSettings::default().coefficient("old.zip", -2.0);
		let graph = scored_pair().resolve_directions(&settings);
		assert_eq!(graph.edge_count(), 0);
		assert_eq!(graph.archive_count(), 0);
		assert_eq!(graph.free().to_vec(), vec!["new.zip", "old.zip"]);
	}

	#[test]
	fn unforced_edges_score_at_least_one() {
		for coefficient in [-2.0, -0.5, 0.01, 0.5, 2.0, 1000.0] {
			let settings = PrecedenceSettings::default().coefficient("old.zip", coefficient);
			let graph = scored_pair().resolve_directions(&settings);
			for (_, _, edge) in graph.edges() {
				assert!(!edge.is_forced());
				assert!(edge.score().unwrap() >= 1.0, "coefficient {} kept a score below one", coefficient);
			}
		}
	}

	#[test]
	fn exact_tie_is_deterministic() {
		let mut index = OverlapIndex::new();
		index.extend([
			entry("a.zip", "x.nif", 100, 100, "h1"),
			entry("b.zip", "x.nif", 100, 100, "h2"),
		]);
		let graph = PrecedenceGraph::from_index(&index).score().resolve_directions(&PrecedenceSettings::default());
		assert_eq!(graph.edge_count(), 1);
		assert!(graph.edge("b.zip", "a.zip").is_some());
	}

	#[test]
	fn resolution_is_idempotent() {
		let settings = PrecedenceSettings::default().exponents(1.0, 2.0, 0.5);
		let first = scored_pair().resolve_directions(&settings);
		let second = scored_pair().resolve_directions(&settings);
		let first: Vec<_> = first.edges().map(|(a, b, e)| (a.id.clone(), b.id.clone(), e.score())).collect();
		let second: Vec<_> = second.edges().map(|(a, b, e)| (a.id.clone(), b.id.clone(), e.score())).collect();
		assert_eq!(first, second);
	}
}
