use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use oio_rs::analysis::AnalysisStatus;
use oio_rs::archive::FileEntry;
use oio_rs::config::PrecedenceSettings;
use oio_rs::Analysis;

const ARCHIVES: [&str; 6] = ["a.zip", "b.7z", "c.zip", "d.zip", "e.rar", "f.zip"];
const FILES: [&str; 8] = ["a.esp", "b.esm", "meshes/c.nif", "meshes/d.nif", "textures/e.dds", "textures/f.dds", "g.bsa", "h.esp"];

fn entries() -> impl Strategy<Value = Vec<FileEntry>> {
	let entry = (0..ARCHIVES.len(), 0..FILES.len(), 1..5_000u64, 0..4_000i64, 0..3u8);
	prop::collection::vec(entry, 1..40).prop_map(|raw| {
		let release = NaiveDate::from_ymd_opt(2002, 5, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
		raw.into_iter().map(|(archive, file, size, day, content)| FileEntry {
			archive: ARCHIVES[archive].to_string(),
			filename: FILES[file].to_string(),
			size,
			modified: release + Duration::days(day),
			hash: format!("{}-{}", FILES[file], content),
		}).collect()
	})
}

fn settings() -> impl Strategy<Value = PrecedenceSettings> {
	(0.0..3.0f64, 0.0..3.0f64, 0.0..3.0f64, 0..ARCHIVES.len(), 0..ARCHIVES.len()).prop_map(|(s, m, f, winner, loser)| {
		let settings = PrecedenceSettings::default().exponents(s, m, f);
		if winner != loser { settings.force(ARCHIVES[winner], ARCHIVES[loser]) } else { settings }
	})
}

proptest! {
	#[test]
	fn finished_graph_is_a_valid_order(entries in entries(), settings in settings()) {
		let archives: BTreeSet<String> = entries.iter().map(|e| e.archive.clone()).collect();
		let status = Analysis::new(settings).from_entries(entries).unwrap();

		let result = match status {
			AnalysisStatus::Ordered(result) => result,
			AnalysisStatus::NoOverlaps { free, .. } => {
				prop_assert_eq!(free.into_iter().collect::<BTreeSet<_>>(), archives);
				return Ok(());
			},
		};
		let graph = &result.graph;

		/* Totality */
		let ordered: BTreeSet<String> = result.ordered.iter().cloned().collect();
		let free: BTreeSet<String> = result.free.iter().cloned().collect();
		prop_assert_eq!(ordered.len(), result.ordered.len());
		prop_assert!(ordered.is_disjoint(&free));
		prop_assert_eq!(ordered.union(&free).cloned().collect::<BTreeSet<_>>(), archives);

		for (i, archive) in graph.ordered().enumerate() {
			prop_assert_eq!(archive.install_index, Some(i));
		}

		for view in graph.edges() {
			/* Antisymmetry */
			prop_assert!(graph.edge(&view.target.id, &view.source.id).is_none());
			/* Order validity */
			if !view.edge.is_removed() {
				prop_assert!(view.source.install_index > view.target.install_index);
			}
		}
	}

	#[test]
	fn analysis_is_deterministic(entries in entries(), settings in settings()) {
		let first = Analysis::new(settings.clone()).from_entries(entries.clone()).unwrap();
		let second = Analysis::new(settings).from_entries(entries).unwrap();
		match (first, second) {
			(AnalysisStatus::Ordered(first), AnalysisStatus::Ordered(second)) => {
				prop_assert_eq!(&first.ordered, &second.ordered);
				let scores = |r: &oio_rs::analysis::AnalysisResult| {
					let mut scores: Vec<_> = r.graph.edges()
						.map(|v| (v.source.id.clone(), v.target.id.clone(), v.edge.score().map(f64::to_bits), v.edge.is_removed()))
						.collect();
					scores.sort();
					scores
				};
				prop_assert_eq!(scores(&first), scores(&second));
			},
			(AnalysisStatus::NoOverlaps { .. }, AnalysisStatus::NoOverlaps { .. }) => {},
			_ => prop_assert!(false, "runs disagree on overlaps"),
		}
	}
}
