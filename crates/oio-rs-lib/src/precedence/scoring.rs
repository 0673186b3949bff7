//! Similarity ratios of every edge.
//!
//! Scoring happens in two passes. The first computes the raw ratios of each edge and
//! the maximum of every ratio family, the second raises each family to the power
//! bringing its maximum down to [`AMPLITUDE`].

use petgraph::prelude::*;

use super::*;

/// The value the largest ratio of each family is normalized to.
pub const AMPLITUDE: f64 = 10.0;

/// Exponents applied to each ratio family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
	pub size: f64,
	pub mtime: f64,
	pub file_count: f64,
}

impl Default for Normalization {
	fn default() -> Self {
		Self { size: 1.0, mtime: 1.0, file_count: 1.0 }
	}
}

/// Exponent bringing `max` to [`AMPLITUDE`].
///
/// A family whose maximum is not above `1` can't be scaled this way and is left as is.
fn normalizing_power(max: f64) -> f64 {
	if max > 1.0 && max.is_finite() {
		AMPLITUDE.ln() / max.ln()
	} else {
		1.0
	}
}

/// Geometric mean of `values`, computed in log space to avoid overflowing on large edges.
fn geometric_mean(values: impl Iterator<Item = f64>) -> f64 {
	let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v.ln(), count + 1));
	if count == 0 {
		return 1.0;
	}
	(sum / count as f64).exp()
}

/// Raw ratios of an edge `a -> b`.
fn raw_ratios(a: &Archive, b: &Archive, edge: &PrecedenceEdge) -> Ratios {
	Ratios {
		size: geometric_mean(edge.files.values().map(|f| f.sizes.0 as f64 / f.sizes.1 as f64)),
		mtime: geometric_mean(edge.files.values().map(|f| f.days.0 as f64 / f.days.1 as f64)),
		/* XXX: Favours the archive with fewer files, check against real load orders. */
		file_count: b.file_count as f64 / a.file_count as f64,
	}
}

/// Computes the raw ratios of every edge, returning the maximum of each family.
fn compute_raw_ratios(graph: &mut ArchiveGraph) -> Ratios {
	let mut max = Ratios { size: 0.0, mtime: 0.0, file_count: 0.0 };
	let edges: Vec<EdgeIndex> = graph.edge_indices().collect();
	for e in edges {
		let Some((a, b)) = graph.edge_endpoints(e) else { continue };
		let ratios = raw_ratios(&graph[a], &graph[b], &graph[e]);
		max.size = max.size.max(ratios.size);
		max.mtime = max.mtime.max(ratios.mtime);
		max.file_count = max.file_count.max(ratios.file_count);
		graph[e].ratios = ratios;
	}
	max
}

impl PrecedenceGraph<Unscored> {
	/// Computes the normalized similarity ratios of every edge.
	pub fn score(mut self) -> PrecedenceGraph<Scored> {
		let max = compute_raw_ratios(&mut self.graph);
		let power = Normalization {
			size: normalizing_power(max.size),
			mtime: normalizing_power(max.mtime),
			file_count: normalizing_power(max.file_count),
		};
		log::debug!("Ratio maxima: size {:.3}, mtime {:.3}, file count {:.3}", max.size, max.mtime, max.file_count);

		for edge in self.graph.edge_weights_mut() {
			edge.ratios.size = edge.ratios.size.powf(power.size);
			edge.ratios.mtime = edge.ratios.mtime.powf(power.mtime);
			edge.ratios.file_count = edge.ratios.file_count.powf(power.file_count);
		}

		self.normalization = power;
		self.into_state()
	}
}
