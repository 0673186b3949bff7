use petgraph::prelude::*;

use super::*;

/// An edge of a [`FinishedGraph`] along with both of its archives.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
	pub source: &'a Archive,
	pub target: &'a Archive,
	pub edge: &'a PrecedenceEdge,
}

/// The sorted precedence graph, read only.
///
/// Holds every archive with its install index, the surviving edges and the edges discarded
/// while breaking cycles which are flagged with [`PrecedenceEdge::is_removed()`].
#[derive(Debug, Clone)]
pub struct FinishedGraph {
	graph: ArchiveGraph,
	nodes: HashMap<String, NodeIndex>,
	order: Vec<NodeIndex>,
	free: Vec<String>,
	normalization: Normalization,
}

impl FinishedGraph {
	pub(super) fn new(graph: ArchiveGraph, nodes: HashMap<String, NodeIndex>, order: Vec<NodeIndex>, free: Vec<String>, normalization: Normalization) -> Self {
		Self { graph, nodes, order, free, normalization }
	}

	fn view(&self, e: EdgeIndex) -> Option<EdgeView<'_>> {
		let (a, b) = self.graph.edge_endpoints(e)?;
		Some(EdgeView { source: &self.graph[a], target: &self.graph[b], edge: &self.graph[e] })
	}

	/// Archives in installation order.
	pub fn ordered(&self) -> impl Iterator<Item = &Archive> {
		self.order.iter().map(|&i| &self.graph[i])
	}

	/// Archives without any overlap, sorted.
	pub fn free(&self) -> &[String] {
		&self.free
	}

	/// Every ordered archive, sorted by identifier.
	pub fn archives(&self) -> Vec<&Archive> {
		let mut archives: Vec<&Archive> = self.graph.node_weights().collect();
		archives.sort_by(|a, b| a.id.cmp(&b.id));
		archives
	}

	pub fn archive(&self, id: &str) -> Option<&Archive> {
		self.nodes.get(id).map(|&i| &self.graph[i])
	}

	/// The edge `a -> b`, surviving or removed.
	pub fn edge(&self, a: &str, b: &str) -> Option<&PrecedenceEdge> {
		let (&na, &nb) = (self.nodes.get(a)?, self.nodes.get(b)?);
		self.graph.find_edge(na, nb).map(|e| &self.graph[e])
	}

	/// Every edge, removed ones included.
	pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
		self.graph.edge_indices().filter_map(|e| self.view(e))
	}

	/// Edges starting from `id`, surviving edges first then removed ones, each sorted by target.
	pub fn outgoing(&self, id: &str) -> Vec<EdgeView<'_>> {
		let Some(&i) = self.nodes.get(id) else { return Vec::new() };
		let mut edges: Vec<EdgeView> = self.graph.edges_directed(i, Outgoing).filter_map(|e| self.view(e.id())).collect();
		edges.sort_by(|x, y| (x.edge.removed, &x.target.id).cmp(&(y.edge.removed, &y.target.id)));
		edges
	}

	pub fn removed_count(&self) -> usize {
		self.graph.edge_weights().filter(|e| e.removed).count()
	}

	/// Exponents that were applied to normalize each ratio family.
	pub fn normalization(&self) -> &Normalization {
		&self.normalization
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn finished() -> FinishedGraph {
		PrecedenceGraph::from_scores(
			&[("a.zip", 1), ("b.zip", 1), ("c.zip", 1), ("d.zip", 1)],
			&[("a.zip", "b.zip", 0.5), ("b.zip", "c.zip", 0.3), ("c.zip", "a.zip", 0.4), ("b.zip", "d.zip", 2.0)],
		).break_cycles().unwrap().sort().unwrap()
	}

	#[test]
	fn outgoing_lists_removed_edges_last() {
		let graph = finished();
		let targets: Vec<_> = graph.outgoing("b.zip").iter().map(|v| (v.target.id.as_str(), v.edge.is_removed())).collect();
		assert_eq!(targets, vec![("d.zip", false), ("c.zip", true)]);
		assert!(graph.outgoing("missing.zip").is_empty());
	}

	#[test]
	fn surviving_edges_respect_install_order() {
		let graph = finished();
		assert_eq!(graph.removed_count(), 1);
		assert_eq!(graph.ordered().count(), 4);
		for view in graph.edges().filter(|v| !v.edge.is_removed()) {
			assert!(view.source.install_index > view.target.install_index);
		}
	}
}
