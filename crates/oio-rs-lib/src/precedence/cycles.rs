//! Cycle elimination, an approximation of the minimum feedback arc set.
//!
//! Every edge gets an integer weight from its score. While a cycle exists, the lowest weight
//! on it is subtracted from every edge of the cycle and edges reaching zero are taken out.
//! Taken out edges are then put back one at a time, only those creating a cycle again are
//! discarded for good.

use std::collections::HashSet;

use petgraph::prelude::*;
use petgraph::algo::is_cyclic_directed;

use super::*;
use crate::Error;

/// Integer weight of a score, scores are kept with three decimals.
fn weight_of(score: Option<f64>) -> u64 {
	/* `as` saturates, negative and NaN scores become 0 */
	(score.unwrap_or(0.0) * 1000.0).round() as u64
}

/// Edges of the first cycle met by a depth first search, in path order.
///
/// Nodes are started from in index order and their outgoing edges followed by target index
/// so the same graph always yields the same cycle.
pub(crate) fn find_cycle<N, E>(graph: &StableDiGraph<N, E>) -> Option<Vec<EdgeIndex>> {
	struct Frame {
		node: NodeIndex,
		edges: Vec<(EdgeIndex, NodeIndex)>,
		next: usize,
	}

	let frame = |node: NodeIndex| {
		let mut edges: Vec<_> = graph.edges_directed(node, Outgoing).map(|e| (e.id(), e.target())).collect();
		edges.sort_by_key(|(_, target)| *target);
		Frame { node, edges, next: 0 }
	};

	let mut visited = HashSet::<NodeIndex>::new();
	for start in graph.node_indices() {
		if !visited.insert(start) { continue; }

		let mut path = vec![frame(start)];
		/* path_edges[i] leads from path[i] to path[i + 1] */
		let mut path_edges = Vec::<EdgeIndex>::new();

		while let Some(top) = path.last_mut() {
			let next = top.edges.get(top.next).copied();
			top.next += 1;
			match next {
				Some((edge, target)) => {
					if let Some(position) = path.iter().position(|f| f.node == target) {
						let mut cycle = path_edges[position..].to_vec();
						cycle.push(edge);
						return Some(cycle);
					}
					if visited.insert(target) {
						path_edges.push(edge);
						path.push(frame(target));
					}
				},
				None => {
					path.pop();
					path_edges.pop();
				},
			}
		}
	}
	None
}

impl PrecedenceGraph<Resolved> {
	/// Discards edges until the graph is acyclic.
	///
	/// # Errors
	/// [`Error::Internal`] if a cycle survives, this should never happen.
	pub fn break_cycles(mut self) -> crate::Result<PrecedenceGraph<Acyclic>> {
		for edge in self.graph.edge_weights_mut() {
			edge.weight = weight_of(edge.score);
		}

		/* Pass 1: wear cycles down */
		let mut candidates = Vec::<(NodeIndex, NodeIndex, PrecedenceEdge)>::new();
		while let Some(cycle) = find_cycle(&self.graph) {
			let min = cycle.iter().map(|&e| self.graph[e].weight).min().unwrap_or(0);
			for e in cycle {
				let edge = &mut self.graph[e];
				edge.weight -= min;
				if edge.weight == 0 {
					let (a, b) = self.graph.edge_endpoints(e).ok_or_else(|| Error::Internal("cycle edge without endpoints".to_string()))?;
					if let Some(edge) = self.graph.remove_edge(e) {
						log::trace!("Taking out {} -> {}", self.graph[a].id, self.graph[b].id);
						candidates.push((a, b, edge));
					}
				}
			}
		}

		/* Pass 2: put back what doesn't hurt */
		for (a, b, edge) in candidates {
			let e = self.graph.add_edge(a, b, edge);
			if is_cyclic_directed(&self.graph) {
				if let Some(mut edge) = self.graph.remove_edge(e) {
					log::trace!("Discarding {} -> {}", self.graph[a].id, self.graph[b].id);
					edge.removed = true;
					self.discarded.push((a, b, edge));
				}
			}
		}

		if is_cyclic_directed(&self.graph) {
			return Err(Error::Internal("precedence graph still has cycles after cycle elimination".to_string()));
		}

		if !self.discarded.is_empty() {
			log::info!("Discarded {} overlap(s) in order to break cycling overlap precedence.", self.discarded.len());
		}
		Ok(self.into_state())
	}
}

impl PrecedenceGraph<Acyclic> {
	/// Edges discarded to break cycles as `(source, target, edge)`.
	pub fn discarded(&self) -> impl Iterator<Item = (&Archive, &Archive, &PrecedenceEdge)> {
		self.discarded.iter().map(|(a, b, e)| (&self.graph[*a], &self.graph[*b], e))
	}
}
