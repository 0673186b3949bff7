use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::prelude::*;

use super::*;
use crate::Error;

impl PrecedenceGraph<Acyclic> {
	/// Orders the archives so every archive is installed after the archives it takes precedence over.
	///
	/// Among archives which could go next the one with the fewest files is picked, ties go to the
	/// lowest identifier. Discarded edges are put back, marked as removed, in the returned graph.
	///
	/// # Errors
	/// [`Error::Internal`] if edges remain once no archive can be picked, meaning the graph had a cycle after all.
	pub fn sort(mut self) -> crate::Result<FinishedGraph> {
		/* Only the structure is needed, edges are consumed as the sort goes */
		let mut working: StableDiGraph<u64, ()> = self.graph.map(|_, archive| archive.file_count, |_, _| ());

		let mut frontier = BinaryHeap::<Reverse<(u64, NodeIndex)>>::new();
		for i in working.node_indices() {
			if working.neighbors_directed(i, Incoming).next().is_none() {
				frontier.push(Reverse((working[i], i)));
			}
		}

		let mut picked = Vec::<NodeIndex>::with_capacity(working.node_count());
		while let Some(Reverse((_, i))) = frontier.pop() {
			picked.push(i);
			let outgoing: Vec<(EdgeIndex, NodeIndex)> = working.edges_directed(i, Outgoing).map(|e| (e.id(), e.target())).collect();
			for (e, target) in outgoing {
				working.remove_edge(e);
				if working.neighbors_directed(target, Incoming).next().is_none() {
					frontier.push(Reverse((working[target], target)));
				}
			}
		}

		if working.edge_count() > 0 {
			return Err(Error::Internal(format!("{} overlap(s) left after sorting the precedence graph", working.edge_count())));
		}

		/* Picked from the top of the precedence chain, installation goes the other way */
		picked.reverse();
		for (install_index, &i) in picked.iter().enumerate() {
			self.graph[i].install_index = Some(install_index);
		}

		for (a, b, edge) in std::mem::take(&mut self.discarded) {
			self.graph.add_edge(a, b, edge);
		}

		Ok(FinishedGraph::new(self.graph, self.nodes, picked, self.free, self.normalization))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn order(graph: &FinishedGraph) -> Vec<&str> {
		graph.ordered().map(|a| a.id.as_str()).collect()
	}

	#[test]
	fn dependencies_come_first() {
		let graph = PrecedenceGraph::from_scores(
			&[("a.zip", 2), ("b.zip", 4), ("c.zip", 1)],
			&[("a.zip", "b.zip", 2.0), ("c.zip", "b.zip", 3.0)],
		);
		let graph = graph.break_cycles().unwrap().sort().unwrap();
		assert_eq!(order(&graph), vec!["b.zip", "a.zip", "c.zip"]);
		assert_eq!(graph.archive("b.zip").unwrap().install_index, Some(0));
		assert_eq!(graph.archive("a.zip").unwrap().install_index, Some(1));
		assert_eq!(graph.archive("c.zip").unwrap().install_index, Some(2));
	}

	#[test]
	fn equal_file_counts_fall_back_to_identifier() {
		let graph = PrecedenceGraph::from_scores(
			&[("x.zip", 3), ("y.zip", 3), ("base.zip", 9)],
			&[("x.zip", "base.zip", 2.0), ("y.zip", "base.zip", 2.0)],
		);
		let graph = graph.break_cycles().unwrap().sort().unwrap();
		assert_eq!(order(&graph), vec!["base.zip", "y.zip", "x.zip"]);
	}

	#[test]
	fn removed_edges_are_restored() {
		let graph = PrecedenceGraph::from_scores(
			&[("a.zip", 1), ("b.zip", 1), ("c.zip", 1)],
			&[("a.zip", "b.zip", 0.5), ("b.zip", "c.zip", 0.3), ("c.zip", "a.zip", 0.4)],
		);
		let graph = graph.break_cycles().unwrap().sort().unwrap();
		let removed = graph.edge("b.zip", "c.zip").unwrap();
		assert!(removed.is_removed());
		assert!(!graph.edge("a.zip", "b.zip").unwrap().is_removed());
		assert_eq!(order(&graph), vec!["b.zip", "a.zip", "c.zip"]);
	}
}
