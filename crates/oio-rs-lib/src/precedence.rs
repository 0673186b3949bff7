//! # Precedence graph
//!
//! Nodes are archives, an edge `A -> B` means `A` must be installed after `B` and so overwrite
//! the files they share.
//!
//! # Usage
//! 1. [`PrecedenceGraph::from_index()`] to build the mirrored conflict graph from an [`OverlapIndex`].
//! 1. [`PrecedenceGraph::score()`] to compute and normalize the similarity ratios of every edge.
//! 1. [`PrecedenceGraph::resolve_directions()`] to keep a single direction per pair of archives.
//! 1. [`PrecedenceGraph::break_cycles()`] to discard a small set of edges making the graph acyclic.
//! 1. [`PrecedenceGraph::sort()`] to get a [`FinishedGraph`] holding the installation order.
//!
//! Each step consumes the graph and returns it in its next state so a half processed graph
//! can't be sorted or reported on.

use std::collections::HashMap;
use std::marker::PhantomData;

use petgraph::prelude::*;
use petgraph::visit::IntoEdgeReferences;

use crate::config::ArchiveName;
use crate::overlap_index::OverlapIndex;

mod edge;
pub use edge::FileOverlap;
pub use edge::PrecedenceEdge;
pub use edge::Ratios;
pub use edge::day_offset;
mod scoring;
pub use scoring::Normalization;
mod direction;
mod cycles;
mod sort;
mod finished;
pub use finished::FinishedGraph;
pub use finished::EdgeView;

/// An archive as a node of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
	pub id: String,
	pub name: ArchiveName,
	pub file_count: u64,
	pub total_size: u64,
	/// Position in the installation order, only set on a [`FinishedGraph`].
	pub install_index: Option<usize>,
}

pub(crate) type ArchiveGraph = StableDiGraph<Archive, PrecedenceEdge>;

/* Graph states */
#[derive(Debug, Clone)]
pub struct Unscored;
#[derive(Debug, Clone)]
pub struct Scored;
#[derive(Debug, Clone)]
pub struct Resolved;
#[derive(Debug, Clone)]
pub struct Acyclic;

#[derive(Debug, Clone)]
pub struct PrecedenceGraph<State> {
	graph: ArchiveGraph,
	nodes: HashMap<String, NodeIndex>,
	/// Archives without any overlap, sorted.
	free: Vec<String>,
	normalization: Normalization,
	/// Edges removed while breaking cycles, kept for reporting.
	discarded: Vec<(NodeIndex, NodeIndex, PrecedenceEdge)>,
	state: PhantomData<State>,
}

impl PrecedenceGraph<Unscored> {
	/// Builds the conflict graph.
	///
	/// Every pair of versions of an overlapping file adds the file to the edges between their
	/// archives in both directions. Archives left without edges are moved to the free list.
	pub fn from_index(index: &OverlapIndex) -> Self {
		let mut graph = ArchiveGraph::default();
		let mut nodes = HashMap::<String, NodeIndex>::new();

		for (id, stats) in index.archives() {
			let i = graph.add_node(Archive {
				id: id.to_string(),
				name: ArchiveName::new(id),
				file_count: stats.file_count,
				total_size: stats.total_size,
				install_index: None,
			});
			nodes.insert(id.to_string(), i);
		}

		for (filename, versions) in index.overlapping() {
			for (i, a) in versions.iter().enumerate() {
				for b in versions.iter().skip(i + 1) {
					if a.archive == b.archive { continue; }
					let (Some(&na), Some(&nb)) = (nodes.get(&a.archive), nodes.get(&b.archive)) else {
						continue;
					};
					add_file_overlap(&mut graph, na, nb, filename, FileOverlap::new((a.size, b.size), (a.modified, b.modified)));
					add_file_overlap(&mut graph, nb, na, filename, FileOverlap::new((b.size, a.size), (b.modified, a.modified)));
				}
			}
		}

		let mut graph = Self {
			graph,
			nodes,
			free: Default::default(),
			normalization: Default::default(),
			discarded: Default::default(),
			state: PhantomData,
		};
		graph.release_isolated_archives();

		log::debug!("Built precedence graph with {} archive(s) and {} overlap(s), {} free archive(s)",
			graph.archive_count(), graph.graph.edge_count() / 2, graph.free.len());
		graph
	}
}

fn add_file_overlap(graph: &mut ArchiveGraph, a: NodeIndex, b: NodeIndex, filename: &str, overlap: FileOverlap) {
	let e = match graph.find_edge(a, b) {
		Some(e) => e,
		None => graph.add_edge(a, b, PrecedenceEdge::default()),
	};
	graph[e].files.insert(filename.to_string(), overlap);
}

impl<State> PrecedenceGraph<State> {
	fn into_state<Next>(self) -> PrecedenceGraph<Next> {
		PrecedenceGraph {
			graph: self.graph,
			nodes: self.nodes,
			free: self.free,
			normalization: self.normalization,
			discarded: self.discarded,
			state: PhantomData,
		}
	}

	/// Moves every archive without a remaining edge to the free list.
	fn release_isolated_archives(&mut self) {
		let isolated: Vec<NodeIndex> = self.graph.node_indices()
			.filter(|&i| self.graph.neighbors_undirected(i).next().is_none())
			.collect();
		for i in isolated {
			if let Some(archive) = self.graph.remove_node(i) {
				self.nodes.remove(&archive.id);
				self.free.push(archive.id);
			}
		}
		self.free.sort();
	}

	/// Number of archives taking part in the graph, free archives excluded.
	pub fn archive_count(&self) -> usize {
		self.graph.node_count()
	}

	/// Number of edges currently in the graph, discarded edges excluded.
	pub fn edge_count(&self) -> usize {
		self.graph.edge_count()
	}

	/// Archives without any overlap.
	pub fn free(&self) -> &[String] {
		&self.free
	}

	pub fn archive(&self, id: &str) -> Option<&Archive> {
		self.nodes.get(id).map(|&i| &self.graph[i])
	}

	/// The edge `a -> b` if it currently exists.
	pub fn edge(&self, a: &str, b: &str) -> Option<&PrecedenceEdge> {
		let (&na, &nb) = (self.nodes.get(a)?, self.nodes.get(b)?);
		self.graph.find_edge(na, nb).map(|e| &self.graph[e])
	}

	/// Every current edge as `(source, target, edge)`.
	pub fn edges(&self) -> impl Iterator<Item = (&Archive, &Archive, &PrecedenceEdge)> {
		self.graph.edge_references().map(|e| (&self.graph[e.source()], &self.graph[e.target()], e.weight()))
	}

	pub fn normalization(&self) -> &Normalization {
		&self.normalization
	}

	pub fn is_cyclic(&self) -> bool {
		petgraph::algo::is_cyclic_directed(&self.graph)
	}
}
