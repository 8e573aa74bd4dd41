//! Graph types for alternative route computation.
//!
//! The algorithms here mutate edge weights all the time (penalization) and
//! remove nodes during contraction, so the central graph type is a dynamic
//! adjacency list rather than an adjacency array. Forward and reverse lists
//! are kept in sync under every mutation.

use crate::io::*;
use std::io::Result;

/// Node ids are 32bit unsigned ints
pub type NodeId = u32;
/// Edge weights are 32bit unsigned ints
pub type Weight = u32;
/// A sufficiently large infinity constant.
/// Set to `u32::MAX / 2` so that `INFINITY + x` for `x <= INFINITY` does not overflow.
pub const INFINITY: Weight = u32::MAX / 2;
/// Sentinel for "no node", used in parent vectors and the like.
pub const INVALID_NODE: NodeId = u32::MAX;

/// Simple struct for weighted links.
/// No behaviour, just a pure data struct.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Link {
    pub node: NodeId,
    pub weight: Weight,
}

/// A node sequence with its total length.
/// An unreachable target yields an empty sequence and `INFINITY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    pub length: Weight,
}

impl Path {
    pub fn unreachable() -> Path {
        Path {
            nodes: Vec::new(),
            length: INFINITY,
        }
    }
}

/// Minimal read access used by the search algorithms.
/// Implemented by the graph itself (outgoing arcs) and by `Reversed` (incoming arcs),
/// so one Dijkstra works in both directions.
pub trait ArcGraph {
    fn num_nodes(&self) -> usize;
    fn arcs(&self, node: NodeId) -> &[Link];
}

/// A directed graph with forward and reverse adjacency lists.
///
/// Both lists always describe the same edge set. There is at most one edge
/// per node pair - inserting an existing pair keeps the smaller weight.
#[derive(Debug, Clone)]
pub struct AdjacencyGraph {
    out_arcs: Vec<Vec<Link>>,
    rev_out_arcs: Vec<Vec<Link>>,
}

impl AdjacencyGraph {
    /// Create a graph with `n` nodes and no edges.
    pub fn new(n: usize) -> AdjacencyGraph {
        AdjacencyGraph {
            out_arcs: vec![Vec::new(); n],
            rev_out_arcs: vec![Vec::new(); n],
        }
    }

    /// Build from an adjacency array (`first_out` has `n + 1` entries, `head` and
    /// `weight` one entry per edge). This is the on-disk layout.
    pub fn from_csr(first_out: &[u32], head: &[NodeId], weight: &[Weight]) -> AdjacencyGraph {
        assert!(!first_out.is_empty());
        assert_eq!(*first_out.last().unwrap() as usize, head.len());
        assert_eq!(head.len(), weight.len());

        let mut graph = AdjacencyGraph::new(first_out.len() - 1);
        for node in 0..first_out.len() - 1 {
            for edge in first_out[node] as usize..first_out[node + 1] as usize {
                graph.add_edge(
                    node as NodeId,
                    Link {
                        node: head[edge],
                        weight: weight[edge],
                    },
                );
            }
        }
        graph
    }

    pub fn num_nodes(&self) -> usize {
        self.out_arcs.len()
    }

    pub fn num_arcs(&self) -> usize {
        self.out_arcs.iter().map(Vec::len).sum()
    }

    pub fn out_arcs(&self, node: NodeId) -> &[Link] {
        &self.out_arcs[node as usize]
    }

    pub fn rev_out_arcs(&self, node: NodeId) -> &[Link] {
        &self.rev_out_arcs[node as usize]
    }

    /// Insert an edge. If the pair already exists, both sides keep the minimum
    /// of the old and new weight instead of creating a parallel edge.
    pub fn add_edge(&mut self, from: NodeId, link: Link) {
        match self.out_arcs[from as usize].iter_mut().find(|l| l.node == link.node) {
            Some(existing) => {
                if link.weight < existing.weight {
                    existing.weight = link.weight;
                    let back = self.rev_out_arcs[link.node as usize]
                        .iter_mut()
                        .find(|l| l.node == from)
                        .expect("reverse arc missing");
                    back.weight = link.weight;
                }
            }
            None => {
                self.out_arcs[from as usize].push(link);
                self.rev_out_arcs[link.node as usize].push(Link {
                    node: from,
                    weight: link.weight,
                });
            }
        }
    }

    /// Remove the edge `from -> to` from both adjacency lists.
    /// Returns false when no such edge exists. The order of the remaining
    /// arcs of a node is not preserved.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        let arcs = &mut self.out_arcs[from as usize];
        match arcs.iter().position(|l| l.node == to) {
            Some(pos) => {
                arcs.swap_remove(pos);
            }
            None => return false,
        }
        let rev_arcs = &mut self.rev_out_arcs[to as usize];
        let pos = rev_arcs.iter().position(|l| l.node == from).expect("reverse arc missing");
        rev_arcs.swap_remove(pos);
        true
    }

    /// Weight of the edge `from -> to`, `INFINITY` when absent.
    pub fn edge_weight(&self, from: NodeId, to: NodeId) -> Weight {
        self.out_arcs[from as usize]
            .iter()
            .find(|l| l.node == to)
            .map(|l| l.weight)
            .unwrap_or(INFINITY)
    }

    /// Overwrite the weight of an existing edge on both sides.
    /// Does nothing when the edge is absent.
    pub fn change_edge_weight(&mut self, from: NodeId, to: NodeId, weight: Weight) {
        if let Some(link) = self.out_arcs[from as usize].iter_mut().find(|l| l.node == to) {
            link.weight = weight;
        } else {
            return;
        }
        let back = self.rev_out_arcs[to as usize]
            .iter_mut()
            .find(|l| l.node == from)
            .expect("reverse arc missing");
        back.weight = weight;
    }

    /// Remove all arcs incident to `node`. The node itself stays, the node
    /// count does not change.
    pub fn disconnect_node(&mut self, node: NodeId) {
        while let Some(&Link { node: head, .. }) = self.out_arcs[node as usize].last() {
            self.remove_edge(node, head);
        }
        while let Some(&Link { node: tail, .. }) = self.rev_out_arcs[node as usize].last() {
            self.remove_edge(tail, node);
        }
    }

    /// Drop every edge but keep the node set.
    pub fn clear_edges(&mut self) {
        for arcs in &mut self.out_arcs {
            arcs.clear();
        }
        for arcs in &mut self.rev_out_arcs {
            arcs.clear();
        }
    }

    /// Sum of the weights along consecutive `nodes` entries, `INFINITY` as
    /// soon as one hop is missing.
    pub fn path_length(&self, nodes: &[NodeId]) -> Weight {
        let mut length = 0;
        for pair in nodes.windows(2) {
            let weight = self.edge_weight(pair[0], pair[1]);
            if weight == INFINITY {
                return INFINITY;
            }
            length += weight;
        }
        length
    }
}

impl ArcGraph for AdjacencyGraph {
    fn num_nodes(&self) -> usize {
        self.num_nodes()
    }

    fn arcs(&self, node: NodeId) -> &[Link] {
        self.out_arcs(node)
    }
}

/// View of a graph with all arcs flipped. Searching on this runs a backward search.
#[derive(Debug, Clone, Copy)]
pub struct Reversed<'a>(pub &'a AdjacencyGraph);

impl<'a> ArcGraph for Reversed<'a> {
    fn num_nodes(&self) -> usize {
        self.0.num_nodes()
    }

    fn arcs(&self, node: NodeId) -> &[Link] {
        self.0.rev_out_arcs(node)
    }
}

impl Reconstruct for AdjacencyGraph {
    fn reconstruct_with(loader: Loader) -> Result<Self> {
        let first_out: Vec<u32> = loader.load("first_out")?;
        let head: Vec<NodeId> = loader.load("head")?;
        let weight: Vec<Weight> = loader.load("weight")?;
        Ok(AdjacencyGraph::from_csr(&first_out, &head, &weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consistent(graph: &AdjacencyGraph) -> bool {
        for node in 0..graph.num_nodes() as NodeId {
            for link in graph.out_arcs(node) {
                let back = graph.rev_out_arcs(link.node).iter().find(|l| l.node == node);
                if back.map(|l| l.weight) != Some(link.weight) {
                    return false;
                }
            }
            for link in graph.rev_out_arcs(node) {
                if graph.edge_weight(link.node, node) != link.weight {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn duplicate_insert_keeps_minimum() {
        let mut graph = AdjacencyGraph::new(2);
        graph.add_edge(0, Link { node: 1, weight: 10 });
        graph.add_edge(0, Link { node: 1, weight: 3 });
        assert_eq!(graph.out_arcs(0), &[Link { node: 1, weight: 3 }]);
        assert_eq!(graph.rev_out_arcs(1), &[Link { node: 0, weight: 3 }]);
        // larger weight leaves everything untouched
        graph.add_edge(0, Link { node: 1, weight: 7 });
        assert_eq!(graph.edge_weight(0, 1), 3);
        assert_eq!(graph.num_arcs(), 1);
    }

    #[test]
    fn mutations_keep_both_sides_in_sync() {
        let mut graph = AdjacencyGraph::new(4);
        graph.add_edge(0, Link { node: 1, weight: 2 });
        graph.add_edge(1, Link { node: 2, weight: 4 });
        graph.add_edge(2, Link { node: 1, weight: 1 });
        graph.add_edge(3, Link { node: 1, weight: 8 });
        assert!(consistent(&graph));

        graph.change_edge_weight(1, 2, 6);
        assert!(consistent(&graph));
        assert_eq!(graph.edge_weight(1, 2), 6);

        assert!(graph.remove_edge(0, 1));
        assert!(!graph.remove_edge(0, 1));
        assert!(consistent(&graph));

        graph.disconnect_node(1);
        assert!(consistent(&graph));
        assert!(graph.out_arcs(1).is_empty());
        assert!(graph.rev_out_arcs(1).is_empty());
        assert_eq!(graph.num_arcs(), 0);
        assert_eq!(graph.num_nodes(), 4);
    }

    #[test]
    fn missing_edges_are_infinity() {
        let graph = AdjacencyGraph::new(2);
        assert_eq!(graph.edge_weight(0, 1), INFINITY);
        assert_eq!(graph.path_length(&[0, 1]), INFINITY);
    }
}
