//! Admissible consistent A* potentials derived from a Contraction Hierarchy.
//!
//! For a fixed target the potential of a node is its exact up-down distance
//! to the target over the CH graphs: one full Dijkstra on the downward side
//! per target, then a lazy minimization over upward arcs per queried node.

use crate::algo::contraction::ContractionHierarchy;
use crate::algo::dijkstra::Dijkstra;
use crate::datastr::{graph::*, timestamped_vector::TimestampedVector};

/// A lower bound provider directed at a fixed target.
pub trait Potential {
    fn init(&mut self, target: NodeId);
    fn potential(&mut self, node: NodeId) -> Option<Weight>;
}

/// The all-zero potential. Degrades A* to plain Dijkstra, handy for testing.
#[derive(Debug)]
pub struct ZeroPotential;

impl Potential for ZeroPotential {
    fn init(&mut self, _target: NodeId) {}
    fn potential(&mut self, _node: NodeId) -> Option<Weight> {
        Some(0)
    }
}

/// CH-derived potentials.
///
/// `forward` instances estimate distances *to* the target (for searches on
/// out-arcs), `reverse` instances distances *from* it (for searches running
/// on reverse arcs). Both are the same computation with the CH sides swapped.
pub struct CHPotential<'a> {
    up: &'a AdjacencyGraph,
    down: &'a AdjacencyGraph,
    down_search: Dijkstra,
    potentials: TimestampedVector<Weight>,
    stack: Vec<NodeId>,
}

impl<'a> CHPotential<'a> {
    pub fn forward(ch: &'a ContractionHierarchy) -> CHPotential<'a> {
        Self::new(&ch.forward, &ch.backward)
    }

    pub fn reverse(ch: &'a ContractionHierarchy) -> CHPotential<'a> {
        Self::new(&ch.backward, &ch.forward)
    }

    fn new(up: &'a AdjacencyGraph, down: &'a AdjacencyGraph) -> CHPotential<'a> {
        let n = up.num_nodes();
        CHPotential {
            up,
            down,
            down_search: Dijkstra::new(n),
            potentials: TimestampedVector::new(n, INFINITY),
            stack: Vec::new(),
        }
    }

    // Memoized up-down distance. The recursion over up-arcs is unrolled onto
    // an explicit stack - CH search spaces get deep enough to overflow the
    // call stack on continental graphs.
    fn resolve(&mut self, node: NodeId) -> Weight {
        if self.potentials.has(node as usize) {
            return self.potentials.get(node as usize);
        }
        self.stack.push(node);
        while let Some(&current) = self.stack.last() {
            if self.potentials.has(current as usize) {
                self.stack.pop();
                continue;
            }
            let mut ready = true;
            for link in self.up.out_arcs(current) {
                if !self.potentials.has(link.node as usize) {
                    self.stack.push(link.node);
                    ready = false;
                }
            }
            if ready {
                self.stack.pop();
                let mut potential = self.down_search.dist(current);
                for link in self.up.out_arcs(current) {
                    potential = std::cmp::min(potential, link.weight + self.potentials.get(link.node as usize));
                }
                self.potentials.set(current as usize, potential);
            }
        }
        self.potentials.get(node as usize)
    }
}

impl<'a> Potential for CHPotential<'a> {
    fn init(&mut self, target: NodeId) {
        // invalidate the memoization before the new sweep starts writing,
        // stale stamps from the previous target must not leak through
        self.potentials.reset();
        self.down_search.finish();
        self.down_search.set_source(target);
        self.down_search.run_until_done(self.down);
    }

    fn potential(&mut self, node: NodeId) -> Option<Weight> {
        let dist = self.resolve(node);
        if dist < INFINITY {
            Some(dist)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::contraction::contract_with_order;
    use crate::datastr::node_order::NodeOrder;

    //    2         2
    // 0 ----> 1 ------> 3
    // |                 ^
    // +---5--> 2 ---1---+
    fn square_ch() -> ContractionHierarchy {
        let mut graph = AdjacencyGraph::new(4);
        graph.add_edge(0, Link { node: 1, weight: 2 });
        graph.add_edge(1, Link { node: 3, weight: 2 });
        graph.add_edge(0, Link { node: 2, weight: 5 });
        graph.add_edge(2, Link { node: 3, weight: 1 });
        contract_with_order(&graph, NodeOrder::from_node_order(vec![0, 1, 2, 3]))
    }

    #[test]
    fn forward_potentials_are_exact_distances() {
        let ch = square_ch();
        let mut potential = CHPotential::forward(&ch);
        potential.init(3);
        assert_eq!(potential.potential(0), Some(4));
        assert_eq!(potential.potential(1), Some(2));
        assert_eq!(potential.potential(2), Some(1));
        assert_eq!(potential.potential(3), Some(0));
    }

    #[test]
    fn reverse_potentials_estimate_distance_from_the_source() {
        let ch = square_ch();
        let mut potential = CHPotential::reverse(&ch);
        potential.init(0);
        assert_eq!(potential.potential(3), Some(4));
        assert_eq!(potential.potential(1), Some(2));
        assert_eq!(potential.potential(2), Some(5));
        assert_eq!(potential.potential(0), Some(0));
    }

    #[test]
    fn retargeting_invalidates_the_memoization() {
        let ch = square_ch();
        let mut potential = CHPotential::forward(&ch);
        potential.init(3);
        assert_eq!(potential.potential(0), Some(4));
        potential.init(1);
        assert_eq!(potential.potential(0), Some(2));
        assert_eq!(potential.potential(3), None);
    }
}
