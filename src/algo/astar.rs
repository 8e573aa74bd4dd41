//! Potential-directed unidirectional A*.

use crate::algo::ch_potentials::Potential;
use crate::datastr::{fast_clear_set::FastClearSet, graph::*, index_heap::*, timestamped_vector::TimestampedVector};

/// A* search keyed by `f = g + h` with an optional cap on f.
///
/// A node counts as closed once it is popped, never earlier - with a
/// consistent heuristic popped distances are final, and the bidirectional
/// variant's meeting test relies on exactly that.
pub struct AStar {
    dist: TimestampedVector<Weight>,
    parents: TimestampedVector<NodeId>,
    queue: IndexdMinHeap<State>,
    closed: FastClearSet,
    max_dist: Weight,
}

impl AStar {
    pub fn new(n: usize) -> AStar {
        AStar {
            dist: TimestampedVector::new(n, INFINITY),
            parents: TimestampedVector::new(n, INVALID_NODE),
            queue: IndexdMinHeap::new(n),
            closed: FastClearSet::new(n),
            max_dist: INFINITY,
        }
    }

    /// Prune any node whose f-value exceeds this bound.
    pub fn set_max_dist(&mut self, max_dist: Weight) {
        self.max_dist = max_dist;
    }

    pub fn add_source<P: Potential>(&mut self, node: NodeId, heuristic: &mut P) {
        let h = heuristic.potential(node).unwrap_or(INFINITY);
        self.dist.set(node as usize, 0);
        self.parents.set(node as usize, INVALID_NODE);
        self.queue.push(State { key: h, node });
    }

    fn step<G: ArcGraph, P: Potential>(&mut self, graph: &G, heuristic: &mut P) -> NodeId {
        let State { node: best, .. } = self.queue.pop().expect("stepped an exhausted search");
        let best_dist = self.dist.get(best as usize);
        for &Link { node: head, weight } in graph.arcs(best) {
            if self.closed.has(head) {
                continue;
            }
            let tentative = best_dist + weight;
            if tentative >= self.dist.get(head as usize) {
                continue;
            }
            self.dist.set(head as usize, tentative);
            self.parents.set(head as usize, best);
            let key = tentative + heuristic.potential(head).unwrap_or(INFINITY);
            if key > self.max_dist {
                continue;
            }
            if let Some(&queued) = self.queue.get(head as usize) {
                if key < queued.key {
                    self.queue.decrease_key(State { key, node: head });
                }
            } else {
                self.queue.push(State { key, node: head });
            }
        }
        best
    }

    /// Run until `target` is popped from the queue. Merely reaching it is not
    /// enough, the closed set would lose its meaning.
    pub fn run_until_target_found<G: ArcGraph, P: Potential>(&mut self, graph: &G, heuristic: &mut P, target: NodeId) {
        if self.closed.has(target) || self.queue.is_empty() {
            return;
        }
        while !self.queue.is_empty() {
            let settled = self.step(graph, heuristic);
            if settled == target {
                break;
            }
            self.closed.set(settled);
        }
    }

    pub fn dist(&self, node: NodeId) -> Weight {
        self.dist.get(node as usize)
    }

    /// Number of nodes closed so far.
    pub fn num_closed(&self) -> usize {
        self.closed.len()
    }

    pub fn path(&self, node: NodeId) -> Path {
        let dist = self.dist(node);
        if dist == INFINITY {
            return Path::unreachable();
        }
        let mut nodes = Vec::new();
        let mut current = node;
        while current != INVALID_NODE {
            nodes.push(current);
            current = self.parents.get(current as usize);
        }
        nodes.reverse();
        Path { nodes, length: dist }
    }

    pub fn finish(&mut self) {
        self.closed.clear();
        self.dist.reset();
        self.parents.reset();
        self.queue.clear();
        self.max_dist = INFINITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::ch_potentials::{CHPotential, ZeroPotential};
    use crate::algo::contraction::contract_with_order;
    use crate::algo::dijkstra::Dijkstra;
    use crate::datastr::node_order::NodeOrder;

    fn grid() -> AdjacencyGraph {
        // 3x3 grid, rightward and downward arcs, assorted weights
        let mut graph = AdjacencyGraph::new(9);
        let weights = [(0, 1, 2), (1, 2, 2), (3, 4, 1), (4, 5, 3), (6, 7, 2), (7, 8, 1)];
        for &(from, to, weight) in &weights {
            graph.add_edge(from, Link { node: to, weight });
        }
        let down = [(0, 3, 1), (1, 4, 2), (2, 5, 1), (3, 6, 3), (4, 7, 1), (5, 8, 2)];
        for &(from, to, weight) in &down {
            graph.add_edge(from, Link { node: to, weight });
        }
        graph
    }

    #[test]
    fn matches_dijkstra_with_zero_heuristic() {
        let graph = grid();
        let mut astar = AStar::new(9);
        let mut dijkstra = Dijkstra::new(9);
        for target in 0..9 {
            astar.add_source(0, &mut ZeroPotential);
            astar.run_until_target_found(&graph, &mut ZeroPotential, target);
            dijkstra.set_source(0);
            dijkstra.run_until_target_found(&graph, target);
            assert_eq!(astar.dist(target), dijkstra.dist(target));
            astar.finish();
            dijkstra.finish();
        }
    }

    #[test]
    fn matches_dijkstra_with_ch_potentials() {
        let graph = grid();
        let ch = contract_with_order(&graph, NodeOrder::from_node_order((0..9).collect()));
        let mut astar = AStar::new(9);
        let mut dijkstra = Dijkstra::new(9);
        for source in 0..9 {
            for target in 0..9 {
                let mut potential = CHPotential::forward(&ch);
                potential.init(target);
                astar.add_source(source, &mut potential);
                astar.run_until_target_found(&graph, &mut potential, target);
                dijkstra.set_source(source);
                dijkstra.run_until_target_found(&graph, target);
                assert_eq!(astar.dist(target), dijkstra.dist(target), "query {} -> {}", source, target);
                assert_eq!(astar.path(target).length, dijkstra.path(target).length);
                astar.finish();
                dijkstra.finish();
            }
        }
    }
}
