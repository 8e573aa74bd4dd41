//! Stepped Dijkstra search.
//!
//! The search state lives separately from the graph and the graph is passed
//! into each call. That way the penalty engine can own a graph, reweight it
//! between queries and still run searches over it, and the witness searches
//! during contraction can work on the shrinking working graph.

use crate::datastr::{graph::*, index_heap::*, timestamped_vector::TimestampedVector};

/// Single source shortest path search with an optional blacklisted node, an
/// optional distance cap and a log of the settled nodes. All per-query state
/// is reset by `finish`, allocations happen only at construction.
pub struct Dijkstra {
    dist: TimestampedVector<Weight>,
    parents: TimestampedVector<NodeId>,
    queue: IndexdMinHeap<State>,
    search_space: Vec<NodeId>,
    blacklisted: NodeId,
    max_dist: Weight,
}

impl Dijkstra {
    pub fn new(n: usize) -> Dijkstra {
        Dijkstra {
            dist: TimestampedVector::new(n, INFINITY),
            parents: TimestampedVector::new(n, INVALID_NODE),
            queue: IndexdMinHeap::new(n),
            search_space: Vec::new(),
            blacklisted: INVALID_NODE,
            max_dist: INFINITY,
        }
    }

    pub fn set_source(&mut self, source: NodeId) {
        self.dist.set(source as usize, 0);
        self.parents.set(source as usize, INVALID_NODE);
        self.queue.push(State { key: 0, node: source });
    }

    /// Arcs into this node are ignored until `finish`.
    pub fn set_blacklisted(&mut self, node: NodeId) {
        self.blacklisted = node;
    }

    /// Stop searching once the settled distance reaches this bound.
    pub fn set_max_dist(&mut self, max_dist: Weight) {
        self.max_dist = max_dist;
    }

    /// Settle the next node and relax its outgoing arcs.
    pub fn step<G: ArcGraph>(&mut self, graph: &G) -> NodeId {
        let State { node: best, .. } = self.queue.pop().expect("stepped an exhausted search");
        self.search_space.push(best);
        let best_dist = self.dist.get(best as usize);
        for &Link { node: head, weight } in graph.arcs(best) {
            if head == self.blacklisted {
                continue;
            }
            let dist = best_dist + weight;
            if dist < self.dist.get(head as usize) {
                self.dist.set(head as usize, dist);
                self.parents.set(head as usize, best);
                if self.queue.contains_index(head as usize) {
                    self.queue.decrease_key(State { key: dist, node: head });
                } else {
                    self.queue.push(State { key: dist, node: head });
                }
            }
        }
        best
    }

    pub fn is_settled(&self, node: NodeId) -> bool {
        self.dist.has(node as usize) && !self.queue.contains_index(node as usize)
    }

    /// Run until `target` is settled, the distance cap is reached, or the
    /// queue runs dry.
    pub fn run_until_target_found<G: ArcGraph>(&mut self, graph: &G, target: NodeId) {
        if self.is_settled(target) || self.queue.is_empty() {
            return;
        }
        loop {
            let settled = self.step(graph);
            if settled == target || self.queue.is_empty() || self.dist.get(settled as usize) >= self.max_dist {
                return;
            }
        }
    }

    /// Settle every reachable node.
    pub fn run_until_done<G: ArcGraph>(&mut self, graph: &G) {
        while !self.queue.is_empty() {
            self.step(graph);
        }
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Smallest key currently queued, None when the queue is empty.
    pub fn min_queue_key(&self) -> Option<Weight> {
        self.queue.peek().map(|state| state.key)
    }

    /// Drop all queued nodes, keeping distances of already settled ones.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    pub fn dist(&self, node: NodeId) -> Weight {
        self.dist.get(node as usize)
    }

    pub fn parent(&self, node: NodeId) -> NodeId {
        self.parents.get(node as usize)
    }

    /// The path from the source to `node` by walking parent pointers.
    /// Empty with length `INFINITY` when `node` was not reached.
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

    /// The settled nodes in settling order.
    pub fn search_space(&self) -> &[NodeId] {
        &self.search_space
    }

    /// Reset all per-query state.
    pub fn finish(&mut self) {
        self.dist.reset();
        self.parents.reset();
        self.queue.clear();
        self.search_space.clear();
        self.blacklisted = INVALID_NODE;
        self.max_dist = INFINITY;
    }
}
