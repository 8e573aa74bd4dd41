//! Via-node alternatives from a bounded bidirectional Dijkstra (X-BDV).
//!
//! Every node settled by both a forward and a backward search within the
//! allowed stretch induces an implicit path through it. Candidates are
//! deduplicated, filtered by how much they share with the optimal path and
//! optionally by an approximate local optimality test, then ranked by a
//! combination of length, sharing and plateau size.

use crate::algo::dijkstra::Dijkstra;
use crate::datastr::{fast_clear_set::FastClearSet, graph::*};

pub const DEFAULT_ALPHA: f64 = 0.25;
pub const DEFAULT_GAMMA: f64 = 0.8;
pub const DEFAULT_EPS: f64 = 0.25;

pub struct XbdvService<'a> {
    graph: &'a AdjacencyGraph,
    dijkstra: Dijkstra,
    forward: Dijkstra,
    backward: Dijkstra,
    space_fwd: FastClearSet,
    space_bwd: FastClearSet,
    optimal_nodes: FastClearSet,
}

impl<'a> XbdvService<'a> {
    pub fn new(graph: &'a AdjacencyGraph) -> XbdvService<'a> {
        let n = graph.num_nodes();
        XbdvService {
            graph,
            dijkstra: Dijkstra::new(n),
            forward: Dijkstra::new(n),
            backward: Dijkstra::new(n),
            space_fwd: FastClearSet::new(n),
            space_bwd: FastClearSet::new(n),
            optimal_nodes: FastClearSet::new(n),
        }
    }

    /// Compute ranked alternatives for one pair. `alpha` scopes the T-test
    /// range, `eps` the accepted stretch and `gamma` the sharing bound.
    pub fn alternatives(&mut self, source: NodeId, target: NodeId, run_t_test: bool, alpha: f64, eps: f64, gamma: f64) -> Vec<Path> {
        self.dijkstra.set_source(source);
        self.dijkstra.run_until_target_found(self.graph, target);
        let optimal_path = self.dijkstra.path(target);
        self.dijkstra.finish();
        if optimal_path.length == INFINITY {
            return Vec::new();
        }
        let optimal_length = optimal_path.length;
        let max_dist = (optimal_length as f64 * (1.0 + eps)) as Weight;

        self.run_bounded_bidirectional(source, target, max_dist);

        // the cut: settled from both sides, within the stretch bound
        let mut cut = Vec::new();
        for &node in self.space_fwd.ids() {
            if self.space_bwd.has(node) {
                let through = self.forward.dist(node) as u64 + self.backward.dist(node) as u64;
                if (through as f64) < (1.0 + eps) * optimal_length as f64 {
                    cut.push(node);
                }
            }
        }

        self.optimal_nodes.clear();
        for &node in &optimal_path.nodes {
            self.optimal_nodes.set(node);
        }

        let mut considered: Vec<Path> = Vec::new();
        let mut candidates = Vec::new();
        for &via_node in &cut {
            let path = self.implicit_path(via_node);
            if considered.contains(&path) {
                continue;
            }
            considered.push(path.clone());
            if self.sharing(&path) as f64 >= gamma * optimal_length as f64 {
                continue;
            }
            if run_t_test && !self.passes_t_test(via_node, (alpha * optimal_length as f64) as Weight) {
                continue;
            }
            candidates.push(path);
        }

        // rank by 2 * length + sharing - plateau, best first
        let mut keyed: Vec<(i64, Path)> = candidates
            .into_iter()
            .map(|path| {
                let key = 2 * path.length as i64 + self.sharing(&path) as i64 - self.plateau_length(&path) as i64;
                (key, path)
            })
            .collect();
        keyed.sort_by_key(|&(key, _)| key);

        self.forward.finish();
        self.backward.finish();
        self.space_fwd.clear();
        self.space_bwd.clear();
        self.optimal_nodes.clear();

        keyed.into_iter().map(|(_, path)| path).collect()
    }

    /// Forward and backward search in lockstep, each side cut off once it
    /// settles a node beyond the bound.
    fn run_bounded_bidirectional(&mut self, source: NodeId, target: NodeId, max_dist: Weight) {
        self.forward.set_source(source);
        self.backward.set_source(target);
        while !self.forward.queue_is_empty() || !self.backward.queue_is_empty() {
            if !self.forward.queue_is_empty() {
                let settled = self.forward.step(self.graph);
                self.space_fwd.set(settled);
                if self.forward.dist(settled) > max_dist {
                    self.forward.clear_queue();
                }
            }
            if !self.backward.queue_is_empty() {
                let settled = self.backward.step(&Reversed(self.graph));
                self.space_bwd.set(settled);
                if self.backward.dist(settled) > max_dist {
                    self.backward.clear_queue();
                }
            }
        }
    }

    /// Concatenate the forward tree path to `node` with the backward tree
    /// path from it.
    fn implicit_path(&self, node: NodeId) -> Path {
        let length = self.forward.dist(node) + self.backward.dist(node);
        let mut nodes = self.forward.path(node).nodes;
        let mut current = self.backward.parent(node);
        while current != INVALID_NODE {
            nodes.push(current);
            current = self.backward.parent(current);
        }
        Path { nodes, length }
    }

    /// Total weight of the path's arcs whose head lies on the optimal path.
    fn sharing(&self, path: &Path) -> Weight {
        let mut shared = 0;
        for pair in path.nodes.windows(2) {
            if self.optimal_nodes.has(pair[1]) {
                shared += self.graph.edge_weight(pair[0], pair[1]);
            }
        }
        shared
    }

    /// Longest contiguous run of path nodes settled by both searches,
    /// measured as the sum of the run's inner arc weights.
    fn plateau_length(&self, path: &Path) -> Weight {
        let mut longest = 0;
        let mut current = 0;
        let mut in_plateau = false;
        for (i, &node) in path.nodes.iter().enumerate() {
            if self.space_fwd.has(node) && self.space_bwd.has(node) {
                if in_plateau {
                    current += self.graph.edge_weight(path.nodes[i - 1], node);
                } else {
                    in_plateau = true;
                }
            } else {
                in_plateau = false;
                longest = longest.max(current);
                current = 0;
            }
        }
        longest.max(current)
    }

    /// The T-test: walk at least `t` back and forward along the search trees
    /// from the via node and check that the walked stretch is a shortest path.
    fn passes_t_test(&mut self, via_node: NodeId, t: Weight) -> bool {
        let mut x = via_node;
        let mut dist_to_x = 0;
        while dist_to_x < t {
            let parent = self.forward.parent(x);
            if parent == INVALID_NODE {
                break;
            }
            dist_to_x += self.graph.edge_weight(parent, x);
            x = parent;
        }

        let mut y = via_node;
        let mut dist_to_y = 0;
        while dist_to_y < t {
            let parent = self.backward.parent(y);
            if parent == INVALID_NODE {
                break;
            }
            dist_to_y += self.graph.edge_weight(y, parent);
            y = parent;
        }

        let along_path = dist_to_x + dist_to_y;
        self.dijkstra.set_source(x);
        self.dijkstra.run_until_target_found(self.graph, y);
        let optimal = self.dijkstra.dist(y);
        self.dijkstra.finish();
        optimal == along_path
    }
}
