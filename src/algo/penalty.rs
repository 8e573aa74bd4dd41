//! The iterative penalty method for alternative routes.
//!
//! Starting from the shortest path, edges of the latest path are made more
//! expensive and arcs rejoining it get a flat surcharge, then the query runs
//! again on the reweighted copy. Candidates that contain a sufficiently long
//! and sufficiently good detour are collected into the alternative subgraph,
//! from which the final routes are extracted afterwards.

use crate::algo::bidir_astar::BiDirAStar;
use crate::algo::contraction::ContractionHierarchy;
use crate::algo::dijkstra::Dijkstra;
use crate::datastr::{fast_clear_set::FastClearSet, graph::*};
use crate::report::{CaseReport, IterationReport, Timer};

/// Tuning knobs of the penalty loop.
#[derive(Debug, Clone, Copy)]
pub struct PenaltySettings {
    /// Relative surcharge on every edge of the latest path.
    pub penalty_factor: f64,
    /// Scales the rejoin surcharge `floor(alpha * sqrt(shortest_length))`.
    pub alpha: f64,
    /// Stop once the latest candidate is longer than `(1 + eps) * shortest`.
    pub eps: f64,
    /// A detour only counts from `delta * shortest_length` on.
    pub delta: f64,
    pub max_iterations: u32,
}

impl Default for PenaltySettings {
    fn default() -> Self {
        PenaltySettings {
            penalty_factor: 0.04,
            alpha: 0.5,
            eps: 0.1,
            delta: 0.1,
            max_iterations: 20,
        }
    }
}

struct Detour {
    a: NodeId,
    b: NodeId,
    length: Weight,
}

/// The penalty engine. Owns a reweightable copy of the input graph, the
/// subgraph of accepted alternatives and the bidirectional query server.
pub struct PenaltyService<'a> {
    graph: &'a AdjacencyGraph,
    penalized: AdjacencyGraph,
    alt_graph: AdjacencyGraph,
    alt_dijkstra: Dijkstra,
    astar: BiDirAStar<'a>,
    on_comparison_path: FastClearSet,
    rejoin_tails: Vec<NodeId>,
    settings: PenaltySettings,
}

impl<'a> PenaltyService<'a> {
    pub fn new(graph: &'a AdjacencyGraph, ch: &'a ContractionHierarchy, settings: PenaltySettings) -> PenaltyService<'a> {
        let n = graph.num_nodes();
        PenaltyService {
            graph,
            penalized: graph.clone(),
            alt_graph: AdjacencyGraph::new(n),
            alt_dijkstra: Dijkstra::new(n),
            astar: BiDirAStar::new(ch),
            on_comparison_path: FastClearSet::new(n),
            rejoin_tails: Vec::new(),
            settings,
        }
    }

    /// The subgraph of all accepted alternatives, at original weights.
    pub fn alt_graph(&self) -> &AdjacencyGraph {
        &self.alt_graph
    }

    /// Restore the pristine state for the next source/target pair.
    pub fn reset(&mut self) {
        self.penalized.clone_from(self.graph);
        self.alt_graph.clear_edges();
    }

    /// Run the penalty loop for one pair, filling in the timing record.
    pub fn run(&mut self, source: NodeId, target: NodeId, case: &mut CaseReport) {
        let timer = Timer::new();
        let original_path = self.astar.run(&self.penalized, source, target);
        case.first_astar_time = timer.passed_ms();
        case.shortest_length = original_path.length;

        if original_path.length == INFINITY {
            // no route at all - the alternative subgraph stays empty
            return;
        }
        self.add_path_to_alt_graph(&original_path);

        let continue_below = (1.0 + self.settings.eps) * original_path.length as f64;
        let mut alt_path = original_path.clone();
        let mut iterations = 0;
        while alt_path.length as f64 <= continue_below && iterations < self.settings.max_iterations {
            let mut report = IterationReport::default();
            let total_timer = Timer::new();
            let mut timer = Timer::new();

            self.apply_penalties(&alt_path, original_path.length);
            report.apply_penalties = timer.passed_ms();

            timer.restart();
            alt_path = self.astar.run(&self.penalized, source, target);
            report.astar_time = timer.passed_ms();
            report.astar_search_space = self.astar.num_settled();
            report.alt_path_length = alt_path.length;

            timer.restart();
            if self.is_feasible(&alt_path, &original_path) {
                self.add_path_to_alt_graph(&alt_path);
            }
            report.is_feasible = timer.passed_ms();

            report.total = total_timer.passed_ms();
            case.iterations.push(report);
            iterations += 1;
        }
    }

    fn add_path_to_alt_graph(&mut self, path: &Path) {
        for pair in path.nodes.windows(2) {
            let weight = self.graph.edge_weight(pair[0], pair[1]);
            self.alt_graph.add_edge(pair[0], Link { node: pair[1], weight });
        }
    }

    fn apply_penalties(&mut self, path: &Path, original_length: Weight) {
        // multiplicative penalty on the path itself, rounded up so even unit
        // weights grow
        let factor = 1.0 + self.settings.penalty_factor;
        for pair in path.nodes.windows(2) {
            let weight = self.penalized.edge_weight(pair[0], pair[1]);
            let penalized = ((weight as f64 * factor).ceil() as Weight).min(INFINITY);
            self.penalized.change_edge_weight(pair[0], pair[1], penalized);
        }

        // flat surcharge on every arc joining the path from the side - for
        // the first node every incoming arc counts, it has no predecessor
        let rejoin_penalty = (self.settings.alpha * (original_length as f64).sqrt()).floor() as Weight;
        for (i, &node) in path.nodes.iter().enumerate() {
            self.rejoin_tails.clear();
            self.rejoin_tails.extend(self.penalized.rev_out_arcs(node).iter().map(|l| l.node));
            for tail_index in 0..self.rejoin_tails.len() {
                let tail = self.rejoin_tails[tail_index];
                if i == 0 || tail != path.nodes[i - 1] {
                    let weight = self.penalized.edge_weight(tail, node);
                    self.penalized
                        .change_edge_weight(tail, node, weight.saturating_add(rejoin_penalty).min(INFINITY));
                }
            }
        }
    }

    /// Maximal subpaths of `path` whose interior avoids `comparison`,
    /// measured at original weights.
    fn detours(&mut self, path: &Path, comparison: &Path) -> Vec<Detour> {
        self.on_comparison_path.clear();
        for &node in &comparison.nodes {
            self.on_comparison_path.set(node);
        }

        let mut detours = Vec::new();
        let mut in_detour = false;
        let mut start = INVALID_NODE;
        let mut length = 0;
        for (i, &node) in path.nodes.iter().enumerate() {
            if !in_detour {
                if !self.on_comparison_path.has(node) {
                    in_detour = true;
                    start = path.nodes[i - 1];
                    length = self.graph.edge_weight(path.nodes[i - 1], node);
                }
            } else {
                length += self.graph.edge_weight(path.nodes[i - 1], node);
                if self.on_comparison_path.has(node) {
                    in_detour = false;
                    detours.push(Detour { a: start, b: node, length });
                }
            }
        }
        detours
    }

    /// A candidate is kept when one of its detours is both long enough
    /// relative to the shortest path and close to the best connection through
    /// the already accepted alternatives.
    fn is_feasible(&mut self, path: &Path, original_path: &Path) -> bool {
        if path.length == INFINITY {
            return false;
        }
        let min_detour_length = self.settings.delta * original_path.length as f64;
        let mut feasible = false;
        for detour in self.detours(path, original_path) {
            if (detour.length as f64) < min_detour_length {
                continue;
            }
            self.alt_dijkstra.set_source(detour.a);
            self.alt_dijkstra.run_until_target_found(&self.alt_graph, detour.b);
            if detour.length as f64 <= (1.0 + self.settings.eps) * self.alt_dijkstra.dist(detour.b) as f64 {
                feasible = true;
            }
            self.alt_dijkstra.finish();
        }
        feasible
    }
}
