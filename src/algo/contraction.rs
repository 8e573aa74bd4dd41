//! Contraction Hierarchy preprocessing and queries.
//!
//! Nodes are contracted in some order; contracting a node inserts shortcuts
//! between its remaining neighbours whenever no witness path is at least as
//! short. The augmented graph is split into two graphs which both only
//! contain arcs towards higher ranked nodes - the forward graph keeps the
//! original direction, the backward graph the reverse.

use crate::algo::dijkstra::Dijkstra;
use crate::datastr::{
    bucket_queue::{BucketQueue, IdKeyPair},
    graph::*,
    node_order::NodeOrder,
};
use crate::io::*;
use log::info;

/// The completely preprocessed hierarchy: both upward graphs plus the order.
#[derive(Debug)]
pub struct ContractionHierarchy {
    pub forward: AdjacencyGraph,
    pub backward: AdjacencyGraph,
    pub order: NodeOrder,
}

impl ContractionHierarchy {
    /// Split an already augmented graph (original edges plus shortcuts) by rank.
    pub fn from_contracted_graph(graph: AdjacencyGraph, order: NodeOrder) -> ContractionHierarchy {
        let (forward, backward) = split_by_rank(&graph, &order);
        ContractionHierarchy { forward, backward, order }
    }
}

impl Reconstruct for ContractionHierarchy {
    fn reconstruct_with(loader: Loader) -> std::io::Result<Self> {
        let graph = AdjacencyGraph::reconstruct_from(loader.path())?;
        let order = NodeOrder::reconstruct_from(loader.path())?;
        Ok(ContractionHierarchy::from_contracted_graph(graph, order))
    }
}

fn split_by_rank(graph: &AdjacencyGraph, order: &NodeOrder) -> (AdjacencyGraph, AdjacencyGraph) {
    let n = graph.num_nodes();
    let mut forward = AdjacencyGraph::new(n);
    let mut backward = AdjacencyGraph::new(n);
    for node in 0..n as NodeId {
        for &link in graph.out_arcs(node) {
            if order.rank(node) < order.rank(link.node) {
                forward.add_edge(node, link);
            } else {
                backward.add_edge(link.node, Link { node, weight: link.weight });
            }
        }
    }
    (forward, backward)
}

/// Shortcut synthesis with reusable witness search state.
/// One instance per preprocessing run, so concurrent builds stay independent.
struct Contractor {
    witness_search: Dijkstra,
    shortcuts: Vec<(NodeId, Link)>,
}

impl Contractor {
    fn new(n: usize) -> Contractor {
        Contractor {
            witness_search: Dijkstra::new(n),
            shortcuts: Vec::new(),
        }
    }

    /// Compute the shortcuts contracting `node` would require in `graph`.
    /// For every in/out neighbour pair a witness search runs with `node`
    /// blacklisted and capped at the shortcut weight. A witness of equal
    /// length wins, only strictly longer detours produce a shortcut.
    fn compute_shortcuts(&mut self, graph: &AdjacencyGraph, node: NodeId) -> &[(NodeId, Link)] {
        self.shortcuts.clear();
        for &Link { node: from, weight: in_weight } in graph.rev_out_arcs(node) {
            self.witness_search.set_blacklisted(node);
            self.witness_search.set_source(from);
            for &Link { node: to, weight: out_weight } in graph.out_arcs(node) {
                let shortcut_weight = in_weight + out_weight;
                self.witness_search.set_max_dist(shortcut_weight);
                self.witness_search.run_until_target_found(graph, to);
                if self.witness_search.dist(to) > shortcut_weight {
                    self.shortcuts.push((
                        from,
                        Link {
                            node: to,
                            weight: shortcut_weight,
                        },
                    ));
                }
            }
            self.witness_search.finish();
        }
        &self.shortcuts
    }
}

/// Preprocess with an externally supplied contraction order.
pub fn contract_with_order(graph: &AdjacencyGraph, order: NodeOrder) -> ContractionHierarchy {
    let n = graph.num_nodes();
    assert_eq!(n, order.len());
    let mut working = graph.clone();
    let (mut forward, mut backward) = split_by_rank(graph, &order);
    let mut contractor = Contractor::new(n);

    for rank in 0..n as NodeId {
        let node = order.node(rank);
        contractor.compute_shortcuts(&working, node);
        for &(from, link) in &contractor.shortcuts {
            working.add_edge(from, link);
            if order.rank(from) < order.rank(link.node) {
                forward.add_edge(from, link);
            } else {
                backward.add_edge(link.node, Link { node: from, weight: link.weight });
            }
        }
        working.disconnect_node(node);
    }

    ContractionHierarchy { forward, backward, order }
}

/// Preprocess without an order: greedily contract the node with the smallest
/// edge difference (shortcuts added minus arcs removed), recomputing the
/// difference of affected neighbours as contraction progresses.
pub fn contract_bottom_up(graph: &AdjacencyGraph) -> ContractionHierarchy {
    let n = graph.num_nodes();
    let mut working = graph.clone();
    let mut augmented = graph.clone();
    let mut contractor = Contractor::new(n);

    info!("computing initial contraction queue");
    let mut queue = BucketQueue::new(n);
    for node in 0..n as NodeId {
        queue.push(IdKeyPair {
            id: node,
            key: edge_difference(&mut contractor, &working, node),
        });
    }

    info!("contracting graph");
    let mut ranks = vec![0 as NodeId; n];
    let mut next_rank: NodeId = 0;
    let mut neighbours = Vec::new();
    while let Some(IdKeyPair { id: node, .. }) = queue.pop() {
        ranks[node as usize] = next_rank;
        next_rank += 1;

        neighbours.clear();
        neighbours.extend(working.out_arcs(node).iter().map(|l| l.node));
        neighbours.extend(working.rev_out_arcs(node).iter().map(|l| l.node));

        contractor.compute_shortcuts(&working, node);
        for &(from, link) in &contractor.shortcuts {
            working.add_edge(from, link);
            augmented.add_edge(from, link);
        }
        working.disconnect_node(node);

        for &neighbour in &neighbours {
            if queue.contains_id(neighbour) {
                let new_key = edge_difference(&mut contractor, &working, neighbour);
                if new_key != queue.key(neighbour) {
                    queue.change_key(IdKeyPair { id: neighbour, key: new_key });
                }
            }
        }
    }

    ContractionHierarchy::from_contracted_graph(augmented, NodeOrder::from_ranks(ranks))
}

fn edge_difference(contractor: &mut Contractor, graph: &AdjacencyGraph, node: NodeId) -> i32 {
    let shortcuts = contractor.compute_shortcuts(graph, node).len() as i32;
    shortcuts - graph.out_arcs(node).len() as i32 - graph.rev_out_arcs(node).len() as i32
}

/// Plain bidirectional up-graph query over a hierarchy.
/// Only computes distances - path unpacking is not needed here.
pub struct CHQuery {
    forward_search: Dijkstra,
    backward_search: Dijkstra,
}

impl CHQuery {
    pub fn new(n: usize) -> CHQuery {
        CHQuery {
            forward_search: Dijkstra::new(n),
            backward_search: Dijkstra::new(n),
        }
    }

    pub fn distance(&mut self, ch: &ContractionHierarchy, from: NodeId, to: NodeId) -> Weight {
        self.forward_search.set_source(from);
        self.backward_search.set_source(to);
        let mut tentative_dist = INFINITY;

        let mut forward_done = false;
        let mut backward_done = false;
        while !forward_done || !backward_done {
            if !forward_done {
                let settled = self.forward_search.step(&ch.forward);
                if self.backward_search.is_settled(settled) {
                    let dist = self.forward_search.dist(settled) + self.backward_search.dist(settled);
                    if dist < tentative_dist {
                        tentative_dist = dist;
                    }
                }
                if self.forward_search.queue_is_empty() || self.forward_search.min_queue_key().unwrap_or(INFINITY) > tentative_dist {
                    forward_done = true;
                }
            }
            if !backward_done {
                let settled = self.backward_search.step(&ch.backward);
                if self.forward_search.is_settled(settled) {
                    let dist = self.forward_search.dist(settled) + self.backward_search.dist(settled);
                    if dist < tentative_dist {
                        tentative_dist = dist;
                    }
                }
                if self.backward_search.queue_is_empty() || self.backward_search.min_queue_key().unwrap_or(INFINITY) > tentative_dist {
                    backward_done = true;
                }
            }
        }

        self.forward_search.finish();
        self.backward_search.finish();
        tentative_dist
    }
}
