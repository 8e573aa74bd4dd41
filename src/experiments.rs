//! Query workload generation and path quality evaluation.

use crate::algo::ch_potentials::{CHPotential, Potential};
use crate::algo::contraction::ContractionHierarchy;
use crate::algo::dijkstra::Dijkstra;
use crate::datastr::graph::*;
use crate::report::AltPathReport;
use rand::Rng;

/// Uniformly random source and target vectors of the given length.
pub fn random_pairs<R: Rng>(rng: &mut R, count: u32, num_nodes: usize) -> (Vec<NodeId>, Vec<NodeId>) {
    let sources = (0..count).map(|_| rng.gen_range(0..num_nodes as NodeId)).collect();
    let targets = (0..count).map(|_| rng.gen_range(0..num_nodes as NodeId)).collect();
    (sources, targets)
}

/// Dijkstra-rank targets for one source: settle everything, sort the nodes by
/// distance and keep the ones at the power-of-two positions.
pub fn dijkstra_rank_targets(graph: &AdjacencyGraph, source: NodeId) -> Vec<NodeId> {
    let mut dijkstra = Dijkstra::new(graph.num_nodes());
    dijkstra.set_source(source);
    dijkstra.run_until_done(graph);

    let mut by_dist: Vec<(Weight, NodeId)> = (0..graph.num_nodes() as NodeId).map(|node| (dijkstra.dist(node), node)).collect();
    by_dist.sort_unstable();

    let mut targets = Vec::new();
    let mut rank = 1;
    while rank < by_dist.len() {
        targets.push(by_dist[rank].1);
        rank *= 2;
    }
    targets
}

/// Full quality record for one alternative: stretch and sharing against the
/// optimal path, plus local optimality and uniformly bounded stretch over all
/// subpaths. The subpath sweep reuses one CH potential per suffix target, but
/// this still costs a potential rebuild per path node.
pub fn path_quality(graph: &AdjacencyGraph, ch: &ContractionHierarchy, path: &Path) -> AltPathReport {
    let source = *path.nodes.first().expect("quality of an empty path");
    let target = *path.nodes.last().unwrap();

    let mut dijkstra = Dijkstra::new(graph.num_nodes());
    dijkstra.set_source(source);
    dijkstra.run_until_target_found(graph, target);
    let optimal_path = dijkstra.path(target);
    dijkstra.finish();

    let mut shared = 0;
    for pair in path.nodes.windows(2) {
        if optimal_path.nodes.contains(&pair[1]) {
            shared += graph.edge_weight(pair[0], pair[1]);
        }
    }

    let mut potential = CHPotential::forward(ch);
    let mut worst_stretch = 1.0f64;
    let mut min_dist_without_local_optimality = path.length;
    for i in (1..path.nodes.len()).rev() {
        potential.init(path.nodes[i]);
        let mut path_dist = 0;
        for j in (0..i).rev() {
            path_dist += graph.edge_weight(path.nodes[j], path.nodes[j + 1]);
            let optimal_dist = potential.potential(path.nodes[j]).unwrap_or(INFINITY);
            if path_dist != optimal_dist && path_dist < min_dist_without_local_optimality {
                min_dist_without_local_optimality = path_dist;
            }
            let stretch = path_dist as f64 / optimal_dist as f64;
            if stretch > worst_stretch {
                worst_stretch = stretch;
            }
        }
    }

    AltPathReport {
        length: path.length,
        stretch: path.length as f64 / optimal_path.length as f64,
        sharing: shared as f64 / optimal_path.length as f64,
        local_optimality: min_dist_without_local_optimality as f64 / path.length as f64,
        uniformly_bounded_stretch: worst_stretch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_targets_follow_the_distance_order() {
        // a directed chain, distances are the node ids
        let mut graph = AdjacencyGraph::new(9);
        for node in 0..8 {
            graph.add_edge(node, Link { node: node + 1, weight: 1 });
        }
        let targets = dijkstra_rank_targets(&graph, 0);
        assert_eq!(targets, vec![1, 2, 4, 8]);
    }

    #[test]
    fn quality_of_the_optimal_path_is_perfect() {
        let mut graph = AdjacencyGraph::new(3);
        graph.add_edge(0, Link { node: 1, weight: 3 });
        graph.add_edge(1, Link { node: 2, weight: 4 });
        graph.add_edge(0, Link { node: 2, weight: 10 });
        let ch = crate::algo::contraction::contract_with_order(&graph, crate::datastr::node_order::NodeOrder::from_node_order(vec![0, 1, 2]));
        let quality = path_quality(&graph, &ch, &Path { nodes: vec![0, 1, 2], length: 7 });
        assert_eq!(quality.length, 7);
        assert!((quality.stretch - 1.0).abs() < 1e-9);
        assert!((quality.sharing - 1.0).abs() < 1e-9);
        assert!((quality.uniformly_bounded_stretch - 1.0).abs() < 1e-9);
        assert!((quality.local_optimality - 1.0).abs() < 1e-9);
    }
}
