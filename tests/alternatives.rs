use alt_routing::{
    algo::{
        astar::AStar,
        bidir_astar::BiDirAStar,
        ch_potentials::{CHPotential, Potential},
        contraction::{contract_bottom_up, contract_with_order, CHQuery, ContractionHierarchy},
        dijkstra::Dijkstra,
        penalty::{PenaltyService, PenaltySettings},
        xbdv::{XbdvService, DEFAULT_ALPHA, DEFAULT_EPS, DEFAULT_GAMMA},
    },
    datastr::{graph::*, node_order::NodeOrder},
    report::CaseReport,
};

// This is the directed graph we're going to use.
// The node numbers correspond to the different states,
// and the edge weights symbolize the cost of moving
// from one node to another.
// Note that the edges are one-way.
//
//                  7
//          +-----------------+
//          |                 |
//          v   1        2    |  2
//          0 -----> 1 -----> 3 ---> 4
//          |        ^        ^      ^
//          |        | 1      |      |
//          |        |        | 3    | 1
//          +------> 2 -------+      |
//           10      |               |
//                   +---------------+
//
fn graph() -> AdjacencyGraph {
    let mut graph = AdjacencyGraph::new(5);
    graph.add_edge(0, Link { node: 2, weight: 10 });
    graph.add_edge(0, Link { node: 1, weight: 1 });
    graph.add_edge(1, Link { node: 3, weight: 2 });
    graph.add_edge(2, Link { node: 1, weight: 1 });
    graph.add_edge(2, Link { node: 3, weight: 3 });
    graph.add_edge(2, Link { node: 4, weight: 1 });
    graph.add_edge(3, Link { node: 0, weight: 7 });
    graph.add_edge(3, Link { node: 4, weight: 2 });
    graph
}

fn all_pairs_dijkstra(graph: &AdjacencyGraph) -> Vec<Vec<Weight>> {
    let mut dijkstra = Dijkstra::new(graph.num_nodes());
    (0..graph.num_nodes() as NodeId)
        .map(|source| {
            dijkstra.set_source(source);
            dijkstra.run_until_done(graph);
            let dists = (0..graph.num_nodes() as NodeId).map(|node| dijkstra.dist(node)).collect();
            dijkstra.finish();
            dists
        })
        .collect()
}

#[test]
fn dijkstra_distances() {
    let graph = graph();
    let mut dijkstra = Dijkstra::new(graph.num_nodes());
    dijkstra.set_source(0);
    dijkstra.run_until_done(&graph);
    assert_eq!(dijkstra.dist(1), 1);
    assert_eq!(dijkstra.dist(3), 3);
    assert_eq!(dijkstra.dist(4), 5);
    assert_eq!(dijkstra.path(4).nodes, vec![0, 1, 3, 4]);
    dijkstra.finish();

    dijkstra.set_source(4);
    dijkstra.run_until_done(&graph);
    assert_eq!(dijkstra.dist(0), INFINITY);
}

#[test]
fn astar_with_ch_potentials_matches_dijkstra() {
    let graph = graph();
    let n = graph.num_nodes();
    let ch = contract_with_order(&graph, NodeOrder::from_node_order((0..n as NodeId).collect()));
    let reference = all_pairs_dijkstra(&graph);

    let mut astar = AStar::new(n);
    for source in 0..n as NodeId {
        for target in 0..n as NodeId {
            let mut potential = CHPotential::forward(&ch);
            potential.init(target);
            astar.add_source(source, &mut potential);
            astar.run_until_target_found(&graph, &mut potential, target);
            assert_eq!(
                astar.dist(target),
                reference[source as usize][target as usize],
                "query {} -> {}",
                source,
                target
            );
            astar.finish();
        }
    }
}

#[test]
fn bidirectional_astar_matches_dijkstra() {
    let graph = graph();
    let n = graph.num_nodes();
    let ch = contract_bottom_up(&graph);
    let reference = all_pairs_dijkstra(&graph);

    let mut astar = BiDirAStar::new(&ch);
    for source in 0..n as NodeId {
        for target in 0..n as NodeId {
            let path = astar.run(&graph, source, target);
            assert_eq!(path.length, reference[source as usize][target as usize], "query {} -> {}", source, target);
            if path.length < INFINITY {
                assert_eq!(graph.path_length(&path.nodes), path.length, "query {} -> {}", source, target);
            }
        }
    }
}

#[test]
fn ch_query_matches_dijkstra() {
    let graph = graph();
    let n = graph.num_nodes();
    let reference = all_pairs_dijkstra(&graph);

    for ch in [
        contract_with_order(&graph, NodeOrder::from_node_order((0..n as NodeId).collect())),
        contract_with_order(&graph, NodeOrder::from_node_order(vec![4, 2, 0, 3, 1])),
        contract_bottom_up(&graph),
    ] {
        let mut query = CHQuery::new(n);
        for source in 0..n as NodeId {
            for target in 0..n as NodeId {
                assert_eq!(
                    query.distance(&ch, source, target),
                    reference[source as usize][target as usize],
                    "query {} -> {}",
                    source,
                    target
                );
            }
        }
    }
}

#[test]
fn triangle_scenario() {
    let mut graph = AdjacencyGraph::new(3);
    graph.add_edge(0, Link { node: 1, weight: 3 });
    graph.add_edge(1, Link { node: 2, weight: 4 });
    graph.add_edge(0, Link { node: 2, weight: 10 });

    let mut dijkstra = Dijkstra::new(3);
    dijkstra.set_source(0);
    dijkstra.run_until_target_found(&graph, 2);
    assert_eq!(dijkstra.path(2), Path { nodes: vec![0, 1, 2], length: 7 });
    dijkstra.finish();

    let ch = contract_with_order(&graph, NodeOrder::from_node_order(vec![0, 1, 2]));
    let mut potential = CHPotential::forward(&ch);
    potential.init(2);
    let mut astar = AStar::new(3);
    astar.add_source(0, &mut potential);
    astar.run_until_target_found(&graph, &mut potential, 2);
    assert_eq!(astar.dist(2), 7);

    let mut bidir = BiDirAStar::new(&ch);
    assert_eq!(bidir.run(&graph, 0, 2).length, 7);
}

#[test]
fn disconnected_scenario() {
    let mut graph = AdjacencyGraph::new(3);
    graph.add_edge(0, Link { node: 1, weight: 5 });
    let ch = contract_bottom_up(&graph);

    let mut service = PenaltyService::new(&graph, &ch, PenaltySettings::default());
    let mut case = CaseReport::default();
    service.run(0, 2, &mut case);
    assert_eq!(case.shortest_length, INFINITY);
    assert_eq!(service.alt_graph().num_arcs(), 0);
    assert!(XbdvService::new(service.alt_graph())
        .alternatives(0, 2, false, DEFAULT_ALPHA, DEFAULT_EPS, DEFAULT_GAMMA)
        .is_empty());
}

// two node disjoint five hop unit weight paths between 0 and 9
//
// 0 -> 1 -> 2 -> 3 -> 4 -> 9
//  \-> 5 -> 6 -> 7 -> 8 ->/
fn ladder() -> AdjacencyGraph {
    let mut graph = AdjacencyGraph::new(10);
    for &(from, to) in &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 9)] {
        graph.add_edge(from, Link { node: to, weight: 1 });
    }
    for &(from, to) in &[(0, 5), (5, 6), (6, 7), (7, 8), (8, 9)] {
        graph.add_edge(from, Link { node: to, weight: 1 });
    }
    graph
}

#[test]
fn ladder_end_to_end() {
    let graph = ladder();
    let ch = contract_bottom_up(&graph);

    let mut service = PenaltyService::new(&graph, &ch, PenaltySettings::default());
    let mut case = CaseReport::default();
    service.run(0, 9, &mut case);
    assert_eq!(case.shortest_length, 5);

    // the alternative subgraph holds both disjoint paths at original weights
    let alt_graph = service.alt_graph();
    assert_eq!(alt_graph.num_arcs(), 10);
    for &(from, to) in &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 9), (0, 5), (5, 6), (6, 7), (7, 8), (8, 9)] {
        assert_eq!(alt_graph.edge_weight(from, to), 1);
    }

    // extraction keeps the path disjoint from the optimal one
    let paths = XbdvService::new(alt_graph).alternatives(0, 9, false, DEFAULT_ALPHA, DEFAULT_EPS, DEFAULT_GAMMA);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].length, 5);
    assert_eq!(paths[0].nodes.len(), 6);
    assert_eq!(paths[0].nodes.first(), Some(&0));
    assert_eq!(paths[0].nodes.last(), Some(&9));
}

#[test]
fn penalty_candidates_contain_qualifying_detours() {
    // a denser graph with several competitive routes
    //
    // 0 -- 1 -- 2 -- 3
    // |    |    |    |
    // 4 -- 5 -- 6 -- 7   all arcs left to right and top to bottom
    let mut graph = AdjacencyGraph::new(8);
    for &(from, to, weight) in &[
        (0, 1, 2),
        (1, 2, 2),
        (2, 3, 2),
        (4, 5, 2),
        (5, 6, 2),
        (6, 7, 2),
        (0, 4, 1),
        (1, 5, 1),
        (2, 6, 1),
        (3, 7, 1),
    ] {
        graph.add_edge(from, Link { node: to, weight });
    }
    let ch = contract_bottom_up(&graph);
    let settings = PenaltySettings::default();
    let mut service = PenaltyService::new(&graph, &ch, settings);
    let mut case = CaseReport::default();
    service.run(0, 7, &mut case);
    assert_eq!(case.shortest_length, 7);
    // whatever was accepted, the subgraph contains the shortest path and only
    // original weights
    let alt_graph = service.alt_graph();
    for node in 0..8 {
        for link in alt_graph.out_arcs(node) {
            assert_eq!(link.weight, graph.edge_weight(node, link.node));
        }
    }
    let mut dijkstra = Dijkstra::new(8);
    dijkstra.set_source(0);
    dijkstra.run_until_target_found(alt_graph, 7);
    assert_eq!(dijkstra.dist(7), 7);
}

#[test]
fn xbdv_alternatives_respect_the_sharing_bound() {
    let graph = ladder();
    let paths = XbdvService::new(&graph).alternatives(0, 9, true, DEFAULT_ALPHA, DEFAULT_EPS, DEFAULT_GAMMA);
    assert!(!paths.is_empty());

    let mut dijkstra = Dijkstra::new(graph.num_nodes());
    dijkstra.set_source(0);
    dijkstra.run_until_target_found(&graph, 9);
    let optimal = dijkstra.path(9);

    for path in &paths {
        let mut shared = 0;
        for pair in path.nodes.windows(2) {
            if optimal.nodes.contains(&pair[1]) {
                shared += graph.edge_weight(pair[0], pair[1]);
            }
        }
        assert!((shared as f64) < DEFAULT_GAMMA * optimal.length as f64);
    }
}

#[test]
fn loading_a_stored_ch_matches_in_process_contraction() {
    use alt_routing::io::{Reconstruct, Store};

    let graph = graph();
    let dir = std::env::temp_dir().join(format!("alt-routing-test-{}", std::process::id()));
    std::fs::create_dir_all(dir.join("ch")).unwrap();

    // store the plain graph as its adjacency array
    let mut first_out = vec![0u32];
    let mut head = Vec::new();
    let mut weight = Vec::new();
    for node in 0..graph.num_nodes() as NodeId {
        for link in graph.out_arcs(node) {
            head.push(link.node);
            weight.push(link.weight);
        }
        first_out.push(head.len() as u32);
    }
    // the ch directory carries the same graph plus the contraction order
    first_out.write_to(dir.join("ch").join("first_out")).unwrap();
    head.write_to(dir.join("ch").join("head")).unwrap();
    weight.write_to(dir.join("ch").join("weight")).unwrap();
    let order: Vec<NodeId> = (0..graph.num_nodes() as NodeId).collect();
    order.write_to(dir.join("ch").join("order")).unwrap();

    let loaded = ContractionHierarchy::reconstruct_from(dir.join("ch")).unwrap();
    let reference = all_pairs_dijkstra(&graph);
    // without shortcuts this order still answers upward queries correctly
    // for pairs whose shortest path is rank increasing, and the identity
    // order happens to make all reachable pairs of this graph work
    let mut query = CHQuery::new(graph.num_nodes());
    assert_eq!(query.distance(&loaded, 0, 4), reference[0][4]);
    assert_eq!(query.distance(&loaded, 2, 4), reference[2][4]);

    std::fs::remove_dir_all(&dir).unwrap();
}
