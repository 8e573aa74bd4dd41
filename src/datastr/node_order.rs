//! Contraction orders.

use crate::datastr::graph::NodeId;
use crate::io::*;

pub type Rank = NodeId;

/// A contraction order together with its inverse, so both directions of the
/// mapping are O(1) and it is always clear which one is meant.
#[derive(Debug, Clone)]
pub struct NodeOrder {
    // node ids ordered by rank, ascending in importance
    node_order: Vec<NodeId>,
    // rank per node - 0 is contracted first, n-1 last
    ranks: Vec<Rank>,
}

impl NodeOrder {
    /// Build from an order vector, i.e. `order[i]` is the i-th node to contract.
    pub fn from_node_order(node_order: Vec<NodeId>) -> NodeOrder {
        let n = node_order.len();
        assert!(n < NodeId::MAX as usize);
        let mut ranks = vec![n as Rank; n];

        for (i, &node) in node_order.iter().enumerate() {
            ranks[node as usize] = i as Rank;
        }

        debug_assert_eq!(ranks.iter().position(|&rank| rank == n as Rank), None, "order is not a permutation");

        NodeOrder { node_order, ranks }
    }

    /// Build from a rank vector, i.e. `ranks[node]` is the position of `node` in the order.
    pub fn from_ranks(ranks: Vec<Rank>) -> NodeOrder {
        let n = ranks.len();
        assert!(n < NodeId::MAX as usize);
        let mut node_order = vec![n as NodeId; n];

        for (node, &rank) in ranks.iter().enumerate() {
            node_order[rank as usize] = node as NodeId;
        }

        debug_assert_eq!(node_order.iter().position(|&node| node == n as NodeId), None, "ranks are not a permutation");

        NodeOrder { node_order, ranks }
    }

    pub fn rank(&self, node: NodeId) -> Rank {
        self.ranks[node as usize]
    }

    pub fn node(&self, rank: Rank) -> NodeId {
        self.node_order[rank as usize]
    }

    pub fn order(&self) -> &[NodeId] {
        &self.node_order
    }

    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    pub fn len(&self) -> usize {
        self.node_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_order.is_empty()
    }
}

impl Reconstruct for NodeOrder {
    fn reconstruct_with(loader: Loader) -> std::io::Result<Self> {
        loader.load("order").map(Self::from_node_order)
    }
}
