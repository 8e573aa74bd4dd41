//! Parallel bidirectional A* with symmetric CH potentials.
//!
//! One thread searches forward from the source, one backward from the
//! target. Both use the averaged heuristic
//!
//! ```text
//! h_f(n) = (pi_f(n) + pi_r(target) - pi_r(n)) / 2
//! h_r(n) = (pi_r(n) + pi_f(source) - pi_f(n)) / 2
//! ```
//!
//! which is consistent in both directions, so a single shared tentative
//! distance with the shifted termination test
//! `k_f + k_r >= tentative + h_f(source)` is exact.
//!
//! Shared state between the threads is kept minimal: the meeting candidate
//! is one atomically swapped word, per-node distances live in epoch-stamped
//! atomic cells written only by their owning direction, and the queue top
//! keys are monotone published values. Each direction carries its own pair
//! of potentials so the memoization caches need no locks.

use crate::algo::ch_potentials::{CHPotential, Potential};
use crate::algo::contraction::ContractionHierarchy;
use crate::datastr::{graph::*, index_heap::*, timestamped_vector::TimestampedVector};
use std::sync::atomic::{
    AtomicU64,
    Ordering::{AcqRel, Acquire, Relaxed, Release},
};

const SETTLED_BIT: u32 = 1 << 31;
// published in place of a queue key when a queue runs dry; far above any
// reachable key sum but safe to add without wrapping
const DRAINED: u64 = u64::MAX / 4;

/// Per-node distances of one search direction, readable from the opposite
/// thread. Each cell packs `(epoch, settled flag, distance)`, so resetting
/// between queries is one epoch bump. Only the owning direction writes.
struct SharedDistances {
    cells: Vec<AtomicU64>,
    epoch: u32,
}

impl SharedDistances {
    fn new(n: usize) -> SharedDistances {
        SharedDistances {
            cells: (0..n).map(|_| AtomicU64::new(0)).collect(),
            // cells start at epoch 0, so the first query must not use it
            epoch: 1,
        }
    }

    fn advance_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            // wrapped around, stale stamps would become valid again
            for cell in &mut self.cells {
                *cell.get_mut() = 0;
            }
            self.epoch = 1;
        }
    }

    fn unpack(&self, cell: u64) -> Option<u32> {
        if (cell >> 32) as u32 == self.epoch {
            Some(cell as u32)
        } else {
            None
        }
    }

    fn dist(&self, node: NodeId) -> Weight {
        match self.unpack(self.cells[node as usize].load(Acquire)) {
            Some(word) => word & !SETTLED_BIT,
            None => INFINITY,
        }
    }

    /// Distance of `node` if the owning direction has settled it.
    fn settled_dist(&self, node: NodeId) -> Option<Weight> {
        match self.unpack(self.cells[node as usize].load(Acquire)) {
            Some(word) if word & SETTLED_BIT != 0 => Some(word & !SETTLED_BIT),
            _ => None,
        }
    }

    // the two writers below must only be called by the owning direction

    fn set_dist(&self, node: NodeId, dist: Weight) {
        debug_assert!(dist < SETTLED_BIT);
        self.cells[node as usize].store((self.epoch as u64) << 32 | dist as u64, Release);
    }

    fn settle(&self, node: NodeId) {
        let cell = self.cells[node as usize].load(Relaxed);
        debug_assert!(self.unpack(cell).is_some(), "settled a node without a distance");
        self.cells[node as usize].store(cell | SETTLED_BIT as u64, Release);
    }
}

// `(distance << 32) | node`, so the numeric u64 order is distance order
fn pack_meeting(dist: Weight, node: NodeId) -> u64 {
    (dist as u64) << 32 | node as u64
}

fn meeting_dist(meeting: u64) -> Weight {
    (meeting >> 32) as Weight
}

/// Lower the shared meeting candidate. Successful updates establish a
/// strictly smaller tentative distance, losers of a race just retry until
/// their candidate is no improvement anymore.
fn update_meeting(meeting: &AtomicU64, dist: Weight, node: NodeId) {
    let mut current = meeting.load(Acquire);
    while dist < meeting_dist(current) {
        match meeting.compare_exchange_weak(current, pack_meeting(dist, node), AcqRel, Acquire) {
            Ok(_) => return,
            Err(observed) => current = observed,
        }
    }
}

/// `(own(node) + other_at_origin - other(node)) / 2`, clamped into `[0, INFINITY]`.
fn averaged_heuristic(own: &mut CHPotential, other: &mut CHPotential, other_at_origin: Weight, node: NodeId) -> Weight {
    let own_pot = match own.potential(node) {
        Some(pot) => pot,
        None => return INFINITY,
    };
    if other_at_origin >= INFINITY {
        return INFINITY;
    }
    let other_pot = other.potential(node).unwrap_or(INFINITY);
    let value = own_pot as i64 + other_at_origin as i64 - other_pot as i64;
    (value.max(0) / 2) as Weight
}

/// The bidirectional query server. Owns all per-query state plus four
/// potential instances (a forward/reverse pair per direction) and borrows the
/// graph per query, so callers may reweight it between runs.
pub struct BiDirAStar<'a> {
    queue_fwd: IndexdMinHeap<State>,
    queue_bwd: IndexdMinHeap<State>,
    parents_fwd: TimestampedVector<NodeId>,
    parents_bwd: TimestampedVector<NodeId>,
    dist_fwd: SharedDistances,
    dist_bwd: SharedDistances,
    fwd_pot_to_target: CHPotential<'a>,
    fwd_pot_from_source: CHPotential<'a>,
    bwd_pot_to_target: CHPotential<'a>,
    bwd_pot_from_source: CHPotential<'a>,
    num_settled: usize,
}

impl<'a> BiDirAStar<'a> {
    pub fn new(ch: &'a ContractionHierarchy) -> BiDirAStar<'a> {
        let n = ch.order.len();
        BiDirAStar {
            queue_fwd: IndexdMinHeap::new(n),
            queue_bwd: IndexdMinHeap::new(n),
            parents_fwd: TimestampedVector::new(n, INVALID_NODE),
            parents_bwd: TimestampedVector::new(n, INVALID_NODE),
            dist_fwd: SharedDistances::new(n),
            dist_bwd: SharedDistances::new(n),
            fwd_pot_to_target: CHPotential::forward(ch),
            fwd_pot_from_source: CHPotential::reverse(ch),
            bwd_pot_to_target: CHPotential::forward(ch),
            bwd_pot_from_source: CHPotential::reverse(ch),
            num_settled: 0,
        }
    }

    /// Nodes settled by both directions of the last query.
    pub fn num_settled(&self) -> usize {
        self.num_settled
    }

    pub fn run(&mut self, graph: &AdjacencyGraph, source: NodeId, target: NodeId) -> Path {
        if source == target {
            return Path {
                nodes: vec![source],
                length: 0,
            };
        }

        self.dist_fwd.advance_epoch();
        self.dist_bwd.advance_epoch();
        self.parents_fwd.reset();
        self.parents_bwd.reset();
        self.queue_fwd.clear();
        self.queue_bwd.clear();

        self.fwd_pot_to_target.init(target);
        self.bwd_pot_to_target.init(target);
        self.fwd_pot_from_source.init(source);
        self.bwd_pot_from_source.init(source);

        self.dist_fwd.set_dist(source, 0);
        self.dist_fwd.settle(source);
        self.parents_fwd.set(source as usize, INVALID_NODE);
        self.dist_bwd.set_dist(target, 0);
        self.dist_bwd.settle(target);
        self.parents_bwd.set(target as usize, INVALID_NODE);

        let pi_r_at_target = self.fwd_pot_from_source.potential(target).unwrap_or(INFINITY);
        let source_key = averaged_heuristic(&mut self.fwd_pot_to_target, &mut self.fwd_pot_from_source, pi_r_at_target, source);
        let pi_f_at_source = self.bwd_pot_to_target.potential(source).unwrap_or(INFINITY);
        let target_key = averaged_heuristic(&mut self.bwd_pot_from_source, &mut self.bwd_pot_to_target, pi_f_at_source, target);
        self.queue_fwd.push(State { key: source_key, node: source });
        self.queue_bwd.push(State { key: target_key, node: target });

        let meeting = AtomicU64::new(pack_meeting(INFINITY, INVALID_NODE));
        let top_key_fwd = AtomicU64::new(source_key as u64);
        let top_key_bwd = AtomicU64::new(target_key as u64);
        // both termination tests compensate the averaging offset by h_f(source)
        let shift = source_key as u64;

        let forward = Direction {
            queue: &mut self.queue_fwd,
            parents: &mut self.parents_fwd,
            dist_own: &self.dist_fwd,
            dist_other: &self.dist_bwd,
            pot_own: &mut self.fwd_pot_to_target,
            pot_other: &mut self.fwd_pot_from_source,
            pot_other_at_origin: pi_r_at_target,
            meeting: &meeting,
            top_key_own: &top_key_fwd,
            top_key_other: &top_key_bwd,
            shift,
        };
        let backward = Direction {
            queue: &mut self.queue_bwd,
            parents: &mut self.parents_bwd,
            dist_own: &self.dist_bwd,
            dist_other: &self.dist_fwd,
            pot_own: &mut self.bwd_pot_from_source,
            pot_other: &mut self.bwd_pot_to_target,
            pot_other_at_origin: pi_f_at_source,
            meeting: &meeting,
            top_key_own: &top_key_bwd,
            top_key_other: &top_key_fwd,
            shift,
        };

        let (settled_fwd, settled_bwd) = std::thread::scope(|scope| {
            let forward_handle = scope.spawn(|| forward.search(graph));
            let backward_handle = scope.spawn(|| backward.search(&Reversed(graph)));
            (forward_handle.join().unwrap(), backward_handle.join().unwrap())
        });
        self.num_settled = settled_fwd + settled_bwd;

        let final_meeting = meeting.load(Acquire);
        let tentative_dist = meeting_dist(final_meeting);
        if tentative_dist >= INFINITY {
            return Path::unreachable();
        }
        let meeting_node = final_meeting as u32;

        let mut nodes = Vec::new();
        let mut current = meeting_node;
        while current != INVALID_NODE {
            nodes.push(current);
            current = self.parents_fwd.get(current as usize);
        }
        nodes.reverse();
        // continue past the meeting node, which is already part of the prefix
        let mut current = self.parents_bwd.get(meeting_node as usize);
        while current != INVALID_NODE {
            nodes.push(current);
            current = self.parents_bwd.get(current as usize);
        }

        Path {
            nodes,
            length: tentative_dist,
        }
    }
}

/// Everything one direction's thread works with. Queue, parents and
/// potentials are exclusive, the rest is the shared query state.
struct Direction<'s, 'a> {
    queue: &'s mut IndexdMinHeap<State>,
    parents: &'s mut TimestampedVector<NodeId>,
    dist_own: &'s SharedDistances,
    dist_other: &'s SharedDistances,
    pot_own: &'s mut CHPotential<'a>,
    pot_other: &'s mut CHPotential<'a>,
    pot_other_at_origin: Weight,
    meeting: &'s AtomicU64,
    top_key_own: &'s AtomicU64,
    top_key_other: &'s AtomicU64,
    shift: u64,
}

impl<'s, 'a> Direction<'s, 'a> {
    fn search<G: ArcGraph>(mut self, graph: &G) -> usize {
        let mut num_settled = 0;
        loop {
            // reread the shared state every round - tentative only shrinks
            // and the keys only grow, so stale values merely delay the exit
            let tentative = meeting_dist(self.meeting.load(Acquire)) as u64;
            let k_own = self.top_key_own.load(Acquire);
            let k_other = self.top_key_other.load(Acquire);
            if k_own + k_other >= tentative + self.shift {
                return num_settled;
            }

            let best = match self.queue.pop() {
                Some(State { node, .. }) => node,
                None => {
                    self.top_key_own.store(DRAINED, Release);
                    continue;
                }
            };
            self.dist_own.settle(best);
            num_settled += 1;
            let best_dist = self.dist_own.dist(best);

            for &Link { node: head, weight } in graph.arcs(best) {
                let dist = best_dist + weight;
                let tentative = meeting_dist(self.meeting.load(Acquire));
                let pot = self.pot_own.potential(head).unwrap_or(INFINITY);
                if dist as u64 + pot as u64 >= tentative as u64 {
                    continue;
                }
                if let Some(other_dist) = self.dist_other.settled_dist(head) {
                    if (dist as u64 + other_dist as u64) < tentative as u64 {
                        update_meeting(self.meeting, dist + other_dist, head);
                    }
                }
                if dist < self.dist_own.dist(head) {
                    self.dist_own.set_dist(head, dist);
                    self.parents.set(head as usize, best);
                    let key = dist + averaged_heuristic(self.pot_own, self.pot_other, self.pot_other_at_origin, head);
                    if self.queue.contains_index(head as usize) {
                        self.queue.decrease_key(State { key, node: head });
                    } else {
                        self.queue.push(State { key, node: head });
                    }
                }
            }

            let top = self.queue.peek().map(|state| state.key as u64).unwrap_or(DRAINED);
            self.top_key_own.store(top, Release);
        }
    }
}
