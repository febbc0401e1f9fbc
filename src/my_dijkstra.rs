use std::collections::BinaryHeap;
use std::cmp::Ordering;

use petgraph::graph::DiGraph;
use petgraph::graph::EdgeReference;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use super::cost::CostFunction;
use super::demand::DemandMatrix;
use super::network::Link;
use super::network::TrafficNetwork;


/// Returned by the settle callback to tell the search whether to keep going.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Control {
    Continue,
    Stop,
}

/// Forward dijkstra from `origin` that records the predecessor of every reached node.  Based on
/// the implementation in the petgraph library.
///
/// Only edges for which `traversable` returns true are relaxed.  `on_settle` is called each time
/// a node's cost becomes final; if it returns `Control::Stop` the search ends there.  Edge costs
/// must be non-negative.
///
/// Returns the cost of reaching each node (infinite if it was not reached) and each node's
/// predecessor on the tree.
pub fn dijkstra_with_predecessors<N, E, F, P, S>(
    graph: &DiGraph<N, E>,
    origin: NodeIndex,
    mut edge_cost: F,
    mut traversable: P,
    mut on_settle: S,
) -> (Vec<f64>, Vec<Option<NodeIndex>>)
where
    F: FnMut(EdgeReference<E>) -> f64,
    P: FnMut(EdgeReference<E>) -> bool,
    S: FnMut(NodeIndex) -> Control,
{
    let num_nodes = graph.node_count();
    let mut settled = vec![false; num_nodes];
    let mut scores = vec![f64::INFINITY; num_nodes];
    let mut predecessors = vec![None; num_nodes];
    scores[origin.index()] = 0.;

    let mut visit_next = BinaryHeap::new();
    visit_next.push(MinScored(0., origin));
    while let Some(MinScored(node_score, node)) = visit_next.pop() {
        if settled[node.index()] {
            continue;
        }
        settled[node.index()] = true;
        if on_settle(node) == Control::Stop {
            break;
        }

        for edge in graph.edges(node) {
            let next = edge.target();
            if settled[next.index()] || !traversable(edge) {
                continue;
            }
            let next_score = node_score + edge_cost(edge);
            if next_score < scores[next.index()] {
                scores[next.index()] = next_score;
                predecessors[next.index()] = Some(node);
                visit_next.push(MinScored(next_score, next));
            }
        }
    }
    (scores, predecessors)
}


/// A shortest path tree rooted at one origin zone.
#[derive(Clone, Debug)]
pub struct ShortestPathTree {
    origin: NodeIndex,
    costs: Vec<f64>,
    predecessors: Vec<Option<NodeIndex>>,
}

impl ShortestPathTree {
    pub fn origin(&self) -> NodeIndex {
        self.origin
    }

    pub fn predecessor(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.predecessors[node.index()]
    }

    /// Cost of the tree path to `node`, infinite if the search never reached it.
    pub fn cost(&self, node: NodeIndex) -> f64 {
        self.costs[node.index()]
    }

    pub fn reached(&self, node: NodeIndex) -> bool {
        node == self.origin || self.predecessors[node.index()].is_some()
    }
}

/// Computes the minimum-weight tree from `origin` over the links' current weights.
///
/// Unless the network lets every node carry through traffic, zones other than the origin are
/// dead ends: they can be reached but not passed through.  If `prune_idle_zones` is set, edges
/// into zones with no demand from the origin are not relaxed at all.  The search stops as soon
/// as every destination with demand from the origin has been settled.
pub fn compute_min_tree<C: CostFunction>(network: &TrafficNetwork<C>, origin: NodeIndex,
                                         demand: &DemandMatrix, prune_idle_zones: bool)
                                         -> ShortestPathTree {
    let graph = network.graph();
    let mut to_be_visited = demand.destination_count(origin);
    let all_centroids = network.all_centroids();

    let edge_cost = |edge: EdgeReference<Link<C>>| edge.weight().weight;
    let traversable = |edge: EdgeReference<Link<C>>| {
        if all_centroids {
            return true;
        }
        let source = edge.source();
        if graph[source].is_zone && source != origin {
            return false;
        }
        let target = edge.target();
        if prune_idle_zones && graph[target].is_zone && demand.demand(origin, target) <= 0. {
            return false;
        }
        true
    };
    let on_settle = |node: NodeIndex| {
        if graph[node].is_zone && demand.demand(origin, node) > 0. {
            to_be_visited -= 1;
            if to_be_visited == 0 {
                return Control::Stop;
            }
        }
        Control::Continue
    };

    let (costs, predecessors) = dijkstra_with_predecessors(graph, origin, edge_cost, traversable,
                                                           on_settle);
    ShortestPathTree { origin, costs, predecessors }
}


#[derive(Copy, Clone, Debug)]
pub struct MinScored<K, T>(pub K, pub T);

impl<K: PartialOrd, T> PartialEq for MinScored<K, T> {
    #[inline]
    fn eq(&self, other: &MinScored<K, T>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: PartialOrd, T> Eq for MinScored<K, T> {}

impl<K: PartialOrd, T> PartialOrd for MinScored<K, T> {
    #[inline]
    fn partial_cmp(&self, other: &MinScored<K, T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: PartialOrd, T> Ord for MinScored<K, T> {
    #[inline]
    fn cmp(&self, other: &MinScored<K, T>) -> Ordering {
        let a = &self.0;
        let b = &other.0;
        if a == b {
            Ordering::Equal
        } else if a < b {
            Ordering::Greater
        } else if a > b {
            Ordering::Less
        } else if a.ne(a) && b.ne(b) {
            // these are the NaN cases
            Ordering::Equal
        } else if a.ne(a) {
            // Order NaN less, so that it is last in the MinScore order
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}
