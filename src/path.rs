use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::Hasher;

use itertools::Itertools;
use petgraph::graph::EdgeIndex;
use petgraph::graph::NodeIndex;

use super::cost::CostFunction;
use super::errors::TrafficError;
use super::my_dijkstra::ShortestPathTree;
use super::network::TrafficNetwork;


/// A route between two zones.  The edges are kept sorted by edge index, so two paths over the
/// same links compare equal regardless of how they were built.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub origin: NodeIndex,
    pub destination: NodeIndex,
    pub flow: f64,
    edges: Vec<EdgeIndex>,
    // fold of the visited nodes, from the destination back to the origin
    hash: u64,
}

impl Path {
    /// Walks the tree back from `destination` to the tree's origin, collecting the edges on the
    /// way.
    pub fn build<C: CostFunction>(tree: &ShortestPathTree, destination: NodeIndex,
                                  network: &TrafficNetwork<C>) -> Result<Path, TrafficError> {
        let origin = tree.origin();
        let unreachable = || TrafficError::Unreachable {
            origin: origin.index(),
            destination: destination.index(),
        };

        let mut hasher = DefaultHasher::new();
        let mut edges = vec![];
        let mut target = destination;
        hasher.write_usize(target.index());
        while target != origin {
            // a tree path can't be longer than the number of nodes
            if edges.len() >= network.num_nodes() {
                return Err(unreachable());
            }
            let prev = tree.predecessor(target).ok_or_else(unreachable)?;
            let edge = network.find_edge(prev, target).ok_or_else(unreachable)?;
            edges.push(edge);
            target = prev;
            hasher.write_usize(target.index());
        }
        edges.sort();

        Ok(Path {
            origin,
            destination,
            flow: 0.,
            edges,
            hash: hasher.finish(),
        })
    }

    pub fn edges(&self) -> &Vec<EdgeIndex> {
        &self.edges
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Sum of the current weights of the path's links.
    pub fn compute_cost<C: CostFunction>(&self, network: &TrafficNetwork<C>) -> f64 {
        self.edges.iter().map(|edge| network.link(*edge).weight).sum()
    }
}


/// Every path ever assigned to each OD pair, in the order they were assigned.  When disabled,
/// paths handed to it are dropped.
#[derive(Clone, Debug, Default)]
pub struct PathCollection {
    enabled: bool,
    paths: HashMap<(NodeIndex, NodeIndex), Vec<Path>>,
}

impl PathCollection {
    pub fn new(enabled: bool) -> PathCollection {
        return PathCollection {
            enabled,
            paths: HashMap::new(),
        };
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, path: Path) {
        if self.enabled {
            self.paths.entry((path.origin, path.destination)).or_insert_with(Vec::new).push(path);
        }
    }

    pub fn paths(&self, origin: NodeIndex, destination: NodeIndex) -> &[Path] {
        match self.paths.get(&(origin, destination)) {
            Some(paths) => paths,
            None => &[],
        }
    }

    /// The number of different routes ever used between two zones.
    pub fn num_distinct_routes(&self, origin: NodeIndex, destination: NodeIndex) -> usize {
        self.paths(origin, destination).iter().map(|path| path.hash).unique().count()
    }

    pub fn num_paths(&self) -> usize {
        self.paths.values().map(|paths| paths.len()).sum()
    }
}
