use ndarray::prelude::*;

use super::cost::CostFunction;
use super::demand::DemandMatrix;
use super::errors::TrafficError;
use super::my_dijkstra::compute_min_tree;
use super::network::TrafficNetwork;
use super::path::Path;
use super::path::PathCollection;


/// Builds the starting solution.  Every link is reset to zero flow; then each origin's demand
/// is loaded onto its shortest paths one destination at a time, with the weights updated after
/// each destination.  The tree of an origin is computed once, before any of its demand is
/// loaded.
pub fn initial_assignment<C: CostFunction>(network: &mut TrafficNetwork<C>, demand: &DemandMatrix,
                                           paths: &mut PathCollection, prune_idle_zones: bool)
                                           -> Result<(), TrafficError> {
    network.reset_flows();

    for origin in demand.origins() {
        let tree = compute_min_tree(network, origin, demand, prune_idle_zones);
        for (destination, od_demand) in demand.destinations(origin) {
            let mut path = Path::build(&tree, destination, network)?;
            path.flow = od_demand;
            for edge in path.edges() {
                let link = network.link_mut(*edge);
                let flow = link.flow + od_demand;
                link.update(flow);
            }
            paths.record(path);
        }
    }
    Ok(())
}

/// Routes every OD demand entirely onto the shortest path under the current weights, without
/// touching the links' flow.  Returns the resulting auxiliary flow of each link.
pub fn all_or_nothing<C: CostFunction>(network: &mut TrafficNetwork<C>, demand: &DemandMatrix,
                                       paths: &mut PathCollection, prune_idle_zones: bool)
                                       -> Result<Array1<f64>, TrafficError> {
    for link in network.links_mut() {
        link.auxiliary_flow = 0.;
    }

    for origin in demand.origins() {
        let tree = compute_min_tree(network, origin, demand, prune_idle_zones);
        for (destination, od_demand) in demand.destinations(origin) {
            let mut path = Path::build(&tree, destination, network)?;
            path.flow = od_demand;
            for edge in path.edges() {
                network.link_mut(*edge).auxiliary_flow += od_demand;
            }
            paths.record(path);
        }
    }

    Ok(network.auxiliary_flows())
}
