use super::cost::CostFunction;
use super::demand::DemandMatrix;
use super::errors::TrafficError;
use super::my_dijkstra::compute_min_tree;
use super::network::TrafficNetwork;
use super::path::Path;


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GapMeasurement {
    /// total cost if every trip took a shortest path under the current weights
    pub min_cost: f64,
    /// total cost of the current flows, sum of flow * weight over links
    pub actual_cost: f64,
    pub relative_gap: f64,
}

/// Sum over OD pairs of demand times the current shortest path cost.
pub fn min_total_cost<C: CostFunction>(network: &TrafficNetwork<C>, demand: &DemandMatrix,
                                       prune_idle_zones: bool) -> Result<f64, TrafficError> {
    let mut sum_d_times_miu = 0.;
    for origin in demand.origins() {
        let tree = compute_min_tree(network, origin, demand, prune_idle_zones);
        for (destination, od_demand) in demand.destinations(origin) {
            let path = Path::build(&tree, destination, network)?;
            sum_d_times_miu += path.compute_cost(network) * od_demand;
        }
    }
    Ok(sum_d_times_miu)
}

pub fn actual_total_cost<C: CostFunction>(network: &TrafficNetwork<C>) -> f64 {
    network.links().map(|link| link.flow * link.weight).sum()
}

/// Measures how far the current flows are from equilibrium, as the relative difference between
/// the actual total cost and the total cost of sending everyone along shortest paths.
pub fn measure_gap<C: CostFunction>(network: &TrafficNetwork<C>, demand: &DemandMatrix,
                                    prune_idle_zones: bool) -> Result<GapMeasurement, TrafficError> {
    let min_cost = min_total_cost(network, demand, prune_idle_zones)?;
    let actual_cost = actual_total_cost(network);
    if !(actual_cost > 0.) {
        return Err(TrafficError::ZeroTotalCost);
    }
    Ok(GapMeasurement {
        min_cost,
        actual_cost,
        relative_gap: (min_cost - actual_cost).abs() / actual_cost,
    })
}
