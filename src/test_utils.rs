use petgraph::graph::NodeIndex;

use super::cost::Bpr;
use super::demand::DemandMatrix;
use super::network::Link;
use super::network::TrafficNetwork;


/// A link whose travel time never changes.
pub fn constant_link(time: f64) -> Link<Bpr> {
    Link::new(Bpr::new(1., time, 0., 4.))
}

pub fn add_links(network: &mut TrafficNetwork<Bpr>, links: Vec<(usize, usize, Link<Bpr>)>) {
    for (source, target, link) in links {
        network.add_link(NodeIndex::new(source), NodeIndex::new(target), link).unwrap();
    }
}

/// Zones 0, 1, 2 and a through node 3.  Going 0 -> 1 -> 2 costs 2 but passes through zone 1;
/// going 0 -> 3 -> 2 costs 10.
pub fn zone_shortcut_network(all_centroids: bool) -> TrafficNetwork<Bpr> {
    let mut network = TrafficNetwork::new(all_centroids);
    for ii in 0..4 {
        network.add_node(ii < 3);
    }
    add_links(&mut network, vec![
        (0, 1, constant_link(1.)),
        (1, 2, constant_link(1.)),
        (0, 3, constant_link(5.)),
        (3, 2, constant_link(5.)),
    ]);
    network
}

/// Zone 0 sends traffic to zone 1 over two routes:
/// route a: 0 -> 2 -> 1, costing (1 + flow) + 1
/// route b: 0 -> 3 -> 1, costing (2 + flow) + 1
pub fn two_route_network() -> TrafficNetwork<Bpr> {
    let mut network = TrafficNetwork::new(false);
    for ii in 0..4 {
        network.add_node(ii < 2);
    }
    add_links(&mut network, vec![
        (0, 2, Link::new(Bpr::new(1., 1., 1., 1.))),
        (2, 1, constant_link(1.)),
        (0, 3, Link::new(Bpr::new(2., 2., 1., 1.))),
        (3, 1, constant_link(1.)),
    ]);
    network
}

/// Three zones around a ring of three through nodes, with BPR links of varying capacity.
pub fn grid_network() -> TrafficNetwork<Bpr> {
    let mut network = TrafficNetwork::new(false);
    for ii in 0..6 {
        network.add_node(ii < 3);
    }
    let pairs = vec![(0, 3), (3, 0), (1, 4), (4, 1), (2, 5), (5, 2), (3, 4), (4, 3), (4, 5), (5, 4),
                     (3, 5), (5, 3), (0, 1), (1, 2)];
    let links = pairs.into_iter().enumerate().map(|(ii, (source, target))| {
        let capacity = 10. + (ii % 4) as f64 * 5.;
        let free_flow_time = 1. + (ii % 3) as f64;
        (source, target, Link::new(Bpr::new(capacity, free_flow_time, 0.15, 4.)))
    }).collect();
    add_links(&mut network, links);
    network
}

pub fn single_pair_demand(num_zones: usize, origin: usize, destination: usize, demand: f64)
                          -> DemandMatrix {
    let mut matrix = DemandMatrix::new(num_zones);
    matrix.insert(origin, destination, demand).unwrap();
    matrix
}

/// Demand between every ordered pair of zones in the grid network.
pub fn grid_demand() -> DemandMatrix {
    let mut matrix = DemandMatrix::new(3);
    let entries = [(0, 1, 20.), (0, 2, 35.), (1, 0, 15.), (1, 2, 25.), (2, 0, 40.), (2, 1, 10.)];
    for (origin, destination, demand) in entries.iter() {
        matrix.insert(*origin, *destination, *demand).unwrap();
    }
    matrix
}
