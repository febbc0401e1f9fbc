// A road network: a petgraph DiGraph whose nodes know whether they are zones, and whose edges
// carry a cost function plus the mutable flow state the assignment works on.
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use ndarray::prelude::*;
use petgraph::graph::DiGraph;
use petgraph::graph::EdgeIndex;
use petgraph::graph::NodeIndex;

use super::config_utils;
use super::config_utils::MetadataLabel;
use super::cost::Bpr;
use super::cost::CostFunction;
use super::errors::TrafficError;


#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub is_zone: bool,
}

#[derive(Clone, Debug)]
pub struct Link<C> {
    pub cost_fn: C,
    pub length: f64,
    pub speed_limit: f64,
    pub toll: f64,
    pub link_type: i64,
    // mutable assignment state
    pub flow: f64,
    pub weight: f64,
    pub derivative: f64,
    pub auxiliary_flow: f64,
}

impl<C: CostFunction> Link<C> {
    pub fn new(cost_fn: C) -> Link<C> {
        let (weight, derivative) = cost_fn.update(0.);
        return Link {
            cost_fn,
            length: 0.,
            speed_limit: 0.,
            toll: 0.,
            link_type: 0,
            flow: 0.,
            weight,
            derivative,
            auxiliary_flow: 0.,
        };
    }

    /// Sets the flow and refreshes the weight and derivative to match it.
    pub fn update(&mut self, flow: f64) {
        self.flow = flow;
        let (weight, derivative) = self.cost_fn.update(flow);
        self.weight = weight;
        self.derivative = derivative;
    }
}

pub type NetworkGraph<C> = DiGraph<Node, Link<C>>;

pub struct TrafficNetwork<C = Bpr> {
    graph: NetworkGraph<C>,
    // maps each (source, destination) pair to the one edge between them
    edge_lookup: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
    zones: Vec<NodeIndex>,
    // if true, zones may be used as intermediate nodes on a path
    all_centroids: bool,
}

impl<C: CostFunction> TrafficNetwork<C> {
    pub fn new(all_centroids: bool) -> TrafficNetwork<C> {
        return TrafficNetwork {
            graph: DiGraph::new(),
            edge_lookup: HashMap::new(),
            zones: vec![],
            all_centroids,
        };
    }

    pub fn add_node(&mut self, is_zone: bool) -> NodeIndex {
        let node = self.graph.add_node(Node { is_zone });
        if is_zone {
            self.zones.push(node);
        }
        node
    }

    /// Adds a link, refusing a second link between the same ordered pair of nodes.
    pub fn add_link(&mut self, source: NodeIndex, target: NodeIndex, link: Link<C>)
                    -> Result<EdgeIndex, TrafficError> {
        let num_nodes = self.graph.node_count();
        for node in &[source, target] {
            if node.index() >= num_nodes {
                return Err(TrafficError::NodeOutOfRange { node: node.index(), num_nodes });
            }
        }
        if self.edge_lookup.contains_key(&(source, target)) {
            return Err(TrafficError::Multigraph {
                source_node: source.index(),
                target_node: target.index(),
            });
        }
        let edge = self.graph.add_edge(source, target, link);
        self.edge_lookup.insert((source, target), edge);
        Ok(edge)
    }

    pub fn graph(&self) -> &NetworkGraph<C> {
        &self.graph
    }

    pub fn find_edge(&self, source: NodeIndex, target: NodeIndex) -> Option<EdgeIndex> {
        self.edge_lookup.get(&(source, target)).cloned()
    }

    pub fn is_zone(&self, node: NodeIndex) -> bool {
        self.graph[node].is_zone
    }

    pub fn zones(&self) -> &Vec<NodeIndex> {
        &self.zones
    }

    pub fn all_centroids(&self) -> bool {
        self.all_centroids
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_links(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn link(&self, edge: EdgeIndex) -> &Link<C> {
        &self.graph[edge]
    }

    pub fn link_mut(&mut self, edge: EdgeIndex) -> &mut Link<C> {
        &mut self.graph[edge]
    }

    pub fn endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    /// All links in the stable edge order used by every flow vector.
    pub fn links(&self) -> impl Iterator<Item = &Link<C>> {
        self.graph.edge_weights()
    }

    pub fn links_mut(&mut self) -> impl Iterator<Item = &mut Link<C>> {
        self.graph.edge_weights_mut()
    }

    pub fn link_flows(&self) -> Array1<f64> {
        self.links().map(|link| link.flow).collect()
    }

    pub fn auxiliary_flows(&self) -> Array1<f64> {
        self.links().map(|link| link.auxiliary_flow).collect()
    }

    /// Pushes a flow vector into the links, refreshing every weight and derivative.
    pub fn set_link_flows(&mut self, flows: &Array1<f64>) -> Result<(), TrafficError> {
        if flows.len() != self.num_links() {
            return Err(TrafficError::FlowLengthMismatch {
                expected: self.num_links(),
                actual: flows.len(),
            });
        }
        for (link, flow) in self.links_mut().zip(flows.iter()) {
            link.update(*flow);
        }
        Ok(())
    }

    /// Resets every link to zero flow.
    pub fn reset_flows(&mut self) {
        for link in self.links_mut() {
            link.update(0.);
            link.auxiliary_flow = 0.;
        }
    }
}

impl TrafficNetwork<Bpr> {
    pub fn from_tntp(path: &Path) -> Result<TrafficNetwork<Bpr>, TrafficError> {
        log::info!("loading network from {:?}", path);
        let reader = config_utils::open_reader(path)?;
        let network = TrafficNetwork::from_reader(reader)?;
        log::info!("network has {} nodes, {} zones, and {} links",
                   network.num_nodes(), network.zones.len(), network.num_links());
        Ok(network)
    }

    /// Parses a network in the TNTP text format.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<TrafficNetwork<Bpr>, TrafficError> {
        let mut num_zones = 0;
        let mut num_nodes = 0;
        let mut num_links = 0;
        let mut all_centroids = false;
        let mut found_end = false;
        let mut lines = config_utils::numbered_lines(reader);

        // read the metadata
        for (line_num, line) in lines.by_ref() {
            let line = line.map_err(|err| TrafficError::parse(line_num, err.to_string()))?;
            let (label, value) = match config_utils::read_metadata(&line) {
                Some(parsed) => parsed,
                None => continue,
            };
            match label {
                MetadataLabel::NumberOfZones =>
                    num_zones = config_utils::parse_field(value, line_num, "zone count")?,
                MetadataLabel::NumberOfNodes =>
                    num_nodes = config_utils::parse_field(value, line_num, "node count")?,
                MetadataLabel::NumberOfLinks =>
                    num_links = config_utils::parse_field(value, line_num, "link count")?,
                MetadataLabel::FirstThruNode => {
                    let first: usize = config_utils::parse_field(value, line_num, "first thru node")?;
                    all_centroids = first == 1;
                },
                MetadataLabel::EndOfMetadata => {
                    found_end = true;
                    break;
                },
                _ => (),
            }
        }
        if !found_end {
            return Err(TrafficError::parse(0, "missing <END OF METADATA>"));
        }
        let mut network = TrafficNetwork::with_nodes(num_zones, num_nodes, num_links, all_centroids)?;

        // read the links
        for (line_num, line) in lines {
            let line = line.map_err(|err| TrafficError::parse(line_num, err.to_string()))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('~') || line.starts_with('<') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace()
                .map(|ff| ff.trim_end_matches(';'))
                .filter(|ff| !ff.is_empty())
                .collect();
            if fields.len() < 7 {
                return Err(TrafficError::parse(line_num, format!("expected at least 7 fields, got {}",
                                                                  fields.len())));
            }

            let source: usize = config_utils::parse_field(fields[0], line_num, "source node")?;
            let target: usize = config_utils::parse_field(fields[1], line_num, "destination node")?;
            let capacity: f64 = config_utils::parse_field(fields[2], line_num, "capacity")?;
            let length: f64 = config_utils::parse_field(fields[3], line_num, "length")?;
            let free_flow_time: f64 = config_utils::parse_field(fields[4], line_num, "free flow time")?;
            let bb: f64 = config_utils::parse_field(fields[5], line_num, "B")?;
            let power: f64 = config_utils::parse_field(fields[6], line_num, "power")?;
            let optional = |idx: usize, what: &str| -> Result<f64, TrafficError> {
                match fields.get(idx) {
                    Some(field) => config_utils::parse_field(field, line_num, what),
                    None => Ok(0.),
                }
            };
            let speed_limit = optional(7, "speed limit")?;
            let toll = optional(8, "toll")?;
            let link_type = optional(9, "link type")? as i64;

            if source == 0 || target == 0 {
                return Err(TrafficError::parse(line_num, "node ids are 1-based"));
            }
            if !(capacity > 0.) || !capacity.is_finite() {
                return Err(TrafficError::InvalidCapacity {
                    source_node: source,
                    target_node: target,
                    capacity,
                });
            }
            // powers below 1 make the cost's slope infinite at zero flow
            let bad_parameter = if !(free_flow_time >= 0.) || !free_flow_time.is_finite() {
                Some(("free flow time", free_flow_time))
            } else if !(bb >= 0.) || !bb.is_finite() {
                Some(("B", bb))
            } else if !(power >= 1.) || !power.is_finite() {
                Some(("power", power))
            } else {
                None
            };
            if let Some((parameter, value)) = bad_parameter {
                return Err(TrafficError::InvalidCostParameter {
                    source_node: source,
                    target_node: target,
                    parameter,
                    value,
                });
            }

            let mut link = Link::new(Bpr::new(capacity, free_flow_time, bb, power));
            link.length = length;
            link.speed_limit = speed_limit;
            link.toll = toll;
            link.link_type = link_type;
            network.add_link(NodeIndex::new(source - 1), NodeIndex::new(target - 1), link)?;
        }

        if network.num_links() != num_links {
            log::warn!("metadata declares {} links but {} were read", num_links, network.num_links());
        }
        Ok(network)
    }

    fn with_nodes(num_zones: usize, num_nodes: usize, num_links: usize, all_centroids: bool)
                  -> Result<TrafficNetwork<Bpr>, TrafficError> {
        if num_nodes > num_links {
            return Err(TrafficError::NotConnected { nodes: num_nodes, links: num_links });
        }
        let mut network = TrafficNetwork::new(all_centroids);
        for ii in 0..num_nodes {
            network.add_node(ii < num_zones);
        }
        Ok(network)
    }
}


#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;

    use approx::assert_relative_eq;
    use ndarray::array;
    use tempfile::tempdir;

    use super::*;

    static TEST_NETWORK: &str = r###"<NUMBER OF ZONES> 2
<NUMBER OF NODES> 4
<FIRST THRU NODE> 3
<NUMBER OF LINKS> 4
<END OF METADATA>

~ 	Init node 	Term node 	Capacity 	Length 	Free Flow Time 	B	Power	Speed limit 	Toll 	Type	;
	1	3	1	1	1	1	1	0	0	1	;
	3	2	1000	1	1	0	4	0	0	1	;
	1	4	2	1	2	1	1	0	0	1	;
	4	2	1000	1	1	0	4	0	0	1	;
"###;

    fn get_network(contents: &str) -> Result<TrafficNetwork<Bpr>, TrafficError> {
        TrafficNetwork::from_reader(contents.as_bytes())
    }

    #[test]
    fn test_network_parsing() -> Result<(), TrafficError> {
        let network = get_network(TEST_NETWORK)?;
        assert_eq!(network.num_nodes(), 4);
        assert_eq!(network.num_links(), 4);
        assert_eq!(network.zones(), &vec![NodeIndex::new(0), NodeIndex::new(1)]);
        assert!(!network.all_centroids());
        assert!(network.is_zone(NodeIndex::new(1)));
        assert!(!network.is_zone(NodeIndex::new(2)));

        let edge = network.find_edge(NodeIndex::new(0), NodeIndex::new(3)).unwrap();
        let link = network.link(edge);
        assert_eq!(link.cost_fn, Bpr::new(2., 2., 1., 1.));
        assert_eq!(link.link_type, 1);
        assert_eq!(link.flow, 0.);
        assert_relative_eq!(link.weight, 2.);

        // edges are enumerated in file order
        assert_eq!(network.endpoints(EdgeIndex::new(1)), Some((NodeIndex::new(2), NodeIndex::new(1))));
        assert_eq!(network.find_edge(NodeIndex::new(1), NodeIndex::new(0)), None);
        Ok(())
    }

    #[test]
    fn test_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file_path = dir.path().join("net.tntp");
        {
            let mut file = File::create(&file_path)?;
            file.write_all(TEST_NETWORK.as_bytes())?;
        }
        let network = TrafficNetwork::from_tntp(&file_path)?;
        assert_eq!(network.num_links(), 4);

        let missing = TrafficNetwork::from_tntp(&dir.path().join("nope.tntp"));
        assert!(matches!(missing, Err(TrafficError::Io { .. })));
        Ok(())
    }

    #[test]
    fn test_all_centroids() {
        let contents = TEST_NETWORK.replace("<FIRST THRU NODE> 3", "<FIRST THRU NODE> 1");
        let network = get_network(&contents).unwrap();
        assert!(network.all_centroids());
        // the zone flags are still set
        assert_eq!(network.zones().len(), 2);
    }

    #[test]
    fn test_multigraph_rejected() {
        let contents = format!("{}\t1\t3\t5\t1\t1\t1\t1\t0\t0\t1\t;\n", TEST_NETWORK);
        match get_network(&contents) {
            Err(TrafficError::Multigraph { source_node, target_node }) => {
                assert_eq!((source_node, target_node), (0, 2));
            },
            other => panic!("expected a multigraph error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_disconnected_rejected() {
        let contents = TEST_NETWORK.replace("<NUMBER OF NODES> 4", "<NUMBER OF NODES> 5");
        assert!(matches!(get_network(&contents),
                         Err(TrafficError::NotConnected { nodes: 5, links: 4 })));
    }

    #[test]
    fn test_bad_capacity_rejected() {
        let contents = TEST_NETWORK.replace("\t1\t3\t1\t1", "\t1\t3\t0\t1");
        assert!(matches!(get_network(&contents), Err(TrafficError::InvalidCapacity { .. })));
    }

    #[test]
    fn test_bad_cost_parameters_rejected() {
        let bad_lines = vec![
            ("\t1\t3\t1\t1\t1\t1\t0.5\t0\t0\t1\t;", "power"),
            ("\t1\t3\t1\t1\t1\t-0.15\t4\t0\t0\t1\t;", "B"),
            ("\t1\t3\t1\t1\t-1\t0.15\t4\t0\t0\t1\t;", "free flow time"),
        ];
        for (bad_line, bad_parameter) in bad_lines {
            let contents = TEST_NETWORK.replace("\t1\t3\t1\t1\t1\t1\t1\t0\t0\t1\t;", bad_line);
            match get_network(&contents) {
                Err(TrafficError::InvalidCostParameter { parameter, source_node: 1, target_node: 3, .. }) =>
                    assert_eq!(parameter, bad_parameter),
                other => panic!("expected a bad {}, got {:?}", bad_parameter, other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_zero_flow_weights_are_finite() {
        let network = get_network(TEST_NETWORK).unwrap();
        for link in network.links() {
            assert!(link.weight.is_finite());
            assert!(link.derivative.is_finite());
        }
    }

    #[test]
    fn test_set_link_flows_wrong_length() {
        let mut network = get_network(TEST_NETWORK).unwrap();
        assert!(matches!(network.set_link_flows(&array![1., 2.]),
                         Err(TrafficError::FlowLengthMismatch { expected: 4, actual: 2 })));
        assert_eq!(network.link_flows(), array![0., 0., 0., 0.]);
    }

    #[test]
    fn test_out_of_range_node_rejected() {
        let contents = format!("{}\t1\t9\t5\t1\t1\t1\t1\t0\t0\t1\t;\n", TEST_NETWORK);
        assert!(matches!(get_network(&contents),
                         Err(TrafficError::NodeOutOfRange { node: 8, num_nodes: 4 })));
    }

    #[test]
    fn test_short_line_rejected() {
        let contents = format!("{}\t1\t2\t5\t1\t;\n", TEST_NETWORK);
        assert!(matches!(get_network(&contents), Err(TrafficError::Parse { .. })));
    }

    #[test]
    fn test_set_link_flows() {
        let mut network = get_network(TEST_NETWORK).unwrap();
        let flows = array![1., 1., 3., 3.];
        network.set_link_flows(&flows).unwrap();
        assert_eq!(network.link_flows(), flows);
        let edge = network.find_edge(NodeIndex::new(0), NodeIndex::new(2)).unwrap();
        assert_relative_eq!(network.link(edge).weight, 2.);
        assert_relative_eq!(network.link(edge).derivative, 1.);

        network.reset_flows();
        assert_eq!(network.link_flows(), Array1::<f64>::zeros(4));
        assert_relative_eq!(network.link(edge).weight, 1.);
    }
}
