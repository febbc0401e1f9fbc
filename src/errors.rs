use std::path::PathBuf;

use thiserror::Error;


#[derive(Error, Debug)]
pub enum TrafficError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write report: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("invalid config: {0}")]
    Config(String),
    #[error("the graph is not connected: {nodes} nodes but only {links} links")]
    NotConnected { nodes: usize, links: usize },
    #[error("link ({source_node}, {target_node}) appears more than once, multigraphs are not supported")]
    Multigraph { source_node: usize, target_node: usize },
    #[error("link ({source_node}, {target_node}) has non-positive capacity {capacity}")]
    InvalidCapacity { source_node: usize, target_node: usize, capacity: f64 },
    #[error("link ({source_node}, {target_node}) has invalid {parameter} {value}")]
    InvalidCostParameter { source_node: usize, target_node: usize, parameter: &'static str, value: f64 },
    #[error("demand from zone {origin} to zone {destination} is {demand}, it must be non-negative")]
    InvalidDemand { origin: usize, destination: usize, demand: f64 },
    #[error("expected {expected} link flows, got {actual}")]
    FlowLengthMismatch { expected: usize, actual: usize },
    #[error("node {node} is outside the network's {num_nodes} nodes")]
    NodeOutOfRange { node: usize, num_nodes: usize },
    #[error("zone {zone} is outside the {num_zones} zones")]
    ZoneOutOfRange { zone: usize, num_zones: usize },
    #[error("the demand matrix has no positive entries")]
    EmptyDemand,
    #[error("no path from {origin} to {destination}")]
    Unreachable { origin: usize, destination: usize },
    #[error("total travel cost is zero, relative gap is undefined")]
    ZeroTotalCost,
}

impl TrafficError {
    pub fn parse(line: usize, message: impl Into<String>) -> TrafficError {
        return TrafficError::Parse { line, message: message.into() };
    }
}
