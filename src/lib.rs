// imports of other modules from this crate
mod errors;
pub use errors::TrafficError;

mod cost;
pub use cost::{Bpr, CostFunction};

mod config_utils;

mod network;
pub use network::{Link, NetworkGraph, Node, TrafficNetwork};

mod demand;
pub use demand::DemandMatrix;

mod my_dijkstra;
pub use my_dijkstra::{compute_min_tree, dijkstra_with_predecessors, Control, ShortestPathTree};

mod path;
pub use path::{Path, PathCollection};

mod assignment;
pub use assignment::{all_or_nothing, initial_assignment};

mod line_search;
pub use line_search::{golden_section, objective_value, quadratic_linesearch, LineSearch,
                      DEFAULT_GOLDEN_ACCURACY};

mod convergence;
pub use convergence::{measure_gap, GapMeasurement};

mod frank_wolfe;
pub use frank_wolfe::{AssignmentResult, EquilibriumSolver, IterationRecord, SolverSettings,
                      SolverState, DEFAULT_TOLERANCE};

mod report;
pub use report::{convergence_trace_to_file, link_flows_to_file, write_convergence_trace,
                 write_link_flows, NumberFormat};

mod config;
pub use config::AssignmentConfig;

#[cfg(test)]
mod test_utils;


/// Loads the network and trips named in the config, solves for the equilibrium, and writes
/// whichever reports the config asks for.  Returns the solver, holding the loaded network at its
/// final flows, along with the result.
pub fn run_assignment(config: &AssignmentConfig)
                      -> Result<(EquilibriumSolver, AssignmentResult), TrafficError> {
    let network = TrafficNetwork::from_tntp(&config.network_path)?;
    let demand = DemandMatrix::from_tntp(&config.trips_path)?;

    let mut solver = EquilibriumSolver::new(network, demand, config.solver.clone())?;
    let result = solver.run()?;

    if let Some(path) = &config.flow_output_path {
        link_flows_to_file(path, solver.network(), config.number_format)?;
    }
    if let Some(path) = &config.trace_output_path {
        convergence_trace_to_file(path, &result.trace, config.number_format)?;
    }
    return Ok((solver, result));
}
