use std::time::Instant;

use ndarray::prelude::*;

use super::assignment;
use super::convergence;
use super::cost::Bpr;
use super::cost::CostFunction;
use super::demand::DemandMatrix;
use super::errors::TrafficError;
use super::line_search;
use super::line_search::LineSearch;
use super::network::TrafficNetwork;
use super::path::PathCollection;


pub const DEFAULT_TOLERANCE: f64 = 1e-4;

#[derive(Clone, Debug, PartialEq)]
pub struct SolverSettings {
    // the run has converged once the relative gap drops below this
    pub tolerance: f64,
    // if set, stop after this many iterations even if not converged
    pub max_iterations: Option<usize>,
    pub line_search: LineSearch,
    // skip relaxing edges into zones the current origin sends nothing to
    pub prune_idle_zones: bool,
    // keep every path ever assigned
    pub record_paths: bool,
}

impl Default for SolverSettings {
    fn default() -> SolverSettings {
        return SolverSettings {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: None,
            line_search: LineSearch::Armijo,
            prune_idle_zones: true,
            record_paths: false,
        };
    }
}

impl SolverSettings {
    /// Checks the settings describe a run that can terminate.
    pub fn validate(&self) -> Result<(), TrafficError> {
        if !(self.tolerance > 0.) {
            return Err(TrafficError::Config(format!("tolerance must be positive, got {}",
                                                    self.tolerance)));
        }
        if self.max_iterations == Some(0) {
            return Err(TrafficError::Config(String::from("max_iterations must be at least 1")));
        }
        if let LineSearch::GoldenSection { accuracy } = self.line_search {
            if !(accuracy > 0.) || !accuracy.is_finite() {
                return Err(TrafficError::Config(format!(
                    "golden section accuracy must be positive and finite, got {}", accuracy)));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SolverState {
    Running,
    Converged,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IterationRecord {
    pub iteration: usize,
    // seconds since the first iteration began
    pub elapsed_s: f64,
    pub relative_gap: f64,
    pub objective: f64,
    pub step_size: f64,
}

#[derive(Clone, Debug)]
pub struct AssignmentResult {
    pub link_flows: Array1<f64>,
    pub objective: f64,
    pub relative_gap: f64,
    pub iterations: usize,
    pub state: SolverState,
    pub trace: Vec<IterationRecord>,
}

impl AssignmentResult {
    pub fn converged(&self) -> bool {
        self.state == SolverState::Converged
    }
}


/// Finds the user equilibrium flows on a network with the Frank-Wolfe (convex combination)
/// method.
pub struct EquilibriumSolver<C = Bpr> {
    network: TrafficNetwork<C>,
    demand: DemandMatrix,
    settings: SolverSettings,
    paths: PathCollection,
}

impl<C: CostFunction> EquilibriumSolver<C> {
    pub fn new(network: TrafficNetwork<C>, demand: DemandMatrix, settings: SolverSettings)
               -> Result<EquilibriumSolver<C>, TrafficError> {
        let num_zones = network.zones().len();
        if demand.num_zones() > num_zones {
            return Err(TrafficError::ZoneOutOfRange { zone: demand.num_zones() - 1, num_zones });
        }
        if demand.num_pairs() == 0 {
            return Err(TrafficError::EmptyDemand);
        }
        settings.validate()?;
        let paths = PathCollection::new(settings.record_paths);
        Ok(EquilibriumSolver { network, demand, settings, paths })
    }

    pub fn network(&self) -> &TrafficNetwork<C> {
        &self.network
    }

    pub fn demand(&self) -> &DemandMatrix {
        &self.demand
    }

    pub fn paths(&self) -> &PathCollection {
        &self.paths
    }

    pub fn into_network(self) -> TrafficNetwork<C> {
        self.network
    }

    /// Runs from a fresh initial solution until the relative gap is below the tolerance or the
    /// iteration limit is reached.
    pub fn run(&mut self) -> Result<AssignmentResult, TrafficError> {
        let prune = self.settings.prune_idle_zones;
        assignment::initial_assignment(&mut self.network, &self.demand, &mut self.paths, prune)?;
        let mut link_flow = self.network.link_flows();
        log::info!("initial objective: {}", line_search::objective_value(&self.network));

        let mut state = SolverState::Running;
        let mut iteration = 1;
        let mut trace = vec![];
        let mut relative_gap = f64::INFINITY;
        let begin = Instant::now();

        while state == SolverState::Running {
            let auxiliary_flow = assignment::all_or_nothing(&mut self.network, &self.demand,
                                                            &mut self.paths, prune)?;
            let direction = &auxiliary_flow - &link_flow;
            let alpha = self.settings.line_search.step_size(&self.network, &link_flow,
                                                            &auxiliary_flow, &direction);
            link_flow = link_flow + &direction * alpha;

            // update all the links before measuring convergence
            self.network.set_link_flows(&link_flow)?;
            let gap = convergence::measure_gap(&self.network, &self.demand, prune)?;
            relative_gap = gap.relative_gap;
            let objective = line_search::objective_value(&self.network);
            let elapsed_s = begin.elapsed().as_secs_f64();
            log::info!("iteration {}: gap {:e}, objective {}, step {}", iteration, relative_gap,
                       objective, alpha);
            trace.push(IterationRecord {
                iteration,
                elapsed_s,
                relative_gap,
                objective,
                step_size: alpha,
            });

            if relative_gap < self.settings.tolerance {
                state = SolverState::Converged;
            } else if self.settings.max_iterations.map_or(false, |max| iteration >= max) {
                log::warn!("stopping after {} iterations without converging, gap is {:e}",
                           iteration, relative_gap);
                break;
            } else {
                iteration += 1;
            }
        }

        if state == SolverState::Converged {
            log::info!("converged after {} iterations", iteration);
        }
        Ok(AssignmentResult {
            objective: line_search::objective_value(&self.network),
            link_flows: link_flow,
            relative_gap,
            iterations: iteration,
            state,
            trace,
        })
    }
}


#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use petgraph::graph::EdgeIndex;
    use petgraph::graph::NodeIndex;

    use super::*;
    use super::super::test_utils;

    fn route_costs(solver: &EquilibriumSolver) -> (f64, f64) {
        let network = solver.network();
        let cost = |edges: [usize; 2]| -> f64 {
            edges.iter().map(|ee| network.link(EdgeIndex::new(*ee)).weight).sum()
        };
        (cost([0, 1]), cost([2, 3]))
    }

    #[test]
    fn test_two_route_equilibrium() -> Result<(), TrafficError> {
        let demand = test_utils::single_pair_demand(2, 0, 1, 10.);
        let mut solver = EquilibriumSolver::new(test_utils::two_route_network(), demand,
                                                SolverSettings::default())?;
        let result = solver.run()?;
        assert!(result.converged());
        assert!(result.relative_gap < DEFAULT_TOLERANCE);
        // 1 + fa = 2 + fb and fa + fb = 10
        assert_relative_eq!(result.link_flows[0], 5.5, epsilon = 1e-3);
        assert_relative_eq!(result.link_flows[2], 4.5, epsilon = 1e-3);
        let (cost_a, cost_b) = route_costs(&solver);
        assert_relative_eq!(cost_a, cost_b, epsilon = 1e-3);
        assert_eq!(result.trace.len(), result.iterations);
        Ok(())
    }

    #[test]
    fn test_golden_section_equilibrium() -> Result<(), TrafficError> {
        let demand = test_utils::single_pair_demand(2, 0, 1, 10.);
        let settings = SolverSettings {
            line_search: LineSearch::GoldenSection { accuracy: 1e-10 },
            ..SolverSettings::default()
        };
        let mut solver = EquilibriumSolver::new(test_utils::two_route_network(), demand, settings)?;
        let result = solver.run()?;
        assert!(result.converged());
        assert_relative_eq!(result.link_flows[0], 5.5, epsilon = 1e-3);
        assert_relative_eq!(result.link_flows[2], 4.5, epsilon = 1e-3);
        Ok(())
    }

    fn capped() -> SolverSettings {
        SolverSettings { max_iterations: Some(10_000), ..SolverSettings::default() }
    }

    #[test]
    fn test_objective_never_increases() -> Result<(), TrafficError> {
        let mut solver = EquilibriumSolver::new(test_utils::grid_network(),
                                                test_utils::grid_demand(), capped())?;
        let result = solver.run()?;
        assert!(result.converged());
        for (prev, next) in result.trace.iter().zip(result.trace.iter().skip(1)) {
            assert!(next.objective <= prev.objective + 1e-9 * prev.objective.abs());
            assert!(next.relative_gap >= 0.);
        }
        assert_relative_eq!(result.objective, result.trace.last().unwrap().objective);
        Ok(())
    }

    #[test]
    fn test_link_flows_match_network() -> Result<(), TrafficError> {
        let mut solver = EquilibriumSolver::new(test_utils::grid_network(),
                                                test_utils::grid_demand(), capped())?;
        let result = solver.run()?;
        assert!(result.converged());
        assert_eq!(result.link_flows, solver.network().link_flows());
        Ok(())
    }

    #[test]
    fn test_iteration_cap() -> Result<(), TrafficError> {
        let settings = SolverSettings {
            tolerance: 1e-300,
            max_iterations: Some(3),
            ..SolverSettings::default()
        };
        let mut solver = EquilibriumSolver::new(test_utils::grid_network(),
                                                test_utils::grid_demand(), settings)?;
        let result = solver.run()?;
        assert_eq!(result.state, SolverState::Running);
        assert_eq!(result.iterations, 3);
        assert_eq!(result.trace.len(), 3);
        Ok(())
    }

    #[test]
    fn test_single_iteration_cap() -> Result<(), TrafficError> {
        let settings = SolverSettings { max_iterations: Some(1), ..SolverSettings::default() };
        let mut solver = EquilibriumSolver::new(test_utils::grid_network(),
                                                test_utils::grid_demand(), settings)?;
        let result = solver.run()?;
        assert_eq!(result.iterations, 1);
        assert_eq!(result.trace.len(), 1);
        Ok(())
    }

    #[test]
    fn test_deterministic() -> Result<(), TrafficError> {
        let run = || -> Result<AssignmentResult, TrafficError> {
            let mut solver = EquilibriumSolver::new(test_utils::grid_network(),
                                                    test_utils::grid_demand(), capped())?;
            solver.run()
        };
        let first = run()?;
        let second = run()?;
        assert_eq!(first.link_flows, second.link_flows);
        assert_eq!(first.objective, second.objective);
        assert_eq!(first.iterations, second.iterations);
        Ok(())
    }

    #[test]
    fn test_records_paths() -> Result<(), TrafficError> {
        let settings = SolverSettings { record_paths: true, ..SolverSettings::default() };
        let demand = test_utils::single_pair_demand(2, 0, 1, 10.);
        let mut solver = EquilibriumSolver::new(test_utils::two_route_network(), demand, settings)?;
        let result = solver.run()?;
        let (origin, dest) = (NodeIndex::new(0), NodeIndex::new(1));
        // one path from the initial solution, then one per iteration
        assert_eq!(solver.paths().paths(origin, dest).len(), result.iterations + 1);
        assert_eq!(solver.paths().num_distinct_routes(origin, dest), 2);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_input() {
        let empty = DemandMatrix::new(2);
        assert!(matches!(EquilibriumSolver::new(test_utils::two_route_network(), empty,
                                                SolverSettings::default()),
                         Err(TrafficError::EmptyDemand)));
        let bad_settings = vec![
            SolverSettings { tolerance: 0., ..SolverSettings::default() },
            SolverSettings { max_iterations: Some(0), ..SolverSettings::default() },
            SolverSettings { line_search: LineSearch::GoldenSection { accuracy: 0. },
                             ..SolverSettings::default() },
            SolverSettings { line_search: LineSearch::GoldenSection { accuracy: f64::NAN },
                             ..SolverSettings::default() },
        ];
        for settings in bad_settings {
            let demand = test_utils::single_pair_demand(2, 0, 1, 10.);
            assert!(matches!(EquilibriumSolver::new(test_utils::two_route_network(), demand,
                                                    settings),
                             Err(TrafficError::Config(_))));
        }

        let too_many_zones = test_utils::single_pair_demand(3, 0, 2, 1.);
        assert!(matches!(EquilibriumSolver::new(test_utils::two_route_network(), too_many_zones,
                                                SolverSettings::default()),
                         Err(TrafficError::ZoneOutOfRange { .. })));
    }
}
