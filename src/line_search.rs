use ndarray::prelude::*;

use super::cost::CostFunction;
use super::network::TrafficNetwork;


pub const QUADRATIC_GAMMA: f64 = 1e-8;
pub const LINESEARCH_THETA: f64 = 0.5;
pub const GOLDEN_POINT: f64 = 0.618;
pub const DEFAULT_GOLDEN_ACCURACY: f64 = 1e-8;
// the bracket is below 1e-40 long by then
const MAX_GOLDEN_STEPS: usize = 200;


/// How the step along the Frank-Wolfe direction is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineSearch {
    /// Newton-like trial step, halved until the Armijo condition holds.
    Armijo,
    /// Bracketing search on [0, 1] that needs no derivatives.
    GoldenSection { accuracy: f64 },
}

impl LineSearch {
    pub fn step_size<C: CostFunction>(&self, network: &TrafficNetwork<C>, link_flow: &Array1<f64>,
                                      auxiliary_flow: &Array1<f64>, direction: &Array1<f64>) -> f64 {
        match self {
            LineSearch::Armijo => {
                let initial_step = initial_step(network, direction);
                quadratic_linesearch(network, direction, initial_step)
            },
            LineSearch::GoldenSection { accuracy } =>
                golden_section(network, link_flow, auxiliary_flow, *accuracy),
        }
    }
}

/// The Beckmann objective: the sum over links of the cost function's integral at the link's flow.
pub fn objective_value<C: CostFunction>(network: &TrafficNetwork<C>) -> f64 {
    network.links().map(|link| link.cost_fn.integral(link.flow)).sum()
}

/// The objective the network would have if its links carried `flows` instead.
pub fn objective_value_at<C: CostFunction>(network: &TrafficNetwork<C>, flows: &Array1<f64>) -> f64 {
    network.links().zip(flows.iter()).map(|(link, flow)| link.cost_fn.integral(*flow)).sum()
}

/// The objective after a step of `alpha` along `direction` from the current flows.
pub fn objective_value_with_alpha<C: CostFunction>(network: &TrafficNetwork<C>, alpha: f64,
                                                   direction: &Array1<f64>) -> f64 {
    network.links().zip(direction.iter())
        .map(|(link, dd)| link.cost_fn.integral(link.flow + alpha * dd))
        .sum()
}

pub fn directional_derivative<C: CostFunction>(network: &TrafficNetwork<C>, direction: &Array1<f64>)
                                               -> f64 {
    network.links().zip(direction.iter()).map(|(link, dd)| link.weight * dd).sum()
}

/// Second order term: the direction weighted by the diagonal of the objective's hessian.
pub fn get_dhd<C: CostFunction>(network: &TrafficNetwork<C>, direction: &Array1<f64>) -> f64 {
    network.links().zip(direction.iter()).map(|(link, dd)| link.derivative * dd * dd).sum()
}

/// The newton step |g.d| / d'Hd, kept within (0, 1].
pub fn initial_step<C: CostFunction>(network: &TrafficNetwork<C>, direction: &Array1<f64>) -> f64 {
    let dhd = get_dhd(network, direction);
    let step = directional_derivative(network, direction).abs() / dhd;
    if !(dhd > 0.) || !step.is_finite() || step > 1. || step <= 0. {
        return 1.;
    }
    step
}

/// True if the two values are equal up to floating point precision, relative to their size.
pub fn robust_equal(aa: f64, bb: f64) -> bool {
    let diff = (aa - bb).abs();
    diff <= aa.abs().max(bb.abs()) * f64::EPSILON
}

/// Backtracks from `initial_step` until the objective drops below the Armijo line.
pub fn quadratic_linesearch<C: CostFunction>(network: &TrafficNetwork<C>, direction: &Array1<f64>,
                                             initial_step: f64) -> f64 {
    let starting_z = objective_value(network);
    let mut alpha = initial_step;
    let mut new_z = objective_value_with_alpha(network, alpha, direction);
    let mut armijo_line = starting_z - alpha * alpha * QUADRATIC_GAMMA;

    while !robust_equal(new_z, armijo_line) && new_z > armijo_line {
        alpha *= LINESEARCH_THETA;
        new_z = objective_value_with_alpha(network, alpha, direction);
        armijo_line = starting_z - alpha * alpha * QUADRATIC_GAMMA;
    }
    log::debug!("armijo step {} takes the objective from {} to {}", alpha, starting_z, new_z);
    alpha
}

/// Golden section search for the step in [0, 1] minimizing the objective of the convex
/// combination of `link_flow` and `auxiliary_flow`.  Each trial is evaluated on a temporary
/// flow vector, so the network itself is never modified.
pub fn golden_section<C: CostFunction>(network: &TrafficNetwork<C>, link_flow: &Array1<f64>,
                                       auxiliary_flow: &Array1<f64>, accuracy: f64) -> f64 {
    let mut lower = 0.;
    let mut upper = 1.;
    let mut left_x = lower + (1. - GOLDEN_POINT) * (upper - lower);
    let mut right_x = lower + GOLDEN_POINT * (upper - lower);

    for _ in 0..MAX_GOLDEN_STEPS {
        let val_left = {
            let left_flow = link_flow * (1. - left_x) + auxiliary_flow * left_x;
            objective_value_at(network, &left_flow)
        };
        let val_right = {
            let right_flow = link_flow * (1. - right_x) + auxiliary_flow * right_x;
            objective_value_at(network, &right_flow)
        };

        if val_left <= val_right {
            upper = right_x;
        } else {
            lower = left_x;
        }

        if (upper - lower).abs() < accuracy {
            return (right_x + left_x) / 2.;
        }

        if val_left <= val_right {
            right_x = left_x;
            left_x = lower + (1. - GOLDEN_POINT) * (upper - lower);
        } else {
            left_x = right_x;
            right_x = lower + GOLDEN_POINT * (upper - lower);
        }
    }
    log::warn!("golden section did not reach accuracy {} in {} steps", accuracy, MAX_GOLDEN_STEPS);
    (right_x + left_x) / 2.
}
