/// Something that can price a link given the flow on it.  The solver only ever talks to links
/// through this trait, so another volume-delay function can be dropped in without touching it.
pub trait CostFunction {
    /// travel time on the link at the given flow.
    fn cost(&self, flow: f64) -> f64;
    fn derivative(&self, flow: f64) -> f64;
    /// antiderivative of the cost; summed over links this is the Beckmann objective.
    fn integral(&self, flow: f64) -> f64;
    /// Returns (weight, derivative) at the given flow, sharing the expensive power computation.
    fn update(&self, flow: f64) -> (f64, f64);
}


/// Bureau of Public Roads volume-delay function, `t0 * (1 + B * (flow / capacity)^power)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Bpr {
    capacity: f64,
    free_flow_time: f64,
    b: f64,
    power: f64,
    // constants derived once from the parameters above
    power_p1: f64,
    power_m1: f64,
    integral_const: f64,
    update_const: f64,
}

impl Bpr {
    /// capacity must be positive; the network loader rejects anything else.
    pub fn new(capacity: f64, free_flow_time: f64, b: f64, power: f64) -> Bpr {
        return Bpr {
            capacity,
            free_flow_time,
            b,
            power,
            power_p1: power + 1.,
            power_m1: power - 1.,
            integral_const: free_flow_time * b / capacity.powf(power),
            update_const: free_flow_time * b / capacity,
        };
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn free_flow_time(&self) -> f64 {
        self.free_flow_time
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn power(&self) -> f64 {
        self.power
    }
}

impl CostFunction for Bpr {
    fn cost(&self, flow: f64) -> f64 {
        return self.free_flow_time * (1. + self.b * (flow / self.capacity).powf(self.power));
    }

    fn derivative(&self, flow: f64) -> f64 {
        return self.power * self.free_flow_time * self.capacity * self.b *
            (flow / self.capacity).powf(self.power_m1);
    }

    fn integral(&self, flow: f64) -> f64 {
        return self.free_flow_time * flow +
            self.integral_const * flow.powf(self.power_p1) / self.power_p1;
    }

    fn update(&self, flow: f64) -> (f64, f64) {
        let tmp = self.update_const * (flow / self.capacity).powf(self.power_m1);
        return (self.free_flow_time + tmp * flow, tmp * self.power);
    }
}
