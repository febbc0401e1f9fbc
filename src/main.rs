use std::error::Error;

use rust_traffic_assignment::AssignmentConfig;
use env_logger;


fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cfg_path = std::env::args().nth(1).unwrap_or_else(|| String::from("config.yaml"));
    let config = AssignmentConfig::from_file(&cfg_path)?;
    let (_, result) = rust_traffic_assignment::run_assignment(&config)?;
    if !result.converged() {
        log::warn!("gave up after {} iterations with relative gap {:e}", result.iterations,
                   result.relative_gap);
    }
    println!("Objective value = {}", config.number_format.format(result.objective));
    Ok(())
}
