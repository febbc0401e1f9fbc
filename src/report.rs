// Writers for the link flow report and the convergence trace.
use std::io::Write;
use std::path::Path;

use super::cost::CostFunction;
use super::errors::TrafficError;
use super::frank_wolfe::IterationRecord;
use super::network::TrafficNetwork;


/// How floating point values are written out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumberFormat {
    /// the shortest text that reads back to the same value
    RoundTrip,
    /// scientific notation with a fixed number of digits after the point
    Scientific(usize),
}

impl Default for NumberFormat {
    fn default() -> NumberFormat {
        NumberFormat::RoundTrip
    }
}

impl NumberFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            NumberFormat::RoundTrip => format!("{}", value),
            NumberFormat::Scientific(precision) => format!("{:.*e}", precision, value),
        }
    }
}

/// One row per link, in edge order, with 1-based node ids.
pub fn write_link_flows<C, W>(writer: W, network: &TrafficNetwork<C>, number_format: NumberFormat)
                              -> Result<(), TrafficError>
where
    C: CostFunction,
    W: Write,
{
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&["link", "from_node", "to_node", "link_flow", "travel_time"])?;
    for edge in network.graph().edge_indices() {
        let (source, target) = match network.endpoints(edge) {
            Some(endpoints) => endpoints,
            None => continue,
        };
        let link = network.link(edge);
        writer.write_record(&[
            edge.index().to_string(),
            (source.index() + 1).to_string(),
            (target.index() + 1).to_string(),
            number_format.format(link.flow),
            number_format.format(link.weight),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_convergence_trace<W: Write>(writer: W, trace: &[IterationRecord],
                                         number_format: NumberFormat) -> Result<(), TrafficError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&["iteration", "time", "error"])?;
    for record in trace {
        writer.write_record(&[
            record.iteration.to_string(),
            number_format.format(record.elapsed_s),
            number_format.format(record.relative_gap),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn link_flows_to_file<C: CostFunction>(path: &Path, network: &TrafficNetwork<C>,
                                           number_format: NumberFormat) -> Result<(), TrafficError> {
    log::info!("writing link flows to {:?}", path);
    write_link_flows(create_file(path)?, network, number_format)
}

pub fn convergence_trace_to_file(path: &Path, trace: &[IterationRecord], number_format: NumberFormat)
                                 -> Result<(), TrafficError> {
    log::info!("writing convergence trace to {:?}", path);
    write_convergence_trace(create_file(path)?, trace, number_format)
}

fn create_file(path: &Path) -> Result<std::fs::File, TrafficError> {
    std::fs::File::create(path).map_err(|source| TrafficError::Io {
        path: path.to_path_buf(),
        source,
    })
}
