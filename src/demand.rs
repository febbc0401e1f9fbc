use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

use petgraph::graph::NodeIndex;

use super::config_utils;
use super::config_utils::MetadataLabel;
use super::errors::TrafficError;


/// Sparse origin-destination demand between zones.  Zone k is network node k.
///
/// Only positive demand between distinct zones is ever stored, so the number of entries in a
/// row is the number of destinations a shortest path tree from that origin has to reach.
#[derive(Clone, Debug, PartialEq)]
pub struct DemandMatrix {
    rows: Vec<BTreeMap<usize, f64>>,
    // the total declared in the file's metadata, if there was one
    declared_total: Option<f64>,
}

impl DemandMatrix {
    pub fn new(num_zones: usize) -> DemandMatrix {
        return DemandMatrix {
            rows: vec![BTreeMap::new(); num_zones],
            declared_total: None,
        };
    }

    /// Records the demand between two zones.  Returns false if the entry was dropped because it
    /// was zero or intra-zonal.  Negative demand is an error.
    pub fn insert(&mut self, origin: usize, destination: usize, demand: f64)
                  -> Result<bool, TrafficError> {
        let num_zones = self.rows.len();
        for zone in &[origin, destination] {
            if *zone >= num_zones {
                return Err(TrafficError::ZoneOutOfRange { zone: *zone, num_zones });
            }
        }
        if !(demand >= 0.) || !demand.is_finite() {
            return Err(TrafficError::InvalidDemand { origin, destination, demand });
        }
        if origin == destination || demand == 0. {
            return Ok(false);
        }
        self.rows[origin].insert(destination, demand);
        Ok(true)
    }

    pub fn num_zones(&self) -> usize {
        self.rows.len()
    }

    pub fn demand(&self, origin: NodeIndex, destination: NodeIndex) -> f64 {
        match self.rows.get(origin.index()) {
            Some(row) => *row.get(&destination.index()).unwrap_or(&0.),
            None => 0.,
        }
    }

    /// Number of destinations with positive demand from this origin.
    pub fn destination_count(&self, origin: NodeIndex) -> usize {
        self.rows.get(origin.index()).map_or(0, |row| row.len())
    }

    /// The destinations of an origin, in increasing order, with their demand.
    pub fn destinations(&self, origin: NodeIndex) -> impl Iterator<Item = (NodeIndex, f64)> + '_ {
        self.rows[origin.index()].iter().map(|(dest, demand)| (NodeIndex::new(*dest), *demand))
    }

    /// Origins that have at least one destination, in increasing order.
    pub fn origins(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.rows.iter().enumerate()
            .filter(|(_, row)| !row.is_empty())
            .map(|(origin, _)| NodeIndex::new(origin))
    }

    pub fn num_pairs(&self) -> usize {
        self.rows.iter().map(|row| row.len()).sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.rows.iter().flat_map(|row| row.values()).sum()
    }

    pub fn declared_total(&self) -> Option<f64> {
        self.declared_total
    }

    pub fn from_tntp(path: &Path) -> Result<DemandMatrix, TrafficError> {
        log::info!("loading trips from {:?}", path);
        let reader = config_utils::open_reader(path)?;
        let demand = DemandMatrix::from_reader(reader)?;
        log::info!("read {} OD pairs over {} zones, total demand {}", demand.num_pairs(),
                   demand.num_zones(), demand.total_demand());
        if let Some(declared) = demand.declared_total {
            if (declared - demand.total_demand()).abs() > 1e-6 * declared.abs().max(1.) {
                log::warn!("trips file declares a total OD flow of {} but entries sum to {}",
                           declared, demand.total_demand());
            }
        }
        Ok(demand)
    }

    /// Parses trips in the TNTP format: `Origin k` headers each followed by `dest : flow;` pairs.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<DemandMatrix, TrafficError> {
        let mut num_zones = 0;
        let mut declared_total = None;
        let mut lines = config_utils::numbered_lines(reader);

        for (line_num, line) in lines.by_ref() {
            let line = line.map_err(|err| TrafficError::parse(line_num, err.to_string()))?;
            match config_utils::read_metadata(&line) {
                Some((MetadataLabel::NumberOfZones, value)) =>
                    num_zones = config_utils::parse_field(value, line_num, "zone count")?,
                Some((MetadataLabel::TotalOdFlow, value)) =>
                    declared_total = Some(config_utils::parse_field(value, line_num, "total OD flow")?),
                Some((MetadataLabel::EndOfMetadata, _)) => break,
                _ => (),
            }
        }

        let mut matrix = DemandMatrix::new(num_zones);
        matrix.declared_total = declared_total;
        let mut origin: Option<usize> = None;
        for (line_num, line) in lines {
            let line = line.map_err(|err| TrafficError::parse(line_num, err.to_string()))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('~') || line.starts_with('<') {
                continue;
            }

            if line.starts_with('O') {
                let id = line.split_whitespace().nth(1)
                    .ok_or_else(|| TrafficError::parse(line_num, "origin line without an id"))?;
                let id: usize = config_utils::parse_field(id, line_num, "origin")?;
                if id == 0 {
                    return Err(TrafficError::parse(line_num, "zone ids are 1-based"));
                }
                origin = Some(id - 1);
                continue;
            }

            let origin = origin
                .ok_or_else(|| TrafficError::parse(line_num, "demand entries before any origin"))?;
            for entry in line.split(';').map(str::trim).filter(|ee| !ee.is_empty()) {
                let mut parts = entry.split(':');
                let (dest, flow) = match (parts.next(), parts.next()) {
                    (Some(dest), Some(flow)) => (dest, flow),
                    _ => return Err(TrafficError::parse(line_num, format!("bad entry '{}'", entry))),
                };
                let dest: usize = config_utils::parse_field(dest, line_num, "destination")?;
                let flow: f64 = config_utils::parse_field(flow, line_num, "flow")?;
                if dest == 0 {
                    return Err(TrafficError::parse(line_num, "zone ids are 1-based"));
                }
                if !(flow >= 0.) || !flow.is_finite() {
                    return Err(TrafficError::parse(line_num, format!("demand must be non-negative, got {}", flow)));
                }
                matrix.insert(origin, dest - 1, flow)?;
            }
        }

        Ok(matrix)
    }
}
