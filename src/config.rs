use std::path::Path;
use std::path::PathBuf;

use yaml_rust::Yaml;
use yaml_rust::YamlLoader;

use super::config_utils;
use super::errors::TrafficError;
use super::frank_wolfe::SolverSettings;
use super::line_search::LineSearch;
use super::line_search::DEFAULT_GOLDEN_ACCURACY;
use super::report::NumberFormat;


/// Everything needed for one assignment run.  Relative paths in the file are taken relative to
/// the directory the config file lives in.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignmentConfig {
    pub network_path: PathBuf,
    pub trips_path: PathBuf,
    pub flow_output_path: Option<PathBuf>,
    pub trace_output_path: Option<PathBuf>,
    pub number_format: NumberFormat,
    pub solver: SolverSettings,
}

impl AssignmentConfig {
    pub fn from_file(path: &str) -> Result<AssignmentConfig, TrafficError> {
        let file_contents = std::fs::read_to_string(path).map_err(|source| TrafficError::Io {
            path: PathBuf::from(path),
            source,
        })?;
        let config_dir = Path::new(path).parent().unwrap_or_else(|| Path::new("."));
        return AssignmentConfig::from_yaml_str(&file_contents, config_dir);
    }

    pub fn from_yaml_str(yaml_str: &str, config_dir: &Path) -> Result<AssignmentConfig, TrafficError> {
        let yaml_cfgs = YamlLoader::load_from_str(yaml_str)
            .map_err(|err| TrafficError::Config(format!("invalid yaml: {}", err)))?;
        let yaml_cfg = match yaml_cfgs.first() {
            Some(cfg) => cfg,
            None => return Err(TrafficError::Config(String::from("config file is empty"))),
        };

        let network_path = required_str(yaml_cfg, "network_path")?;
        let network_path = config_utils::str_to_absolute_path(network_path, config_dir);
        let trips_path = required_str(yaml_cfg, "trips_path")?;
        let trips_path = config_utils::str_to_absolute_path(trips_path, config_dir);
        let flow_output_path = optional_str(yaml_cfg, "flow_output_path")?
            .map(|pp| config_utils::str_to_absolute_path(pp, config_dir));
        let trace_output_path = optional_str(yaml_cfg, "trace_output_path")?
            .map(|pp| config_utils::str_to_absolute_path(pp, config_dir));

        let number_format = match optional_usize(yaml_cfg, "output_precision")? {
            Some(precision) => NumberFormat::Scientific(precision),
            None => NumberFormat::RoundTrip,
        };

        let defaults = SolverSettings::default();
        let line_search = match optional_str(yaml_cfg, "line_search")? {
            None | Some("armijo") => LineSearch::Armijo,
            Some("golden_section") => {
                let accuracy = optional_f64(yaml_cfg, "golden_section_accuracy")?
                    .unwrap_or(DEFAULT_GOLDEN_ACCURACY);
                LineSearch::GoldenSection { accuracy }
            },
            Some(other) => {
                return Err(TrafficError::Config(format!("unknown line search '{}'", other)));
            },
        };
        let solver = SolverSettings {
            tolerance: optional_f64(yaml_cfg, "tolerance")?.unwrap_or(defaults.tolerance),
            max_iterations: optional_usize(yaml_cfg, "max_iterations")?,
            line_search,
            prune_idle_zones: optional_bool(yaml_cfg, "prune_idle_zones")?
                .unwrap_or(defaults.prune_idle_zones),
            record_paths: optional_bool(yaml_cfg, "record_paths")?.unwrap_or(defaults.record_paths),
        };
        solver.validate()?;

        return Ok(AssignmentConfig {
            network_path,
            trips_path,
            flow_output_path,
            trace_output_path,
            number_format,
            solver,
        });
    }
}

fn bad_type(key: &str, expected: &str) -> TrafficError {
    TrafficError::Config(format!("'{}' should be {}", key, expected))
}

fn required_str<'a>(yaml_cfg: &'a Yaml, key: &str) -> Result<&'a str, TrafficError> {
    match optional_str(yaml_cfg, key)? {
        Some(val) => Ok(val),
        None => Err(TrafficError::Config(format!("missing '{}'", key))),
    }
}

fn optional_str<'a>(yaml_cfg: &'a Yaml, key: &str) -> Result<Option<&'a str>, TrafficError> {
    let val = &yaml_cfg[key];
    if val.is_badvalue() || val.is_null() {
        return Ok(None);
    }
    val.as_str().map(Some).ok_or_else(|| bad_type(key, "a string"))
}

fn optional_f64(yaml_cfg: &Yaml, key: &str) -> Result<Option<f64>, TrafficError> {
    let val = &yaml_cfg[key];
    if val.is_badvalue() || val.is_null() {
        return Ok(None);
    }
    // yaml distinguishes 1 from 1.0
    val.as_f64()
        .or_else(|| val.as_i64().map(|ii| ii as f64))
        .map(Some)
        .ok_or_else(|| bad_type(key, "a number"))
}

fn optional_usize(yaml_cfg: &Yaml, key: &str) -> Result<Option<usize>, TrafficError> {
    let val = &yaml_cfg[key];
    if val.is_badvalue() || val.is_null() {
        return Ok(None);
    }
    match val.as_i64() {
        Some(ii) if ii >= 0 => Ok(Some(ii as usize)),
        _ => Err(bad_type(key, "a non-negative integer")),
    }
}

fn optional_bool(yaml_cfg: &Yaml, key: &str) -> Result<Option<bool>, TrafficError> {
    let val = &yaml_cfg[key];
    if val.is_badvalue() || val.is_null() {
        return Ok(None);
    }
    val.as_bool().map(Some).ok_or_else(|| bad_type(key, "true or false"))
}
