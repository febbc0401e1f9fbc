use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use super::errors::TrafficError;


/// The metadata tags that may appear at the top of a TNTP network or trips file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetadataLabel {
    NumberOfZones,
    NumberOfNodes,
    FirstThruNode,
    NumberOfLinks,
    TotalOdFlow,
    EndOfMetadata,
    Unknown,
}

/// Splits a line like `<NUMBER OF ZONES> 24` into its label and its (trimmed) value.
pub fn read_metadata(line: &str) -> Option<(MetadataLabel, &str)> {
    let line = line.trim();
    if !line.starts_with('<') {
        return None;
    }
    let close = line.find('>')?;
    let label = match line[1..close].trim() {
        "NUMBER OF ZONES" => MetadataLabel::NumberOfZones,
        "NUMBER OF NODES" => MetadataLabel::NumberOfNodes,
        "FIRST THRU NODE" => MetadataLabel::FirstThruNode,
        "NUMBER OF LINKS" => MetadataLabel::NumberOfLinks,
        "TOTAL OD FLOW" => MetadataLabel::TotalOdFlow,
        "END OF METADATA" => MetadataLabel::EndOfMetadata,
        _ => MetadataLabel::Unknown,
    };
    Some((label, line[close + 1..].trim()))
}

/// Parses a single field, reporting the line number on failure.
pub fn parse_field<T: FromStr>(field: &str, line_num: usize, what: &str) -> Result<T, TrafficError> {
    match field.trim().parse::<T>() {
        Ok(val) => Ok(val),
        Err(_) => Err(TrafficError::parse(line_num, format!("bad {} '{}'", what, field))),
    }
}

/// Opens a text file, turning a missing file into a load-time error.
pub fn open_reader(path: &Path) -> Result<BufReader<File>, TrafficError> {
    let file = File::open(path).map_err(|source| TrafficError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Returns the lines of a reader with their 1-based line numbers.
pub fn numbered_lines<R: BufRead>(reader: R) -> impl Iterator<Item = (usize, std::io::Result<String>)> {
    reader.lines().enumerate().map(|(ii, line)| (ii + 1, line))
}

pub fn str_to_absolute_path(path_str: &str, default_base_dir: &Path) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        return path;
    } else {
        return [default_base_dir, Path::new(&path)].iter().collect();
    }
}
