use crate::error::LoadError;
use log::*;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The three subway lines, in fleet numbering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    R,
    B,
    G,
}

impl Line {
    pub const ALL: [Line; 3] = [Line::R, Line::B, Line::G];

    pub fn letter(self) -> char {
        match self {
            Line::R => 'R',
            Line::B => 'B',
            Line::G => 'G',
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Line {
    type Err = &'static str;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "R" => Ok(Line::R),
            "B" => Ok(Line::B),
            "G" => Ok(Line::G),
            _ => Err("Could not parse line name."),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Station {
    pub line: Line,
    pub ordinal: u32,
    pub code: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
}

pub type StationDirectory = HashMap<String, Station>;

/// Fixed-width station code: line letter plus zero-padded ordinal.
/// Lexicographic order on these codes coincides with ordinal order.
pub fn station_code(line: Line, ordinal: u32) -> String {
    format!("{}{:02}", line, ordinal)
}

/// All directory codes carrying the line's prefix, in ascending code order.
pub fn sorted_codes(directory: &StationDirectory, line: Line) -> Vec<String> {
    let mut codes = directory
        .keys()
        .filter(|code| code.starts_with(line.letter()))
        .cloned()
        .collect::<Vec<_>>();
    codes.sort();
    codes
}

/// Reads the station table. Columns are positional: the first is unused,
/// then line name, station number, code, name, x, y. The header row is
/// skipped. Duplicate codes: last write wins.
pub fn load_stations(path: &Path) -> Result<StationDirectory, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| LoadError::SourceUnavailable {
            path: path.to_path_buf(),
            source: match e.into_kind() {
                csv::ErrorKind::Io(io) => io,
                other => std::io::Error::new(std::io::ErrorKind::Other, format!("{:?}", other)),
            },
        })?;

    let mut stations = StationDirectory::new();
    for (idx, record) in reader.records().enumerate() {
        let row = idx + 2; // 1-based, counting the header
        let record = record.map_err(|e| LoadError::MalformedRecord {
            row,
            reason: e.to_string(),
        })?;
        let station = parse_station(&record, row)?;
        trace!("station {} ({})", station.code, station.name);
        stations.insert(station.code.clone(), station);
    }

    info!("Loaded {} stations from {}", stations.len(), path.display());
    Ok(stations)
}

fn parse_station(record: &csv::StringRecord, row: usize) -> Result<Station, LoadError> {
    if record.len() < 7 {
        return Err(LoadError::MalformedRecord {
            row,
            reason: format!("expected 7 fields, got {}", record.len()),
        });
    }
    let malformed = |reason: String| LoadError::MalformedRecord { row, reason };

    let line = record[1]
        .parse::<Line>()
        .map_err(|_| malformed(format!("unknown line name {:?}", &record[1])))?;
    let ordinal = record[2]
        .parse::<u32>()
        .map_err(|_| malformed(format!("non-numeric station number {:?}", &record[2])))?;
    let x = record[5]
        .parse::<f64>()
        .map_err(|_| malformed(format!("non-numeric x coordinate {:?}", &record[5])))?;
    let y = record[6]
        .parse::<f64>()
        .map_err(|_| malformed(format!("non-numeric y coordinate {:?}", &record[6])))?;

    Ok(Station {
        line,
        ordinal,
        code: record[3].to_string(),
        name: record[4].to_string(),
        x,
        y,
    })
}

/// Directory with contiguous ordinals 1..=len per line, for tests.
#[cfg(test)]
pub(crate) fn fixture_directory(lens: &[(Line, u32)]) -> StationDirectory {
    let mut stations = StationDirectory::new();
    for &(line, len) in lens {
        for ordinal in 1..=len {
            let code = station_code(line, ordinal);
            stations.insert(
                code.clone(),
                Station {
                    line,
                    ordinal,
                    code,
                    name: format!("{} street {}", line, ordinal),
                    x: ordinal as f64,
                    y: 0.0,
                },
            );
        }
    }
    stations
}
