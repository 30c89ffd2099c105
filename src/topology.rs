use crate::error::LoadError;
use crate::fleet::Direction;
use crate::station::{sorted_codes, Line, Station, StationDirectory};
use log::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct LineEnds {
    pub start: Station,
    pub end: Station,
}

/// Start/end station of every line, derived once at startup.
#[derive(Debug)]
pub struct Topology {
    ends: HashMap<Line, LineEnds>,
}

impl Topology {
    pub fn derive(directory: &StationDirectory) -> Result<Topology, LoadError> {
        let mut ends = HashMap::new();
        for line in Line::ALL.iter().copied() {
            let line_ends = derive_endpoints(directory, line)?;
            debug!(
                "line {} runs {} -> {}",
                line, line_ends.start.code, line_ends.end.code
            );
            ends.insert(line, line_ends);
        }
        Ok(Topology { ends })
    }

    pub fn ends(&self, line: Line) -> &LineEnds {
        &self.ends[&line]
    }

    /// The station a train is headed for: the line's end going forward,
    /// its start going backward.
    pub fn destination(&self, line: Line, direction: Direction) -> &Station {
        let ends = self.ends(line);
        match direction {
            Direction::Forward => &ends.end,
            Direction::Backward => &ends.start,
        }
    }
}

pub fn derive_endpoints(directory: &StationDirectory, line: Line) -> Result<LineEnds, LoadError> {
    let codes = sorted_codes(directory, line);
    match (codes.first(), codes.last()) {
        (Some(first), Some(last)) => Ok(LineEnds {
            start: directory[first].clone(),
            end: directory[last].clone(),
        }),
        _ => Err(LoadError::EmptyLine { line }),
    }
}
