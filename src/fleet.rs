use crate::error::LoadError;
use crate::station::{sorted_codes, Line, Station, StationDirectory};
use log::*;
use rand::Rng;
use std::fmt;

pub const FLEET_SIZE: usize = 12;
pub const TRAINS_PER_LINE: usize = 4;

// Fewest stations for which the placement stepping rules below yield a
// full complement of 4 trains.
const MIN_LINE_STATIONS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Single-letter form used in the console snapshot.
    pub fn letter(self) -> char {
        match self {
            Direction::Forward => 'F',
            Direction::Backward => 'B',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// A train's mutable state. `position` is always the ordinal of `station`.
#[derive(Debug)]
pub struct Train {
    pub line: Line,
    pub number: u32,
    pub direction: Direction,
    pub station: Station,
    pub position: u32,
}

/// The fixed fleet, 4 trains per line, numbered 1..=12 across R, B, G.
#[derive(Debug)]
pub struct Fleet {
    pub trains: Vec<Train>,
}

impl Fleet {
    /// Places the fleet. Per line: forward trains at a random offset in the
    /// first third of the station list and five stations further on,
    /// backward trains seeded at the last five stations stepping by four.
    /// Numbering is sequential in creation order, forward before backward.
    pub fn init(directory: &StationDirectory, rng: &mut impl Rng) -> Result<Fleet, LoadError> {
        let mut trains = Vec::with_capacity(FLEET_SIZE);
        let mut number = 1u32;
        for line in Line::ALL.iter().copied() {
            let codes = sorted_codes(directory, line);
            if codes.len() < MIN_LINE_STATIONS {
                return Err(LoadError::ShortLine {
                    line,
                    stations: codes.len(),
                });
            }

            let first = rng.gen_range(0..codes.len() / 3);
            let placements = forward_offsets(first)
                .map(|i| (i, Direction::Forward))
                .chain(backward_offsets(codes.len()).map(|i| (i, Direction::Backward)));

            for (offset, direction) in placements {
                let station = directory[&codes[offset]].clone();
                debug!("train {} enters service at {} {}", number, station.code, direction);
                trains.push(Train {
                    line,
                    number,
                    direction,
                    position: station.ordinal,
                    station,
                });
                number += 1;
            }
        }

        debug_assert_eq!(trains.len(), FLEET_SIZE);
        Ok(Fleet { trains })
    }

    /// Registry-order scan for a train by line and number.
    pub fn get(&self, line: Line, number: u32) -> Option<&Train> {
        self.trains
            .iter()
            .find(|t| t.line == line && t.number == number)
    }
}

// Offsets `first, first+5, ...` while still within `first + 5`, so at most
// two forward trains per line.
fn forward_offsets(first: usize) -> impl Iterator<Item = usize> {
    (first..).step_by(5).take_while(move |i| *i <= first + 5)
}

// The fifth-from-last station onward, stepping by four.
fn backward_offsets(len: usize) -> impl Iterator<Item = usize> {
    (len - 5..len).step_by(4)
}
