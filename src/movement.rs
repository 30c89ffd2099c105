use crate::error::TickError;
use crate::fleet::{Direction, Fleet, Train};
use crate::station::{station_code, Line, StationDirectory};
use crate::topology::Topology;
use log::*;

/// Minimum ordinal gap to the same-direction neighbor before a train may
/// advance.
pub const MIN_HEADWAY: u32 = 4;

/// How the same-line, same-direction neighbor is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborStrategy {
    /// First registry-order train past this one's position. This is how the
    /// system has always behaved; with 4 trains per line it usually, but
    /// not always, coincides with the closest train.
    FirstMatch,
    /// The closest train past this one's position.
    Nearest,
}

impl Default for NeighborStrategy {
    fn default() -> Self {
        NeighborStrategy::FirstMatch
    }
}

// Start-of-tick view of one train.
#[derive(Clone, Copy)]
struct Placement {
    line: Line,
    direction: Direction,
    position: u32,
}

/// Advances the whole fleet by one tick. Every decision reads positions and
/// directions as of the start of the tick, so a train moved earlier in the
/// loop is still seen where it stood. Each train moves at most one ordinal;
/// reaching a line boundary flips the direction and consumes the tick.
pub fn step(
    fleet: &mut Fleet,
    directory: &StationDirectory,
    topology: &Topology,
    strategy: NeighborStrategy,
) -> Result<(), TickError> {
    let before: Vec<Placement> = fleet
        .trains
        .iter()
        .map(|t| Placement {
            line: t.line,
            direction: t.direction,
            position: t.position,
        })
        .collect();

    for (idx, train) in fleet.trains.iter_mut().enumerate() {
        let me = before[idx];
        let clear = match me.direction {
            Direction::Forward => train_in_front(&before, idx, strategy)
                .map_or(true, |front| front - me.position >= MIN_HEADWAY),
            Direction::Backward => train_behind(&before, idx, strategy)
                .map_or(true, |behind| me.position - behind >= MIN_HEADWAY),
        };
        if !clear {
            trace!("T{} held at {} for headway", train.number, train.station.code);
            continue;
        }

        let ends = topology.ends(me.line);
        match me.direction {
            Direction::Forward => {
                if me.position < ends.end.ordinal {
                    advance(train, directory, me.position + 1)?;
                } else {
                    train.direction = Direction::Backward;
                    trace!("T{} reverses at {}", train.number, train.station.code);
                }
            }
            Direction::Backward => {
                if me.position > ends.start.ordinal {
                    advance(train, directory, me.position - 1)?;
                } else {
                    train.direction = Direction::Forward;
                    trace!("T{} reverses at {}", train.number, train.station.code);
                }
            }
        }
    }

    Ok(())
}

fn advance(train: &mut Train, directory: &StationDirectory, position: u32) -> Result<(), TickError> {
    let code = station_code(train.line, position);
    let station = directory.get(&code).ok_or(TickError::UnknownStation { code })?;
    train.position = position;
    train.station = station.clone();
    trace!("T{} advances to {}", train.number, train.station.code);
    Ok(())
}

fn train_in_front(snapshot: &[Placement], idx: usize, strategy: NeighborStrategy) -> Option<u32> {
    let me = snapshot[idx];
    let mut ahead = snapshot
        .iter()
        .filter(|o| o.line == me.line && o.direction == me.direction && o.position > me.position)
        .map(|o| o.position);
    match strategy {
        NeighborStrategy::FirstMatch => ahead.next(),
        NeighborStrategy::Nearest => ahead.min(),
    }
}

fn train_behind(snapshot: &[Placement], idx: usize, strategy: NeighborStrategy) -> Option<u32> {
    let me = snapshot[idx];
    let mut behind = snapshot
        .iter()
        .filter(|o| o.line == me.line && o.direction == me.direction && o.position < me.position)
        .map(|o| o.position);
    match strategy {
        NeighborStrategy::FirstMatch => behind.next(),
        NeighborStrategy::Nearest => behind.max(),
    }
}
