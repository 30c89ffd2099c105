use crate::error::{LoadError, TickError};
use crate::fleet::{Fleet, TRAINS_PER_LINE};
use crate::station::Line;
use crate::topology::Topology;
use log::*;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One data row of the per-tick snapshot file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrainRecord {
    pub line_name: String,
    pub train_number: u32,
    pub station_code: String,
    pub direction: String,
    pub destination: String,
}

/// Snapshot rows in registry order.
pub fn train_records(fleet: &Fleet, topology: &Topology) -> Vec<TrainRecord> {
    fleet
        .trains
        .iter()
        .map(|t| TrainRecord {
            line_name: t.line.to_string(),
            train_number: t.number,
            station_code: t.station.code.clone(),
            direction: t.direction.to_string(),
            destination: topology.destination(t.line, t.direction).code.clone(),
        })
        .collect()
}

/// One console line per subway line: the line letter followed by that
/// line's block of 4 trains as `T<number>(<code>, <F|B>)`.
pub fn console_lines(fleet: &Fleet) -> Vec<String> {
    Line::ALL
        .iter()
        .enumerate()
        .map(|(block, &line)| {
            let first = (block * TRAINS_PER_LINE) as u32 + 1;
            let entries = (first..first + TRAINS_PER_LINE as u32)
                .filter_map(|number| fleet.get(line, number))
                .map(|t| format!("T{}({}, {})", t.number, t.station.code, t.direction.letter()))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: {}", line, entries)
        })
        .collect()
}

pub fn print_positions(fleet: &Fleet) {
    for line in console_lines(fleet) {
        println!("{}", line);
    }
}

fn write_records<W: io::Write>(records: &[TrainRecord], writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `Trains_<epoch-millis>.csv` into the output directory.
pub fn write_snapshot(
    fleet: &Fleet,
    topology: &Topology,
    dir: &Path,
    epoch_millis: u128,
) -> Result<PathBuf, TickError> {
    let path = dir.join(format!("Trains_{}.csv", epoch_millis));
    let snapshot_err = |path: &Path, reason: String| TickError::SnapshotWrite {
        path: path.to_path_buf(),
        reason,
    };
    let file = fs::File::create(&path).map_err(|e| snapshot_err(&path, e.to_string()))?;
    write_records(&train_records(fleet, topology), file)
        .map_err(|e| snapshot_err(&path, e.to_string()))?;
    debug!("wrote snapshot {}", path.display());
    Ok(path)
}

pub fn prepare_output_dir(path: &Path) -> Result<(), LoadError> {
    fs::create_dir_all(path).map_err(|e| LoadError::OutputUnwritable {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Deletes every `.csv` file directly inside the output directory. Runs
/// once at startup, never between ticks.
pub fn clean_output_dir(path: &Path) -> Result<(), LoadError> {
    let unwritable = |path: &Path, source: io::Error| LoadError::OutputUnwritable {
        path: path.to_path_buf(),
        source,
    };
    let mut removed = 0;
    for entry in fs::read_dir(path).map_err(|e| unwritable(path, e))? {
        let entry = entry.map_err(|e| unwritable(path, e))?;
        let file = entry.path();
        if file.is_file() && file.extension().map_or(false, |ext| ext == "csv") {
            fs::remove_file(&file).map_err(|e| unwritable(&file, e))?;
            removed += 1;
        }
    }
    if removed > 0 {
        info!("Removed {} stale snapshots from {}", removed, path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::{Direction, Train};
    use crate::station::{fixture_directory, station_code, StationDirectory};

    fn directory() -> StationDirectory {
        fixture_directory(&[(Line::R, 20), (Line::B, 8), (Line::G, 15)])
    }

    fn sample_fleet(directory: &StationDirectory) -> Fleet {
        let placements = [
            (Line::R, Direction::Forward, 5),
            (Line::R, Direction::Forward, 10),
            (Line::R, Direction::Backward, 16),
            (Line::R, Direction::Backward, 20),
            (Line::B, Direction::Forward, 2),
            (Line::B, Direction::Forward, 7),
            (Line::B, Direction::Backward, 4),
            (Line::B, Direction::Backward, 8),
            (Line::G, Direction::Forward, 3),
            (Line::G, Direction::Forward, 8),
            (Line::G, Direction::Backward, 11),
            (Line::G, Direction::Backward, 15),
        ];
        let trains = placements
            .iter()
            .enumerate()
            .map(|(idx, &(line, direction, ordinal))| {
                let station = directory[&station_code(line, ordinal)].clone();
                Train {
                    line,
                    number: idx as u32 + 1,
                    direction,
                    position: ordinal,
                    station,
                }
            })
            .collect();
        Fleet { trains }
    }

    #[test]
    fn console_shows_three_lines_in_fixed_order() {
        let directory = directory();
        let fleet = sample_fleet(&directory);
        let lines = console_lines(&fleet);
        assert_eq!(
            lines,
            vec![
                "R: T1(R05, F), T2(R10, F), T3(R16, B), T4(R20, B)",
                "B: T5(B02, F), T6(B07, F), T7(B04, B), T8(B08, B)",
                "G: T9(G03, F), T10(G08, F), T11(G11, B), T12(G15, B)",
            ]
        );
    }

    #[test]
    fn records_follow_registry_order_with_destinations() {
        let directory = directory();
        let topology = Topology::derive(&directory).unwrap();
        let fleet = sample_fleet(&directory);
        let records = train_records(&fleet, &topology);

        assert_eq!(records.len(), 12);
        let numbers: Vec<u32> = records.iter().map(|r| r.train_number).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<u32>>());

        // forward trains head for the line end, backward trains for the start
        assert_eq!(records[0].destination, "R20");
        assert_eq!(records[3].destination, "R01");
        assert_eq!(records[5].destination, "B08");
        assert_eq!(records[6].station_code, "B04");
        assert_eq!(records[6].direction, "backward");
        assert_eq!(records[6].destination, "B01");
    }

    #[test]
    fn csv_header_and_rows_match_the_contract() {
        let directory = directory();
        let topology = Topology::derive(&directory).unwrap();
        let fleet = sample_fleet(&directory);

        let mut buffer = Vec::new();
        write_records(&train_records(&fleet, &topology), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "LineName,TrainNumber,StationCode,Direction,Destination");
        assert_eq!(lines.len(), 13);
        assert_eq!(lines[1], "R,1,R05,forward,R20");
        assert_eq!(lines[7], "B,7,B04,backward,B01");
    }

    #[test]
    fn snapshot_file_name_embeds_the_timestamp() {
        let directory = directory();
        let topology = Topology::derive(&directory).unwrap();
        let fleet = sample_fleet(&directory);

        let dir = std::env::temp_dir().join(format!("subwaysim_snap_{}", std::process::id()));
        prepare_output_dir(&dir).unwrap();
        let path = write_snapshot(&fleet, &topology, &dir, 1234567890).unwrap();
        assert_eq!(path.file_name().unwrap(), "Trains_1234567890.csv");
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 13);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn cleanup_removes_only_csv_files() {
        let dir = std::env::temp_dir().join(format!("subwaysim_clean_{}", std::process::id()));
        prepare_output_dir(&dir).unwrap();
        fs::write(dir.join("Trains_1.csv"), "stale").unwrap();
        fs::write(dir.join("Trains_2.csv"), "stale").unwrap();
        fs::write(dir.join("notes.txt"), "keep").unwrap();

        clean_output_dir(&dir).unwrap();

        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["notes.txt"]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_output_dir_is_unwritable() {
        let dir = std::env::temp_dir().join("subwaysim_no_such_dir");
        assert!(matches!(
            clean_output_dir(&dir),
            Err(LoadError::OutputUnwritable { .. })
        ));
    }
}
