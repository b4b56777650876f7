//! CSV ingestion for the historical tables.
//!
//! Expects `races.csv`, `drivers.csv`, `results.csv`, `sprint_results.csv` and
//! `driver_standings.csv` in one directory, with `\N` marking missing values.
//! Extra columns are ignored.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::constants::NULL_MARKER;
use crate::data::{Dataset, Driver, DriverId, Race, RaceId, ResultRow, SprintResultRow, StandingRow};
use crate::error::{Result, TitleError};
use crate::points::Position;

#[derive(Deserialize)]
struct RawRace {
    #[serde(rename = "raceId")]
    race_id: RaceId,
    year: u16,
    round: u32,
    #[serde(default)]
    sprint_date: Option<String>,
}

#[derive(Deserialize)]
struct RawDriver {
    #[serde(rename = "driverId")]
    driver_id: DriverId,
    forename: String,
    surname: String,
}

#[derive(Deserialize)]
struct RawResult {
    #[serde(rename = "raceId")]
    race_id: RaceId,
    #[serde(rename = "driverId")]
    driver_id: DriverId,
    position: String,
    #[serde(rename = "fastestLapTime", default)]
    fastest_lap_time: Option<String>,
}

#[derive(Deserialize)]
struct RawPlacing {
    #[serde(rename = "raceId")]
    race_id: RaceId,
    #[serde(rename = "driverId")]
    driver_id: DriverId,
    position: String,
}

/// Load and index every table under `dir`.
///
/// A missing `sprint_results.csv` is treated as a history without sprints.
pub fn load_dataset(dir: impl AsRef<Path>) -> Result<Dataset> {
    let dir = dir.as_ref();

    let races: Vec<Race> = read_table::<RawRace>(&dir.join("races.csv"))?
        .into_iter()
        .map(|raw| Race {
            id: raw.race_id,
            year: raw.year,
            round: raw.round,
            has_sprint: raw.sprint_date.as_deref().map(is_present).unwrap_or(false),
            cumulative_sprints: 0,
        })
        .collect();

    let drivers: Vec<Driver> = read_table::<RawDriver>(&dir.join("drivers.csv"))?
        .into_iter()
        .map(|raw| Driver {
            id: raw.driver_id,
            forename: raw.forename,
            surname: raw.surname,
        })
        .collect();

    let results = rank_fastest_laps(read_table::<RawResult>(&dir.join("results.csv"))?)?;

    let sprint_path = dir.join("sprint_results.csv");
    let sprint_results: Vec<SprintResultRow> = if sprint_path.exists() {
        read_table::<RawPlacing>(&sprint_path)?
            .into_iter()
            .map(|raw| {
                Ok(SprintResultRow {
                    race_id: raw.race_id,
                    driver_id: raw.driver_id,
                    position: parse_position(&raw.position, "sprint_results")?,
                })
            })
            .collect::<Result<_>>()?
    } else {
        warn!(path = %sprint_path.display(), "no sprint results table; assuming no sprints");
        Vec::new()
    };

    let standings: Vec<StandingRow> = read_table::<RawPlacing>(&dir.join("driver_standings.csv"))?
        .into_iter()
        .map(|raw| {
            Ok(StandingRow {
                race_id: raw.race_id,
                driver_id: raw.driver_id,
                position: parse_position(&raw.position, "driver_standings")?,
            })
        })
        .collect::<Result<_>>()?;

    info!(
        races = races.len(),
        drivers = drivers.len(),
        results = results.len(),
        sprint_results = sprint_results.len(),
        standings = standings.len(),
        "dataset loaded"
    );

    Ok(Dataset::new(races, drivers, results, sprint_results, standings))
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize::<T>().collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(rows)
}

fn is_present(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != NULL_MARKER
}

/// Parse a finishing position; `\N` or blank means not classified.
pub fn parse_position(value: &str, table: &'static str) -> Result<Position> {
    if !is_present(value) {
        return Ok(Position::NotClassified);
    }
    match value.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(TitleError::Parse {
            table,
            message: format!("invalid position {:?}", value),
        }),
        Ok(p) => Ok(Position::Classified(p)),
    }
}

/// Parse a lap time like `1:27.452` or `87.452` into milliseconds.
pub fn parse_lap_time(value: &str) -> Option<u64> {
    if !is_present(value) {
        return None;
    }
    let value = value.trim();
    let (minutes, seconds) = match value.split_once(':') {
        Some((m, s)) => (m.parse::<u64>().ok()?, s),
        None => (0, value),
    };
    let seconds: f64 = seconds.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(minutes * 60_000 + (seconds * 1000.0).round() as u64)
}

/// Rank lap times within each race; the quickest gets rank 1, ties go to the lower driver id.
fn rank_fastest_laps(raw: Vec<RawResult>) -> Result<Vec<ResultRow>> {
    let mut laps: HashMap<RaceId, Vec<(u64, DriverId)>> = HashMap::new();
    for row in &raw {
        if let Some(ms) = row.fastest_lap_time.as_deref().and_then(parse_lap_time) {
            laps.entry(row.race_id).or_default().push((ms, row.driver_id));
        }
    }
    let mut ranks: HashMap<(RaceId, DriverId), u32> = HashMap::new();
    for (race_id, mut times) in laps {
        times.sort_unstable();
        for (i, (_, driver_id)) in times.into_iter().enumerate() {
            ranks.insert((race_id, driver_id), i as u32 + 1);
        }
    }

    raw.into_iter()
        .map(|row| {
            Ok(ResultRow {
                race_id: row.race_id,
                driver_id: row.driver_id,
                position: parse_position(&row.position, "results")?,
                fastest_lap_rank: ranks.get(&(row.race_id, row.driver_id)).copied(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_tables(dir: &Path, with_sprints: bool) {
        fs::write(
            dir.join("races.csv"),
            "raceId,year,round,circuitId,name,date,sprint_date\n\
             2,2021,2,1,B,2021-04-01,2021-03-31\n\
             1,2021,1,1,A,2021-03-01,\\N\n",
        )
        .unwrap();
        fs::write(
            dir.join("drivers.csv"),
            "driverId,driverRef,forename,surname\n1,ada,Ada,Lane\n2,bo,Bo,Reyes\n",
        )
        .unwrap();
        fs::write(
            dir.join("results.csv"),
            "resultId,raceId,driverId,position,fastestLapTime\n\
             10,1,1,1,1:30.100\n\
             11,1,2,2,1:29.900\n\
             12,2,1,\\N,\\N\n\
             13,2,2,1,1:31.000\n",
        )
        .unwrap();
        if with_sprints {
            fs::write(
                dir.join("sprint_results.csv"),
                "resultId,raceId,driverId,position\n1,2,1,1\n2,2,2,2\n",
            )
            .unwrap();
        }
        fs::write(
            dir.join("driver_standings.csv"),
            "driverStandingsId,raceId,driverId,points,position\n1,2,2,44,1\n2,2,1,28,2\n",
        )
        .unwrap();
    }

    #[test]
    fn test_load_dataset() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path(), true);
        let data = load_dataset(dir.path()).unwrap();

        let season = data.season(2021).unwrap();
        assert_eq!(season.total_rounds(), 2);
        assert_eq!(season.races[0].id, 1);
        assert!(season.races[1].has_sprint);
        assert_eq!(season.total_sprints(), 1);

        assert_eq!(season.fastest_lap_holder(0).unwrap(), 2);
        let race2 = data.results_for(2);
        assert_eq!(race2[0].position, Position::Classified(1));
        assert_eq!(race2[1].position, Position::NotClassified);
        assert_eq!(data.driver_name(2), "Bo Reyes");
        assert_eq!(data.standings_for(2)[0].driver_id, 2);
    }

    #[test]
    fn test_missing_sprint_table() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path(), false);
        let data = load_dataset(dir.path()).unwrap();
        assert!(data.sprint_results_for(2).is_empty());
        // sprint_date still marks the weekend
        assert!(data.race(2).unwrap().has_sprint);
    }

    #[test]
    fn test_missing_table_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dataset(dir.path()).is_err());
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("3", "results").unwrap(), Position::Classified(3));
        assert_eq!(parse_position("\\N", "results").unwrap(), Position::NotClassified);
        assert!(parse_position("R", "results").is_err());
        assert!(parse_position("0", "results").is_err());
    }

    #[test]
    fn test_parse_lap_time() {
        assert_eq!(parse_lap_time("1:27.452"), Some(87_452));
        assert_eq!(parse_lap_time("59.001"), Some(59_001));
        assert_eq!(parse_lap_time("\\N"), None);
        assert_eq!(parse_lap_time("x:1"), None);
    }
}
