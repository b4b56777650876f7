//! Normalized historical tables and per-season views.
//!
//! A `Dataset` is built once, single-threaded, and then only read. Row order
//! inside the input tables never leaks into results: every index sorts its rows.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, TitleError};
use crate::points::Position;

pub type RaceId = u32;
pub type DriverId = u32;

/// One points-awarding race event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    pub id: RaceId,
    pub year: u16,
    /// 1-based order within the season
    pub round: u32,
    pub has_sprint: bool,
    /// Sprints held up to and including this round
    pub cumulative_sprints: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub race_id: RaceId,
    pub driver_id: DriverId,
    pub position: Position,
    /// Rank 1 marks the fastest lap of the race
    pub fastest_lap_rank: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintResultRow {
    pub race_id: RaceId,
    pub driver_id: DriverId,
    pub position: Position,
}

/// Championship standing after a race.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub race_id: RaceId,
    pub driver_id: DriverId,
    pub position: Position,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub forename: String,
    pub surname: String,
}

impl Driver {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.forename, self.surname)
    }
}

/// Immutable, indexed snapshot of the input tables.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    races: Vec<Race>,
    race_index: HashMap<RaceId, usize>,
    drivers: HashMap<DriverId, Driver>,
    results: HashMap<RaceId, Vec<ResultRow>>,
    sprint_results: HashMap<RaceId, Vec<SprintResultRow>>,
    standings: HashMap<RaceId, Vec<StandingRow>>,
    seasons: BTreeMap<u16, Vec<usize>>,
}

impl Dataset {
    /// Index the tables.
    ///
    /// Races are ordered by (year, round); `has_sprint` is set for any race with
    /// sprint results and `cumulative_sprints` is recomputed per season.
    pub fn new(
        mut races: Vec<Race>,
        drivers: Vec<Driver>,
        results: Vec<ResultRow>,
        sprint_results: Vec<SprintResultRow>,
        standings: Vec<StandingRow>,
    ) -> Self {
        races.sort_by_key(|r| (r.year, r.round, r.id));

        let results = group_rows(results, |r| r.race_id, |r| (r.position, r.driver_id));
        let sprint_results = group_rows(sprint_results, |r| r.race_id, |r| (r.position, r.driver_id));
        let standings = group_rows(standings, |r| r.race_id, |r| (r.position, r.driver_id));

        let mut seasons: BTreeMap<u16, Vec<usize>> = BTreeMap::new();
        let mut race_index = HashMap::with_capacity(races.len());
        let mut sprints_so_far = 0;
        let mut current_year = None;
        for (i, race) in races.iter_mut().enumerate() {
            if current_year != Some(race.year) {
                current_year = Some(race.year);
                sprints_so_far = 0;
            }
            race.has_sprint = race.has_sprint || sprint_results.contains_key(&race.id);
            if race.has_sprint {
                sprints_so_far += 1;
            }
            race.cumulative_sprints = sprints_so_far;
            race_index.insert(race.id, i);
            seasons.entry(race.year).or_default().push(i);
        }

        Dataset {
            races,
            race_index,
            drivers: drivers.into_iter().map(|d| (d.id, d)).collect(),
            results,
            sprint_results,
            standings,
            seasons,
        }
    }

    /// All races in (year, round) order.
    pub fn races(&self) -> &[Race] {
        &self.races
    }

    /// Race by id.
    pub fn race(&self, race_id: RaceId) -> Result<&Race> {
        self.race_index
            .get(&race_id)
            .map(|&i| &self.races[i])
            .ok_or_else(|| TitleError::MissingReference(format!("race {}", race_id)))
    }

    /// Driver by id.
    pub fn driver(&self, driver_id: DriverId) -> Result<&Driver> {
        self.drivers
            .get(&driver_id)
            .ok_or_else(|| TitleError::MissingReference(format!("driver {}", driver_id)))
    }

    /// Display name, falling back to the numeric id for drivers missing from the table.
    pub fn driver_name(&self, driver_id: DriverId) -> String {
        self.driver(driver_id)
            .map(Driver::display_name)
            .unwrap_or_else(|_| format!("#{}", driver_id))
    }

    /// Years with at least one race, ascending.
    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.seasons.keys().copied()
    }

    /// Races of one season in round order.
    pub fn season_races(&self, year: u16) -> Vec<&Race> {
        self.seasons
            .get(&year)
            .map(|idx| idx.iter().map(|&i| &self.races[i]).collect())
            .unwrap_or_default()
    }

    /// Race results for `race_id`, sorted by (position, driver).
    pub fn results_for(&self, race_id: RaceId) -> &[ResultRow] {
        self.results.get(&race_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sprint results for `race_id`, sorted by (position, driver).
    pub fn sprint_results_for(&self, race_id: RaceId) -> &[SprintResultRow] {
        self.sprint_results.get(&race_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Championship standings recorded after `race_id`.
    pub fn standings_for(&self, race_id: RaceId) -> &[StandingRow] {
        self.standings.get(&race_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Owned view of one season, or `None` if the year has no races.
    pub fn season(&self, year: u16) -> Option<SeasonData> {
        let races: Vec<Race> = self.season_races(year).into_iter().cloned().collect();
        if races.is_empty() {
            return None;
        }
        let results = races.iter().map(|r| self.results_for(r.id).to_vec()).collect();
        let sprint_results = races
            .iter()
            .map(|r| self.sprint_results_for(r.id).to_vec())
            .collect();
        Some(SeasonData {
            year,
            races,
            results,
            sprint_results,
        })
    }
}

fn group_rows<T, K: Ord>(
    rows: Vec<T>,
    race_of: impl Fn(&T) -> RaceId,
    order: impl Fn(&T) -> K,
) -> HashMap<RaceId, Vec<T>> {
    let mut grouped: HashMap<RaceId, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(race_of(&row)).or_default().push(row);
    }
    for rows in grouped.values_mut() {
        rows.sort_by_key(|r| order(r));
    }
    grouped
}

/// Races and results of one season in round order.
///
/// `results[i]` and `sprint_results[i]` belong to `races[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SeasonData {
    pub year: u16,
    pub races: Vec<Race>,
    pub results: Vec<Vec<ResultRow>>,
    pub sprint_results: Vec<Vec<SprintResultRow>>,
}

impl SeasonData {
    /// Number of race rounds in the season.
    pub fn total_rounds(&self) -> u32 {
        self.races.len() as u32
    }

    /// Sprints held over the whole season.
    pub fn total_sprints(&self) -> u32 {
        self.sprints_after(0)
    }

    /// Sprints still to be held after `round` (1-based).
    ///
    /// Counted from the `has_sprint` flags; `cumulative_sprints` is not consulted.
    pub fn sprints_after(&self, round: u32) -> u32 {
        self.races
            .iter()
            .skip(round as usize)
            .filter(|race| race.has_sprint)
            .count() as u32
    }

    /// Holder of the fastest lap for the race at `index`.
    pub fn fastest_lap_holder(&self, index: usize) -> Result<DriverId> {
        self.results
            .get(index)
            .and_then(|rows| rows.iter().find(|r| r.fastest_lap_rank == Some(1)))
            .map(|r| r.driver_id)
            .ok_or_else(|| {
                let race = self.races.get(index).map(|r| r.id).unwrap_or_default();
                TitleError::MissingReference(format!("no fastest lap recorded for race {}", race))
            })
    }

    /// Competitors with at least one classified race finish.
    pub fn classified_competitors(&self) -> usize {
        let mut ids: Vec<DriverId> = self
            .results
            .iter()
            .flatten()
            .filter(|r| r.position.is_classified())
            .map(|r| r.driver_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}
