use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use crate::data::{DriverId, RaceId, SeasonData};
use crate::points::{fastest_lap_bonus, points};
use crate::rule_set::RuleSet;

/// Running totals for one competitor through a round.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StandingEntry {
    pub driver_id: DriverId,
    pub race_points: f64,
    pub sprint_points: f64,
    pub fastest_lap_points: f64,
    /// Order of first appearance in the season, used to break ties
    #[serde(skip)]
    first_seen: usize,
}

impl StandingEntry {
    fn new(driver_id: DriverId, first_seen: usize) -> Self {
        StandingEntry {
            driver_id,
            race_points: 0.0,
            sprint_points: 0.0,
            fastest_lap_points: 0.0,
            first_seen,
        }
    }

    pub fn total(&self) -> f64 {
        self.race_points + self.sprint_points + self.fastest_lap_points
    }
}

/// Ranked cumulative standings at a round boundary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundStanding {
    pub round: u32,
    pub race_id: RaceId,
    /// Ranked by total, highest first
    pub entries: Vec<StandingEntry>,
}

impl RoundStanding {
    pub fn leader(&self) -> Option<&StandingEntry> {
        self.entries.first()
    }

    pub fn runner_up(&self) -> Option<&StandingEntry> {
        self.entries.get(1)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeasonStandings {
    pub year: u16,
    pub rounds: Vec<RoundStanding>,
}

impl SeasonStandings {
    /// Standings after `round` (1-based).
    pub fn at(&self, round: u32) -> Option<&RoundStanding> {
        round
            .checked_sub(1)
            .and_then(|i| self.rounds.get(i as usize))
    }

    pub fn final_standing(&self) -> Option<&RoundStanding> {
        self.rounds.last()
    }
}

/// Accumulate race, sprint, and fastest-lap points round by round.
///
/// Sprints add to the round of the race they accompany; only races create
/// round boundaries.
pub fn accumulate(season: &SeasonData, rules: &RuleSet) -> SeasonStandings {
    let mut totals: HashMap<DriverId, StandingEntry> = HashMap::new();
    let mut rounds = Vec::with_capacity(season.races.len());

    for (index, race) in season.races.iter().enumerate() {
        let holder = match season.fastest_lap_holder(index) {
            Ok(driver) => Some(driver),
            Err(err) => {
                debug!(year = season.year, round = race.round, "{}; no bonus", err);
                None
            }
        };

        for row in &season.results[index] {
            let next = totals.len();
            let entry = totals
                .entry(row.driver_id)
                .or_insert_with(|| StandingEntry::new(row.driver_id, next));
            let race_points = points(row.position, &rules.race_ladder);
            entry.race_points += race_points;
            let rank = (holder == Some(row.driver_id)).then_some(1);
            entry.fastest_lap_points += fastest_lap_bonus(rank, race_points, rules);
        }

        for row in &season.sprint_results[index] {
            let next = totals.len();
            let entry = totals
                .entry(row.driver_id)
                .or_insert_with(|| StandingEntry::new(row.driver_id, next));
            entry.sprint_points += points(row.position, &rules.sprint_ladder);
        }

        let mut entries: Vec<StandingEntry> = totals.values().cloned().collect();
        entries.sort_by(rank_order);
        rounds.push(RoundStanding {
            round: race.round,
            race_id: race.id,
            entries,
        });
    }

    SeasonStandings {
        year: season.year,
        rounds,
    }
}

fn rank_order(a: &StandingEntry, b: &StandingEntry) -> Ordering {
    b.total()
        .partial_cmp(&a.total())
        .unwrap_or(Ordering::Equal)
        .then(a.first_seen.cmp(&b.first_seen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Race, ResultRow, SprintResultRow};
    use crate::points::Position;

    fn rules() -> RuleSet {
        RuleSet::new(vec![10, 6, 4], vec![3, 2, 1], 1).unwrap()
    }

    fn row(race_id: RaceId, driver_id: DriverId, pos: u32, fastest: bool) -> ResultRow {
        ResultRow {
            race_id,
            driver_id,
            position: Position::Classified(pos),
            fastest_lap_rank: fastest.then_some(1),
        }
    }

    fn make_season() -> SeasonData {
        let races = vec![
            Race { id: 1, year: 2000, round: 1, has_sprint: true, cumulative_sprints: 1 },
            Race { id: 2, year: 2000, round: 2, has_sprint: false, cumulative_sprints: 1 },
        ];
        let results = vec![
            vec![row(1, 7, 1, false), row(1, 8, 2, false), row(1, 9, 4, true)],
            vec![row(2, 8, 1, true), row(2, 7, 2, false), row(2, 9, 3, false)],
        ];
        let sprint_results = vec![
            vec![SprintResultRow { race_id: 1, driver_id: 8, position: Position::Classified(1) }],
            vec![],
        ];
        SeasonData { year: 2000, races, results, sprint_results }
    }

    #[test]
    fn test_accumulates_all_sources() {
        let standings = accumulate(&make_season(), &rules());
        let round1 = standings.at(1).unwrap();
        // 7 has 10 from the win, 8 has 6 plus 3 from the sprint
        assert_eq!(round1.leader().unwrap().driver_id, 7);
        assert_eq!(round1.runner_up().unwrap().driver_id, 8);
        assert_eq!(round1.runner_up().unwrap().total(), 9.0);

        let round2 = standings.at(2).unwrap();
        let leader = round2.leader().unwrap();
        assert_eq!(leader.driver_id, 8);
        assert_eq!(leader.race_points, 16.0);
        assert_eq!(leader.sprint_points, 3.0);
        assert_eq!(leader.fastest_lap_points, 1.0);
        assert_eq!(leader.total(), 20.0);
    }

    #[test]
    fn test_fastest_lap_outside_points_gets_nothing() {
        let standings = accumulate(&make_season(), &rules());
        let driver9 = standings.at(1).unwrap().entries.iter().find(|e| e.driver_id == 9).unwrap();
        assert_eq!(driver9.total(), 0.0);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let races = vec![Race { id: 1, year: 2000, round: 1, has_sprint: false, cumulative_sprints: 0 }];
        let results = vec![vec![
            ResultRow { race_id: 1, driver_id: 5, position: Position::Classified(4), fastest_lap_rank: None },
            ResultRow { race_id: 1, driver_id: 3, position: Position::Classified(5), fastest_lap_rank: None },
        ]];
        let season = SeasonData { year: 2000, races, results, sprint_results: vec![vec![]] };
        let standings = accumulate(&season, &rules());
        let order: Vec<DriverId> = standings.at(1).unwrap().entries.iter().map(|e| e.driver_id).collect();
        assert_eq!(order, vec![5, 3]);
    }

    #[test]
    fn test_totals_never_decrease() {
        let standings = accumulate(&make_season(), &rules());
        for driver in [7, 8, 9] {
            let mut last = 0.0;
            for round in &standings.rounds {
                let total = round.entries.iter().find(|e| e.driver_id == driver).unwrap().total();
                assert!(total >= last);
                last = total;
            }
        }
    }
}
