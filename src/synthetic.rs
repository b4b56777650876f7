//! Seeded synthetic seasons for stress tests, benchmarks, and what-if runs.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;
use std::ops::RangeInclusive;

use crate::data::{Dataset, Driver, DriverId, Race, ResultRow, SeasonData, SprintResultRow, StandingRow};
use crate::error::Result;
use crate::points::Position;
use crate::rules::ScoringRuleTable;
use crate::standings::accumulate;

/// Shape of a generated season.
#[derive(Clone, Debug)]
pub struct SeasonShape {
    pub rounds: u32,
    pub competitors: u32,
    /// A sprint accompanies every n-th round
    pub sprint_every: Option<u32>,
    /// Chance that a competitor is not classified in a race
    pub retirement_prob: f64,
    /// Weight of per-race noise against fixed competitor skill
    pub noise: f64,
}

impl Default for SeasonShape {
    fn default() -> Self {
        SeasonShape {
            rounds: 20,
            competitors: 20,
            sprint_every: None,
            retirement_prob: 0.1,
            noise: 1.0,
        }
    }
}

/// Generate one season. The same seed always yields the same season.
pub fn generate_season(year: u16, shape: &SeasonShape, seed: u64) -> SeasonData {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let skills: Vec<f64> = (0..shape.competitors).map(|_| rng.gen::<f64>()).collect();

    let mut races = Vec::with_capacity(shape.rounds as usize);
    let mut results = Vec::with_capacity(shape.rounds as usize);
    let mut sprint_results = Vec::with_capacity(shape.rounds as usize);
    let mut sprints = 0;

    for round in 1..=shape.rounds {
        let race_id = race_id(year, round);
        let has_sprint = shape
            .sprint_every
            .map(|n| n > 0 && round % n == 0)
            .unwrap_or(false);
        if has_sprint {
            sprints += 1;
        }
        races.push(Race {
            id: race_id,
            year,
            round,
            has_sprint,
            cumulative_sprints: sprints,
        });

        let fastest = (shape.competitors > 0).then(|| rng.gen_range(0..shape.competitors) + 1);
        let mut classified = 0;
        let rows = finishing_order(&skills, shape.noise, &mut rng)
            .into_iter()
            .map(|driver_id| {
                let position = if rng.gen::<f64>() < shape.retirement_prob {
                    Position::NotClassified
                } else {
                    classified += 1;
                    Position::Classified(classified)
                };
                ResultRow {
                    race_id,
                    driver_id,
                    position,
                    fastest_lap_rank: (fastest == Some(driver_id)).then_some(1),
                }
            })
            .collect();
        results.push(rows);

        let sprint_rows = if has_sprint {
            finishing_order(&skills, shape.noise, &mut rng)
                .into_iter()
                .enumerate()
                .map(|(i, driver_id)| SprintResultRow {
                    race_id,
                    driver_id,
                    position: Position::Classified(i as u32 + 1),
                })
                .collect()
        } else {
            Vec::new()
        };
        sprint_results.push(sprint_rows);
    }

    SeasonData {
        year,
        races,
        results,
        sprint_results,
    }
}

/// Generate a dataset covering `years`, including end-of-season standings
/// scored under the rule table so champions can be identified.
pub fn generate_dataset(
    years: RangeInclusive<u16>,
    shape: &SeasonShape,
    table: &ScoringRuleTable,
    seed: u64,
) -> Result<Dataset> {
    let mut races = Vec::new();
    let mut results = Vec::new();
    let mut sprint_results = Vec::new();
    let mut standings = Vec::new();

    for year in years {
        let season = generate_season(year, shape, seed ^ u64::from(year));
        let rules = table.rules_for_year(year)?;
        if let Some(last) = accumulate(&season, &rules).final_standing() {
            standings.extend(last.entries.iter().enumerate().map(|(i, entry)| StandingRow {
                race_id: last.race_id,
                driver_id: entry.driver_id,
                position: Position::Classified(i as u32 + 1),
            }));
        }
        races.extend(season.races);
        results.extend(season.results.into_iter().flatten());
        sprint_results.extend(season.sprint_results.into_iter().flatten());
    }

    let drivers = (1..=shape.competitors)
        .map(|id| Driver {
            id,
            forename: "Driver".to_string(),
            surname: id.to_string(),
        })
        .collect();

    Ok(Dataset::new(races, drivers, results, sprint_results, standings))
}

fn race_id(year: u16, round: u32) -> u32 {
    u32::from(year) * 100 + round
}

fn finishing_order(skills: &[f64], noise: f64, rng: &mut ChaCha8Rng) -> Vec<DriverId> {
    let mut pace: Vec<(DriverId, f64)> = skills
        .iter()
        .enumerate()
        .map(|(i, skill)| (i as DriverId + 1, skill + noise * rng.gen::<f64>()))
        .collect();
    pace.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    pace.into_iter().map(|(id, _)| id).collect()
}
