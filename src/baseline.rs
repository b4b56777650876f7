use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::data::{Dataset, DriverId, SeasonData};
use crate::points::Position;
use crate::rule_set::RuleSet;
use crate::standings::accumulate;

/// Season champion as recorded in the standings table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Champion {
    pub year: u16,
    pub driver_id: DriverId,
}

/// Champions per season: the rank-1 standing row after each season's last round.
///
/// Seasons without standings for their final race have no champion.
pub fn season_champions(data: &Dataset) -> Vec<Champion> {
    data.years()
        .filter_map(|year| {
            let last = data.season_races(year).into_iter().last()?;
            data.standings_for(last.id)
                .iter()
                .find(|row| row.position == Position::Classified(1))
                .map(|row| Champion {
                    year,
                    driver_id: row.driver_id,
                })
        })
        .collect()
}

/// Where the "plays like a champion" figure comes from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BaselineSource {
    /// Historical mean computed per rule set
    Computed,
    /// Fixed published figure, same for every rule set
    Reference(f64),
}

/// Mean points per race scored by historical champions, cached per rule set.
#[derive(Clone, Debug)]
pub struct ChampionBaselines {
    values: HashMap<RuleSet, f64>,
    source: BaselineSource,
}

impl ChampionBaselines {
    /// Compute baselines for every distinct rule set in `rule_sets`.
    ///
    /// Rule sets repeat across years, so each distinct value is computed once
    /// and the distinct sets are processed in parallel.
    pub fn compute<I>(data: &Dataset, rule_sets: I, source: BaselineSource) -> Self
    where
        I: IntoIterator<Item = RuleSet>,
    {
        if let BaselineSource::Reference(value) = source {
            info!(value, "using reference champion baseline");
            return ChampionBaselines {
                values: HashMap::new(),
                source,
            };
        }

        let mut seen = HashSet::new();
        let distinct: Vec<RuleSet> = rule_sets
            .into_iter()
            .filter(|rules| seen.insert(rules.clone()))
            .collect();

        let history = ChampionHistory::new(data);
        let values: HashMap<RuleSet, f64> = distinct
            .into_par_iter()
            .map(|rules| {
                let value = history.mean_points_per_race(&rules);
                info!(%rules, value, "champion baseline");
                (rules, value)
            })
            .collect();

        ChampionBaselines { values, source }
    }

    /// Baseline for `rules`, or `None` if it was never computed.
    pub fn get(&self, rules: &RuleSet) -> Option<f64> {
        match self.source {
            BaselineSource::Reference(value) => Some(value),
            BaselineSource::Computed => self.values.get(rules).copied(),
        }
    }

    pub fn source(&self) -> BaselineSource {
        self.source
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Champion seasons materialized once and rescored under any rule set.
struct ChampionHistory {
    seasons: Vec<(SeasonData, DriverId)>,
    races: usize,
}

impl ChampionHistory {
    fn new(data: &Dataset) -> Self {
        let seasons: Vec<(SeasonData, DriverId)> = season_champions(data)
            .into_iter()
            .filter_map(|c| data.season(c.year).map(|s| (s, c.driver_id)))
            .collect();
        let races = seasons.iter().map(|(s, _)| s.races.len()).sum();
        if seasons.is_empty() {
            warn!("no champions found in standings; champion baseline is 0");
        }
        ChampionHistory { seasons, races }
    }

    fn mean_points_per_race(&self, rules: &RuleSet) -> f64 {
        if self.races == 0 {
            return 0.0;
        }
        let total: f64 = self
            .seasons
            .iter()
            .map(|(season, champion)| {
                accumulate(season, rules)
                    .final_standing()
                    .and_then(|round| round.entries.iter().find(|e| e.driver_id == *champion))
                    .map(|e| e.total())
                    .unwrap_or(0.0)
            })
            .sum();
        total / self.races as f64
    }
}
