use serde::Serialize;
use tracing::debug;

use crate::data::{DriverId, SeasonData};
use crate::decidability::{evaluate, OutcomeLabel, RoundState};
use crate::error::{Result, TitleError};
use crate::rule_set::RuleSet;
use crate::standings::{accumulate, SeasonStandings};

/// Classification of a season after one round.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeasonOutcome {
    pub year: u16,
    pub round: u32,
    pub label: OutcomeLabel,
    pub leader: Option<DriverId>,
    pub runner_up: Option<DriverId>,
    pub leader_points: f64,
    pub runner_up_points: f64,
}

/// Evaluates one season round by round against its rule set.
#[derive(Clone, Debug)]
pub struct SeasonEvaluator {
    season: SeasonData,
    standings: SeasonStandings,
    rules: RuleSet,
    champion_baseline: f64,
}

impl SeasonEvaluator {
    /// Accumulate standings for `season`.
    ///
    /// Fails with `InsufficientData` when the season has no rounds or fewer
    /// than two classified competitors.
    pub fn new(season: SeasonData, rules: RuleSet, champion_baseline: f64) -> Result<Self> {
        if season.races.is_empty() {
            return Err(TitleError::insufficient(season.year, "season has no rounds"));
        }
        let classified = season.classified_competitors();
        if classified < 2 {
            return Err(TitleError::insufficient(
                season.year,
                format!("{} classified competitor(s), need 2", classified),
            ));
        }
        let standings = accumulate(&season, &rules);
        Ok(SeasonEvaluator {
            season,
            standings,
            rules,
            champion_baseline,
        })
    }

    /// Season year.
    pub fn year(&self) -> u16 {
        self.season.year
    }

    /// Number of rounds in the season.
    pub fn total_rounds(&self) -> u32 {
        self.season.total_rounds()
    }

    /// Standings after every round.
    pub fn standings(&self) -> &SeasonStandings {
        &self.standings
    }

    /// Rule set the season is scored under.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Outcome after `round`, 1-based and clamped to the season length.
    pub fn outcome_at(&self, round: u32) -> SeasonOutcome {
        let round = round.clamp(1, self.total_rounds());
        let standing = self.standings.at(round);
        let leader = standing.and_then(|s| s.leader());
        let runner_up = standing.and_then(|s| s.runner_up());
        let leader_points = leader.map(|e| e.total()).unwrap_or(0.0);
        let runner_up_points = runner_up.map(|e| e.total()).unwrap_or(0.0);

        let label = evaluate(
            RoundState::new(leader_points, runner_up_points, round),
            self.total_rounds() - round,
            self.season.sprints_after(round),
            &self.rules,
            self.champion_baseline,
        );

        SeasonOutcome {
            year: self.year(),
            round,
            label,
            leader: leader.map(|e| e.driver_id),
            runner_up: runner_up.map(|e| e.driver_id),
            leader_points,
            runner_up_points,
        }
    }

    /// Whether the title is settled after `round`.
    pub fn is_decided_at(&self, round: u32) -> bool {
        self.outcome_at(round).label.is_decided()
    }

    /// Earliest round at which the season is decided, or the final round if
    /// it never is.
    pub fn earliest_decided_round(&self) -> u32 {
        let round = earliest_round(self.total_rounds(), |r| self.is_decided_at(r))
            .unwrap_or_else(|| self.total_rounds());
        debug!(year = self.year(), round, "season decided");
        round
    }

    /// Outcome after every round.
    pub fn timeline(&self) -> Vec<SeasonOutcome> {
        (1..=self.total_rounds()).map(|r| self.outcome_at(r)).collect()
    }
}

/// Binary search for the first round in `1..=total_rounds` where `decided`
/// holds, relying on `decided` being monotonic in the round.
///
/// The final round is returned when no earlier round qualifies; `None` only
/// when there are no rounds.
pub fn earliest_round(total_rounds: u32, decided: impl Fn(u32) -> bool) -> Option<u32> {
    if total_rounds == 0 {
        return None;
    }
    let mut lo = 1;
    let mut hi = total_rounds;
    while lo != hi {
        let mid = lo + (hi - lo) / 2;
        if decided(mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Some(lo)
}

/// Earliest decided round of `season` under `rules`.
pub fn earliest_decided_round(season: SeasonData, rules: RuleSet, champion_baseline: f64) -> Result<u32> {
    SeasonEvaluator::new(season, rules, champion_baseline).map(|e| e.earliest_decided_round())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Race, ResultRow};
    use crate::points::Position;
    use crate::rules::ScoringRuleTable;
    use crate::synthetic::{generate_season, SeasonShape};
    use proptest::prelude::*;

    fn linear_scan(evaluator: &SeasonEvaluator) -> u32 {
        (1..=evaluator.total_rounds())
            .find(|&r| evaluator.is_decided_at(r))
            .unwrap_or(evaluator.total_rounds())
    }

    fn dominant_season(rounds: u32) -> SeasonData {
        let races: Vec<Race> = (1..=rounds)
            .map(|round| Race { id: round, year: 2015, round, has_sprint: false, cumulative_sprints: 0 })
            .collect();
        let results = (1..=rounds)
            .map(|race_id| {
                vec![
                    ResultRow { race_id, driver_id: 1, position: Position::Classified(1), fastest_lap_rank: None },
                    ResultRow { race_id, driver_id: 2, position: Position::Classified(2), fastest_lap_rank: None },
                ]
            })
            .collect();
        SeasonData { year: 2015, races, results, sprint_results: vec![vec![]; rounds as usize] }
    }

    fn modern() -> RuleSet {
        ScoringRuleTable::historical().rules_for_year(2015).unwrap()
    }

    #[test]
    fn test_dominant_leader_decided_early() {
        // The gap grows by 7 a round and perfect play is worth 25 a race:
        // decided once 7r > 25(10 - r), i.e. from round 8.
        let evaluator = SeasonEvaluator::new(dominant_season(10), modern(), 20.0).unwrap();
        assert_eq!(evaluator.earliest_decided_round(), 8);
        assert_eq!(linear_scan(&evaluator), 8);
    }

    fn alternating(rounds: u32) -> SeasonData {
        let mut season = dominant_season(rounds);
        for (i, rows) in season.results.iter_mut().enumerate() {
            if i % 2 == 1 {
                rows[0].position = Position::Classified(2);
                rows[1].position = Position::Classified(1);
            }
        }
        season
    }

    #[test]
    fn test_decided_only_at_final_round() {
        let evaluator = SeasonEvaluator::new(alternating(3), modern(), 20.0).unwrap();
        assert!(!evaluator.is_decided_at(2));
        assert!(evaluator.is_decided_at(3));
        assert_eq!(evaluator.earliest_decided_round(), 3);
    }

    #[test]
    fn test_never_decided_returns_final_round() {
        // Level on points after the last race: still open, so the answer is the final round.
        let evaluator = SeasonEvaluator::new(alternating(2), modern(), 20.0).unwrap();
        assert!(!evaluator.is_decided_at(2));
        assert_eq!(evaluator.earliest_decided_round(), 2);
    }

    #[test]
    fn test_single_competitor_is_insufficient() {
        let mut season = dominant_season(3);
        for rows in &mut season.results {
            rows.truncate(1);
        }
        let err = SeasonEvaluator::new(season, modern(), 20.0).unwrap_err();
        assert!(matches!(err, TitleError::InsufficientData { year: 2015, .. }));
    }

    #[test]
    fn test_zero_rounds_is_insufficient() {
        let season = SeasonData { year: 2015, races: vec![], results: vec![], sprint_results: vec![] };
        assert!(matches!(
            earliest_decided_round(season, modern(), 20.0),
            Err(TitleError::InsufficientData { .. })
        ));
        assert_eq!(earliest_round(0, |_| true), None);
    }

    #[test]
    fn test_decreasing_sprint_counts_do_not_panic() {
        let mut season = dominant_season(2);
        season.races[0].has_sprint = true;
        season.races[0].cumulative_sprints = 1;
        season.races[1].cumulative_sprints = 0;
        let evaluator = SeasonEvaluator::new(season, modern(), 20.0).unwrap();
        let timeline = evaluator.timeline();
        assert_eq!(timeline.len(), 2);
        assert!(evaluator.earliest_decided_round() <= 2);
    }

    #[test]
    fn test_timeline_identities() {
        let evaluator = SeasonEvaluator::new(dominant_season(4), modern(), 20.0).unwrap();
        let timeline = evaluator.timeline();
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline[1].leader, Some(1));
        assert_eq!(timeline[1].runner_up, Some(2));
        assert_eq!(timeline[1].leader_points, 50.0);
        assert_eq!(timeline[1].runner_up_points, 36.0);
    }

    proptest! {
        #[test]
        fn prop_binary_search_matches_linear_scan(
            seed in any::<u64>(),
            rounds in 1u32..=25,
            competitors in 2u32..8,
            sprint_every in prop::option::of(2u32..6),
        ) {
            let shape = SeasonShape { rounds, competitors, sprint_every, retirement_prob: 0.0, noise: 1.0 };
            let season = generate_season(2022, &shape, seed);
            let rules = ScoringRuleTable::historical().rules_for_year(2022).unwrap();
            let evaluator = SeasonEvaluator::new(season, rules, 20.0).unwrap();
            prop_assert_eq!(evaluator.earliest_decided_round(), linear_scan(&evaluator));
        }

        #[test]
        fn prop_decided_is_monotonic(
            seed in any::<u64>(),
            rounds in 1u32..=25,
            competitors in 2u32..8,
            retirement_prob in 0.0f64..0.5,
        ) {
            let shape = SeasonShape { rounds, competitors, sprint_every: Some(4), retirement_prob, noise: 0.5 };
            let season = generate_season(2021, &shape, seed);
            let rules = ScoringRuleTable::historical().rules_for_year(2021).unwrap();
            prop_assume!(season.classified_competitors() >= 2);
            let evaluator = SeasonEvaluator::new(season, rules, 20.0).unwrap();
            let labels: Vec<bool> = evaluator.timeline().iter().map(|o| o.label.is_decided()).collect();
            let first = labels.iter().position(|&d| d);
            if let Some(first) = first {
                prop_assert!(labels[first..].iter().all(|&d| d));
            }
        }
    }
}
