use serde::Serialize;
use std::fmt;

use crate::constants::TIE_EPSILON;
use crate::rule_set::RuleSet;

/// How the runner-up would finish against the leader in a scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Margin {
    Win,
    Tie,
}

/// Season state at a round, ordered from most open to decided.
///
/// Each open variant names the most optimistic scenario (for the runner-up)
/// under which the title can still change hands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum OutcomeLabel {
    /// Runner-up scores like a historical champion, leader keeps its own average
    ChampionPace(Margin),
    /// Runner-up wins everything left, leader keeps its own average
    PerfectVsAverage(Margin),
    /// Runner-up wins everything left, leader scores nothing more
    PerfectVsScoreless(Margin),
    Decided,
}

impl OutcomeLabel {
    pub fn is_decided(&self) -> bool {
        matches!(self, OutcomeLabel::Decided)
    }

    /// Every label in taxonomy order.
    pub fn all() -> [OutcomeLabel; 7] {
        use Margin::*;
        use OutcomeLabel::*;
        [
            ChampionPace(Win),
            ChampionPace(Tie),
            PerfectVsAverage(Win),
            PerfectVsAverage(Tie),
            PerfectVsScoreless(Win),
            PerfectVsScoreless(Tie),
            Decided,
        ]
    }
}

impl fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (scenario, margin) = match self {
            OutcomeLabel::ChampionPace(m) => ("#2 drives like a champion, #1 scores normally", m),
            OutcomeLabel::PerfectVsAverage(m) => ("#2 drives perfectly, #1 scores normally", m),
            OutcomeLabel::PerfectVsScoreless(m) => ("#2 drives perfectly, #1 scores 0 points", m),
            OutcomeLabel::Decided => return write!(f, "decided"),
        };
        match margin {
            Margin::Win => write!(f, "possible if {}", scenario),
            Margin::Tie => write!(f, "tie if {}", scenario),
        }
    }
}

/// Leader and runner-up totals after a round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundState {
    pub leader_points: f64,
    pub runner_up_points: f64,
    /// Leader's mean points per race so far this season
    pub leader_mean: f64,
}

impl RoundState {
    pub fn new(leader_points: f64, runner_up_points: f64, rounds_completed: u32) -> Self {
        let leader_mean = if rounds_completed == 0 {
            0.0
        } else {
            leader_points / rounds_completed as f64
        };
        RoundState {
            leader_points,
            runner_up_points,
            leader_mean,
        }
    }
}

/// Everything a scenario needs to project final totals.
#[derive(Clone, Copy, Debug)]
pub struct ScenarioInput<'a> {
    pub state: RoundState,
    pub races_remaining: u32,
    pub sprints_remaining: u32,
    pub rules: &'a RuleSet,
    pub champion_baseline: f64,
}

impl ScenarioInput<'_> {
    fn leader_average(&self) -> f64 {
        self.state.leader_points + self.races_remaining as f64 * self.state.leader_mean
    }

    fn runner_up_perfect(&self) -> f64 {
        self.state.runner_up_points
            + self.races_remaining as f64 * self.rules.best_race_haul()
            + self.sprints_remaining as f64 * self.rules.best_sprint_points()
    }
}

/// Projected final totals under one scenario: (leader, runner-up).
type Projection = fn(&ScenarioInput) -> (f64, f64);

fn champion_pace(input: &ScenarioInput) -> (f64, f64) {
    // A champion's pace never beats a perfect race; the cap keeps decidability monotonic in the round.
    let pace = input.champion_baseline.min(input.rules.best_race_haul());
    let runner_up = input.state.runner_up_points + input.races_remaining as f64 * pace;
    (input.leader_average(), runner_up)
}

fn perfect_vs_average(input: &ScenarioInput) -> (f64, f64) {
    (input.leader_average(), input.runner_up_perfect())
}

fn perfect_vs_scoreless(input: &ScenarioInput) -> (f64, f64) {
    (input.state.leader_points, input.runner_up_perfect())
}

/// Scenarios from most to least optimistic for the runner-up.
const SCENARIOS: [(Projection, fn(Margin) -> OutcomeLabel); 3] = [
    (champion_pace, OutcomeLabel::ChampionPace),
    (perfect_vs_average, OutcomeLabel::PerfectVsAverage),
    (perfect_vs_scoreless, OutcomeLabel::PerfectVsScoreless),
];

fn compare(leader: f64, runner_up: f64) -> Option<Margin> {
    if (runner_up - leader).abs() <= TIE_EPSILON {
        Some(Margin::Tie)
    } else if runner_up > leader {
        Some(Margin::Win)
    } else {
        None
    }
}

/// Classify the season state: the first scenario in which the runner-up can
/// still catch or tie the leader, otherwise `Decided`.
pub fn evaluate(
    state: RoundState,
    races_remaining: u32,
    sprints_remaining: u32,
    rules: &RuleSet,
    champion_baseline: f64,
) -> OutcomeLabel {
    let input = ScenarioInput {
        state,
        races_remaining,
        sprints_remaining,
        rules,
        champion_baseline,
    };
    SCENARIOS
        .iter()
        .find_map(|(project, label)| {
            let (leader, runner_up) = project(&input);
            compare(leader, runner_up).map(*label)
        })
        .unwrap_or(OutcomeLabel::Decided)
}
