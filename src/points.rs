use serde::{Deserialize, Serialize};

use crate::rule_set::RuleSet;

/// Finishing position of a competitor in a race or sprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Classified(u32),
    NotClassified,
}

impl Position {
    pub fn is_classified(&self) -> bool {
        matches!(self, Position::Classified(_))
    }
}

/// Points for a finishing position under `ladder`.
///
/// Unclassified finishes and positions past the end of the ladder score 0.
pub fn points(position: Position, ladder: &[u32]) -> f64 {
    match position {
        Position::NotClassified => 0.0,
        Position::Classified(0) => 0.0,
        Position::Classified(p) => ladder.get(p as usize - 1).copied().unwrap_or(0) as f64,
    }
}

/// Points for a mean (fractional) finishing position.
///
/// Between adjacent placings the value decays geometrically:
/// `points(p) * (points(p + 1) / points(p)) ^ frac`. No extrapolation is done
/// past the last scoring position. Positions below 1 are treated as 1.
pub fn points_fractional(position: f64, ladder: &[u32]) -> f64 {
    if !position.is_finite() {
        return 0.0;
    }
    let position = position.max(1.0);
    let floor = position.floor();
    let frac = position - floor;
    let p = floor as u32;

    let here = points(Position::Classified(p), ladder);
    if here == 0.0 {
        return 0.0;
    }
    if frac == 0.0 {
        return here;
    }
    let next = points(Position::Classified(p.saturating_add(1)), ladder);
    here * (next / here).powf(frac)
}

/// Fastest-lap bonus for one race.
///
/// Only the rank-1 lap holder who also scored race points is eligible.
pub fn fastest_lap_bonus(fastest_lap_rank: Option<u32>, race_points: f64, rules: &RuleSet) -> f64 {
    match fastest_lap_rank {
        Some(1) if race_points > 0.0 => rules.fastest_lap_bonus as f64,
        _ => 0.0,
    }
}
