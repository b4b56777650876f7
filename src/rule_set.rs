use serde::Serialize;
use std::fmt;

use crate::error::{Result, TitleError};

/// Scoring rules in force for a season: race ladder, sprint ladder, fastest-lap bonus.
///
/// Compared and hashed by value so seasons sharing identical rules share a
/// single champion baseline.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RuleSet {
    /// Points by finishing position, index 0 = 1st place
    pub race_ladder: Vec<u32>,

    /// Points by sprint finishing position (may be empty)
    pub sprint_ladder: Vec<u32>,

    /// Bonus for the fastest lap, 0 or 1
    pub fastest_lap_bonus: u32,
}

impl RuleSet {
    /// Create a rule set, rejecting ladders that increase by position or a bonus above 1.
    pub fn new(race_ladder: Vec<u32>, sprint_ladder: Vec<u32>, fastest_lap_bonus: u32) -> Result<Self> {
        validate_ladder("race ladder", &race_ladder)?;
        validate_ladder("sprint ladder", &sprint_ladder)?;
        validate_bonus(fastest_lap_bonus)?;
        Ok(RuleSet {
            race_ladder,
            sprint_ladder,
            fastest_lap_bonus,
        })
    }

    /// Points for a race win
    pub fn best_race_points(&self) -> f64 {
        self.race_ladder.first().copied().unwrap_or(0) as f64
    }

    /// Points for a sprint win, 0 without a sprint ladder
    pub fn best_sprint_points(&self) -> f64 {
        self.sprint_ladder.first().copied().unwrap_or(0) as f64
    }

    /// Most points one competitor can collect from a single race (win plus fastest lap)
    pub fn best_race_haul(&self) -> f64 {
        self.best_race_points() + self.fastest_lap_bonus as f64
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "race {:?} | sprint {:?} | fastest lap {}",
            self.race_ladder, self.sprint_ladder, self.fastest_lap_bonus
        )
    }
}

pub(crate) fn validate_ladder(name: &str, ladder: &[u32]) -> Result<()> {
    if let Some(pos) = ladder.windows(2).position(|w| w[1] > w[0]) {
        return Err(TitleError::Configuration(format!(
            "{} increases at position {}: {:?}",
            name,
            pos + 2,
            ladder
        )));
    }
    Ok(())
}

pub(crate) fn validate_bonus(bonus: u32) -> Result<()> {
    if bonus > 1 {
        return Err(TitleError::Configuration(format!(
            "fastest-lap bonus must be 0 or 1, got {}",
            bonus
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rejects_increasing_ladder() {
        let err = RuleSet::new(vec![10, 6, 8], vec![], 0).unwrap_err();
        assert!(matches!(err, TitleError::Configuration(_)));
    }

    #[test]
    fn test_rejects_large_bonus() {
        assert!(RuleSet::new(vec![10, 6], vec![], 2).is_err());
    }

    #[test]
    fn test_equal_rule_sets_hash_together() {
        let a = RuleSet::new(vec![10, 6, 4], vec![3, 2, 1], 0).unwrap();
        let b = RuleSet::new(vec![10, 6, 4], vec![3, 2, 1], 0).unwrap();
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_best_haul_includes_bonus() {
        let rules = RuleSet::new(vec![25, 18], vec![], 1).unwrap();
        assert_eq!(rules.best_race_haul(), 26.0);
        assert_eq!(rules.best_sprint_points(), 0.0);
    }
}
