use crate::constants::{
    CURRENT_SPRINT_LADDER, EARLY_SPRINT_LADDER, FASTEST_LAP_POINTS, FASTEST_LAP_REINSTATED,
    FASTEST_LAP_WITHDRAWN, RACE_LADDERS, SPRINT_LADDER_CUTOFF,
};
use crate::error::{Result, TitleError};
use crate::overrides::RuleOverrides;
use crate::rule_set::{validate_ladder, RuleSet};

/// A race ladder and the closed range of years it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LadderEra {
    pub first_year: u16,
    pub last_year: u16,
    pub ladder: Vec<u32>,
}

/// Year → rule set lookup with optional experimental overrides.
#[derive(Clone, Debug)]
pub struct ScoringRuleTable {
    eras: Vec<LadderEra>,
    overrides: RuleOverrides,
}

impl ScoringRuleTable {
    /// Historical table with the given overrides.
    pub fn new(overrides: RuleOverrides) -> Self {
        let eras = RACE_LADDERS
            .iter()
            .map(|&(first_year, last_year, ladder)| LadderEra {
                first_year,
                last_year,
                ladder: ladder.to_vec(),
            })
            .collect();
        ScoringRuleTable { eras, overrides }
    }

    pub fn historical() -> Self {
        Self::new(RuleOverrides::default())
    }

    /// Custom table. Eras must be sorted, non-overlapping, and carry non-increasing ladders.
    pub fn with_eras(eras: Vec<LadderEra>, overrides: RuleOverrides) -> Result<Self> {
        if eras.is_empty() {
            return Err(TitleError::Configuration("rule table has no eras".to_string()));
        }
        for era in &eras {
            if era.first_year > era.last_year {
                return Err(TitleError::Configuration(format!(
                    "era {}-{} is inverted",
                    era.first_year, era.last_year
                )));
            }
            validate_ladder("race ladder", &era.ladder)?;
        }
        for pair in eras.windows(2) {
            if pair[1].first_year <= pair[0].last_year {
                return Err(TitleError::Configuration(format!(
                    "eras {}-{} and {}-{} overlap or are out of order",
                    pair[0].first_year, pair[0].last_year, pair[1].first_year, pair[1].last_year
                )));
            }
        }
        overrides.validate()?;
        Ok(ScoringRuleTable { eras, overrides })
    }

    pub fn overrides(&self) -> &RuleOverrides {
        &self.overrides
    }

    /// Rule set for `year`, after overrides.
    ///
    /// A year not covered by any era is a configuration error, even when the
    /// race ladder is overridden.
    pub fn rules_for_year(&self, year: u16) -> Result<RuleSet> {
        let race_ladder = self.race_ladder_for(year)?;

        let sprint_ladder = if year <= SPRINT_LADDER_CUTOFF {
            EARLY_SPRINT_LADDER.to_vec()
        } else {
            CURRENT_SPRINT_LADDER.to_vec()
        };

        let fastest_lap_bonus = if year < FASTEST_LAP_WITHDRAWN || year > FASTEST_LAP_REINSTATED {
            FASTEST_LAP_POINTS
        } else {
            0
        };

        let computed = RuleSet {
            race_ladder,
            sprint_ladder,
            fastest_lap_bonus,
        };
        Ok(self.overrides.apply(computed))
    }

    fn race_ladder_for(&self, year: u16) -> Result<Vec<u32>> {
        let last = self.eras.len() - 1;
        self.eras
            .iter()
            .enumerate()
            .find(|(i, era)| {
                year >= era.first_year && (year <= era.last_year || *i == last)
            })
            .map(|(_, era)| era.ladder.clone())
            .ok_or_else(|| {
                TitleError::Configuration(format!("no race ladder configured for {}", year))
            })
    }
}
