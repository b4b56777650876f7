use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::rule_set::{validate_bonus, validate_ladder, RuleSet};

/// Experimental replacements for the historical scoring rules.
///
/// Each field independently either keeps the computed value for the year
/// (`None`) or replaces it for every year. The object is validated once and
/// then handed to the rule table, which never changes it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleOverrides {
    #[serde(default)]
    race_ladder: Option<Vec<u32>>,
    #[serde(default)]
    sprint_ladder: Option<Vec<u32>>,
    #[serde(default)]
    fastest_lap_bonus: Option<u32>,
}

impl RuleOverrides {
    pub fn new(
        race_ladder: Option<Vec<u32>>,
        sprint_ladder: Option<Vec<u32>>,
        fastest_lap_bonus: Option<u32>,
    ) -> Result<Self> {
        let overrides = RuleOverrides {
            race_ladder,
            sprint_ladder,
            fastest_lap_bonus,
        };
        overrides.validate()?;
        Ok(overrides)
    }

    /// Read overrides from a TOML file with optional `race_ladder`,
    /// `sprint_ladder` and `fastest_lap_bonus` keys.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let overrides: RuleOverrides = toml::from_str(&text)?;
        overrides.validate()?;
        Ok(overrides)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(ladder) = &self.race_ladder {
            validate_ladder("race ladder override", ladder)?;
        }
        if let Some(ladder) = &self.sprint_ladder {
            validate_ladder("sprint ladder override", ladder)?;
        }
        if let Some(bonus) = self.fastest_lap_bonus {
            validate_bonus(bonus)?;
        }
        Ok(())
    }

    /// Replace every overridden component of `computed`.
    pub fn apply(&self, computed: RuleSet) -> RuleSet {
        RuleSet {
            race_ladder: self.race_ladder.clone().unwrap_or(computed.race_ladder),
            sprint_ladder: self.sprint_ladder.clone().unwrap_or(computed.sprint_ladder),
            fastest_lap_bonus: self.fastest_lap_bonus.unwrap_or(computed.fastest_lap_bonus),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.race_ladder.is_none() && self.sprint_ladder.is_none() && self.fastest_lap_bonus.is_none()
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merged_with(&self, other: &RuleOverrides) -> RuleOverrides {
        RuleOverrides {
            race_ladder: other.race_ladder.clone().or_else(|| self.race_ladder.clone()),
            sprint_ladder: other.sprint_ladder.clone().or_else(|| self.sprint_ladder.clone()),
            fastest_lap_bonus: other.fastest_lap_bonus.or(self.fastest_lap_bonus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TitleError;
    use std::io::Write;

    fn modern() -> RuleSet {
        RuleSet::new(vec![25, 18, 15], vec![8, 7], 1).unwrap()
    }

    #[test]
    fn test_empty_overrides_keep_computed() {
        let overrides = RuleOverrides::default();
        assert!(overrides.is_empty());
        assert_eq!(overrides.apply(modern()), modern());
    }

    #[test]
    fn test_override_replaces_only_given_fields() {
        let overrides = RuleOverrides::new(Some(vec![20, 19, 18]), None, Some(0)).unwrap();
        let rules = overrides.apply(modern());
        assert_eq!(rules.race_ladder, vec![20, 19, 18]);
        assert_eq!(rules.sprint_ladder, vec![8, 7]);
        assert_eq!(rules.fastest_lap_bonus, 0);
    }

    #[test]
    fn test_malformed_override_rejected() {
        let err = RuleOverrides::new(None, Some(vec![1, 2, 3]), None).unwrap_err();
        assert!(matches!(err, TitleError::Configuration(_)));
        assert!(RuleOverrides::new(None, None, Some(5)).is_err());
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "race_ladder = [10, 8, 6]").unwrap();
        writeln!(file, "fastest_lap_bonus = 1").unwrap();

        let overrides = RuleOverrides::read_from_file(file.path()).unwrap();
        assert_eq!(
            overrides,
            RuleOverrides::new(Some(vec![10, 8, 6]), None, Some(1)).unwrap()
        );
    }

    #[test]
    fn test_merged_with_prefers_other() {
        let base = RuleOverrides::new(Some(vec![10, 8]), None, Some(0)).unwrap();
        let cli = RuleOverrides::new(None, Some(vec![3, 2, 1]), Some(1)).unwrap();
        let merged = base.merged_with(&cli);
        assert_eq!(merged, RuleOverrides::new(Some(vec![10, 8]), Some(vec![3, 2, 1]), Some(1)).unwrap());
    }
}
