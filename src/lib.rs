//! Title Core - championship decidability under alternative points systems.
//!
//! Estimates how early in a season the fight between the top two becomes
//! mathematically settled, and compares that across seasons and scoring
//! rules. Python bindings are available with the `python` feature.

pub mod baseline;
pub mod batch;
pub mod constants;
pub mod data;
pub mod decidability;
pub mod error;
pub mod loader;
pub mod overrides;
pub mod points;
pub mod rule_set;
pub mod rules;
pub mod search;
pub mod standings;
pub mod synthetic;

#[cfg(feature = "python")]
mod python;

pub use baseline::{season_champions, BaselineSource, Champion, ChampionBaselines};
pub use batch::{BatchConfig, BatchReport, BatchRunner, BatchSummary, CancelToken, SeasonFailure, SeasonReport};
pub use constants::REFERENCE_CHAMPION_BASELINE;
pub use data::{Dataset, Driver, DriverId, Race, RaceId, ResultRow, SeasonData, SprintResultRow, StandingRow};
pub use decidability::{evaluate, Margin, OutcomeLabel, RoundState};
pub use error::{Result, TitleError};
pub use loader::load_dataset;
pub use overrides::RuleOverrides;
pub use points::{fastest_lap_bonus, points, points_fractional, Position};
pub use rule_set::RuleSet;
pub use rules::{LadderEra, ScoringRuleTable};
pub use search::{earliest_decided_round, earliest_round, SeasonEvaluator, SeasonOutcome};
pub use standings::{accumulate, RoundStanding, SeasonStandings, StandingEntry};
