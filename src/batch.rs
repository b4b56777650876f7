use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::baseline::{BaselineSource, ChampionBaselines};
use crate::constants::REFERENCE_CHAMPION_BASELINE;
use crate::data::Dataset;
use crate::decidability::OutcomeLabel;
use crate::error::{Result, TitleError};
use crate::overrides::RuleOverrides;
use crate::rule_set::RuleSet;
use crate::rules::ScoringRuleTable;
use crate::search::{SeasonEvaluator, SeasonOutcome};

fn default_reference_baseline() -> f64 {
    REFERENCE_CHAMPION_BASELINE
}

/// Settings for one batch run over a range of seasons.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    pub first_year: u16,
    pub last_year: u16,
    #[serde(default)]
    pub overrides: RuleOverrides,
    /// Use the fixed reference baseline instead of the historical one
    #[serde(default)]
    pub use_reference_baseline: bool,
    #[serde(default = "default_reference_baseline")]
    pub reference_baseline: f64,
    /// Record the outcome after every round, not just the decision round
    #[serde(default)]
    pub timeline: bool,
}

impl BatchConfig {
    pub fn new(first_year: u16, last_year: u16) -> Self {
        BatchConfig {
            first_year,
            last_year,
            overrides: RuleOverrides::default(),
            use_reference_baseline: false,
            reference_baseline: REFERENCE_CHAMPION_BASELINE,
            timeline: false,
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BatchConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_year > self.last_year {
            return Err(TitleError::Configuration(format!(
                "year range {}..={} is empty",
                self.first_year, self.last_year
            )));
        }
        if !(self.reference_baseline.is_finite() && self.reference_baseline >= 0.0) {
            return Err(TitleError::Configuration(format!(
                "reference baseline must be a non-negative number, got {}",
                self.reference_baseline
            )));
        }
        self.overrides.validate()
    }

    pub fn baseline_source(&self) -> BaselineSource {
        if self.use_reference_baseline {
            BaselineSource::Reference(self.reference_baseline)
        } else {
            BaselineSource::Computed
        }
    }
}

/// Coarse cancellation flag checked before each season starts.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeasonReport {
    pub year: u16,
    pub total_rounds: u32,
    pub decided_round: u32,
    pub rules: RuleSet,
    pub champion_baseline: f64,
    /// State at the decision round
    pub outcome: SeasonOutcome,
    pub leader_name: Option<String>,
    pub runner_up_name: Option<String>,
    /// Every round, when the timeline was requested
    pub timeline: Vec<SeasonOutcome>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeasonFailure {
    pub year: u16,
    pub reason: String,
    pub cancelled: bool,
}

/// Aggregate numbers for one outcome label across every timeline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabelStat {
    pub label: OutcomeLabel,
    pub description: String,
    /// (season, round) pairs with this label
    pub rounds_observed: usize,
    pub seasons_observed: usize,
    /// Mean of the first round the label appears, over seasons where it appears
    pub mean_first_round: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchSummary {
    pub seasons_evaluated: usize,
    pub seasons_failed: usize,
    pub mean_decided_round: Option<f64>,
    pub std_dev_decided_round: Option<f64>,
    pub median_decided_round: Option<f64>,
    /// Seasons per label at their decision round
    pub final_labels: Vec<(OutcomeLabel, usize)>,
    /// Empty unless timelines were recorded
    pub labels: Vec<LabelStat>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchReport {
    pub seasons: Vec<SeasonReport>,
    pub failures: Vec<SeasonFailure>,
    pub summary: BatchSummary,
    pub cancelled: bool,
}

enum SeasonRun {
    Done(Box<SeasonReport>),
    Failed(SeasonFailure),
}

/// Runs the decision-point search over every configured season.
#[derive(Clone, Debug)]
pub struct BatchRunner {
    config: BatchConfig,
    table: ScoringRuleTable,
}

impl BatchRunner {
    pub fn new(config: BatchConfig) -> Result<Self> {
        config.validate()?;
        let table = ScoringRuleTable::new(config.overrides.clone());
        Ok(BatchRunner { config, table })
    }

    pub fn with_table(config: BatchConfig, table: ScoringRuleTable) -> Result<Self> {
        config.validate()?;
        Ok(BatchRunner { config, table })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn table(&self) -> &ScoringRuleTable {
        &self.table
    }

    pub fn run(&self, data: &Dataset) -> Result<BatchReport> {
        self.run_with_cancel(data, &CancelToken::new())
    }

    /// Evaluate every season in parallel.
    ///
    /// Rule lookup failures abort the run. Seasons that cannot be evaluated
    /// are recorded as failures and the rest continue.
    pub fn run_with_cancel(&self, data: &Dataset, cancel: &CancelToken) -> Result<BatchReport> {
        let years: Vec<(u16, RuleSet)> = (self.config.first_year..=self.config.last_year)
            .map(|year| self.table.rules_for_year(year).map(|rules| (year, rules)))
            .collect::<Result<_>>()?;

        info!(
            first = self.config.first_year,
            last = self.config.last_year,
            "evaluating {} seasons",
            years.len()
        );

        let baselines = ChampionBaselines::compute(
            data,
            years.iter().map(|(_, rules)| rules.clone()),
            self.config.baseline_source(),
        );

        let runs: Vec<SeasonRun> = years
            .into_par_iter()
            .map(|(year, rules)| self.run_season(data, &baselines, year, rules, cancel))
            .collect();

        let mut seasons = Vec::new();
        let mut failures = Vec::new();
        for run in runs {
            match run {
                SeasonRun::Done(report) => seasons.push(*report),
                SeasonRun::Failed(failure) => {
                    if !failure.cancelled {
                        warn!(year = failure.year, "season skipped: {}", failure.reason);
                    }
                    failures.push(failure);
                }
            }
        }

        let cancelled = failures.iter().any(|f| f.cancelled);
        let summary = summarize(&seasons, failures.len());
        if let Some(mean) = summary.mean_decided_round {
            info!(mean, seasons = seasons.len(), "average season decided after {:.2} races", mean);
        }

        Ok(BatchReport {
            seasons,
            failures,
            summary,
            cancelled,
        })
    }

    fn run_season(
        &self,
        data: &Dataset,
        baselines: &ChampionBaselines,
        year: u16,
        rules: RuleSet,
        cancel: &CancelToken,
    ) -> SeasonRun {
        if cancel.is_cancelled() {
            return SeasonRun::Failed(SeasonFailure {
                year,
                reason: TitleError::Cancelled.to_string(),
                cancelled: true,
            });
        }

        let evaluated = data
            .season(year)
            .ok_or_else(|| TitleError::insufficient(year, "no races in dataset"))
            .and_then(|season| {
                let baseline = baselines.get(&rules).ok_or_else(|| {
                    TitleError::MissingReference(format!("champion baseline for {}", rules))
                })?;
                SeasonEvaluator::new(season, rules, baseline).map(|e| (e, baseline))
            });

        let (evaluator, champion_baseline) = match evaluated {
            Ok(pair) => pair,
            Err(err) => {
                return SeasonRun::Failed(SeasonFailure {
                    year,
                    reason: err.to_string(),
                    cancelled: false,
                })
            }
        };

        let decided_round = evaluator.earliest_decided_round();
        let outcome = evaluator.outcome_at(decided_round);
        let timeline = if self.config.timeline {
            evaluator.timeline()
        } else {
            Vec::new()
        };

        SeasonRun::Done(Box::new(SeasonReport {
            year,
            total_rounds: evaluator.total_rounds(),
            decided_round,
            rules: evaluator.rules().clone(),
            champion_baseline,
            leader_name: outcome.leader.map(|id| data.driver_name(id)),
            runner_up_name: outcome.runner_up.map(|id| data.driver_name(id)),
            outcome,
            timeline,
        }))
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn summarize(seasons: &[SeasonReport], seasons_failed: usize) -> BatchSummary {
    let rounds: Vec<f64> = seasons.iter().map(|s| s.decided_round as f64).collect();
    let (mean, std_dev, median) = if rounds.is_empty() {
        (None, None, None)
    } else {
        (
            finite(rounds.iter().mean()),
            finite(rounds.iter().std_dev()),
            finite(Data::new(rounds.clone()).median()),
        )
    };

    let final_labels = OutcomeLabel::all()
        .into_iter()
        .map(|label| (label, seasons.iter().filter(|s| s.outcome.label == label).count()))
        .filter(|(_, count)| *count > 0)
        .collect();

    let with_timeline: Vec<&SeasonReport> = seasons.iter().filter(|s| !s.timeline.is_empty()).collect();
    let labels = if with_timeline.is_empty() {
        Vec::new()
    } else {
        OutcomeLabel::all()
            .into_iter()
            .map(|label| label_stat(label, &with_timeline))
            .collect()
    };

    BatchSummary {
        seasons_evaluated: seasons.len(),
        seasons_failed,
        mean_decided_round: mean,
        std_dev_decided_round: std_dev,
        median_decided_round: median,
        final_labels,
        labels,
    }
}

fn label_stat(label: OutcomeLabel, seasons: &[&SeasonReport]) -> LabelStat {
    let rounds_observed = seasons
        .iter()
        .flat_map(|s| s.timeline.iter())
        .filter(|o| o.label == label)
        .count();
    let first_rounds: Vec<f64> = seasons
        .iter()
        .filter_map(|s| s.timeline.iter().find(|o| o.label == label))
        .map(|o| o.round as f64)
        .collect();
    let mean_first_round = if first_rounds.is_empty() {
        None
    } else {
        finite(first_rounds.iter().mean())
    };
    LabelStat {
        label,
        description: label.to_string(),
        rounds_observed,
        seasons_observed: first_rounds.len(),
        mean_first_round,
    }
}
