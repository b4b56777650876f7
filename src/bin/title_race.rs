//! title_race CLI
//!
//! Finds the round at which each championship was settled, optionally under
//! replacement scoring rules.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use title_core::{load_dataset, BatchConfig, BatchReport, BatchRunner, RuleOverrides, ScoringRuleTable, SeasonReport};

const DEFAULT_FIRST_YEAR: u16 = 1994;
const DEFAULT_LAST_YEAR: u16 = 2023;

#[derive(Parser)]
#[command(name = "title_race")]
#[command(about = "How early was each championship decided?", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every season in a year range
    Batch {
        /// Directory holding the CSV tables
        #[arg(long)]
        data: PathBuf,

        /// TOML batch configuration; flags below take precedence
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        first_year: Option<u16>,

        #[arg(long)]
        last_year: Option<u16>,

        #[command(flatten)]
        rules: RuleArgs,

        #[command(flatten)]
        baseline: BaselineArgs,

        /// Record the outcome after every round
        #[arg(long, default_value = "false")]
        timeline: bool,

        /// Print the report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Round-by-round outcomes for one season
    Season {
        #[arg(long)]
        data: PathBuf,

        #[arg(long)]
        year: u16,

        #[command(flatten)]
        rules: RuleArgs,

        #[command(flatten)]
        baseline: BaselineArgs,

        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Print the scoring rules in force for a year
    Rules {
        #[arg(long)]
        year: u16,

        #[command(flatten)]
        rules: RuleArgs,

        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[derive(Args)]
struct RuleArgs {
    /// TOML file with race_ladder / sprint_ladder / fastest_lap_bonus keys
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Race ladder for every year, e.g. 25,18,15
    #[arg(long, value_delimiter = ',')]
    race_ladder: Option<Vec<u32>>,

    /// Sprint ladder for every year, e.g. 8,7,6
    #[arg(long, value_delimiter = ',')]
    sprint_ladder: Option<Vec<u32>>,

    /// Fastest-lap bonus for every year (0 or 1)
    #[arg(long)]
    fastest_lap_bonus: Option<u32>,
}

impl RuleArgs {
    /// Layer the overrides file and then the individual flags onto `base`.
    fn resolve(&self, base: &RuleOverrides) -> Result<RuleOverrides> {
        let mut merged = base.clone();
        if let Some(path) = &self.overrides {
            let from_file = RuleOverrides::read_from_file(path)
                .with_context(|| format!("reading overrides from {}", path.display()))?;
            merged = merged.merged_with(&from_file);
        }
        let flags = RuleOverrides::new(
            self.race_ladder.clone(),
            self.sprint_ladder.clone(),
            self.fastest_lap_bonus,
        )
        .context("invalid rule override flags")?;
        Ok(merged.merged_with(&flags))
    }
}

#[derive(Args)]
struct BaselineArgs {
    /// Use the fixed reference champion pace instead of the historical one
    #[arg(long, default_value = "false")]
    reference: bool,

    /// Reference champion pace in points per race (implies --reference)
    #[arg(long)]
    reference_baseline: Option<f64>,
}

impl BaselineArgs {
    fn apply(&self, config: &mut BatchConfig) {
        if self.reference {
            config.use_reference_baseline = true;
        }
        if let Some(value) = self.reference_baseline {
            config.use_reference_baseline = true;
            config.reference_baseline = value;
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Batch {
            data,
            config,
            first_year,
            last_year,
            rules,
            baseline,
            timeline,
            json,
        } => {
            let mut batch = match &config {
                Some(path) => BatchConfig::read_from_file(path)
                    .with_context(|| format!("reading config from {}", path.display()))?,
                None => BatchConfig::new(DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR),
            };
            if let Some(year) = first_year {
                batch.first_year = year;
            }
            if let Some(year) = last_year {
                batch.last_year = year;
            }
            batch.overrides = rules.resolve(&batch.overrides)?;
            baseline.apply(&mut batch);
            batch.timeline |= timeline;

            let report = run(&data, batch)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_batch(&report);
            }
        }

        Commands::Season {
            data,
            year,
            rules,
            baseline,
            json,
        } => {
            let mut batch = BatchConfig::new(year, year);
            batch.overrides = rules.resolve(&batch.overrides)?;
            batch.timeline = true;
            baseline.apply(&mut batch);

            let report = run(&data, batch)?;
            if let Some(failure) = report.failures.first() {
                bail!("season {} could not be evaluated: {}", failure.year, failure.reason);
            }
            let Some(season) = report.seasons.first() else {
                bail!("season {} produced no report", year);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(season)?);
            } else {
                print_season(season);
            }
        }

        Commands::Rules { year, rules, json } => {
            let table = ScoringRuleTable::new(rules.resolve(&RuleOverrides::default())?);
            let rule_set = table.rules_for_year(year)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rule_set)?);
            } else {
                println!("{}: {}", year, rule_set);
            }
        }
    }

    Ok(())
}

fn run(data: &Path, config: BatchConfig) -> Result<BatchReport> {
    let dataset = load_dataset(data).with_context(|| format!("loading tables from {}", data.display()))?;
    let runner = BatchRunner::new(config).context("invalid batch configuration")?;
    Ok(runner.run(&dataset)?)
}

fn name_or_dash(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("-")
}

fn print_batch(report: &BatchReport) {
    println!(
        "{:<6} {:>7} {:>7}  {:<24} {:<24} {}",
        "year", "decided", "rounds", "leader", "runner-up", "state"
    );
    for season in &report.seasons {
        println!(
            "{:<6} {:>7} {:>7}  {:<24} {:<24} {}",
            season.year,
            season.decided_round,
            season.total_rounds,
            name_or_dash(&season.leader_name),
            name_or_dash(&season.runner_up_name),
            season.outcome.label
        );
    }
    for failure in &report.failures {
        println!("{:<6} skipped: {}", failure.year, failure.reason);
    }

    let summary = &report.summary;
    println!();
    println!(
        "seasons: {} evaluated, {} skipped",
        summary.seasons_evaluated, summary.seasons_failed
    );
    if let (Some(mean), Some(median)) = (summary.mean_decided_round, summary.median_decided_round) {
        println!(
            "decided after {:.2} races on average (median {:.1}, sd {:.2})",
            mean,
            median,
            summary.std_dev_decided_round.unwrap_or(0.0)
        );
    }
    for (label, count) in &summary.final_labels {
        println!("  {:>3} x {}", count, label);
    }
    for stat in &summary.labels {
        if let Some(first) = stat.mean_first_round {
            println!(
                "  {:<40} first seen at round {:.2} on average ({} seasons, {} rounds)",
                stat.description, first, stat.seasons_observed, stat.rounds_observed
            );
        }
    }
}

fn print_season(season: &SeasonReport) {
    println!("{} under {}", season.year, season.rules);
    println!("champion pace {:.2} points per race", season.champion_baseline);
    println!(
        "{:>5} {:>8} {:>8}  {}",
        "round", "leader", "2nd", "state"
    );
    for outcome in &season.timeline {
        println!(
            "{:>5} {:>8.1} {:>8.1}  {}",
            outcome.round, outcome.leader_points, outcome.runner_up_points, outcome.label
        );
    }
    println!(
        "decided after round {} of {} ({} vs {})",
        season.decided_round,
        season.total_rounds,
        name_or_dash(&season.leader_name),
        name_or_dash(&season.runner_up_name)
    );
}
