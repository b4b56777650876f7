use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::batch::{BatchConfig, BatchReport, BatchRunner};
use crate::constants::REFERENCE_CHAMPION_BASELINE;
use crate::error::TitleError;
use crate::loader::load_dataset;
use crate::points::points_fractional;
use crate::rules::ScoringRuleTable;
use crate::search::earliest_decided_round;
use crate::synthetic::{generate_season, SeasonShape};

fn to_py_err(err: TitleError) -> PyErr {
    match err {
        TitleError::Io(_) | TitleError::Csv(_) => PyIOError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Points for a (possibly fractional) finishing position under `ladder`.
#[pyfunction]
#[pyo3(name = "points_for_position")]
fn py_points_for_position(position: f64, ladder: Vec<u32>) -> f64 {
    points_fractional(position, &ladder)
}

/// Historical (race ladder, sprint ladder, fastest-lap bonus) for a year.
#[pyfunction]
#[pyo3(name = "rules_for_year")]
fn py_rules_for_year(year: u16) -> PyResult<(Vec<u32>, Vec<u32>, u32)> {
    let rules = ScoringRuleTable::historical()
        .rules_for_year(year)
        .map_err(to_py_err)?;
    Ok((rules.race_ladder, rules.sprint_ladder, rules.fastest_lap_bonus))
}

/// Earliest decided round of a seeded synthetic season.
#[pyfunction]
#[pyo3(name = "decided_round_synthetic")]
#[pyo3(signature = (rounds, competitors, seed, year = 2023, champion_baseline = REFERENCE_CHAMPION_BASELINE))]
fn py_decided_round_synthetic(
    rounds: u32,
    competitors: u32,
    seed: u64,
    year: u16,
    champion_baseline: f64,
) -> PyResult<u32> {
    let shape = SeasonShape {
        rounds,
        competitors,
        ..Default::default()
    };
    let rules = ScoringRuleTable::historical()
        .rules_for_year(year)
        .map_err(to_py_err)?;
    earliest_decided_round(generate_season(year, &shape, seed), rules, champion_baseline).map_err(to_py_err)
}

/// Decision round per year for the tables in `data_dir`.
#[pyfunction]
#[pyo3(name = "run_batch")]
#[pyo3(signature = (data_dir, first_year, last_year, use_reference_baseline = false))]
fn py_run_batch(
    py: Python<'_>,
    data_dir: &str,
    first_year: u16,
    last_year: u16,
    use_reference_baseline: bool,
) -> PyResult<HashMap<u16, u32>> {
    let mut config = BatchConfig::new(first_year, last_year);
    config.use_reference_baseline = use_reference_baseline;
    let report: crate::error::Result<BatchReport> = py.allow_threads(|| {
        let data = load_dataset(data_dir)?;
        BatchRunner::new(config)?.run(&data)
    });
    let report = report.map_err(to_py_err)?;
    Ok(report
        .seasons
        .into_iter()
        .map(|s| (s.year, s.decided_round))
        .collect())
}

#[pymodule]
fn title_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_points_for_position, m)?)?;
    m.add_function(wrap_pyfunction!(py_rules_for_year, m)?)?;
    m.add_function(wrap_pyfunction!(py_decided_round_synthetic, m)?)?;
    m.add_function(wrap_pyfunction!(py_run_batch, m)?)?;

    m.add("REFERENCE_CHAMPION_BASELINE", REFERENCE_CHAMPION_BASELINE)?;

    Ok(())
}
