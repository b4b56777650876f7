/// Historical race points ladders as closed year ranges.
///
/// The last entry is open-ended: it applies to every year at or after its start.
pub const RACE_LADDERS: [(u16, u16, &[u32]); 6] = [
    (1950, 1959, &[8, 6, 4, 3, 2]),
    (1960, 1960, &[8, 6, 4, 3, 2, 1]),
    (1961, 1990, &[9, 6, 4, 3, 2, 1]),
    (1991, 2002, &[10, 6, 4, 3, 2, 1]),
    (2003, 2009, &[10, 8, 6, 5, 4, 3, 2, 1]),
    (2010, u16::MAX, &[25, 18, 15, 12, 10, 8, 6, 4, 2, 1]),
];

/// Sprint ladder in force up to and including `SPRINT_LADDER_CUTOFF`
pub const EARLY_SPRINT_LADDER: [u32; 3] = [3, 2, 1];

/// Sprint ladder for seasons after `SPRINT_LADDER_CUTOFF`
pub const CURRENT_SPRINT_LADDER: [u32; 8] = [8, 7, 6, 5, 4, 3, 2, 1];

pub const SPRINT_LADDER_CUTOFF: u16 = 2021;

/// Fastest-lap bonus is awarded before this year...
pub const FASTEST_LAP_WITHDRAWN: u16 = 1960;

/// ...and again after this one.
pub const FASTEST_LAP_REINSTATED: u16 = 2018;

/// Point value of the fastest-lap bonus when it is in force
pub const FASTEST_LAP_POINTS: u32 = 1;

/// Published champion points-per-race figure used to reproduce external comparisons.
pub const REFERENCE_CHAMPION_BASELINE: f64 = 18.0;

/// Placeholder used by the source tables for "not classified" / missing values
pub const NULL_MARKER: &str = r"\N";

/// Tolerance under which two projected totals count as a tie
pub const TIE_EPSILON: f64 = 1e-9;
