//! Daily rate derivation.
//!
//! Pure functions that turn annual figures into the daily figures shown to
//! clients.

/// Assumed annual population growth rate (0.5%).
pub const GROWTH_RATE: f64 = 0.005;

/// Days used to spread an annual figure.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Crude rates are expressed per this many people.
pub const RATE_BASE: f64 = 1000.0;

// Values fit comfortably in i64 at national scale.
#[allow(clippy::cast_possible_truncation)]
fn round_to_i64(value: f64) -> i64 {
    value.round() as i64
}

/// Estimated daily increase of a population of `annual_value` people.
#[must_use]
pub fn daily_population_delta(annual_value: f64) -> i64 {
    round_to_i64(annual_value * GROWTH_RATE / DAYS_PER_YEAR)
}

/// Average births per day given annual births.
#[must_use]
pub fn daily_births(annual_value: f64) -> i64 {
    round_to_i64(annual_value / DAYS_PER_YEAR)
}

/// Annual births implied by a crude birth rate (per 1,000) and a population.
#[must_use]
pub fn annual_births_from_rate(rate_per_thousand: f64, total_population: f64) -> i64 {
    round_to_i64(rate_per_thousand * total_population / RATE_BASE)
}

/// Rounds a provider value to a whole count.
#[must_use]
pub fn whole_count(value: f64) -> i64 {
    round_to_i64(value)
}
