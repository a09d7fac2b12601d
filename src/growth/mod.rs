//! Network growth under uniform adoption probability.
//!
//! The population starts with `initial_referrers` users, each allowed
//! `capacity` successful referrals over their lifetime. Every simulated day
//! each active user (capacity left) converts one new user with probability
//! `p`; a conversion costs the referrer one unit of capacity and adds a fresh
//! referrer at full capacity on the same day.
//!
//! [`GrowthModel::expected_network_size`] tracks the expected number of users
//! at each remaining-capacity level, which keeps the recurrence exact and
//! linear in the number of days. [`GrowthModel::sample_network_size`] runs one
//! random realisation of the same process.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_INITIAL_REFERRERS: u32 = 100;
pub const DEFAULT_CAPACITY: u32 = 10;
/// Largest capacity the simulators honour; larger configured values are
/// clamped down to it.
pub const MAX_CAPACITY: u32 = 1_000;
/// Population above which [`GrowthModel::sample_network_size`] gives up.
pub const SAMPLE_POPULATION_LIMIT: u64 = 1_000_000;

/// Population parameters for the growth process.
///
/// `capacity` is clamped to [`MAX_CAPACITY`] when simulating.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GrowthModel {
    pub initial_referrers: u32,
    pub capacity: u32,
}

impl Default for GrowthModel {
    fn default() -> Self {
        Self {
            initial_referrers: DEFAULT_INITIAL_REFERRERS,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl GrowthModel {
    pub fn new(initial_referrers: u32, capacity: u32) -> Self {
        Self {
            initial_referrers,
            capacity,
        }
    }

    fn capacity_levels(&self) -> usize {
        if self.capacity > MAX_CAPACITY {
            warn!(
                "capacity {} above maximum {}, clamping",
                self.capacity, MAX_CAPACITY
            );
            return MAX_CAPACITY as usize;
        }
        self.capacity as usize
    }

    /// Expected total users after simulating day 0 through `days` inclusive.
    ///
    /// `p` is clamped into `[0, 1]`; NaN counts as 0.
    pub fn expected_network_size(&self, p: f64, days: u32) -> f64 {
        let p = clamp_probability(p);
        let top = self.capacity_levels();
        let initial = f64::from(self.initial_referrers);

        let mut buckets = vec![0.0_f64; top + 1];
        buckets[top] = initial;
        let mut next = vec![0.0_f64; top + 1];
        let mut total_successes = 0.0_f64;

        for _ in 0..=days {
            let active: f64 = buckets[1..].iter().sum();
            let successes = p * active;
            total_successes += successes;

            next.fill(0.0);
            next[0] = buckets[0];
            for level in 1..=top {
                let mass = buckets[level];
                next[level] += mass * (1.0 - p);
                next[level - 1] += mass * p;
            }
            next[top] += successes;
            std::mem::swap(&mut buckets, &mut next);
        }

        initial + total_successes
    }

    /// One random realisation of the process: total users after day `days`.
    ///
    /// Every active referrer flips its own coin each day, so the cost grows
    /// with the population. Returns `None` once the population exceeds
    /// [`SAMPLE_POPULATION_LIMIT`]; with `p = 1` and the default model that
    /// happens after about 14 days.
    pub fn sample_network_size<R: Rng + ?Sized>(
        &self,
        p: f64,
        days: u32,
        rng: &mut R,
    ) -> Option<u64> {
        let p = clamp_probability(p);
        let top = self.capacity_levels();
        let initial = u64::from(self.initial_referrers);

        let mut counts = vec![0u64; top + 1];
        counts[top] = initial;
        let mut total = initial;

        for day in 0..=days {
            if total > SAMPLE_POPULATION_LIMIT {
                warn!(
                    "sampled population {} exceeded {} on day {}, stopping",
                    total, SAMPLE_POPULATION_LIMIT, day
                );
                return None;
            }
            let mut converted = vec![0u64; top + 1];
            for level in 1..=top {
                converted[level] = (0..counts[level]).filter(|_| rng.gen_bool(p)).count() as u64;
            }
            let mut day_successes = 0u64;
            for level in 1..=top {
                let moved = converted[level];
                counts[level] -= moved;
                counts[level - 1] += moved;
                day_successes += moved;
            }
            if top > 0 {
                counts[top] += day_successes;
            }
            total += day_successes;
        }

        Some(total)
    }
}

/// [`GrowthModel::expected_network_size`] with the default population of 100
/// referrers at capacity 10.
pub fn expected_network_size(p: f64, days: u32) -> f64 {
    GrowthModel::default().expected_network_size(p, days)
}

pub(crate) fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        warn!("adoption probability is NaN, treating as 0");
        return 0.0;
    }
    if !(0.0..=1.0).contains(&p) {
        warn!("adoption probability {} outside [0, 1], clamping", p);
        return p.clamp(0.0, 1.0);
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn approx(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[test]
    fn zero_probability_never_grows() {
        for days in [0, 1, 7, 365] {
            assert_eq!(expected_network_size(0.0, days), 100.0);
        }
    }

    #[test]
    fn certain_adoption_on_day_zero_doubles() {
        assert_eq!(expected_network_size(1.0, 0), 200.0);
        // cohorts double daily: 100 · (2^4 - 1) new users after four days
        approx(expected_network_size(1.0, 3), 1_600.0, 1e-9);
    }

    #[test]
    fn certain_adoption_exhausts_capacity() {
        let model = GrowthModel::new(1, 2);
        // day 0: 1 -> 2, day 1: 2 -> 4, day 2: founder spent, three others convert -> 7
        approx(model.expected_network_size(1.0, 0), 2.0, 1e-12);
        approx(model.expected_network_size(1.0, 1), 4.0, 1e-12);
        approx(model.expected_network_size(1.0, 2), 7.0, 1e-12);
    }

    #[test]
    fn reference_values() {
        approx(expected_network_size(0.5, 5), 1_139.0625, 1e-2);
        approx(expected_network_size(0.1, 20), 740.02, 1e-2);
    }

    #[test]
    fn growth_is_monotone_in_probability_and_days() {
        let mut previous = 0.0;
        for step in 0..=10 {
            let size = expected_network_size(step as f64 / 10.0, 12);
            assert!(size >= previous);
            previous = size;
        }
        let mut previous = 0.0;
        for days in 0..30 {
            let size = expected_network_size(0.2, days);
            assert!(size >= previous);
            previous = size;
        }
    }

    #[test]
    fn out_of_range_probabilities_are_clamped() {
        assert_eq!(expected_network_size(-0.5, 4), 100.0);
        assert_eq!(expected_network_size(f64::NAN, 4), 100.0);
        assert_eq!(expected_network_size(3.0, 2), expected_network_size(1.0, 2));
    }

    #[test]
    fn zero_capacity_model_is_inert() {
        let model = GrowthModel::new(50, 0);
        assert_eq!(model.expected_network_size(0.9, 10), 50.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(model.sample_network_size(0.9, 10, &mut rng), Some(50));
    }

    #[test]
    fn sampler_matches_degenerate_probabilities() {
        let model = GrowthModel::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(model.sample_network_size(0.0, 30, &mut rng), Some(100));
        assert_eq!(model.sample_network_size(1.0, 0, &mut rng), Some(200));
        assert_eq!(model.sample_network_size(1.0, 3, &mut rng), Some(1_600));
    }

    #[test]
    fn sample_mean_tracks_expectation() {
        let model = GrowthModel::default();
        let mut rng = StdRng::seed_from_u64(42);
        let runs = 200;
        let sum: u64 = (0..runs)
            .map(|_| model.sample_network_size(0.3, 6, &mut rng).unwrap())
            .sum();
        let mean = sum as f64 / runs as f64;
        let expected = model.expected_network_size(0.3, 6);
        assert!(
            (mean - expected).abs() / expected < 0.03,
            "sample mean {mean} too far from {expected}"
        );
    }

    #[test]
    fn sampler_stops_past_population_limit() {
        let model = GrowthModel::default();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(model.sample_network_size(1.0, 60, &mut rng), None);
        assert!(model.sample_network_size(1.0, 10, &mut rng).is_some());
    }

    #[test]
    fn oversized_capacity_is_clamped() {
        let huge: GrowthModel =
            serde_json::from_str(r#"{"capacity": 4294967295}"#).unwrap();
        let capped = GrowthModel::new(100, MAX_CAPACITY);
        assert_eq!(huge.expected_network_size(0.0, 5), 100.0);
        assert_eq!(huge.expected_network_size(1.0, 0), 200.0);
        assert_eq!(
            huge.expected_network_size(0.2, 15),
            capped.expected_network_size(0.2, 15)
        );
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(huge.sample_network_size(1.0, 2, &mut rng), Some(800));
    }

    #[test]
    fn model_config_fills_defaults() {
        let model: GrowthModel = serde_json::from_str(r#"{"capacity": 3}"#).unwrap();
        assert_eq!(model, GrowthModel::new(100, 3));
        let model: GrowthModel = serde_json::from_str("{}").unwrap();
        assert_eq!(model, GrowthModel::default());
    }
}
