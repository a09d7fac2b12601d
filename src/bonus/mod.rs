//! Minimum-incentive search.
//!
//! The adoption oracle maps a bonus (a non-negative multiple of the search
//! increment) to the probability that a referral succeeds. The oracle is
//! assumed monotone non-decreasing and expensive, so the search finds an
//! upper bound by doubling and then bisects on the increment grid, calling
//! the oracle at most once per bonus.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::growth::{clamp_probability, GrowthModel};

pub const DEFAULT_INCREMENT: u64 = 10;
pub const DEFAULT_INITIAL_HIGH: u64 = 100;

/// Search parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BonusSearch {
    /// Bonus granularity; every probed value is a multiple of it.
    pub increment: u64,
    /// First upper-bound guess for the exponential phase.
    pub initial_high: u64,
    pub model: GrowthModel,
}

impl Default for BonusSearch {
    fn default() -> Self {
        Self {
            increment: DEFAULT_INCREMENT,
            initial_high: DEFAULT_INITIAL_HIGH,
            model: GrowthModel::default(),
        }
    }
}

/// Smallest qualifying bonus and what it buys.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct BonusOutcome {
    pub bonus: u64,
    pub probability: f64,
    pub expected_size: f64,
    pub oracle_calls: usize,
}

impl BonusSearch {
    pub fn with_increment(mut self, increment: u64) -> Self {
        self.increment = increment;
        self
    }

    pub fn with_initial_high(mut self, initial_high: u64) -> Self {
        self.initial_high = initial_high;
        self
    }

    pub fn with_model(mut self, model: GrowthModel) -> Self {
        self.model = model;
        self
    }

    /// Find the smallest multiple of `increment` whose adoption probability
    /// grows the network to at least `target_size` within `days`.
    ///
    /// Returns `None` when even a saturated probability of 1.0 falls short,
    /// or when the doubling phase would overflow `u64`.
    pub fn min_bonus_for_target<F>(
        &self,
        days: u32,
        target_size: f64,
        adoption_prob: F,
    ) -> Option<BonusOutcome>
    where
        F: FnMut(u64) -> f64,
    {
        let increment = self.increment.max(1);
        let mut probe = Probe::new(self.model, days, target_size, adoption_prob);

        let mut low = 0u64;
        let mut high = round_up(self.initial_high, increment)?.max(increment);
        loop {
            let eval = probe.eval(high);
            if eval.reached {
                break;
            }
            if eval.probability >= 1.0 {
                debug!(
                    "target {} unreachable in {} days: adoption saturated at bonus {}",
                    target_size, days, high
                );
                return None;
            }
            low = high;
            high = match high.checked_mul(2) {
                Some(next) => next,
                None => {
                    debug!("bonus upper bound overflowed after {}", low);
                    return None;
                }
            };
        }

        // answer lies in [low, high] and high qualifies
        while high > low {
            let steps = (high - low) / increment;
            let mid = low + (steps / 2) * increment;
            if probe.eval(mid).reached {
                high = mid;
            } else {
                low = mid + increment;
            }
        }

        let best = probe.eval(high);
        debug!(
            "minimum bonus {} (p = {}, expected size {}) after {} oracle calls",
            high,
            best.probability,
            best.expected_size,
            probe.calls()
        );
        Some(BonusOutcome {
            bonus: high,
            probability: best.probability,
            expected_size: best.expected_size,
            oracle_calls: probe.calls(),
        })
    }
}

/// Smallest multiple of 10 that reaches `target_size` under the default
/// growth model. `initial_high` seeds the doubling phase.
pub fn min_bonus_for_target<F>(
    days: u32,
    target_size: f64,
    adoption_prob: F,
    initial_high: u64,
) -> Option<u64>
where
    F: FnMut(u64) -> f64,
{
    BonusSearch::default()
        .with_initial_high(initial_high)
        .min_bonus_for_target(days, target_size, adoption_prob)
        .map(|outcome| outcome.bonus)
}

fn round_up(value: u64, increment: u64) -> Option<u64> {
    match value % increment {
        0 => Some(value),
        rem => value.checked_add(increment - rem),
    }
}

#[derive(Clone, Copy, Debug)]
struct Evaluation {
    probability: f64,
    expected_size: f64,
    reached: bool,
}

/// Memoising wrapper around the oracle and the growth model.
struct Probe<F> {
    model: GrowthModel,
    days: u32,
    target_size: f64,
    oracle: F,
    seen: BTreeMap<u64, Evaluation>,
}

impl<F> Probe<F>
where
    F: FnMut(u64) -> f64,
{
    fn new(model: GrowthModel, days: u32, target_size: f64, oracle: F) -> Self {
        Self {
            model,
            days,
            target_size,
            oracle,
            seen: BTreeMap::new(),
        }
    }

    fn eval(&mut self, bonus: u64) -> Evaluation {
        if let Some(hit) = self.seen.get(&bonus) {
            return *hit;
        }
        let probability = clamp_probability((self.oracle)(bonus));
        let expected_size = self.model.expected_network_size(probability, self.days);
        let eval = Evaluation {
            probability,
            expected_size,
            reached: expected_size >= self.target_size,
        };
        trace!(
            "bonus {} -> p = {}, expected size {}, reached = {}",
            bonus,
            probability,
            expected_size,
            eval.reached
        );
        self.seen.insert(bonus, eval);
        eval
    }

    fn calls(&self) -> usize {
        self.seen.len()
    }
}
