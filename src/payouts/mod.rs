use serde::{Deserialize, Serialize};

use crate::graph::{ReferralGraph, UserId};

pub type Amount = u64;

/// Multi-level reward split paid up a converting user's referrer chain.
///
/// `levels_bps[0]` is the direct referrer's share in basis points,
/// `levels_bps[1]` the referrer's referrer, and so on.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PayoutSchedule {
    pub levels_bps: Vec<u32>,
    pub minimum_payout: Amount,
    pub level_cap: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralPayout {
    pub recipient: UserId,
    pub amount: Amount,
    pub level: u32,
}

impl PayoutSchedule {
    pub fn new(levels_bps: Vec<u32>) -> Self {
        Self {
            levels_bps,
            ..Self::default()
        }
    }

    pub fn max_depth(&self) -> usize {
        match self.level_cap {
            Some(cap) => (cap as usize).min(self.levels_bps.len()),
            None => self.levels_bps.len(),
        }
    }

    /// Split `amount` earned by `origin` among its ancestors.
    ///
    /// Levels with a zero share and shares below `minimum_payout` are
    /// skipped; the level number stays the distance to `origin`. Shares
    /// above 10 000 bps saturate at `Amount::MAX` instead of wrapping.
    pub fn calculate_payouts(
        &self,
        graph: &ReferralGraph,
        origin: &str,
        amount: Amount,
    ) -> Vec<ReferralPayout> {
        if amount == 0 {
            return vec![];
        }
        let chain = graph.all_ancestors(origin);
        let mut payouts = Vec::new();
        for (idx, (recipient, bps)) in chain
            .into_iter()
            .zip(self.levels_bps.iter())
            .take(self.max_depth())
            .enumerate()
        {
            if *bps == 0 {
                continue;
            }
            let share = level_share(amount, *bps);
            if share < self.minimum_payout {
                continue;
            }
            payouts.push(ReferralPayout {
                recipient,
                amount: share,
                level: (idx + 1) as u32,
            });
        }
        payouts
    }

    pub fn total(payouts: &[ReferralPayout]) -> Amount {
        payouts.iter().map(|p| p.amount).sum()
    }
}

fn level_share(amount: Amount, bps: u32) -> Amount {
    let share = u128::from(amount) * u128::from(bps) / 10_000;
    Amount::try_from(share).unwrap_or(Amount::MAX)
}
