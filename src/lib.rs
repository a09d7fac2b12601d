//! Referral network primitives.
//!
//! The crate models referrals as a directed forest and exposes the pieces
//! that referral programs are usually built from:
//!
//! * [`graph`]: the forest itself, with single-referrer and acyclicity
//!   constraints enforced on every insertion.
//! * [`metrics`]: read-only influence rankings (reach and flow centrality).
//! * [`growth`]: expected-value simulation of network growth under a uniform
//!   adoption probability, plus a Monte-Carlo sampler of the same process.
//! * [`bonus`]: search for the smallest incentive that reaches a target
//!   network size, driven by an injected adoption-probability oracle.
//! * [`payouts`]: multi-level reward split along a user's referrer chain.
//!
//! Everything is in memory and synchronous. Persistence and transport are
//! left to the caller.

pub mod bonus;
pub mod graph;
pub mod growth;
pub mod metrics;
pub mod payouts;

mod error;

pub use bonus::{min_bonus_for_target, BonusOutcome, BonusSearch};
pub use error::{ConstraintViolation, ViolationKind};
pub use graph::{ReferralGraph, UserId};
pub use growth::{expected_network_size, GrowthModel};
pub use metrics::{top_k_by_flow_centrality, top_k_by_reach};
pub use payouts::{PayoutSchedule, ReferralPayout};
