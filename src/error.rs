use thiserror::Error;

use crate::graph::UserId;

/// Reason a referral insertion was refused. The graph is left untouched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// A user tried to refer themselves.
    #[error("self-referral is not allowed: {user}")]
    SelfReferral { user: UserId },

    /// The candidate is already attached to a referrer.
    #[error("{candidate} already has a referrer ({referrer})")]
    AlreadyReferred { candidate: UserId, referrer: UserId },

    /// The candidate is an ancestor of the referrer, so the edge would close a loop.
    #[error("referral {referrer} -> {candidate} would create a cycle")]
    Cycle { referrer: UserId, candidate: UserId },
}

/// Fieldless category of a [`ConstraintViolation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    SelfReferral,
    AlreadyReferred,
    Cycle,
}

impl ConstraintViolation {
    pub fn kind(&self) -> ViolationKind {
        match self {
            ConstraintViolation::SelfReferral { .. } => ViolationKind::SelfReferral,
            ConstraintViolation::AlreadyReferred { .. } => ViolationKind::AlreadyReferred,
            ConstraintViolation::Cycle { .. } => ViolationKind::Cycle,
        }
    }
}
