use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::error::ConstraintViolation;

pub type UserId = String;

/// Directed forest of referrer → candidate edges.
///
/// Every candidate has at most one referrer, nobody refers themselves and
/// the edges never form a cycle. Insertion is the only mutation and it is
/// all-or-nothing: a rejected [`ReferralGraph::add_referral`] leaves the
/// graph exactly as it was.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GraphSnapshot", into = "GraphSnapshot")]
pub struct ReferralGraph {
    parents: BTreeMap<UserId, UserId>,
    children: BTreeMap<UserId, BTreeSet<UserId>>,
    nodes: BTreeSet<UserId>,
}

impl ReferralGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `referrer → candidate`.
    ///
    /// Constraints are checked in order: self-referral, existing referrer,
    /// then cycle. The cycle check walks the referrer's ancestor chain, so it
    /// costs O(depth of `referrer`).
    pub fn add_referral(
        &mut self,
        referrer: impl Into<UserId>,
        candidate: impl Into<UserId>,
    ) -> Result<(), ConstraintViolation> {
        let referrer = referrer.into();
        let candidate = candidate.into();
        if let Err(err) = self.check_constraints(&referrer, &candidate) {
            debug!("rejected referral {} -> {}: {}", referrer, candidate, err);
            return Err(err);
        }

        trace!("referral {} -> {}", referrer, candidate);
        self.parents.insert(candidate.clone(), referrer.clone());
        self.children
            .entry(referrer.clone())
            .or_default()
            .insert(candidate.clone());
        self.nodes.insert(referrer);
        self.nodes.insert(candidate);
        Ok(())
    }

    fn check_constraints(&self, referrer: &str, candidate: &str) -> Result<(), ConstraintViolation> {
        if referrer == candidate {
            return Err(ConstraintViolation::SelfReferral {
                user: candidate.to_owned(),
            });
        }
        if let Some(existing) = self.parents.get(candidate) {
            return Err(ConstraintViolation::AlreadyReferred {
                candidate: candidate.to_owned(),
                referrer: existing.clone(),
            });
        }
        // candidate being an ancestor of referrer would close a loop
        let mut current = referrer;
        while let Some(parent) = self.parents.get(current) {
            if parent == candidate {
                return Err(ConstraintViolation::Cycle {
                    referrer: referrer.to_owned(),
                    candidate: candidate.to_owned(),
                });
            }
            current = parent.as_str();
        }
        Ok(())
    }

    /// Users directly referred by `user`. The set is a copy.
    pub fn direct_referrals(&self, user: &str) -> BTreeSet<UserId> {
        self.children.get(user).cloned().unwrap_or_default()
    }

    /// Every strict descendant of `user`, in depth-first order.
    pub fn all_referrals(&self, user: &str) -> Vec<UserId> {
        let mut result = Vec::new();
        let mut stack: Vec<&UserId> = match self.children.get(user) {
            Some(direct) => direct.iter().collect(),
            None => return result,
        };
        while let Some(node) = stack.pop() {
            result.push(node.clone());
            if let Some(next) = self.children.get(node) {
                stack.extend(next.iter());
            }
        }
        result
    }

    /// Referrer chain of `user`, immediate referrer first.
    pub fn all_ancestors(&self, user: &str) -> Vec<UserId> {
        let mut chain = Vec::new();
        let mut current = user;
        while let Some(parent) = self.parents.get(current) {
            chain.push(parent.clone());
            current = parent.as_str();
        }
        chain
    }

    /// Snapshot of every user seen as referrer or candidate.
    pub fn nodes(&self) -> BTreeSet<UserId> {
        self.nodes.clone()
    }

    pub fn referrer_of(&self, user: &str) -> Option<&UserId> {
        self.parents.get(user)
    }

    pub fn contains(&self, user: &str) -> bool {
        self.nodes.contains(user)
    }

    /// Number of ancestors above `user`; 0 for roots and unknown users.
    pub fn depth(&self, user: &str) -> usize {
        let mut depth = 0;
        let mut current = user;
        while let Some(parent) = self.parents.get(current) {
            depth += 1;
            current = parent.as_str();
        }
        depth
    }

    /// Known users with no referrer, in lexical order.
    pub fn roots(&self) -> Vec<UserId> {
        self.nodes
            .iter()
            .filter(|user| !self.parents.contains_key(*user))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.parents.len()
    }

    /// SHA-256 commitment over the node set and the edge set.
    ///
    /// Both are hashed in sorted order with length-prefixed identifiers, so
    /// equal graphs always produce equal digests regardless of how they
    /// were built.
    pub fn state_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"referral-graph");
        hasher.update((self.nodes.len() as u64).to_le_bytes());
        for node in &self.nodes {
            hasher.update(b"node");
            update_id(&mut hasher, node);
        }
        hasher.update((self.parents.len() as u64).to_le_bytes());
        for (candidate, referrer) in &self.parents {
            hasher.update(b"edge");
            update_id(&mut hasher, referrer);
            update_id(&mut hasher, candidate);
        }
        hasher.finalize().into()
    }

    pub fn state_digest_hex(&self) -> String {
        hex::encode(self.state_digest())
    }
}

fn update_id(hasher: &mut Sha256, id: &str) {
    hasher.update((id.len() as u64).to_le_bytes());
    hasher.update(id.as_bytes());
}

/// Serialized form of a [`ReferralGraph`]: its `(referrer, candidate)` edges.
///
/// Deserialization replays the edges through `add_referral`, so a snapshot
/// that violates the forest constraints is rejected instead of loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub edges: Vec<(UserId, UserId)>,
}

impl From<ReferralGraph> for GraphSnapshot {
    fn from(graph: ReferralGraph) -> Self {
        let edges = graph
            .parents
            .into_iter()
            .map(|(candidate, referrer)| (referrer, candidate))
            .collect();
        Self { edges }
    }
}

impl TryFrom<GraphSnapshot> for ReferralGraph {
    type Error = ConstraintViolation;

    fn try_from(snapshot: GraphSnapshot) -> Result<Self, Self::Error> {
        let mut graph = ReferralGraph::new();
        for (referrer, candidate) in snapshot.edges {
            graph.add_referral(referrer, candidate)?;
        }
        Ok(graph)
    }
}
