//! Influence rankings over a [`ReferralGraph`].
//!
//! Scores are recomputed from graph queries on every call; nothing here
//! mutates or caches graph state. Equal scores are ordered by ascending
//! user id so rankings are reproducible.

use crate::graph::{ReferralGraph, UserId};

/// Number of users reachable below `user`.
pub fn reach(graph: &ReferralGraph, user: &str) -> usize {
    graph.all_referrals(user).len()
}

/// Count of (ancestor, descendant) pairs whose connecting path runs through
/// `user`. In a forest that path is unique, so the count factors into
/// ancestors × descendants.
pub fn flow_centrality(graph: &ReferralGraph, user: &str) -> usize {
    graph.all_ancestors(user).len() * graph.all_referrals(user).len()
}

/// The `k` users with the largest reach, highest first.
pub fn top_k_by_reach(graph: &ReferralGraph, k: usize) -> Vec<(UserId, usize)> {
    top_k_by(graph, k, reach)
}

/// The `k` users with the largest flow centrality, highest first.
pub fn top_k_by_flow_centrality(graph: &ReferralGraph, k: usize) -> Vec<(UserId, usize)> {
    top_k_by(graph, k, flow_centrality)
}

fn top_k_by<F>(graph: &ReferralGraph, k: usize, score: F) -> Vec<(UserId, usize)>
where
    F: Fn(&ReferralGraph, &str) -> usize,
{
    if k == 0 {
        return Vec::new();
    }
    let mut scored: Vec<(UserId, usize)> = graph
        .nodes()
        .into_iter()
        .map(|user| {
            let value = score(graph, user.as_str());
            (user, value)
        })
        .collect();
    scored.sort_by(|(a_user, a_score), (b_user, b_score)| {
        b_score.cmp(a_score).then_with(|| a_user.cmp(b_user))
    });
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(edges: &[(&str, &str)]) -> ReferralGraph {
        let mut graph = ReferralGraph::new();
        for (referrer, candidate) in edges {
            graph.add_referral(*referrer, *candidate).unwrap();
        }
        graph
    }

    fn names(ranked: &[(UserId, usize)]) -> Vec<&str> {
        ranked.iter().map(|(user, _)| user.as_str()).collect()
    }

    #[test]
    fn reach_on_tree() {
        let graph = build(&[("A", "B"), ("A", "C"), ("A", "D"), ("B", "E"), ("B", "F")]);
        assert_eq!(reach(&graph, "A"), 5);
        assert_eq!(reach(&graph, "B"), 2);
        assert_eq!(reach(&graph, "C"), 0);
        assert_eq!(reach(&graph, "D"), 0);

        let top = top_k_by_reach(&graph, 2);
        assert_eq!(top, vec![("A".to_string(), 5), ("B".to_string(), 2)]);
    }

    #[test]
    fn reach_ties_break_lexically_and_large_k_returns_everyone() {
        let graph = build(&[("A", "B"), ("A", "C"), ("A", "D"), ("B", "E"), ("B", "F")]);
        let top = top_k_by_reach(&graph, 100);
        assert_eq!(names(&top), vec!["A", "B", "C", "D", "E", "F"]);
        assert!(top[2..].iter().all(|(_, score)| *score == 0));
    }

    #[test]
    fn flow_peaks_mid_chain() {
        let graph = build(&[("A", "B"), ("B", "C"), ("C", "D"), ("D", "E")]);
        assert_eq!(flow_centrality(&graph, "C"), 4);
        assert_eq!(flow_centrality(&graph, "B"), 3);
        assert_eq!(flow_centrality(&graph, "D"), 3);
        assert_eq!(flow_centrality(&graph, "A"), 0);
        assert_eq!(flow_centrality(&graph, "E"), 0);

        let top = top_k_by_flow_centrality(&graph, 3);
        assert_eq!(names(&top), vec!["C", "B", "D"]);
        assert_eq!(top[0].1, 4);
    }

    #[test]
    fn empty_inputs() {
        let graph = ReferralGraph::new();
        assert!(top_k_by_reach(&graph, 3).is_empty());
        assert!(top_k_by_flow_centrality(&graph, 3).is_empty());

        let graph = build(&[("A", "B")]);
        assert!(top_k_by_reach(&graph, 0).is_empty());
    }

    #[test]
    fn rankings_do_not_mutate_graph() {
        let graph = build(&[("A", "B"), ("B", "C")]);
        let digest = graph.state_digest();
        let _ = top_k_by_reach(&graph, 2);
        let _ = top_k_by_flow_centrality(&graph, 2);
        assert_eq!(graph.state_digest(), digest);
    }
}
