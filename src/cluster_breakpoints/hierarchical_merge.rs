use std::collections::BTreeSet;

use unwrap::unwrap;

use super::interval_pair::IntervalPair;
use super::maximal_cliques::Clique;

/// Weighted mean interval pair of a node group
///
/// Groups are never empty at this stage, so an empty group is treated as an internal error.
///
fn get_group_mean(nodes: &[IntervalPair], group: &Clique) -> IntervalPair {
    unwrap!(
        IntervalPair::weighted_mean(group.iter().map(|&x| &nodes[x])),
        "Empty group found in hierarchical merge"
    )
}

/// Sort groups by their weighted mean interval pair
///
/// Groups with the same mean are ordered by their node indexes.
///
fn sort_groups(nodes: &[IntervalPair], groups: Vec<Clique>) -> Vec<(IntervalPair, Clique)> {
    let mut groups = groups
        .into_iter()
        .map(|x| (get_group_mean(nodes, &x), x))
        .collect::<Vec<_>>();
    groups.sort();
    groups
}

/// Repeatedly merge groups with the neighboring groups in weighted mean order
///
/// In each pass the groups are sorted by weighted mean, and each group is compared only to the
/// groups immediately before and after it in this order. The union of any two adjacent groups
/// with means within `radius` becomes a candidate for the next pass. A group that merges with
/// neither of its neighbors is complete. Passes continue until no candidates remain.
///
/// A group may merge with both of its neighbors, so the output groups can share nodes.
///
/// Every pass produces fewer candidates than it has input groups, so the merge always finishes.
///
pub fn merge_ordered_groups(
    nodes: &[IntervalPair],
    groups: Vec<Clique>,
    radius: f64,
) -> Vec<Clique> {
    let mut queue = sort_groups(nodes, groups);
    let mut complete_groups = Vec::new();
    let mut observed_complete = BTreeSet::new();

    while !queue.is_empty() {
        let mut candidates = Vec::new();
        let mut observed_candidates = BTreeSet::new();
        let mut add_candidate = |x: Clique| {
            if observed_candidates.insert(x.clone()) {
                candidates.push(x);
            }
        };

        for (group_index, (mean, group)) in queue.iter().enumerate() {
            let mut merged = false;
            if group_index > 0 {
                let (prev_mean, prev_group) = &queue[group_index - 1];
                if prev_mean.dist(mean) <= radius {
                    add_candidate(group.union(prev_group).copied().collect());
                    merged = true;
                }
            }
            if let Some((next_mean, next_group)) = queue.get(group_index + 1)
                && next_mean.dist(mean) <= radius
            {
                add_candidate(group.union(next_group).copied().collect());
                merged = true;
            }
            if !merged && observed_complete.insert(group.clone()) {
                complete_groups.push(group.clone());
            }
        }

        queue = sort_groups(nodes, candidates);
    }

    complete_groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;

    fn ip(start: (i64, i64), end: (i64, i64), id: usize) -> IntervalPair {
        IntervalPair::new(
            Interval::new(start.0, start.1),
            Interval::new(end.0, end.1),
            id,
        )
    }

    fn sorted_groups(groups: Vec<Clique>) -> Vec<Vec<usize>> {
        let mut x = groups
            .into_iter()
            .map(|x| x.into_iter().collect::<Vec<_>>())
            .collect::<Vec<_>>();
        x.sort();
        x
    }

    fn get_test_nodes() -> Vec<IntervalPair> {
        // a, b, c, d, e
        vec![
            ip((1, 1), (1, 1), 0),
            ip((10, 10), (10, 10), 1),
            ip((15, 20), (15, 20), 2),
            ip((24, 24), (24, 24), 3),
            ip((33, 33), (33, 33), 4),
        ]
    }

    #[test]
    fn test_merge_with_both_neighbors() {
        let nodes = get_test_nodes();
        let groups = vec![
            Clique::from([0, 1]),
            Clique::from([2]),
            Clique::from([3, 4]),
        ];
        let groups = merge_ordered_groups(&nodes, groups, 12.0);
        assert_eq!(sorted_groups(groups), vec![vec![0, 1, 2], vec![2, 3, 4]]);
    }

    #[test]
    fn test_merge_is_stable() {
        let nodes = get_test_nodes();
        let groups = vec![
            Clique::from([0, 1]),
            Clique::from([2]),
            Clique::from([3, 4]),
        ];
        let groups = merge_ordered_groups(&nodes, groups, 12.0);
        let regroups = merge_ordered_groups(&nodes, groups.clone(), 12.0);
        assert_eq!(sorted_groups(groups), sorted_groups(regroups));
    }

    #[test]
    fn test_distant_groups_are_unchanged() {
        let nodes = get_test_nodes();
        let groups = vec![Clique::from([0]), Clique::from([2]), Clique::from([4])];
        let groups = merge_ordered_groups(&nodes, groups, 5.0);
        assert_eq!(sorted_groups(groups), vec![vec![0], vec![2], vec![4]]);
    }

    #[test]
    fn test_nearby_groups_merge_to_one() {
        // Every group is within radius of every other, so repeated neighbor merges join all of them
        let nodes = get_test_nodes();
        let groups = vec![Clique::from([0]), Clique::from([1]), Clique::from([3])];
        let groups = merge_ordered_groups(&nodes, groups, 100.0);
        assert_eq!(sorted_groups(groups), vec![vec![0, 1, 3]]);
    }

    #[test]
    fn test_only_adjacent_groups_merge() {
        // Groups 0 and 2 are within radius, but group 1 sorts between them
        let nodes = vec![
            ip((0, 0), (0, 0), 0),
            ip((1, 1), (100, 100), 1),
            ip((2, 2), (0, 0), 2),
        ];
        approx::assert_ulps_eq!(nodes[0].dist(&nodes[2]), 1.0, max_ulps = 4);
        approx::assert_ulps_eq!(nodes[0].dist(&nodes[1]), 50.5, max_ulps = 4);
        approx::assert_ulps_eq!(nodes[1].dist(&nodes[2]), 50.5, max_ulps = 4);

        let groups = vec![Clique::from([0]), Clique::from([1]), Clique::from([2])];
        let groups = merge_ordered_groups(&nodes, groups, 10.0);
        assert_eq!(sorted_groups(groups), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_empty_input() {
        let nodes = get_test_nodes();
        assert!(merge_ordered_groups(&nodes, Vec::new(), 10.0).is_empty());
    }
}
