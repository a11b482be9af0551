use std::collections::{BTreeMap, BTreeSet};

use super::ClusterError;
use super::proximity_graph::ProximityGraph;

/// A set of graph node indexes
pub type Clique = BTreeSet<usize>;

/// Clique sizes at or above this value are reported as a likely performance problem
pub const LARGE_CLIQUE_SIZE: usize = 20;

/// Collect every clique in `component` which is either of size `max_clique_size`, or can't be
/// extended by any other node
///
/// These are exactly the cliques of size `max_clique_size` or smaller which are not a proper
/// subset of another such clique. The search is exhaustive over all cliques up to the size limit,
/// where every clique is visited once by extending it only with higher-indexed common neighbors.
///
fn get_component_maximal_kcliques(
    graph: &ProximityGraph,
    component: &[usize],
    max_clique_size: usize,
    cliques: &mut Vec<Clique>,
) {
    fn intersect_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
        let mut x = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    x.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        x
    }

    /// `common_neighbors` - sorted nodes adjacent to every member of `clique`
    fn extend_clique(
        graph: &ProximityGraph,
        max_clique_size: usize,
        clique: &mut Vec<usize>,
        common_neighbors: &[usize],
        cliques: &mut Vec<Clique>,
    ) {
        if clique.len() == max_clique_size || common_neighbors.is_empty() {
            cliques.push(clique.iter().copied().collect());
        }
        if clique.len() == max_clique_size {
            return;
        }

        let last = *clique.last().unwrap();
        for &candidate in common_neighbors.iter().filter(|&&x| x > last) {
            let next_common_neighbors =
                intersect_sorted(common_neighbors, graph.neighbors(candidate));
            clique.push(candidate);
            extend_clique(
                graph,
                max_clique_size,
                clique,
                &next_common_neighbors,
                cliques,
            );
            clique.pop();
        }
    }

    for &node_index in component.iter() {
        let mut clique = vec![node_index];
        extend_clique(
            graph,
            max_clique_size,
            &mut clique,
            graph.neighbors(node_index),
            cliques,
        );
    }
}

/// Mean distance from a node to the other members of its clique
///
/// A clique reduced to the node alone is scored as infinitely distant, so that the node is kept
/// in any clique where it still has company.
///
fn get_mean_clique_distance(graph: &ProximityGraph, node_index: usize, clique: &Clique) -> f64 {
    if clique.len() < 2 {
        return f64::INFINITY;
    }
    let node = &graph.nodes[node_index];
    let dist_sum = clique
        .iter()
        .filter(|&&x| x != node_index)
        .map(|&x| node.dist(&graph.nodes[x]))
        .sum::<f64>();
    dist_sum / (clique.len() - 1) as f64
}

/// Reduce node sharing among cliques
///
/// Each node found in more than one clique is kept only in the clique(s) where its mean distance
/// to the other members is lowest. Nodes are processed from the highest to lowest participation
/// count, with ties processed in descending node order.
///
fn resolve_shared_nodes(graph: &ProximityGraph, cliques: &mut [Clique]) {
    let mut participation = BTreeMap::new();
    for clique in cliques.iter() {
        for &node_index in clique.iter() {
            *participation.entry(node_index).or_insert(0usize) += 1;
        }
    }

    let mut shared_nodes = participation
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .collect::<Vec<_>>();
    shared_nodes.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then(graph.nodes[b.0].cmp(&graph.nodes[a.0]))
            .then(b.0.cmp(&a.0))
    });

    for (node_index, _) in shared_nodes {
        let distances = cliques
            .iter()
            .enumerate()
            .filter(|(_, clique)| clique.contains(&node_index))
            .map(|(clique_index, clique)| {
                (
                    clique_index,
                    get_mean_clique_distance(graph, node_index, clique),
                )
            })
            .collect::<Vec<_>>();

        let lowest = distances
            .iter()
            .map(|&(_, d)| d)
            .fold(f64::INFINITY, f64::min);
        for (clique_index, d) in distances {
            if d > lowest {
                cliques[clique_index].remove(&node_index);
            }
        }
    }
}

/// Check the clique size limit
///
/// Returns true if the clique size is large enough to warn the caller about exhaustive search
/// runtime.
///
pub fn check_max_clique_size(max_clique_size: usize) -> Result<bool, ClusterError> {
    if max_clique_size < 1 {
        return Err(ClusterError::InvalidArgument(format!(
            "Maximum clique size must be greater than 0, found {max_clique_size}"
        )));
    }
    Ok(max_clique_size >= LARGE_CLIQUE_SIZE)
}

/// Find the maximal cliques of a graph, up to size `max_clique_size`, with shared node resolution
///
/// Each connected component is searched for all cliques up to the maximum size, and any clique
/// that is a proper subset of another is removed. Nodes participating in multiple of the
/// remaining cliques are then assigned to their closest clique(s), see `resolve_shared_nodes`.
/// Nodes equally close to multiple cliques remain shared.
///
/// Every graph node is present in at least one returned clique.
///
pub fn get_redundant_maximal_kcliques(
    graph: &ProximityGraph,
    max_clique_size: usize,
) -> Result<Vec<Clique>, ClusterError> {
    check_max_clique_size(max_clique_size)?;

    let mut cliques = Vec::new();
    for component in graph.connected_components() {
        get_component_maximal_kcliques(graph, &component, max_clique_size, &mut cliques);
    }

    resolve_shared_nodes(graph, &mut cliques);

    // Resolution can reduce two cliques to the same node set
    let mut observed = BTreeSet::new();
    cliques.retain(|x| !x.is_empty() && observed.insert(x.clone()));

    let mut found = vec![false; graph.node_count()];
    for clique in cliques.iter() {
        debug_assert!(graph.is_complete(&clique.iter().copied().collect::<Vec<_>>()));
        for &node_index in clique.iter() {
            found[node_index] = true;
        }
    }
    if let Some(lost_node_index) = found.iter().position(|x| !x) {
        panic!(
            "Node lost during clique resolution: {:?}",
            graph.nodes[lost_node_index]
        );
    }

    Ok(cliques)
}
