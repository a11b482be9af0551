use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::mpsc::channel;

use log::debug;

use super::ClusterError;
use super::hierarchical_merge::merge_ordered_groups;
use super::interval_pair::IntervalPair;
use super::maximal_cliques::{Clique, check_max_clique_size, get_redundant_maximal_kcliques};
use super::proximity_graph::ProximityGraph;
use crate::breakpoint::{Breakpoint, BreakpointPair, Orientation, Strand, get_sv_types};

/// Clustering parameters
#[derive(Clone, Copy, Debug)]
pub struct ClusterParams {
    /// Max clustering distance between two interval pairs for them to be connected
    pub radius: f64,

    /// Max clique size searched for in each connected component of the proximity graph
    pub max_clique_size: usize,
}

/// The partition key of the clustering input
///
/// Only breakpoint pairs with the same classification key are compared during clustering. Every
/// key field is concrete except for strands, which may be unspecified.
///
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ClassificationKey {
    pub chrom1: String,
    pub chrom2: String,
    pub orient1: Orientation,
    pub orient2: Orientation,
    pub strand1: Strand,
    pub strand2: Strand,
    pub opposing_strands: bool,
}

impl fmt::Display for ClassificationKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}{}/{}:{}{} opposing={}",
            self.chrom1,
            self.orient1,
            self.strand1,
            self.chrom2,
            self.orient2,
            self.strand2,
            self.opposing_strands
        )
    }
}

/// Non-fatal conditions found during clustering
///
#[derive(Clone, Debug, PartialEq)]
pub enum ClusterWarning {
    /// Clique search is exhaustive, so large clique sizes may have very long runtimes
    LargeCliqueSize(usize),

    /// One input was assigned to multiple clusters of the same classification bucket
    MultipleClusterParticipation {
        key: ClassificationKey,
        input_index: usize,
        cluster_count: usize,
    },
}

impl fmt::Display for ClusterWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClusterWarning::LargeCliqueSize(x) => write!(
                f,
                "Maximum clique size {x} is large, clique search may be very slow"
            ),
            ClusterWarning::MultipleClusterParticipation {
                key,
                input_index,
                cluster_count,
            } => write!(
                f,
                "Input breakpoint pair {input_index} participates in {cluster_count} clusters of bucket {key}"
            ),
        }
    }
}

/// A consensus breakpoint pair and the clustering input indexes that it represents
///
#[derive(Clone, Debug)]
pub struct BreakpointPairCluster {
    pub consensus: BreakpointPair,
    pub input_indices: BTreeSet<usize>,
}

#[derive(Debug)]
pub struct ClusterResult {
    /// Clusters in consensus breakpoint pair order
    pub clusters: Vec<BreakpointPairCluster>,

    pub warnings: Vec<ClusterWarning>,

    /// Number of classification buckets compared
    pub bucket_count: usize,
}

/// Partition the input breakpoint pairs into classification buckets
///
/// Unspecified orientations are expanded into each concrete orientation, so that one input may be
/// found in multiple buckets. Strands are used as given. Orientation combinations which
/// contradict the input strands, or can't form a valid rearrangement, are skipped.
///
/// Each interval pair id is the index of its breakpoint pair in `input_pairs`.
///
pub fn get_classification_buckets(
    input_pairs: &[BreakpointPair],
) -> BTreeMap<ClassificationKey, Vec<IntervalPair>> {
    let mut buckets = BTreeMap::new();
    for (input_index, bpp) in input_pairs.iter().enumerate() {
        let (b1, b2) = (&bpp.break1, &bpp.break2);
        if b1.strand.is_specified()
            && b2.strand.is_specified()
            && bpp.opposing_strands != (b1.strand != b2.strand)
        {
            continue;
        }

        let is_interchromosomal = bpp.is_interchromosomal();
        for &orient1 in b1.orient.expand() {
            for &orient2 in b2.orient.expand() {
                if get_sv_types(is_interchromosomal, orient1, orient2, bpp.opposing_strands)
                    .is_none()
                {
                    continue;
                }
                let key = ClassificationKey {
                    chrom1: b1.chrom.clone(),
                    chrom2: b2.chrom.clone(),
                    orient1,
                    orient2,
                    strand1: b1.strand,
                    strand2: b2.strand,
                    opposing_strands: bpp.opposing_strands,
                };
                buckets
                    .entry(key)
                    .or_insert_with(Vec::new)
                    .push(IntervalPair::new(b1.interval, b2.interval, input_index));
            }
        }
    }
    buckets
}

/// Report any input with more than one cluster in the same bucket
///
fn get_participation_warnings(
    key: &ClassificationKey,
    nodes: &[IntervalPair],
    groups: &[Clique],
) -> Vec<ClusterWarning> {
    let mut participation = BTreeMap::new();
    for group in groups.iter() {
        for &node_index in group.iter() {
            *participation.entry(nodes[node_index].id).or_insert(0usize) += 1;
        }
    }
    participation
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(id, cluster_count)| ClusterWarning::MultipleClusterParticipation {
            key: key.clone(),
            input_index: id.unwrap(),
            cluster_count,
        })
        .collect()
}

/// Translate a node group into its consensus breakpoint pair and input index set
///
fn get_group_cluster(
    key: &ClassificationKey,
    nodes: &[IntervalPair],
    group: &Clique,
) -> Result<BreakpointPairCluster, ClusterError> {
    let mean = IntervalPair::weighted_mean(group.iter().map(|&x| &nodes[x]))?;
    let break1 = Breakpoint {
        chrom: key.chrom1.clone(),
        interval: mean.start,
        orient: key.orient1,
        strand: key.strand1,
    };
    let break2 = Breakpoint {
        chrom: key.chrom2.clone(),
        interval: mean.end,
        orient: key.orient2,
        strand: key.strand2,
    };
    let consensus = BreakpointPair::new(break1, break2, Some(key.opposing_strands), false, None)?;
    let input_indices = group.iter().map(|&x| nodes[x].id.unwrap()).collect();
    Ok(BreakpointPairCluster {
        consensus,
        input_indices,
    })
}

/// Cluster the interval pairs of a single classification bucket
///
fn cluster_bucket(
    key: &ClassificationKey,
    nodes: Vec<IntervalPair>,
    params: &ClusterParams,
) -> Result<(Vec<BreakpointPairCluster>, Vec<ClusterWarning>), ClusterError> {
    let graph = ProximityGraph::new(nodes, params.radius);
    let cliques = get_redundant_maximal_kcliques(&graph, params.max_clique_size)?;
    let groups = merge_ordered_groups(&graph.nodes, cliques, params.radius);

    debug!(
        "Bucket {key}: {} interval pairs, {} edges, {} clusters",
        graph.node_count(),
        graph.edge_count(),
        groups.len()
    );

    let warnings = get_participation_warnings(key, &graph.nodes, &groups);
    let clusters = groups
        .iter()
        .map(|x| get_group_cluster(key, &graph.nodes, x))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((clusters, warnings))
}

/// Cluster breakpoint pairs into consensus breakpoint pairs
///
/// Input pairs are partitioned into classification buckets, see `get_classification_buckets`.
/// Each bucket is clustered independently, on up to `thread_count` worker threads. Clusters from
/// different buckets with identical consensus pairs are combined.
///
/// Results do not depend on thread count or scheduling.
///
pub fn cluster_breakpoint_pairs(
    input_pairs: &[BreakpointPair],
    params: &ClusterParams,
    thread_count: usize,
) -> Result<ClusterResult, ClusterError> {
    let mut warnings = Vec::new();
    if check_max_clique_size(params.max_clique_size)? {
        warnings.push(ClusterWarning::LargeCliqueSize(params.max_clique_size));
    }

    let buckets = get_classification_buckets(input_pairs);
    let bucket_count = buckets.len();

    let worker_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .unwrap();

    let (tx, rx) = channel();
    worker_pool.scope(move |scope| {
        for (key, nodes) in buckets {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let result = cluster_bucket(&key, nodes, params);
                tx.send((key, result)).unwrap();
            });
        }
    });

    let mut bucket_results = rx.into_iter().collect::<Vec<_>>();
    bucket_results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut consensus_inputs = BTreeMap::new();
    for (_key, result) in bucket_results {
        let (bucket_clusters, bucket_warnings) = result?;
        warnings.extend(bucket_warnings);
        for cluster in bucket_clusters {
            consensus_inputs
                .entry(cluster.consensus)
                .or_insert_with(BTreeSet::new)
                .extend(cluster.input_indices);
        }
    }

    let clusters = consensus_inputs
        .into_iter()
        .map(|(consensus, input_indices)| BreakpointPairCluster {
            consensus,
            input_indices,
        })
        .collect();

    Ok(ClusterResult {
        clusters,
        warnings,
        bucket_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bpp(
        break1: (&str, i64, Orientation),
        break2: (&str, i64, Orientation),
        opposing_strands: bool,
    ) -> BreakpointPair {
        BreakpointPair::new(
            Breakpoint::new(break1.0, break1.1, break1.1, break1.2, Strand::NotSpecified),
            Breakpoint::new(break2.0, break2.1, break2.1, break2.2, Strand::NotSpecified),
            Some(opposing_strands),
            false,
            None,
        )
        .unwrap()
    }

    fn get_bucket_orientations(
        buckets: &BTreeMap<ClassificationKey, Vec<IntervalPair>>,
    ) -> Vec<(Orientation, Orientation)> {
        buckets.keys().map(|x| (x.orient1, x.orient2)).collect()
    }

    fn test_params() -> ClusterParams {
        ClusterParams {
            radius: 20.0,
            max_clique_size: 15,
        }
    }

    #[test]
    fn test_unspecified_orientation_buckets() {
        use Orientation::*;

        let input = [bpp(("1", 100, NotSpecified), ("2", 500, NotSpecified), false)];
        let buckets = get_classification_buckets(&input);
        assert_eq!(
            get_bucket_orientations(&buckets),
            vec![(Left, Right), (Right, Left)]
        );
        for nodes in buckets.values() {
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].id, Some(0));
        }

        let input = [bpp(("1", 100, NotSpecified), ("2", 500, NotSpecified), true)];
        let buckets = get_classification_buckets(&input);
        assert_eq!(
            get_bucket_orientations(&buckets),
            vec![(Left, Left), (Right, Right)]
        );

        let input = [bpp(("1", 100, Left), ("1", 500, NotSpecified), false)];
        let buckets = get_classification_buckets(&input);
        assert_eq!(get_bucket_orientations(&buckets), vec![(Left, Right)]);
    }

    #[test]
    fn test_conflicting_strands_are_skipped() {
        let mut x = bpp(("1", 100, Orientation::Left), ("1", 500, Orientation::Right), false);
        x.break1.strand = Strand::Pos;
        x.break2.strand = Strand::Neg;
        assert!(get_classification_buckets(&[x]).is_empty());
    }

    #[test]
    fn test_cluster_breakpoint_pairs() {
        use Orientation::*;

        let input = [
            bpp(("1", 100, Left), ("1", 1000, Right), false),
            bpp(("1", 105, Left), ("1", 1003, Right), false),
            bpp(("1", 110, Left), ("1", 995, Right), false),
            bpp(("1", 5000, Left), ("1", 9000, Right), false),
            bpp(("1", 102, NotSpecified), ("1", 1001, NotSpecified), false),
        ];
        let result = cluster_breakpoint_pairs(&input, &test_params(), 2).unwrap();

        assert_eq!(result.bucket_count, 2);
        assert!(result.warnings.is_empty());

        let mut input_sets = result
            .clusters
            .iter()
            .map(|x| x.input_indices.iter().copied().collect::<Vec<_>>())
            .collect::<Vec<_>>();
        input_sets.sort();
        assert_eq!(input_sets, vec![vec![0, 1, 2, 4], vec![3], vec![4]]);

        for (a, b) in result.clusters.iter().zip(result.clusters.iter().skip(1)) {
            assert!(a.consensus < b.consensus);
        }

        let cluster = result
            .clusters
            .iter()
            .find(|x| x.input_indices.len() == 1 && x.input_indices.contains(&3))
            .unwrap();
        assert_eq!(cluster.consensus.break1.interval.start, 5000);
        assert_eq!(cluster.consensus.break2.interval.start, 9000);
        assert!(!cluster.consensus.stranded);
        assert!(!cluster.consensus.opposing_strands);
    }

    #[test]
    fn test_consensus_position() {
        use Orientation::*;

        let input = [
            bpp(("1", 100, Left), ("1", 1000, Right), false),
            bpp(("1", 105, Left), ("1", 1003, Right), false),
            bpp(("1", 110, Left), ("1", 995, Right), false),
        ];
        let result = cluster_breakpoint_pairs(&input, &test_params(), 1).unwrap();
        assert_eq!(result.clusters.len(), 1);

        let consensus = &result.clusters[0].consensus;
        assert_eq!(
            consensus.break1,
            Breakpoint::new("1", 105, 105, Left, Strand::NotSpecified)
        );
        assert_eq!(
            consensus.break2,
            Breakpoint::new("1", 999, 999, Right, Strand::NotSpecified)
        );
    }

    #[test]
    fn test_invalid_clique_size() {
        let params = ClusterParams {
            radius: 20.0,
            max_clique_size: 0,
        };
        assert!(matches!(
            cluster_breakpoint_pairs(&[], &params, 1),
            Err(ClusterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_large_clique_size_warning() {
        let params = ClusterParams {
            radius: 20.0,
            max_clique_size: 25,
        };
        let result = cluster_breakpoint_pairs(&[], &params, 1).unwrap();
        assert_eq!(result.warnings, vec![ClusterWarning::LargeCliqueSize(25)]);
        assert!(result.clusters.is_empty());
    }

    #[test]
    fn test_participation_warnings() {
        let key = ClassificationKey {
            chrom1: "1".to_string(),
            chrom2: "1".to_string(),
            orient1: Orientation::Left,
            orient2: Orientation::Right,
            strand1: Strand::NotSpecified,
            strand2: Strand::NotSpecified,
            opposing_strands: false,
        };
        let nodes = [(100, 200), (110, 210), (105, 205)]
            .into_iter()
            .enumerate()
            .map(|(i, (s, e))| {
                IntervalPair::new(
                    crate::interval::Interval::from_pos(s),
                    crate::interval::Interval::from_pos(e),
                    i + 10,
                )
            })
            .collect::<Vec<_>>();
        let groups = vec![Clique::from([0, 2]), Clique::from([1, 2])];
        let warnings = get_participation_warnings(&key, &nodes, &groups);
        assert_eq!(
            warnings,
            vec![ClusterWarning::MultipleClusterParticipation {
                key,
                input_index: 12,
                cluster_count: 2,
            }]
        );
    }
}
