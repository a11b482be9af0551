use std::collections::BTreeSet;
use std::error;
use std::time::Instant;

use itertools::Itertools;
use log::{info, warn};

use crate::breakpoint::BreakpointPair;
use crate::bpp_input::read_breakpoint_pairs;
use crate::cli::{self, ClusterSettings};
use crate::cluster_breakpoints::{ClusterParams, cluster_breakpoint_pairs};
use crate::cluster_output::{
    CLUSTER_ASSIGNMENT_FILENAME, UNINFORMATIVE_FILENAME, annotate_clusters, get_assignment_rows,
    get_batch_size, log_cluster_histograms, write_breakpoint_pairs, write_cluster_batches,
    write_cluster_bed, write_complete_stamp, write_tabbed_file,
};
use crate::columns;
use crate::genome_regions::{GenomeRegions, filter_masked_pairs, filter_uninformative_pairs};
use crate::run_stats::{ClusterRunStats, write_cluster_run_stats};

/// Assign unlabeled input to `library`, and remove input from all other libraries
///
/// Returns the pairs retained for clustering and the count of removed pairs
///
fn filter_library_pairs(
    pairs: Vec<BreakpointPair>,
    library: &str,
) -> (Vec<BreakpointPair>, usize) {
    let mut other_libraries = BTreeSet::new();
    let mut retained = Vec::new();
    let mut removed_count = 0;
    for mut bpp in pairs {
        match bpp.library().map(|x| x.to_string()) {
            None => {
                bpp.data
                    .insert(columns::LIBRARY.to_string(), library.to_string());
                retained.push(bpp);
            }
            Some(x) if x == library => {
                retained.push(bpp);
            }
            Some(x) => {
                other_libraries.insert(x);
                removed_count += 1;
            }
        }
    }

    if !other_libraries.is_empty() {
        warn!(
            "Ignoring {removed_count} input breakpoint pairs from other libraries: {}",
            other_libraries.iter().join(", ")
        );
    }
    (retained, removed_count)
}

/// Read, filter and cluster all input breakpoint pairs, then write all cluster output files
///
pub fn run_cluster(
    shared_settings: &cli::SharedSettings,
    settings: &ClusterSettings,
) -> Result<(), Box<dyn error::Error>> {
    let start = Instant::now();

    cli::write_cluster_settings(&settings.output_dir, settings);

    let mut run_stats = ClusterRunStats {
        input_file_count: settings.input_filenames.len(),
        ..Default::default()
    };

    let mut input_pairs = Vec::new();
    for input_filename in settings.input_filenames.iter() {
        input_pairs.extend(read_breakpoint_pairs(input_filename)?);
    }
    run_stats.input_pair_count = input_pairs.len();
    info!(
        "Read {} breakpoint pairs from {} input files",
        input_pairs.len(),
        settings.input_filenames.len()
    );

    let (mut input_pairs, other_library_count) =
        filter_library_pairs(input_pairs, &settings.library);
    run_stats.filter_stats.other_library_pair_count = other_library_count;

    if let Some(masking_filename) = &settings.masking_filename {
        let masking = GenomeRegions::from_bed(masking_filename, "masking")?;
        let (passed, failed) = filter_masked_pairs(input_pairs, &masking);
        run_stats.filter_stats.masked_pair_count = failed.len();
        input_pairs = passed;
    }

    if settings.uninformative_filter
        && let Some(annotations_filename) = &settings.annotations_filename
    {
        let annotations = GenomeRegions::from_bed(annotations_filename, "annotation")?;
        let (passed, failed) = filter_uninformative_pairs(
            input_pairs,
            &annotations,
            settings.max_proximity as i64,
        );
        run_stats.filter_stats.uninformative_pair_count = failed.len();
        write_breakpoint_pairs(
            &settings.output_dir.join(UNINFORMATIVE_FILENAME),
            "uninformative breakpoint pairs",
            &failed,
        );
        input_pairs = passed;
    }
    run_stats.clustered_input_pair_count = input_pairs.len();

    let params = ClusterParams {
        radius: settings.cluster_radius as f64,
        max_clique_size: settings.cluster_clique_size,
    };
    info!(
        "Clustering {} breakpoint pairs with radius {} and max clique size {}",
        input_pairs.len(),
        settings.cluster_radius,
        settings.cluster_clique_size
    );
    let cluster_start = Instant::now();
    let result = cluster_breakpoint_pairs(&input_pairs, &params, shared_settings.thread_count)?;
    run_stats.total_clustering_time_secs = cluster_start.elapsed().as_secs_f64();

    for warning in result.warnings.iter() {
        warn!("{warning}");
    }
    run_stats.bucket_count = result.bucket_count;
    run_stats.warning_count = result.warnings.len();

    let mut clusters = result.clusters;
    info!(
        "Computed {} clusters from {} breakpoint pairs in {} classification buckets",
        clusters.len(),
        input_pairs.len(),
        result.bucket_count
    );
    annotate_clusters(&mut clusters, &input_pairs);
    log_cluster_histograms(&clusters);
    run_stats.cluster_count = clusters.len();

    let assignment_rows = get_assignment_rows(
        &clusters,
        &input_pairs,
        &settings.library,
        &settings.protocol.to_string(),
    );
    write_tabbed_file(
        &settings.output_dir.join(CLUSTER_ASSIGNMENT_FILENAME),
        "cluster assignment",
        &assignment_rows,
    );
    write_cluster_bed(&settings.output_dir, &clusters);

    let batch_size = get_batch_size(
        clusters.len(),
        settings.min_clusters_per_file,
        settings.max_files,
    );
    let batch_filenames = write_cluster_batches(
        &settings.output_dir,
        &settings.batch_prefix,
        &clusters,
        batch_size,
    );
    info!(
        "Wrote {} clusters to {} batch files",
        clusters.len(),
        batch_filenames.len()
    );
    run_stats.batch_file_count = batch_filenames.len();

    write_cluster_run_stats(&settings.output_dir, &run_stats);
    write_complete_stamp(&settings.output_dir, start.elapsed());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use camino::Utf8PathBuf;
    use clap::Parser;

    use crate::breakpoint::{Breakpoint, Orientation, Strand};
    use crate::run_stats::RUN_STATS_FILENAME;

    fn bpp(pos: i64, library: Option<&str>) -> BreakpointPair {
        let mut x = BreakpointPair::new(
            Breakpoint::new("1", pos, pos, Orientation::Left, Strand::NotSpecified),
            Breakpoint::new("1", pos + 1000, pos + 1000, Orientation::Right, Strand::NotSpecified),
            Some(false),
            false,
            None,
        )
        .unwrap();
        if let Some(library) = library {
            x.data
                .insert(columns::LIBRARY.to_string(), library.to_string());
        }
        x
    }

    #[test]
    fn test_filter_library_pairs() {
        let pairs = vec![
            bpp(100, None),
            bpp(200, Some("lib1")),
            bpp(300, Some("lib2")),
            bpp(400, Some("lib3")),
        ];
        let (pairs, removed_count) = filter_library_pairs(pairs, "lib1");
        assert_eq!(removed_count, 2);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|x| x.library() == Some("lib1")));
    }

    fn get_test_dir(name: &str) -> Utf8PathBuf {
        let dir = std::env::temp_dir().join(format!("bppcluster-run-cluster-{name}"));
        let dir = Utf8PathBuf::from_path_buf(dir).unwrap();
        if dir.exists() {
            std::fs::remove_dir_all(&dir).unwrap();
        }
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_run_cluster() {
        let dir = get_test_dir("full");
        let input_filename = dir.join("input.tab");
        let header = [
            "#break1_chromosome",
            "break1_position_start",
            "break1_position_end",
            "break1_orientation",
            "break2_chromosome",
            "break2_position_start",
            "break2_position_end",
            "break2_orientation",
            "opposing_strands",
            "tools",
            "library",
        ]
        .join("\t");
        let rows = [
            "chr1\t100\t100\tL\tchr1\t1000\t1000\tR\tFalse\tdelly\tlib1",
            "chr1\t110\t110\tL\tchr1\t1010\t1010\tR\tFalse\tmanta\tlib1",
            "chr1\t90000\t90000\tL\tchr1\t95000\t95000\tR\tFalse\tdelly\tlib1",
            "chr1\t100\t100\tL\tchr1\t1000\t1000\tR\tFalse\tdelly\tlib2",
        ];
        std::fs::write(&input_filename, header + "\n" + &rows.join("\n") + "\n").unwrap();

        let masking_filename = dir.join("masking.bed");
        std::fs::write(&masking_filename, "chr1\t94000\t96000\n").unwrap();

        let output_dir = dir.join("output");
        std::fs::create_dir_all(&output_dir).unwrap();

        let settings = cli::Settings::try_parse_from([
            "bppcluster",
            "--threads",
            "2",
            "cluster",
            "--input",
            input_filename.as_str(),
            "--masking",
            masking_filename.as_str(),
            "--library",
            "lib1",
            "--output-dir",
            output_dir.as_str(),
        ])
        .unwrap();
        let settings = cli::validate_and_fix_settings(settings);
        let cli::Commands::Cluster(cluster_settings) = &settings.command;
        run_cluster(&settings.shared, cluster_settings).unwrap();

        let assignment =
            std::fs::read_to_string(output_dir.join(CLUSTER_ASSIGNMENT_FILENAME)).unwrap();
        let assignment_lines = assignment.lines().collect::<Vec<_>>();
        assert_eq!(assignment_lines.len(), 3);
        assert!(assignment_lines[1].contains("cluster-1"));
        assert!(assignment_lines[2].contains("cluster-1"));

        let bed = std::fs::read_to_string(output_dir.join("clusters.bed")).unwrap();
        assert_eq!(bed.lines().count(), 2);

        let batch = std::fs::read_to_string(output_dir.join("batch-1.tab")).unwrap();
        assert_eq!(batch.lines().count(), 2);
        assert!(batch.contains("delly;manta"));

        let run_stats = std::fs::read_to_string(output_dir.join(RUN_STATS_FILENAME)).unwrap();
        let run_stats: ClusterRunStats = serde_json::from_str(&run_stats).unwrap();
        assert_eq!(run_stats.input_pair_count, 4);
        assert_eq!(run_stats.filter_stats.other_library_pair_count, 1);
        assert_eq!(run_stats.filter_stats.masked_pair_count, 1);
        assert_eq!(run_stats.clustered_input_pair_count, 2);
        assert_eq!(run_stats.cluster_count, 1);
        assert_eq!(run_stats.batch_file_count, 1);

        assert!(output_dir.join("bppcluster.COMPLETE").exists());
        assert!(output_dir.join("cluster.settings.json").exists());
    }
}
