//! Track stats for the whole cluster run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use unwrap::unwrap;

pub const RUN_STATS_FILENAME: &str = "run.stats.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FilterStats {
    /// Input breakpoint pairs removed because they were assigned to a different library
    pub other_library_pair_count: usize,
    pub masked_pair_count: usize,
    pub uninformative_pair_count: usize,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ClusterRunStats {
    pub input_file_count: usize,
    pub input_pair_count: usize,
    pub filter_stats: FilterStats,

    /// Breakpoint pairs remaining after all filters
    pub clustered_input_pair_count: usize,

    /// Count of distinct classification buckets compared during clustering
    pub bucket_count: usize,
    pub cluster_count: usize,
    pub warning_count: usize,
    pub batch_file_count: usize,

    pub total_clustering_time_secs: f64,
}

/// Write run_stats structure out in json format
pub fn write_cluster_run_stats(output_dir: &Utf8Path, run_stats: &ClusterRunStats) {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &run_stats).unwrap();
}
