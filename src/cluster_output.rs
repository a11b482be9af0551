//! Cluster annotation and output file writing
//!

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use hhmmss::Hhmmss;
use itertools::Itertools;
use log::info;
use unwrap::unwrap;

use crate::breakpoint::BreakpointPair;
use crate::cluster_breakpoints::BreakpointPairCluster;
use crate::columns::{self, NULL_VALUE, sort_columns};
use crate::globals::PROGRAM_NAME;

pub const CLUSTER_ASSIGNMENT_FILENAME: &str = "cluster_assignment.tab";
pub const CLUSTER_BED_FILENAME: &str = "clusters.bed";
pub const UNINFORMATIVE_FILENAME: &str = "uninformative_clusters.txt";

/// A key/value representation of one output row
pub type TabbedRow = BTreeMap<String, String>;

fn get_cluster_id(cluster_index: usize) -> String {
    format!("cluster-{}", cluster_index + 1)
}

/// Add id, size and tool metadata to each cluster's consensus pair
///
/// Cluster ids follow the order of the input cluster list.
///
pub fn annotate_clusters(clusters: &mut [BreakpointPairCluster], input_pairs: &[BreakpointPair]) {
    for (cluster_index, cluster) in clusters.iter_mut().enumerate() {
        let tools = cluster
            .input_indices
            .iter()
            .flat_map(|&x| input_pairs[x].tools())
            .collect::<BTreeSet<_>>();
        let data = &mut cluster.consensus.data;
        data.insert(columns::CLUSTER_ID.to_string(), get_cluster_id(cluster_index));
        data.insert(
            columns::CLUSTER_SIZE.to_string(),
            cluster.input_indices.len().to_string(),
        );
        data.insert(columns::TOOLS.to_string(), tools.into_iter().join(";"));
    }
}

fn round_to_hundreds(x: i64) -> i64 {
    ((x as f64) / 100.0).round() as i64 * 100
}

/// Histograms of cluster input counts, and of breakpoint interval lengths rounded to the nearest
/// hundred
///
fn get_cluster_histograms(
    clusters: &[BreakpointPairCluster],
) -> (BTreeMap<usize, usize>, BTreeMap<i64, usize>) {
    let mut size_hist = BTreeMap::new();
    let mut length_hist = BTreeMap::new();
    for cluster in clusters.iter() {
        *size_hist.entry(cluster.input_indices.len()).or_insert(0) += 1;
        for breakpoint in [&cluster.consensus.break1, &cluster.consensus.break2] {
            let length = round_to_hundreds(breakpoint.interval.len());
            *length_hist.entry(length).or_insert(0) += 1;
        }
    }
    (size_hist, length_hist)
}

pub fn log_cluster_histograms(clusters: &[BreakpointPairCluster]) {
    let (size_hist, length_hist) = get_cluster_histograms(clusters);
    let format_hist = |x: Vec<String>| x.join(", ");
    info!(
        "Cluster input pair count distribution: {}",
        format_hist(size_hist.iter().map(|(k, v)| format!("{k}:{v}")).collect())
    );
    info!(
        "Cluster interval length distribution: {}",
        format_hist(length_hist.iter().map(|(k, v)| format!("{k}:{v}")).collect())
    );
}

/// Get one row for each input pair that contributed to a cluster
///
/// Each row describes the input pair, along with the ids of all clusters it contributed to. Rows
/// are in input order.
///
pub fn get_assignment_rows(
    clusters: &[BreakpointPairCluster],
    input_pairs: &[BreakpointPair],
    library: &str,
    protocol: &str,
) -> Vec<TabbedRow> {
    let mut input_clusters = BTreeMap::new();
    for cluster in clusters.iter() {
        let cluster_id = &cluster.consensus.data[columns::CLUSTER_ID];
        for &input_index in cluster.input_indices.iter() {
            input_clusters
                .entry(input_index)
                .or_insert_with(BTreeSet::new)
                .insert(cluster_id.as_str());
        }
    }

    let multi_cluster_count = input_clusters.values().filter(|x| x.len() > 1).count();
    if multi_cluster_count > 0 {
        info!("{multi_cluster_count} input breakpoint pairs were assigned to multiple clusters");
    }

    input_clusters
        .into_iter()
        .map(|(input_index, cluster_ids)| {
            let bpp = &input_pairs[input_index];
            let mut row = bpp.flatten();
            row.insert(columns::CLUSTERS.to_string(), cluster_ids.iter().join(";"));
            row.insert(columns::TOOLS.to_string(), bpp.tools().iter().join(";"));
            row.insert(columns::LIBRARY.to_string(), library.to_string());
            row.insert(columns::PROTOCOL.to_string(), protocol.to_string());
            row
        })
        .collect()
}

/// Write rows in tabbed format
///
/// The header is the union of all row columns in output column order, prefixed with '#'. Values
/// missing from a row are written as the null value.
///
pub fn write_tabbed_rows<'a>(
    mut writer: impl Write,
    rows: impl IntoIterator<Item = &'a TabbedRow> + Clone,
) -> std::io::Result<()> {
    let header = sort_columns(
        rows.clone()
            .into_iter()
            .flat_map(|x| x.keys().map(|x| x.as_str())),
    );
    writeln!(writer, "#{}", header.join("\t"))?;
    for row in rows {
        let values = header
            .iter()
            .map(|x| row.get(x).map(|x| x.as_str()).unwrap_or(NULL_VALUE))
            .join("\t");
        writeln!(writer, "{values}")?;
    }
    Ok(())
}

/// Write rows to a new tabbed file
///
/// * `label` - used to describe the file in log and error messages
///
pub fn write_tabbed_file(filename: &Utf8Path, label: &str, rows: &[TabbedRow]) {
    info!("Writing {label} to file: '{filename}'");
    let f = unwrap!(
        File::create(filename),
        "Unable to create {label} file: '{filename}'"
    );
    unwrap!(
        write_tabbed_rows(BufWriter::new(f), rows),
        "Unable to write {label} file: '{filename}'"
    );
}

pub fn write_breakpoint_pairs(filename: &Utf8Path, label: &str, pairs: &[BreakpointPair]) {
    let rows = pairs.iter().map(|x| x.flatten()).collect::<Vec<_>>();
    write_tabbed_file(filename, label, &rows);
}

/// Write one BED record for each breakpoint of each cluster
///
pub fn write_cluster_bed_records(
    mut writer: impl Write,
    clusters: &[BreakpointPairCluster],
) -> std::io::Result<()> {
    for cluster in clusters.iter() {
        let cluster_id = &cluster.consensus.data[columns::CLUSTER_ID];
        for breakpoint in [&cluster.consensus.break1, &cluster.consensus.break2] {
            let (start, end) = breakpoint.interval.to_bed_range();
            writeln!(writer, "{}\t{start}\t{end}\t{cluster_id}", breakpoint.chrom)?;
        }
    }
    Ok(())
}

pub fn write_cluster_bed(output_dir: &Utf8Path, clusters: &[BreakpointPairCluster]) {
    let filename = output_dir.join(CLUSTER_BED_FILENAME);
    info!("Writing cluster bed file: '{filename}'");
    let f = unwrap!(
        File::create(&filename),
        "Unable to create cluster bed file: '{filename}'"
    );
    unwrap!(
        write_cluster_bed_records(BufWriter::new(f), clusters),
        "Unable to write cluster bed file: '{filename}'"
    );
}

/// Number of clusters written to each batch file
///
/// This is normally `min_clusters_per_file`, unless that would require more than `max_files`
/// files, in which case the clusters are spread evenly over `max_files` files.
///
pub fn get_batch_size(
    cluster_count: usize,
    min_clusters_per_file: usize,
    max_files: usize,
) -> usize {
    assert!(min_clusters_per_file > 0 && max_files > 0);
    if cluster_count / min_clusters_per_file > max_files - 1 {
        let batch_size = (cluster_count as f64 / max_files as f64).round() as usize;
        std::cmp::max(batch_size, 1)
    } else {
        min_clusters_per_file
    }
}

/// Split clusters into consecutive batch files for downstream processing
///
/// Returns the batch filenames
///
pub fn write_cluster_batches(
    output_dir: &Utf8Path,
    batch_prefix: &str,
    clusters: &[BreakpointPairCluster],
    batch_size: usize,
) -> Vec<Utf8PathBuf> {
    let mut filenames = Vec::new();
    for (batch_index, batch) in clusters.chunks(batch_size).enumerate() {
        let filename = output_dir.join(format!("{batch_prefix}-{}.tab", batch_index + 1));
        let rows = batch
            .iter()
            .map(|x| x.consensus.flatten())
            .collect::<Vec<_>>();
        write_tabbed_file(&filename, "cluster batch", &rows);
        filenames.push(filename);
    }
    filenames
}

fn write_complete_stamp_content(mut writer: impl Write, runtime: Duration) -> std::io::Result<()> {
    writeln!(writer, "run time (hh:mm:ss): {}", runtime.hhmmss())?;
    writeln!(writer, "run time (s): {}", runtime.as_secs())
}

/// Write the completion stamp marking a finished run
///
pub fn write_complete_stamp(output_dir: &Utf8Path, runtime: Duration) {
    let filename = output_dir.join(format!("{PROGRAM_NAME}.COMPLETE"));
    info!("Writing completion stamp: '{filename}'");
    let f = unwrap!(
        File::create(&filename),
        "Unable to create completion stamp: '{filename}'"
    );
    unwrap!(
        write_complete_stamp_content(f, runtime),
        "Unable to write completion stamp: '{filename}'"
    );
}
