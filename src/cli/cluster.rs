use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail};
use unwrap::unwrap;

use super::utils::{canonicalize_filename, check_optional_filename, check_required_filename};

pub const SETTINGS_FILENAME: &str = "cluster.settings.json";

/// Sequencing protocol of the library
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize, Serialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    #[default]
    Genome,
    Transcriptome,
}

#[derive(Args, Deserialize, Serialize)]
pub struct ClusterSettings {
    /// Breakpoint pair input file in tabbed format. Use this option more than once to cluster
    /// multiple input files together.
    #[arg(long = "input", value_name = "FILE", required = true)]
    pub input_filenames: Vec<Utf8PathBuf>,

    /// Directory for all cluster command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_output"))]
    pub output_dir: Utf8PathBuf,

    /// Library name. Only input breakpoint pairs from this library are clustered. Input without a
    /// library column is assigned to this library.
    #[arg(long)]
    pub library: String,

    /// Sequencing protocol of the library
    #[arg(long, value_enum, default_value_t = Protocol::Genome)]
    pub protocol: Protocol,

    /// Masked genome regions in BED format. Breakpoint pairs with either breakpoint overlapping
    /// a masked region are removed before clustering.
    #[arg(long = "masking", value_name = "FILE")]
    pub masking_filename: Option<Utf8PathBuf>,

    /// Annotated genome regions in BED format, used by the uninformative filter
    #[arg(long = "annotations", value_name = "FILE")]
    pub annotations_filename: Option<Utf8PathBuf>,

    /// Remove breakpoint pairs without any breakpoint near an annotated region
    ///
    /// Requires --annotations. Removed breakpoint pairs are written to a separate output file.
    ///
    #[arg(long)]
    pub uninformative_filter: bool,

    /// Max distance between a breakpoint and an annotated region for the breakpoint to be
    /// considered informative
    #[arg(long, default_value_t = 5000)]
    pub max_proximity: u32,

    /// Max clustering distance between two breakpoint pairs, which is the mean distance of their
    /// first and second breakpoint centers
    #[arg(long, default_value_t = 100)]
    pub cluster_radius: u32,

    /// Max size of the exhaustive clique search. Large values can greatly increase runtime.
    #[arg(long, default_value_t = 15)]
    pub cluster_clique_size: usize,

    /// Min number of clusters to write to each batch file
    #[arg(long, default_value_t = 50)]
    pub min_clusters_per_file: usize,

    /// Max number of batch files
    #[arg(long, default_value_t = 200)]
    pub max_files: usize,

    /// Batch filename prefix
    #[arg(long, default_value = "batch")]
    pub batch_prefix: String,

    #[arg(hide = true, long)]
    pub disable_path_canonicalization: bool,
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_cluster_settings(
    mut settings: ClusterSettings,
) -> SimpleResult<ClusterSettings> {
    for input_filename in settings.input_filenames.iter() {
        check_required_filename(input_filename, "breakpoint pair input")?;
    }
    check_optional_filename(settings.masking_filename.as_ref(), "masking regions")?;
    check_optional_filename(settings.annotations_filename.as_ref(), "annotation regions")?;

    if settings.uninformative_filter && settings.annotations_filename.is_none() {
        bail!("--uninformative-filter requires an --annotations file");
    }

    if settings.library.is_empty() {
        bail!("--library argument must not be empty");
    }

    if settings.cluster_clique_size == 0 {
        bail!("--cluster-clique-size argument must be greater than 0");
    }

    if settings.min_clusters_per_file == 0 {
        bail!("--min-clusters-per-file argument must be greater than 0");
    }

    if settings.max_files == 0 {
        bail!("--max-files argument must be greater than 0");
    }

    if settings.batch_prefix.is_empty() || settings.batch_prefix.contains('/') {
        bail!(
            "--batch-prefix argument must be a non-empty filename prefix, found '{}'",
            settings.batch_prefix
        );
    }

    if !settings.disable_path_canonicalization {
        settings.input_filenames = settings
            .input_filenames
            .iter()
            .map(|x| canonicalize_filename(x))
            .collect::<SimpleResult<Vec<_>>>()?;
        if let Some(x) = &settings.masking_filename {
            settings.masking_filename = Some(canonicalize_filename(x)?);
        }
        if let Some(x) = &settings.annotations_filename {
            settings.annotations_filename = Some(canonicalize_filename(x)?);
        }
    }

    Ok(settings)
}

pub fn write_cluster_settings(output_dir: &Utf8Path, settings: &ClusterSettings) {
    use log::info;

    let filename = output_dir.join(SETTINGS_FILENAME);

    info!("Writing cluster settings to file: '{filename}'");

    let f = unwrap!(
        std::fs::File::create(&filename),
        "Unable to create cluster settings json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &settings).unwrap();
}
