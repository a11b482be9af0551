mod bpp_input;
mod breakpoint;
mod cli;
mod cluster_breakpoints;
mod cluster_output;
mod columns;
mod genome_regions;
mod globals;
mod interval;
mod logger;
mod os_utils;
mod run_cluster;
mod run_stats;

use std::time::Instant;
use std::{error, process};

use hhmmss::Hhmmss;
use itertools::Itertools;
use log::{error, info};

use crate::cli::Commands;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_output_dir_and_logger;
use crate::run_cluster::run_cluster;

fn log_run_start(settings: &cli::Settings) {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!("cmdline: {}", std::env::args().join(" "));
    info!("Output directory: '{}'", settings.get_output_dir());
    info!("Running on {} threads", settings.shared.thread_count);
}

fn run(settings: &cli::Settings) -> Result<(), Box<dyn error::Error>> {
    log_run_start(settings);
    let start = Instant::now();

    match &settings.command {
        Commands::Cluster(x) => run_cluster(&settings.shared, x)?,
    }

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    setup_output_dir_and_logger(
        settings.get_output_dir(),
        settings.shared.clobber,
        settings.shared.debug,
    );

    if let Err(err) = run(&settings) {
        error!("{err}");
        process::exit(2);
    }
}
