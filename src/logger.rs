//! Program logger setup, with output to stderr and a log file in the output directory
//!

use camino::{Utf8Path, Utf8PathBuf};
use log::{LevelFilter, info};

use crate::cli;
use crate::globals::PROGRAM_NAME;
use crate::os_utils::create_dir_all;

pub fn get_log_filename(output_dir: &Utf8Path) -> Utf8PathBuf {
    output_dir.join(format!("{PROGRAM_NAME}.log"))
}

/// Debug logging also reports the module path of each message
///
fn setup_logger(log_filename: &Utf8Path, debug: bool) -> Result<(), fern::InitError> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(move |out, message, record| {
            let timestamp = chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]");
            if debug {
                out.finish(format_args!(
                    "{timestamp}[{PROGRAM_NAME}][{}][{}] {message}",
                    record.level(),
                    record.target(),
                ))
            } else {
                out.finish(format_args!(
                    "{timestamp}[{PROGRAM_NAME}][{}] {message}",
                    record.level()
                ))
            }
        })
        .level(level)
        .chain(std::io::stderr())
        .chain(fern::log_file(log_filename)?)
        .apply()?;
    Ok(())
}

/// Check and create the output directory, then setup the logger to write there
///
/// An existing output directory is an error unless `clobber` is set.
///
/// * `debug` - If true use debug log level, and info level otherwise
///
pub fn setup_output_dir_and_logger(output_dir: &Utf8Path, clobber: bool, debug: bool) {
    // No logger is available yet, so errors here follow the command-line validation pattern
    let is_existing_dir = match cli::check_novel_dirname(output_dir, "Output directory") {
        Ok(_) => false,
        Err(msg) => {
            if !(clobber && output_dir.is_dir()) {
                eprintln!("Invalid command-line setting: {msg}");
                std::process::exit(exitcode::USAGE);
            }
            true
        }
    };
    create_dir_all(output_dir, "output");

    let log_filename = get_log_filename(output_dir);
    if let Err(e) = setup_logger(&log_filename, debug) {
        eprintln!("Can't setup logger to write '{log_filename}': {e}");
        std::process::exit(exitcode::CANTCREAT);
    }

    if is_existing_dir {
        info!("Writing into existing output directory: '{output_dir}'");
    }
}
