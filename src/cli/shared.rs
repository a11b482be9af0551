use clap::Args;
use simple_error::{SimpleResult, bail};

/// Options available to all subcommands
#[derive(Args)]
pub struct SharedSettings {
    /// Number of threads used to cluster classification buckets. Defaults to all logical cpus
    /// detected.
    #[arg(long = "threads", global = true, value_name = "THREAD_COUNT")]
    thread_count_option: Option<usize>,

    /// Resolved from thread_count_option during validation
    #[arg(skip)]
    pub thread_count: usize,

    /// Write into an existing output directory
    #[arg(long, global = true)]
    pub clobber: bool,

    /// Turn on extra debug logging
    ///
    /// This option enables extra logging intended for debugging only, including a summary of each
    /// classification bucket compared during clustering.
    ///
    #[arg(long, global = true)]
    pub debug: bool,
}

fn get_thread_count(thread_count_option: Option<usize>) -> SimpleResult<usize> {
    match thread_count_option {
        Some(0) => bail!("--threads argument must be greater than 0"),
        Some(count) => Ok(count),
        None => Ok(num_cpus::get()),
    }
}

pub fn validate_and_fix_shared_settings(
    mut settings: SharedSettings,
) -> SimpleResult<SharedSettings> {
    settings.thread_count = get_thread_count(settings.thread_count_option)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_thread_count() {
        assert_eq!(get_thread_count(Some(3)).unwrap(), 3);
        assert!(get_thread_count(Some(0)).is_err());
        assert!(get_thread_count(None).unwrap() > 0);
    }
}
