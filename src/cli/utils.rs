use camino::{Utf8Path, Utf8PathBuf};
use simple_error::{SimpleResult, bail};

/// Check a required input filename
///
/// Assumes no logger has been configured yet
///
pub fn check_required_filename(filename: &Utf8Path, label: &str) -> SimpleResult<()> {
    if filename.as_str().is_empty() {
        bail!("Must specify {label} file");
    }
    if !filename.exists() {
        bail!("Can't find specified {label} file: '{filename}'");
    }
    if !filename.is_file() {
        bail!("Specified {label} file path does not appear to be a file: '{filename}'");
    }
    Ok(())
}

/// Check an optional input filename
///
/// Assumes no logger has been configured yet
///
pub fn check_optional_filename(
    filename_opt: Option<&Utf8PathBuf>,
    label: &str,
) -> SimpleResult<()> {
    if let Some(filename) = filename_opt {
        check_required_filename(filename, label)?;
    }
    Ok(())
}

/// Convert a checked input filename to its canonical absolute path
///
pub fn canonicalize_filename(filename: &Utf8Path) -> SimpleResult<Utf8PathBuf> {
    match filename.canonicalize_utf8() {
        Ok(x) => Ok(x),
        Err(e) => bail!("Can't canonicalize file path '{filename}': {e}"),
    }
}
