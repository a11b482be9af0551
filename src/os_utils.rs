//! Utilities pertaining to filesystem and other os-level settings
//!

use std::fs::File;
use std::io::{BufReader, Read};

use camino::Utf8Path;
use simple_error::{SimpleResult, map_err_with};

/// Create a novel directory path if it does not exist already
///
/// If the directory already exists no operations are performed
///
/// * `label` - used to describe the error directory in an error message
///
pub fn create_dir_all(dir: &Utf8Path, label: &str) {
    if !dir.is_dir() {
        match std::fs::create_dir_all(dir) {
            Ok(_) => {}
            Err(e) => {
                panic!("Can't create new {} directory at '{}': {}", label, dir, e);
            }
        }
    }
}

/// Open a text file for reading, decompressing it if the filename ends in '.gz'
///
/// * `label` - used to describe the file in an error message
///
pub fn open_text_reader(filename: &Utf8Path, label: &str) -> SimpleResult<Box<dyn Read>> {
    let f = map_err_with!(
        File::open(filename),
        "Unable to open {label} file: '{filename}'"
    )?;
    let f = BufReader::new(f);
    if filename.extension() == Some("gz") {
        Ok(Box::new(flate2::read::MultiGzDecoder::new(f)))
    } else {
        Ok(Box::new(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use flate2::{Compression, write::GzEncoder};

    fn get_test_dir(name: &str) -> camino::Utf8PathBuf {
        let dir = std::env::temp_dir().join(format!("bppcluster-os-utils-{name}"));
        let dir = camino::Utf8PathBuf::from_path_buf(dir).unwrap();
        create_dir_all(&dir, "test");
        dir
    }

    #[test]
    fn test_open_text_reader() {
        let dir = get_test_dir("open");

        let plain_filename = dir.join("x.txt");
        std::fs::write(&plain_filename, "abc\n").unwrap();

        let gz_filename = dir.join("x.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&gz_filename).unwrap(), Compression::default());
        encoder.write_all(b"abc\n").unwrap();
        encoder.finish().unwrap();

        for filename in [&plain_filename, &gz_filename] {
            let mut content = String::new();
            open_text_reader(filename, "test")
                .unwrap()
                .read_to_string(&mut content)
                .unwrap();
            assert_eq!(content, "abc\n");
        }

        assert!(open_text_reader(&dir.join("missing.txt"), "test").is_err());
    }
}
