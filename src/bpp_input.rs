//! Read breakpoint pairs from tab-separated input files
//!

use std::collections::BTreeMap;
use std::io::Read;
use std::str::FromStr;

use camino::Utf8Path;
use csv::{ReaderBuilder, Trim};
use log::info;
use regex::Regex;
use simple_error::{SimpleResult, bail, map_err_with};

use crate::breakpoint::{Breakpoint, BreakpointPair, Orientation, Strand, SvType};
use crate::columns::{self, is_null, parse_bool};
use crate::os_utils::open_text_reader;

/// Columns which must be present in the input header
const REQUIRED_COLUMNS: &[&str] = &[
    columns::BREAK1_CHROMOSOME,
    columns::BREAK1_POSITION_START,
    columns::BREAK1_POSITION_END,
    columns::BREAK2_CHROMOSOME,
    columns::BREAK2_POSITION_START,
    columns::BREAK2_POSITION_END,
];

/// Columns consumed into the breakpoint pair itself, these are not copied into the pair's data map
const BREAKPOINT_PAIR_COLUMNS: &[&str] = &[
    columns::BREAK1_CHROMOSOME,
    columns::BREAK1_POSITION_START,
    columns::BREAK1_POSITION_END,
    columns::BREAK1_ORIENTATION,
    columns::BREAK1_STRAND,
    columns::BREAK2_CHROMOSOME,
    columns::BREAK2_POSITION_START,
    columns::BREAK2_POSITION_END,
    columns::BREAK2_ORIENTATION,
    columns::BREAK2_STRAND,
    columns::OPPOSING_STRANDS,
    columns::STRANDED,
    columns::UNTEMPLATED_SEQ,
];

struct BreakpointColumns {
    chrom: &'static str,
    start: &'static str,
    end: &'static str,
    orient: &'static str,
    strand: &'static str,
}

const BREAK1_COLUMNS: BreakpointColumns = BreakpointColumns {
    chrom: columns::BREAK1_CHROMOSOME,
    start: columns::BREAK1_POSITION_START,
    end: columns::BREAK1_POSITION_END,
    orient: columns::BREAK1_ORIENTATION,
    strand: columns::BREAK1_STRAND,
};

const BREAK2_COLUMNS: BreakpointColumns = BreakpointColumns {
    chrom: columns::BREAK2_CHROMOSOME,
    start: columns::BREAK2_POSITION_START,
    end: columns::BREAK2_POSITION_END,
    orient: columns::BREAK2_ORIENTATION,
    strand: columns::BREAK2_STRAND,
};

struct RowParser {
    chrom_prefix: Regex,
}

impl RowParser {
    fn new() -> Self {
        Self {
            chrom_prefix: Regex::new("^chr").unwrap(),
        }
    }

    fn get_chrom(&self, row: &BTreeMap<String, String>, key: &str) -> SimpleResult<String> {
        let chrom = get_required_value(row, key)?;
        Ok(self.chrom_prefix.replace(chrom, "").to_string())
    }

    fn get_breakpoint(
        &self,
        row: &BTreeMap<String, String>,
        keys: &BreakpointColumns,
        stranded: bool,
    ) -> SimpleResult<Breakpoint> {
        let chrom = self.get_chrom(row, keys.chrom)?;
        let start = get_position(row, keys.start)?;
        let end = get_position(row, keys.end)?;
        if start > end {
            bail!("Breakpoint start {start} is greater than end {end}");
        }
        let orient = get_symbol(row, keys.orient, Orientation::NotSpecified)?;
        let strand = if stranded {
            get_symbol(row, keys.strand, Strand::NotSpecified)?
        } else {
            Strand::NotSpecified
        };
        Ok(Breakpoint::new(&chrom, start, end, orient, strand))
    }

    /// Convert one input row to a breakpoint pair
    ///
    /// Strands are ignored for pairs that are not stranded.
    ///
    fn parse_row(&self, row: BTreeMap<String, String>) -> SimpleResult<BreakpointPair> {
        let stranded = match get_optional_value(&row, columns::STRANDED) {
            Some(x) => map_err(parse_bool(x))?,
            None => false,
        };

        let break1 = self.get_breakpoint(&row, &BREAK1_COLUMNS, stranded)?;
        let break2 = self.get_breakpoint(&row, &BREAK2_COLUMNS, stranded)?;

        let opposing_strands = match get_optional_value(&row, columns::OPPOSING_STRANDS) {
            Some("?") | None => None,
            Some(x) => Some(map_err(parse_bool(x))?),
        };

        let untemplated_seq = get_optional_value(&row, columns::UNTEMPLATED_SEQ).map(String::from);

        let mut bpp = map_err_with!(
            BreakpointPair::new(break1, break2, opposing_strands, stranded, untemplated_seq),
            "Invalid breakpoint pair"
        )?;

        if let Some(event_types) = get_optional_value(&row, columns::EVENT_TYPE) {
            let supported_types = bpp.classify();
            for event_type in event_types.split(';') {
                let event_type = map_err_with!(
                    SvType::from_str(event_type),
                    "Unknown {} value '{event_type}'",
                    columns::EVENT_TYPE
                )?;
                if !supported_types.contains(&event_type) {
                    bail!(
                        "{} '{event_type}' is not supported by breakpoint pair {bpp:?}",
                        columns::EVENT_TYPE
                    );
                }
            }
        }

        bpp.data = row
            .into_iter()
            .filter(|(k, _)| !BREAKPOINT_PAIR_COLUMNS.contains(&k.as_str()))
            .collect();
        Ok(bpp)
    }
}

fn map_err<T>(x: Result<T, String>) -> SimpleResult<T> {
    x.map_err(simple_error::SimpleError::new)
}

/// Get a column value, treating null tokens as missing
fn get_optional_value<'a>(row: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    row.get(key).map(|x| x.as_str()).filter(|x| !is_null(x))
}

fn get_required_value<'a>(row: &'a BTreeMap<String, String>, key: &str) -> SimpleResult<&'a str> {
    match get_optional_value(row, key) {
        Some(x) => Ok(x),
        None => bail!("Missing required value for column '{key}'"),
    }
}

fn get_position(row: &BTreeMap<String, String>, key: &str) -> SimpleResult<i64> {
    let value = get_required_value(row, key)?;
    Ok(map_err_with!(
        value.parse::<i64>(),
        "Can't parse integer position from column '{key}' value '{value}'"
    )?)
}

fn get_symbol<T: FromStr>(row: &BTreeMap<String, String>, key: &str, default: T) -> SimpleResult<T> {
    match get_optional_value(row, key) {
        Some(value) => match T::from_str(value) {
            Ok(x) => Ok(x),
            Err(_) => bail!("Unexpected value in column '{key}': '{value}'"),
        },
        None => Ok(default),
    }
}

/// Get column names from the header record, checking that all required columns are present
///
fn parse_header(record: &csv::StringRecord, label: &str) -> SimpleResult<Vec<String>> {
    let columns = record
        .iter()
        .enumerate()
        .map(|(i, x)| {
            if i == 0 {
                x.trim_start_matches('#').trim().to_string()
            } else {
                x.to_string()
            }
        })
        .collect::<Vec<_>>();
    for &required_column in REQUIRED_COLUMNS {
        if !columns.iter().any(|x| x == required_column) {
            bail!("Missing required column '{required_column}' in header of {label}");
        }
    }
    Ok(columns)
}

/// Parse breakpoint pairs from tabbed text
///
/// The header is the first line starting with a single '#'. Lines before the header starting
/// with '##' are skipped. Input without any lines is treated as an empty breakpoint pair list.
///
/// * `label` - used to describe the input source in error messages
///
pub fn parse_breakpoint_pairs(reader: impl Read, label: &str) -> SimpleResult<Vec<BreakpointPair>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .delimiter(b'\t')
        .from_reader(reader);

    let row_parser = RowParser::new();
    let mut header: Option<Vec<String>> = None;
    let mut pairs = Vec::new();
    let mut record_count = 0;
    for result in rdr.records() {
        let record = map_err_with!(result, "Failed to parse tabbed record from {label}")?;
        record_count += 1;
        let line_number = record.position().map(|x| x.line()).unwrap_or_default();

        let Some(header) = header.as_ref() else {
            if record.get(0).unwrap_or_default().starts_with("##") {
                continue;
            }
            header = Some(parse_header(&record, label)?);
            continue;
        };

        if record.len() != header.len() {
            bail!(
                "Expected {} columns but found {} on line {line_number} of {label}",
                header.len(),
                record.len()
            );
        }

        let row = header
            .iter()
            .cloned()
            .zip(record.iter().map(|x| x.to_string()))
            .collect::<BTreeMap<_, _>>();

        let bpp = map_err_with!(
            row_parser.parse_row(row),
            "Invalid record on line {line_number} of {label}"
        )?;
        pairs.push(bpp);
    }

    if header.is_none() {
        if record_count == 0 {
            info!("Ignoring empty {label}");
            return Ok(pairs);
        }
        bail!("No header found in {label}");
    }

    Ok(pairs)
}

/// Read all breakpoint pairs from a tabbed input file, which may be gzip compressed
///
pub fn read_breakpoint_pairs(filename: &Utf8Path) -> SimpleResult<Vec<BreakpointPair>> {
    info!("Reading breakpoint pairs from file: '{filename}'");
    let reader = open_text_reader(filename, "breakpoint pair input")?;
    let pairs = parse_breakpoint_pairs(reader, &format!("file '{filename}'"))?;
    info!("Read {} breakpoint pairs from file: '{filename}'", pairs.len());
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "#break1_chromosome\tbreak1_position_start\tbreak1_position_end\tbreak1_orientation\tbreak1_strand\tbreak2_chromosome\tbreak2_position_start\tbreak2_position_end\tbreak2_orientation\tbreak2_strand\topposing_strands\tstranded\tuntemplated_seq\ttools\n";

    fn parse(content: &str) -> SimpleResult<Vec<BreakpointPair>> {
        parse_breakpoint_pairs(content.as_bytes(), "test input")
    }

    #[test]
    fn test_parse_breakpoint_pairs() {
        let content = String::from("## metadata line\n")
            + HEADER
            + "chr1\t100\t110\tL\t+\tchr1\t500\t500\tR\t+\tFalse\tTrue\tNone\tdelly\n";
        let pairs = parse(&content).unwrap();
        assert_eq!(pairs.len(), 1);

        let bpp = &pairs[0];
        assert_eq!(
            bpp.break1,
            Breakpoint::new("1", 100, 110, Orientation::Left, Strand::Pos)
        );
        assert_eq!(bpp.break2.strand, Strand::Pos);
        assert!(!bpp.opposing_strands);
        assert!(bpp.stranded);
        assert_eq!(bpp.untemplated_seq, None);
        assert_eq!(bpp.data.get(columns::TOOLS).unwrap(), "delly");
        assert!(!bpp.data.contains_key(columns::BREAK1_CHROMOSOME));

        // Order is standardized, and opposing_strands can't be resolved without stranding
        let content = String::from(HEADER)
            + "2\t300\t300\t?\t?\t1\t50\t60\t?\t?\tFalse\tFalse\tACGT\tmanta;delly\n";
        let pairs = parse(&content).unwrap();
        let bpp = &pairs[0];
        assert_eq!(bpp.break1.chrom, "1");
        assert_eq!(bpp.break2.chrom, "2");
        assert_eq!(bpp.untemplated_seq.as_deref(), Some("ACGT"));
        assert_eq!(bpp.tools().len(), 2);
    }

    #[test]
    fn test_unresolved_opposing_strands_fails() {
        let content = String::from(HEADER)
            + "2\t300\t300\t?\t?\t1\t50\t60\t?\t?\t?\tFalse\tACGT\tmanta\n";
        assert!(parse(&content).is_err());
    }

    #[test]
    fn test_unstranded_input_drops_strands() {
        let content = String::from(HEADER)
            + "1\t100\t100\tL\t+\t1\t500\t500\tL\t-\tTrue\tFalse\tNone\tdelly\n";
        let pairs = parse(&content).unwrap();
        assert_eq!(pairs[0].break1.strand, Strand::NotSpecified);
        assert_eq!(pairs[0].break2.strand, Strand::NotSpecified);
        assert!(pairs[0].opposing_strands);
    }

    #[test]
    fn test_default_columns() {
        let content = "#break1_chromosome\tbreak1_position_start\tbreak1_position_end\tbreak2_chromosome\tbreak2_position_start\tbreak2_position_end\topposing_strands\tlibrary\n1\t10\t20\t1\t400\t410\tFalse\tlib1\n";
        let pairs = parse(content).unwrap();
        let bpp = &pairs[0];
        assert_eq!(bpp.break1.orient, Orientation::NotSpecified);
        assert_eq!(bpp.break1.strand, Strand::NotSpecified);
        assert!(!bpp.stranded);
        assert_eq!(bpp.library(), Some("lib1"));
    }

    #[test]
    fn test_invalid_rows() {
        let bad_rows = [
            // inverted interval
            "1\t110\t100\tL\t+\t1\t500\t500\tR\t+\tFalse\tTrue\tNone\tdelly\n",
            // bad orientation
            "1\t100\t110\tX\t+\t1\t500\t500\tR\t+\tFalse\tTrue\tNone\tdelly\n",
            // non-integer position
            "1\tabc\t110\tL\t+\t1\t500\t500\tR\t+\tFalse\tTrue\tNone\tdelly\n",
            // invalid topology
            "1\t100\t110\tL\t+\t1\t500\t500\tL\t+\tFalse\tTrue\tNone\tdelly\n",
            // column count
            "1\t100\t110\tL\t+\t1\t500\t500\tR\t+\tFalse\tTrue\tNone\n",
        ];
        for bad_row in bad_rows {
            let content = String::from(HEADER) + bad_row;
            assert!(parse(&content).is_err(), "row: {bad_row}");
        }
    }

    #[test]
    fn test_error_reports_line_number() {
        let content = String::from(HEADER)
            + "1\t100\t110\tL\t+\t1\t500\t500\tR\t+\tFalse\tTrue\tNone\tdelly\n"
            + "1\tabc\t110\tL\t+\t1\t500\t500\tR\t+\tFalse\tTrue\tNone\tdelly\n";
        let msg = parse(&content).unwrap_err().to_string();
        assert!(msg.contains("line 3"), "{msg}");
    }

    #[test]
    fn test_missing_required_column() {
        let content = "#break1_chromosome\tbreak1_position_start\n1\t10\n";
        assert!(parse(content).is_err());
        assert!(parse("## metadata only\n").is_err());
    }

    #[test]
    fn test_empty_input_is_ignored() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse(HEADER).unwrap().is_empty());

        let dir = std::env::temp_dir().join("bppcluster-bpp-input-empty");
        let dir = camino::Utf8PathBuf::from_path_buf(dir).unwrap();
        std::fs::create_dir_all(&dir).unwrap();
        let filename = dir.join("empty.tab");
        std::fs::write(&filename, "").unwrap();
        assert!(read_breakpoint_pairs(&filename).unwrap().is_empty());
    }

    #[test]
    fn test_event_type_check() {
        let header = "#break1_chromosome\tbreak1_position_start\tbreak1_position_end\tbreak1_orientation\tbreak2_chromosome\tbreak2_position_start\tbreak2_position_end\tbreak2_orientation\topposing_strands\tevent_type\n";
        let content = String::from(header) + "1\t10\t10\tL\t1\t400\t400\tR\tFalse\tdeletion\n";
        let pairs = parse(&content).unwrap();
        assert_eq!(pairs[0].data.get(columns::EVENT_TYPE).unwrap(), "deletion");

        let content = String::from(header) + "1\t10\t10\tL\t1\t400\t400\tR\tFalse\tinversion\n";
        assert!(parse(&content).is_err());
    }
}
