//! Column names shared by the tabbed breakpoint pair input and output files
//!

pub const BREAK1_CHROMOSOME: &str = "break1_chromosome";
pub const BREAK1_POSITION_START: &str = "break1_position_start";
pub const BREAK1_POSITION_END: &str = "break1_position_end";
pub const BREAK1_ORIENTATION: &str = "break1_orientation";
pub const BREAK1_STRAND: &str = "break1_strand";
pub const BREAK2_CHROMOSOME: &str = "break2_chromosome";
pub const BREAK2_POSITION_START: &str = "break2_position_start";
pub const BREAK2_POSITION_END: &str = "break2_position_end";
pub const BREAK2_ORIENTATION: &str = "break2_orientation";
pub const BREAK2_STRAND: &str = "break2_strand";
pub const OPPOSING_STRANDS: &str = "opposing_strands";
pub const STRANDED: &str = "stranded";
pub const UNTEMPLATED_SEQ: &str = "untemplated_seq";

pub const CLUSTER_ID: &str = "cluster_id";
pub const CLUSTER_SIZE: &str = "cluster_size";
pub const CLUSTERS: &str = "clusters";
pub const EVENT_TYPE: &str = "event_type";
pub const FILTER_COMMENT: &str = "filter_comment";
pub const LIBRARY: &str = "library";
pub const PROTOCOL: &str = "protocol";
pub const TOOLS: &str = "tools";

/// String used for unset values in tabbed output
pub const NULL_VALUE: &str = "None";

/// Canonical leading column order for tabbed output, all other columns follow in sorted order
const COLUMN_ORDER: &[&str] = &[
    CLUSTER_ID,
    BREAK1_CHROMOSOME,
    BREAK1_POSITION_START,
    BREAK1_POSITION_END,
    BREAK1_ORIENTATION,
    BREAK1_STRAND,
    BREAK2_CHROMOSOME,
    BREAK2_POSITION_START,
    BREAK2_POSITION_END,
    BREAK2_ORIENTATION,
    BREAK2_STRAND,
    OPPOSING_STRANDS,
    STRANDED,
    UNTEMPLATED_SEQ,
    LIBRARY,
    PROTOCOL,
    TOOLS,
];

pub fn format_bool(x: bool) -> String {
    if x { "True" } else { "False" }.to_string()
}

/// Parse a boolean column value
///
/// Returns Err for anything that isn't a recognized boolean token
///
pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err(format!("Can't parse boolean value from '{s}'")),
    }
}

/// True for the tokens used to represent an unset value
pub fn is_null(s: &str) -> bool {
    matches!(s, "" | "None" | "none" | "null" | "NULL")
}

/// Sort a set of column names into output order
///
pub fn sort_columns<'a>(columns: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut columns = columns.into_iter().collect::<Vec<_>>();
    columns.sort_by_key(|x| {
        (
            COLUMN_ORDER
                .iter()
                .position(|y| y == x)
                .unwrap_or(COLUMN_ORDER.len()),
            *x,
        )
    });
    columns.dedup();
    columns.into_iter().map(|x| x.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_columns() {
        let columns = sort_columns(["zeta", TOOLS, BREAK2_CHROMOSOME, "alpha", BREAK1_CHROMOSOME]);
        assert_eq!(
            columns,
            vec![BREAK1_CHROMOSOME, BREAK2_CHROMOSOME, TOOLS, "alpha", "zeta"]
        );
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }
}
