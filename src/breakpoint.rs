use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::columns;
use crate::interval::Interval;

/// Orientation of a breakpoint
///
/// 'Left' means that the sequence to the left of the breakpoint is retained. A 'Left' breakpoint
/// would correspond to the first breakpoint of a simple deletion.
///
/// Variant order follows the sort order of the input symbols ('?' < 'L' < 'R').
///
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
)]
pub enum Orientation {
    #[strum(serialize = "?")]
    NotSpecified,
    #[strum(serialize = "L")]
    Left,
    #[strum(serialize = "R")]
    Right,
}

impl Orientation {
    /// All concrete orientations consistent with this one
    pub fn expand(self) -> &'static [Orientation] {
        match self {
            Orientation::NotSpecified => &[Orientation::Left, Orientation::Right],
            Orientation::Left => &[Orientation::Left],
            Orientation::Right => &[Orientation::Right],
        }
    }

    pub fn is_specified(self) -> bool {
        self != Orientation::NotSpecified
    }
}

/// Strand of a breakpoint
///
/// Variant order follows the sort order of the input symbols ('+' < '-' < '?').
///
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
)]
pub enum Strand {
    #[strum(serialize = "+")]
    Pos,
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "?")]
    NotSpecified,
}

impl Strand {
    pub fn is_specified(self) -> bool {
        self != Strand::NotSpecified
    }
}

/// Structural variant types that a breakpoint pair can support
///
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
)]
pub enum SvType {
    #[strum(serialize = "deletion")]
    Deletion,
    #[strum(serialize = "insertion")]
    Insertion,
    #[strum(serialize = "duplication")]
    Duplication,
    #[strum(serialize = "inversion")]
    Inversion,
    #[strum(serialize = "translocation")]
    Translocation,
    #[strum(serialize = "inverted translocation")]
    InvertedTranslocation,
}

/// One side of a structural variant
///
/// The interval may be a single position, or a range representing uncertainty in the breakpoint
/// location. Field order defines the breakpoint sort key: (chrom, start, end, orient, strand).
///
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Breakpoint {
    pub chrom: String,
    pub interval: Interval,
    pub orient: Orientation,
    pub strand: Strand,
}

impl Breakpoint {
    pub fn new(chrom: &str, start: i64, end: i64, orient: Orientation, strand: Strand) -> Self {
        Self {
            chrom: chrom.to_string(),
            interval: Interval::new(start, end),
            orient,
            strand,
        }
    }

    pub fn start(&self) -> i64 {
        self.interval.start
    }

    pub fn end(&self) -> i64 {
        self.interval.end
    }
}

impl fmt::Debug for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.chrom, self.interval.start)?;
        if self.interval.end != self.interval.start {
            write!(f, "-{}", self.interval.end)?;
        }
        write!(f, "{}{}", self.orient, self.strand)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BreakpointPairError {
    /// The given opposing_strands disagrees with the strands of the two breakpoints
    StrandConflict {
        break1: Breakpoint,
        break2: Breakpoint,
        opposing_strands: bool,
    },

    /// The orientation and opposing strand combination can't form a rearrangement
    InvalidRearrangement {
        break1: Breakpoint,
        break2: Breakpoint,
        opposing_strands: bool,
    },

    /// opposing_strands is not given and can't be inferred from the breakpoint strands
    Unresolvable { break1: Breakpoint, break2: Breakpoint },
}

impl fmt::Display for BreakpointPairError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BreakpointPairError::StrandConflict {
                break1,
                break2,
                opposing_strands,
            } => write!(
                f,
                "opposing_strands={opposing_strands} conflicts with the strands of breakpoints {break1:?} and {break2:?}"
            ),
            BreakpointPairError::InvalidRearrangement {
                break1,
                break2,
                opposing_strands,
            } => write!(
                f,
                "Breakpoints {break1:?} and {break2:?} with opposing_strands={opposing_strands} can't form a valid rearrangement"
            ),
            BreakpointPairError::Unresolvable { break1, break2 } => write!(
                f,
                "opposing_strands must be specified for breakpoints {break1:?} and {break2:?} without strand information"
            ),
        }
    }
}

impl std::error::Error for BreakpointPairError {}

/// Get the SV types supported by an orientation and opposing strand pattern
///
/// Returns None if the pattern is not a valid rearrangement topology. Unspecified orientations
/// are allowed, in which case all types consistent with the specified fields are returned.
///
pub fn get_sv_types(
    is_interchromosomal: bool,
    orient1: Orientation,
    orient2: Orientation,
    opposing_strands: bool,
) -> Option<Vec<SvType>> {
    use Orientation::*;
    use SvType::*;

    let is_same_orient = orient1.is_specified() && orient1 == orient2;
    let is_diff_orient = orient1.is_specified() && orient2.is_specified() && orient1 != orient2;

    if opposing_strands {
        if is_diff_orient {
            return None;
        }
        if is_interchromosomal {
            Some(vec![InvertedTranslocation])
        } else {
            Some(vec![Inversion])
        }
    } else {
        if is_same_orient {
            return None;
        }
        if is_interchromosomal {
            Some(vec![Translocation])
        } else if orient1 == Left || orient2 == Right {
            Some(vec![Deletion, Insertion])
        } else if orient1 == Right || orient2 == Left {
            Some(vec![Duplication])
        } else {
            Some(vec![Deletion, Insertion, Duplication])
        }
    }
}

/// Two breakpoints describing one rearrangement
///
/// Breakpoints are stored in standardized order, such that break1 <= break2.
///
/// Equality, hashing and sort order use the breakpoints, opposing strand state, stranded flag and
/// untemplated sequence. The auxiliary data map is not part of the pair's identity.
///
#[derive(Clone)]
pub struct BreakpointPair {
    pub break1: Breakpoint,
    pub break2: Breakpoint,
    pub opposing_strands: bool,

    /// If not stranded, then +/- is equivalent to -/+
    pub stranded: bool,

    /// Sequence between the breakpoints that is not part of either breakpoint
    pub untemplated_seq: Option<String>,

    /// Auxiliary columns from the input, such as tool name, library and tracking id
    pub data: BTreeMap<String, String>,
}

impl BreakpointPair {
    /// Create a new breakpoint pair, standardizing breakpoint order
    ///
    /// If `opposing_strands` is None it is inferred from the breakpoint strands.
    ///
    pub fn new(
        b1: Breakpoint,
        b2: Breakpoint,
        opposing_strands: Option<bool>,
        stranded: bool,
        untemplated_seq: Option<String>,
    ) -> Result<Self, BreakpointPairError> {
        let (break1, break2) = if b1 > b2 { (b2, b1) } else { (b1, b2) };

        let opposing_strands = if break1.strand.is_specified() && break2.strand.is_specified() {
            let opposing = break1.strand != break2.strand;
            match opposing_strands {
                Some(x) if x != opposing => {
                    return Err(BreakpointPairError::StrandConflict {
                        break1,
                        break2,
                        opposing_strands: x,
                    });
                }
                _ => opposing,
            }
        } else {
            match opposing_strands {
                Some(x) => x,
                None => return Err(BreakpointPairError::Unresolvable { break1, break2 }),
            }
        };

        let is_interchromosomal = break1.chrom != break2.chrom;
        if get_sv_types(
            is_interchromosomal,
            break1.orient,
            break2.orient,
            opposing_strands,
        )
        .is_none()
        {
            return Err(BreakpointPairError::InvalidRearrangement {
                break1,
                break2,
                opposing_strands,
            });
        }

        Ok(Self {
            break1,
            break2,
            opposing_strands,
            stranded,
            untemplated_seq,
            data: BTreeMap::new(),
        })
    }

    pub fn is_interchromosomal(&self) -> bool {
        self.break1.chrom != self.break2.chrom
    }

    /// Possible SV types supported by this pair
    ///
    pub fn classify(&self) -> Vec<SvType> {
        // Topology is checked on construction
        get_sv_types(
            self.is_interchromosomal(),
            self.break1.orient,
            self.break2.orient,
            self.opposing_strands,
        )
        .unwrap()
    }

    /// Set of tool names from the auxiliary data
    ///
    pub fn tools(&self) -> BTreeSet<String> {
        match self.data.get(columns::TOOLS) {
            Some(x) => x
                .split(';')
                .filter(|x| !x.is_empty())
                .map(|x| x.to_string())
                .collect(),
            None => BTreeSet::new(),
        }
    }

    pub fn library(&self) -> Option<&str> {
        self.data.get(columns::LIBRARY).map(|x| x.as_str())
    }

    fn key(&self) -> (&Breakpoint, &Breakpoint, bool, bool, &Option<String>) {
        (
            &self.break1,
            &self.break2,
            self.opposing_strands,
            self.stranded,
            &self.untemplated_seq,
        )
    }

    /// Key/value representation of the pair, which can be written directly as a tabbed row
    ///
    /// Auxiliary data is included, but is overwritten by any breakpoint pair column of the same
    /// name.
    ///
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut row = self.data.clone();
        let mut set = |k: &str, v: String| {
            row.insert(k.to_string(), v);
        };
        set(columns::BREAK1_CHROMOSOME, self.break1.chrom.clone());
        set(columns::BREAK1_POSITION_START, self.break1.start().to_string());
        set(columns::BREAK1_POSITION_END, self.break1.end().to_string());
        set(columns::BREAK1_ORIENTATION, self.break1.orient.to_string());
        set(columns::BREAK1_STRAND, self.break1.strand.to_string());
        set(columns::BREAK2_CHROMOSOME, self.break2.chrom.clone());
        set(columns::BREAK2_POSITION_START, self.break2.start().to_string());
        set(columns::BREAK2_POSITION_END, self.break2.end().to_string());
        set(columns::BREAK2_ORIENTATION, self.break2.orient.to_string());
        set(columns::BREAK2_STRAND, self.break2.strand.to_string());
        set(
            columns::OPPOSING_STRANDS,
            columns::format_bool(self.opposing_strands),
        );
        set(columns::STRANDED, columns::format_bool(self.stranded));
        set(
            columns::UNTEMPLATED_SEQ,
            self.untemplated_seq
                .clone()
                .unwrap_or_else(|| columns::NULL_VALUE.to_string()),
        );
        row
    }
}

impl PartialEq for BreakpointPair {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for BreakpointPair {}

impl std::hash::Hash for BreakpointPair {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Ord for BreakpointPair {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for BreakpointPair {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for BreakpointPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "BPP<{:?}==>{:?}; opposing={} seq={:?}>",
            self.break1, self.break2, self.opposing_strands, self.untemplated_seq
        )
    }
}
