use std::collections::HashMap;
use std::io::Read;
use std::ops::Range;

use bio::data_structures::interval_tree::IntervalTree;
use camino::Utf8Path;
use log::info;
use regex::Regex;
use simple_error::{SimpleResult, bail, map_err_with};

use crate::breakpoint::{Breakpoint, BreakpointPair};
use crate::columns;
use crate::os_utils::open_text_reader;

/// A set of chromosome regions which can be efficiently queried
///
/// Regions use the 0-indexed, half-closed coordinates of BED files.
///
#[derive(Clone)]
pub struct ChromRegions {
    regions: IntervalTree<i64, ()>,
}

impl ChromRegions {
    pub fn new() -> Self {
        Self {
            regions: IntervalTree::new(),
        }
    }

    /// Return the first region intersecting the start-end range, if any
    ///
    pub fn find_overlap(&self, start: i64, end: i64) -> Option<Range<i64>> {
        self.regions
            .find(start..end)
            .next()
            .map(|x| {
                let interval = x.interval();
                interval.start..interval.end
            })
    }

    /// Add region, regions are not collapsed
    ///
    pub fn add_region(&mut self, start: i64, end: i64) {
        self.regions.insert(start..end, ());
    }
}

#[derive(Clone)]
pub struct GenomeRegions {
    pub chroms: HashMap<String, ChromRegions>,
    region_count: usize,
}

impl GenomeRegions {
    pub fn new() -> Self {
        Self {
            chroms: HashMap::new(),
            region_count: 0,
        }
    }

    /// Parse regions from BED formatted text
    ///
    /// Header lines starting with '#', 'track' or 'browser' are skipped. A leading 'chr' is removed
    /// from chromosome names to match breakpoint chromosome names.
    ///
    /// * `label` - used to describe the input source in error messages
    ///
    pub fn from_bed_reader(mut reader: impl Read, label: &str) -> SimpleResult<Self> {
        let mut content = String::new();
        map_err_with!(
            reader.read_to_string(&mut content),
            "Can't parse text from {label}"
        )?;

        let chrom_prefix = Regex::new("^chr").unwrap();
        let mut regions = GenomeRegions::new();
        for (line_index, line) in content.lines().enumerate() {
            let line_number = line_index + 1;
            if line.trim().is_empty()
                || line.starts_with('#')
                || line.starts_with("track")
                || line.starts_with("browser")
            {
                continue;
            }

            let words = line.split('\t').collect::<Vec<_>>();
            if words.len() < 3 {
                bail!("Expected at least 3 columns on line {line_number} of {label}");
            }
            let chrom = chrom_prefix.replace(words[0], "");
            let start = map_err_with!(
                words[1].trim().parse::<i64>(),
                "Can't parse region start on line {line_number} of {label}"
            )?;
            let end = map_err_with!(
                words[2].trim().parse::<i64>(),
                "Can't parse region end on line {line_number} of {label}"
            )?;
            if start >= end {
                bail!("Empty or inverted region on line {line_number} of {label}");
            }
            regions.add_region(&chrom, start, end);
        }
        Ok(regions)
    }

    /// Create new object from a bed file, which may be gzip compressed
    ///
    /// * `label` - Used in log and error messages to describe what type of regions file this is
    ///
    pub fn from_bed(filename: &Utf8Path, label: &str) -> SimpleResult<Self> {
        info!("Reading {label} regions from file '{filename}'");
        let reader = open_text_reader(filename, &format!("{label} regions"))?;
        let regions = Self::from_bed_reader(reader, &format!("{label} regions file '{filename}'"))?;
        info!(
            "Read {} {label} regions on {} chromosomes",
            regions.region_count,
            regions.chroms.len()
        );
        Ok(regions)
    }

    /// Add a region in BED coordinates
    ///
    /// # Arguments
    /// * `chrom` - the contig string
    /// * `start` - the start coordinate (included)
    /// * `end` - the end coordinates (excluded)
    pub fn add_region(&mut self, chrom: &str, start: i64, end: i64) {
        self.chroms
            .entry(chrom.to_owned())
            .or_insert_with(ChromRegions::new)
            .add_region(start, end);
        self.region_count += 1;
    }

    /// Return the first region overlapping the breakpoint interval, expanded by `padding` on
    /// each side
    ///
    pub fn find_breakpoint_overlap(
        &self,
        breakpoint: &Breakpoint,
        padding: i64,
    ) -> Option<Range<i64>> {
        let (start, end) = breakpoint.interval.expand_by(padding).to_bed_range();
        self.chroms
            .get(&breakpoint.chrom)
            .and_then(|x| x.find_overlap(start, end))
    }
}

/// Split breakpoint pairs by overlap with masked regions
///
/// Pairs with either breakpoint overlapping a masked region fail the filter, and have the
/// overlapping region recorded in their filter comment.
///
/// Returns (passed, failed) pairs
///
pub fn filter_masked_pairs(
    pairs: Vec<BreakpointPair>,
    masking: &GenomeRegions,
) -> (Vec<BreakpointPair>, Vec<BreakpointPair>) {
    info!(
        "Filtering from {} breakpoint pairs using overlaps with masked regions",
        pairs.len()
    );
    let input_count = pairs.len();
    let mut passed = Vec::new();
    let mut failed = Vec::new();
    for mut bpp in pairs {
        let overlap = [&bpp.break1, &bpp.break2]
            .into_iter()
            .find_map(|b| masking.find_breakpoint_overlap(b, 0).map(|x| (b.chrom.clone(), x)));
        match overlap {
            Some((chrom, region)) => {
                bpp.data.insert(
                    columns::FILTER_COMMENT.to_string(),
                    format!(
                        "overlapped masked region: {chrom}:{}-{}",
                        region.start + 1,
                        region.end
                    ),
                );
                failed.push(bpp);
            }
            None => passed.push(bpp),
        }
    }
    info!(
        "Filtered from {input_count} down to {} (removed {})",
        passed.len(),
        failed.len()
    );
    (passed, failed)
}

/// Split breakpoint pairs by proximity to annotated regions
///
/// Pairs pass the filter if either breakpoint is within `max_proximity` of an annotated region.
///
/// Returns (passed, failed) pairs
///
pub fn filter_uninformative_pairs(
    pairs: Vec<BreakpointPair>,
    annotations: &GenomeRegions,
    max_proximity: i64,
) -> (Vec<BreakpointPair>, Vec<BreakpointPair>) {
    info!(
        "Filtering from {} breakpoint pairs using informative filter",
        pairs.len()
    );
    let input_count = pairs.len();
    let (passed, failed): (Vec<_>, Vec<_>) = pairs.into_iter().partition(|bpp| {
        [&bpp.break1, &bpp.break2]
            .into_iter()
            .any(|b| annotations.find_breakpoint_overlap(b, max_proximity).is_some())
    });
    info!(
        "Filtered from {input_count} down to {} (removed {})",
        passed.len(),
        failed.len()
    );
    (passed, failed)
}
