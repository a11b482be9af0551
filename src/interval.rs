use std::fmt;

/// A closed integer range, [start,end]
///
/// All breakpoint intervals follow the 1-indexed, fully-closed convention of the breakpoint pair
/// input files. A single position has start == end.
///
/// This differs from the half-closed convention used for BED regions, see `to_bed_range`.
///
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

/// Weighted means are undefined over an empty interval list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyInputError;

impl fmt::Display for EmptyInputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Can't compute the weighted mean of an empty interval list")
    }
}

impl std::error::Error for EmptyInputError {}

impl Interval {
    pub fn new(start: i64, end: i64) -> Self {
        assert!(start <= end, "Invalid interval [{start},{end}]");
        Self { start, end }
    }

    #[allow(dead_code)]
    pub fn from_pos(pos: i64) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) as f64 / 2.0
    }

    #[allow(dead_code)]
    pub fn contains_pos(&self, pos: i64) -> bool {
        pos >= self.start && pos <= self.end
    }

    /// Return true if the closed ranges share at least one position
    ///
    #[allow(dead_code)]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    #[allow(dead_code)]
    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Interval {
            start: std::cmp::max(self.start, other.start),
            end: std::cmp::min(self.end, other.end),
        })
    }

    /// Smallest interval covering both inputs
    #[allow(dead_code)]
    pub fn union(&self, other: &Interval) -> Interval {
        Interval {
            start: std::cmp::min(self.start, other.start),
            end: std::cmp::max(self.end, other.end),
        }
    }

    /// Expand the interval by `size` on each side
    pub fn expand_by(&self, size: i64) -> Interval {
        Interval {
            start: self.start - size,
            end: self.end + size,
        }
    }

    /// Translate to a 0-indexed, half-closed [start,end) range for BED output
    pub fn to_bed_range(&self) -> (i64, i64) {
        (self.start - 1, self.end)
    }

    /// Weighted consensus of a set of intervals
    ///
    /// Each interval is weighted by the inverse of its length, so that precise intervals dominate
    /// the consensus position. The consensus center is the weighted mean of the input centers, and
    /// the consensus length is the same weighted mean of input lengths (the harmonic mean length).
    ///
    /// The result is bounded by the min start and max end of the inputs.
    ///
    pub fn weighted_mean(intervals: &[Interval]) -> Result<Interval, EmptyInputError> {
        if intervals.is_empty() {
            return Err(EmptyInputError);
        }

        let mut weight_sum = 0.0;
        let mut center_sum = 0.0;
        let mut len_sum = 0.0;
        for interval in intervals.iter() {
            let len = interval.len() as f64;
            let weight = 1.0 / len;
            weight_sum += weight;
            center_sum += weight * interval.center();
            len_sum += weight * len;
        }
        let center = center_sum / weight_sum;
        let len = len_sum / weight_sum;

        let min_start = intervals.iter().map(|x| x.start).min().unwrap();
        let max_end = intervals.iter().map(|x| x.end).max().unwrap();

        let start = ((center - len / 2.0 + 0.5).round() as i64).clamp(min_start, max_end);
        let end = ((center + len / 2.0 - 0.5).round() as i64).clamp(start, max_end);
        Ok(Interval { start, end })
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.start == self.end {
            write!(f, "[{}]", self.start)
        } else {
            write!(f, "[{}-{}]", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_and_center() {
        let i = Interval::new(10, 20);
        assert_eq!(i.len(), 11);
        approx::assert_ulps_eq!(i.center(), 15.0, max_ulps = 4);

        let p = Interval::from_pos(7);
        assert_eq!(p.len(), 1);
        approx::assert_ulps_eq!(p.center(), 7.0, max_ulps = 4);
    }

    #[test]
    fn test_overlaps() {
        let i1 = Interval::new(1, 4);
        let i2 = Interval::new(4, 8);
        let i3 = Interval::new(5, 8);

        assert!(i1.overlaps(&i2));
        assert!(i2.overlaps(&i1));
        assert!(!i1.overlaps(&i3));
        assert_eq!(i1.intersection(&i2), Some(Interval::from_pos(4)));
        assert_eq!(i1.intersection(&i3), None);
        assert_eq!(i1.union(&i3), Interval::new(1, 8));
        assert!(i1.contains_pos(4));
        assert!(!i1.contains_pos(5));
    }

    #[test]
    fn test_weighted_mean() {
        let x = Interval::weighted_mean(&[Interval::from_pos(1), Interval::from_pos(10)]);
        assert_eq!(x, Ok(Interval::from_pos(6)));

        let x = Interval::weighted_mean(&[
            Interval::new(1, 2),
            Interval::new(1, 9),
            Interval::new(2, 10),
        ]);
        assert_eq!(x, Ok(Interval::new(1, 4)));

        let x = Interval::weighted_mean(&[Interval::new(15, 20)]);
        assert_eq!(x, Ok(Interval::new(15, 20)));
    }

    #[test]
    fn test_weighted_mean_empty() {
        assert_eq!(Interval::weighted_mean(&[]), Err(EmptyInputError));
    }

    #[test]
    fn test_weighted_mean_is_bounded() {
        let test_sets = [
            vec![Interval::from_pos(1), Interval::new(1, 100)],
            vec![Interval::new(50, 60), Interval::from_pos(3), Interval::new(2, 1000)],
            vec![Interval::new(-5, 5), Interval::new(-20, -10)],
        ];
        for intervals in test_sets.iter() {
            let min_start = intervals.iter().map(|x| x.start).min().unwrap();
            let max_end = intervals.iter().map(|x| x.end).max().unwrap();
            let mean = Interval::weighted_mean(intervals).unwrap();
            assert!(mean.start <= mean.end);
            assert!(mean.start >= min_start && mean.end <= max_end);
        }
    }
}
