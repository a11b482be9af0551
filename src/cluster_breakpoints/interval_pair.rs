use std::fmt;

use crate::interval::{EmptyInputError, Interval};

/// The breakpoint pair representation used as a clustering graph node
///
/// `start` and `end` are the intervals of breakpoints 1 and 2. `id` is the index of the
/// breakpoint pair in the clustering input, it is only a lookup key back to that input, and is
/// None for synthetic pairs such as weighted means.
///
/// Sort order is (start, end), with id as the final tie-breaker.
///
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct IntervalPair {
    pub start: Interval,
    pub end: Interval,
    pub id: Option<usize>,
}

impl IntervalPair {
    pub fn new(start: Interval, end: Interval, id: usize) -> Self {
        Self {
            start,
            end,
            id: Some(id),
        }
    }

    /// Clustering distance between two pairs
    ///
    /// This is the mean of the center distances of the two start intervals and the two end
    /// intervals. It is symmetric and zero for identical pairs, but does not satisfy the triangle
    /// inequality in general.
    ///
    pub fn dist(&self, other: &IntervalPair) -> f64 {
        let d_start = (self.start.center() - other.start.center()).abs();
        let d_end = (self.end.center() - other.end.center()).abs();
        (d_start + d_end) / 2.0
    }

    /// Element-wise weighted mean of the start and end intervals of the input pairs
    ///
    pub fn weighted_mean<'a>(
        pairs: impl IntoIterator<Item = &'a IntervalPair>,
    ) -> Result<IntervalPair, EmptyInputError> {
        let (starts, ends): (Vec<_>, Vec<_>) = pairs.into_iter().map(|x| (x.start, x.end)).unzip();
        Ok(IntervalPair {
            start: Interval::weighted_mean(&starts)?,
            end: Interval::weighted_mean(&ends)?,
            id: None,
        })
    }
}

impl fmt::Debug for IntervalPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IntervalPair<{:?}, {:?}", self.start, self.end)?;
        if let Some(id) = self.id {
            write!(f, ", id={id}")?;
        }
        write!(f, ">")
    }
}
