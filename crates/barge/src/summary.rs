//! Additive counter summaries reported at every aggregation level.

use serde::Serialize;

/// Outcome counters for one file, one page, or the whole job.
///
/// Merging is per-field addition, so summaries can be folded in any order:
/// file results into a window, windows into a page, pages into the job
/// total. Every scheduled file lands in exactly one of `success`/`failure`
/// accounting or a single `failure` unit, never both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Bulk items acknowledged with a 201 create status.
    pub success: u64,
    /// Bulk items with any other status, plus one unit per file that failed
    /// to fetch, decode, or submit.
    pub failure: u64,
    /// Bulk items tallied, successful or not.
    pub records: u64,
    /// Files handed to the scheduler.
    pub files: u64,
    /// Listing pages walked.
    pub pages: u64,
}

impl ImportSummary {
    /// The unit substituted for a file whose import failed outright.
    pub(crate) fn failed_file() -> Self {
        Self {
            failure: 1,
            ..Self::default()
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.success += other.success;
        self.failure += other.failure;
        self.records += other.records;
        self.files += other.files;
        self.pages += other.pages;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(seed: u64) -> ImportSummary {
        ImportSummary {
            success: seed,
            failure: seed * 2,
            records: seed * 3,
            files: seed + 1,
            pages: seed % 2,
        }
    }

    #[test]
    fn merge_is_commutative() {
        let (a, b) = (sample(3), sample(7));

        let mut left = a;
        left.merge(b);
        let mut right = b;
        right.merge(a);

        assert_eq!(left, right);
    }

    #[test]
    fn merge_is_associative() {
        let (a, b, c) = (sample(1), sample(4), sample(9));

        let mut left = a;
        left.merge(b);
        left.merge(c);

        let mut bc = b;
        bc.merge(c);
        let mut right = a;
        right.merge(bc);

        assert_eq!(left, right);
    }

    #[test]
    fn default_is_the_merge_identity() {
        let mut merged = sample(5);
        merged.merge(ImportSummary::default());
        assert_eq!(merged, sample(5));
    }

    #[test]
    fn failed_file_is_one_failure_unit() {
        assert_eq!(
            ImportSummary::failed_file(),
            ImportSummary {
                failure: 1,
                ..ImportSummary::default()
            }
        );
    }
}
