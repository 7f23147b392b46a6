//! Column summary statistics.

use crate::input::{Column, Dataset};

use super::report::{NumericSummary, ReportSummary};

// =============================================================================
// RUNNING MOMENTS
// =============================================================================
// Welford's online algorithm for computing mean and variance in a single pass.

#[derive(Debug, Clone)]
struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64, // Sum of squared differences from mean
}

impl RunningStats {
    fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Sample standard deviation; undefined below two values.
    fn sample_std(&self) -> Option<f64> {
        (self.count >= 2).then(|| (self.m2 / (self.count - 1) as f64).sqrt())
    }
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Describe a numeric column. Returns `None` for non-numeric columns.
pub fn describe(column: &Column) -> Option<NumericSummary> {
    if !column.dtype().is_numeric() {
        return None;
    }

    let mut running = RunningStats::new();
    let mut sorted: Vec<f64> = Vec::with_capacity(column.len());
    for value in column.numeric_values() {
        running.add(value);
        sorted.push(value);
    }
    sorted.sort_by(f64::total_cmp);

    let present = running.count > 0;
    Some(NumericSummary {
        count: running.count,
        mean: present.then_some(running.mean),
        std: running.sample_std(),
        min: sorted.first().copied(),
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.50),
        q3: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    })
}

/// Null counts, unique counts and numeric descriptions for every column.
pub fn summarize(dataset: &Dataset) -> ReportSummary {
    let mut summary = ReportSummary::default();
    for (name, column) in dataset.columns() {
        summary
            .null_counts
            .insert(name.to_string(), column.null_count());
        summary
            .unique_counts
            .insert(name.to_string(), column.unique_count());
        if let Some(stats) = describe(column) {
            summary.numeric_columns_stats.insert(name.to_string(), stats);
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_describe_matches_reference_values() {
        let col = Column::floats([Some(1.0), Some(2.0), Some(3.0), Some(4.0), None]);
        let stats = describe(&col).unwrap();

        assert_eq!(stats.count, 4);
        assert!(close(stats.mean, 2.5));
        assert!(close(stats.std, 1.2909944487358056));
        assert!(close(stats.min, 1.0));
        assert!(close(stats.q1, 1.75));
        assert!(close(stats.median, 2.5));
        assert!(close(stats.q3, 3.25));
        assert!(close(stats.max, 4.0));
    }

    #[test]
    fn test_describe_single_value_has_no_std() {
        let stats = describe(&Column::integers([Some(7)])).unwrap();
        assert_eq!(stats.std, None);
        assert!(close(stats.median, 7.0));
    }

    #[test]
    fn test_describe_all_null() {
        let stats = describe(&Column::floats([None, None])).unwrap();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.min, None);
    }

    #[test]
    fn test_describe_skips_text() {
        assert!(describe(&Column::strings([Some("a")])).is_none());
    }

    #[test]
    fn test_summarize_covers_every_column() {
        let ds = Dataset::from_columns([
            ("id", Column::strings([Some("a"), Some("a"), None])),
            ("price", Column::floats([Some(1.0), Some(2.0), Some(2.0)])),
        ])
        .unwrap();
        let summary = summarize(&ds);

        assert_eq!(summary.null_counts["id"], 1);
        assert_eq!(summary.unique_counts["id"], 1);
        assert_eq!(summary.unique_counts["price"], 2);
        assert!(summary.numeric_columns_stats.contains_key("price"));
        assert!(!summary.numeric_columns_stats.contains_key("id"));
    }
}
