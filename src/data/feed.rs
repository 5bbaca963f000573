use crate::error::{EvotraderError, Result};
use polars::prelude::*;

/// Ordered, fixed-width numeric rows, one per historical timestamp.
///
/// Rows are stored row-major. The feed is never mutated once built; cohorts only read
/// windows out of it.
#[derive(Debug, Clone, Default)]
pub struct FeatureFeed {
    values: Vec<f64>,
    width: usize,
}

impl FeatureFeed {
    /// Feed with `width` columns and no rows.
    pub fn empty(width: usize) -> Self {
        Self {
            values: Vec::new(),
            width,
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut values = Vec::with_capacity(width * rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(EvotraderError::shape(format!("feature row {}", i), width, row.len()));
            }
            values.extend(row);
        }
        Ok(Self { values, width })
    }

    /// Build a feed from every column of `df` except `exclude` (timestamps and the like).
    /// Columns are cast to `f64`; nulls are rejected.
    pub fn from_frame(df: &DataFrame, exclude: &[&str]) -> Result<Self> {
        let mut columns = Vec::new();
        for name in df.get_column_names() {
            if exclude.contains(&name.as_str()) {
                continue;
            }
            let column = df.column(name)?.cast(&DataType::Float64)?;
            if column.null_count() > 0 {
                return Err(EvotraderError::DataLoading(format!(
                    "Column '{}' has {} null values",
                    name,
                    column.null_count()
                )));
            }
            let values: Vec<f64> = column.f64()?.into_no_null_iter().collect();
            columns.push(values);
        }

        let width = columns.len();
        let height = if width == 0 { 0 } else { df.height() };
        let mut values = Vec::with_capacity(width * height);
        for row in 0..height {
            values.extend(columns.iter().map(|c| c[row]));
        }

        Ok(Self { values, width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.values.len() / self.width
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.values[index * self.width..(index + 1) * self.width]
    }

    /// Number of decision steps available with a window of `window_rows` rows.
    pub fn steps(&self, window_rows: usize) -> usize {
        if window_rows == 0 {
            return 0;
        }
        self.len().saturating_sub(window_rows - 1)
    }

    /// Flattened window for decision step `step`, newest row first.
    pub fn window(&self, step: usize, window_rows: usize) -> Vec<f64> {
        let newest = step + window_rows - 1;
        let mut window = Vec::with_capacity(window_rows * self.width);
        for row in (step..=newest).rev() {
            window.extend_from_slice(self.row(row));
        }
        window
    }

    /// Trade price seen at decision step `step`: `price_column` of the newest row.
    pub fn price(&self, step: usize, window_rows: usize, price_column: usize) -> f64 {
        self.row(step + window_rows - 1)[price_column]
    }

    pub fn input_size(&self, window_rows: usize) -> usize {
        self.width * window_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn sample() -> FeatureFeed {
        FeatureFeed::from_rows(vec![
            vec![1.0, 10.0],
            vec![2.0, 20.0],
            vec![3.0, 30.0],
            vec![4.0, 40.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_window_is_newest_first() {
        let feed = sample();
        assert_eq!(feed.steps(2), 3);
        assert_eq!(feed.window(0, 2), vec![2.0, 20.0, 1.0, 10.0]);
        assert_eq!(feed.window(2, 2), vec![4.0, 40.0, 3.0, 30.0]);
        assert_eq!(feed.price(2, 2, 0), 4.0);
        assert_eq!(feed.price(0, 2, 1), 20.0);
    }

    #[test]
    fn test_short_feed_has_no_steps() {
        assert_eq!(sample().steps(5), 0);
        assert_eq!(FeatureFeed::default().steps(1), 0);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = FeatureFeed::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(EvotraderError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_from_frame_skips_excluded() {
        let df = df! {
            "close_time" => &[1i64, 2, 3],
            "open" => &[1.0, 2.0, 3.0],
            "volume" => &[5i64, 6, 7],
        }
        .unwrap();

        let feed = FeatureFeed::from_frame(&df, &["close_time"]).unwrap();
        assert_eq!(feed.width(), 2);
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.row(1), &[2.0, 6.0]);
    }
}
