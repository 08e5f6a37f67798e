// 📈 History Viewer
// Turns stored measurements into the series plotted by the chart window
//
// The x-axis is categorical: point i sits at x = i, in insertion order.
// Timestamps are only used as labels, so two readings taken within the
// same second still plot as two distinct, correctly ordered points.

use crate::db::MeasurementStore;
use crate::error::StoreError;

/// Notice shown instead of a chart when nothing is stored
pub const EMPTY_HISTORY_MESSAGE: &str = "No BMI data available.";

/// Minimum vertical padding around the plotted values, in BMI units
const MIN_Y_PADDING: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryView {
    Empty,
    Chart(HistorySeries),
}

/// Parallel timestamp / BMI sequences, order preserved from the store
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySeries {
    pub timestamps: Vec<String>,
    pub bmis: Vec<f64>,
}

/// Load every stored record and decide what the history action shows
pub fn view_history<S: MeasurementStore + ?Sized>(store: &S) -> Result<HistoryView, StoreError> {
    let rows = store.fetch_all()?;

    if rows.is_empty() {
        return Ok(HistoryView::Empty);
    }

    let (timestamps, bmis): (Vec<String>, Vec<f64>) = rows.into_iter().unzip();
    Ok(HistoryView::Chart(HistorySeries { timestamps, bmis }))
}

impl HistorySeries {
    pub fn len(&self) -> usize {
        self.bmis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bmis.is_empty()
    }

    /// Most recent reading
    pub fn latest(&self) -> Option<(&str, f64)> {
        let i = self.len().checked_sub(1)?;
        Some((self.timestamps[i].as_str(), self.bmis[i]))
    }

    /// (index, bmi) pairs ready for plotting
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.bmis
            .iter()
            .enumerate()
            .map(|(i, &bmi)| (i as f64, bmi))
            .collect()
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        if self.len() <= 1 {
            // Centre a lone point
            [-1.0, 1.0]
        } else {
            [0.0, (self.len() - 1) as f64]
        }
    }

    /// Axis labels are spread evenly across the bounds, so only pick
    /// timestamps that fall exactly on those positions.
    pub fn x_labels(&self) -> Vec<String> {
        let n = self.len();
        match n {
            0 => Vec::new(),
            1 => vec![String::new(), self.timestamps[0].clone(), String::new()],
            _ if n % 2 == 1 => vec![
                self.timestamps[0].clone(),
                self.timestamps[(n - 1) / 2].clone(),
                self.timestamps[n - 1].clone(),
            ],
            _ => vec![self.timestamps[0].clone(), self.timestamps[n - 1].clone()],
        }
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let min = self.bmis.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.bmis.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if !min.is_finite() || !max.is_finite() {
            return [0.0, 1.0];
        }

        let padding = ((max - min) * 0.05).max(MIN_Y_PADDING);
        [min - padding, max + padding]
    }

    pub fn y_labels(&self) -> Vec<String> {
        let [low, high] = self.y_bounds();
        [low, (low + high) / 2.0, high]
            .iter()
            .map(|v| format!("{:.1}", v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, SqliteStore};

    fn series(rows: &[(&str, f64)]) -> HistorySeries {
        HistorySeries {
            timestamps: rows.iter().map(|(t, _)| t.to_string()).collect(),
            bmis: rows.iter().map(|(_, b)| *b).collect(),
        }
    }

    #[test]
    fn test_view_history_empty_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();

        assert_eq!(view_history(&store).unwrap(), HistoryView::Empty);
    }

    #[test]
    fn test_view_history_splits_rows_in_order() {
        let store = MemoryStore::new();
        store.insert(70.0, 1.75, 22.86, "2024-01-01 08:00:00").unwrap();
        store.insert(72.0, 1.75, 23.51, "2024-01-08 08:00:00").unwrap();

        let view = view_history(&store).unwrap();

        assert_eq!(
            view,
            HistoryView::Chart(series(&[
                ("2024-01-01 08:00:00", 22.86),
                ("2024-01-08 08:00:00", 23.51),
            ]))
        );
    }

    #[test]
    fn test_view_history_missing_table_is_read_error() {
        let store = SqliteStore::open_in_memory().unwrap();

        let err = view_history(&store).unwrap_err();

        assert!(matches!(err, StoreError::Read(_)));
    }

    #[test]
    fn test_points_use_categorical_index() {
        let s = series(&[("b", 22.0), ("a", 23.0), ("a", 21.5)]);

        assert_eq!(s.points(), vec![(0.0, 22.0), (1.0, 23.0), (2.0, 21.5)]);
        assert_eq!(s.x_bounds(), [0.0, 2.0]);
    }

    #[test]
    fn test_single_point_is_centred() {
        let s = series(&[("2024-01-01 08:00:00", 22.0)]);

        assert_eq!(s.x_bounds(), [-1.0, 1.0]);
        assert_eq!(s.x_labels(), vec!["", "2024-01-01 08:00:00", ""]);
        assert_eq!(s.y_bounds(), [21.5, 22.5]);
        assert_eq!(s.latest(), Some(("2024-01-01 08:00:00", 22.0)));
    }

    #[test]
    fn test_x_labels_odd_count_includes_middle() {
        let s = series(&[("t0", 20.0), ("t1", 21.0), ("t2", 22.0), ("t3", 23.0), ("t4", 24.0)]);

        assert_eq!(s.x_labels(), vec!["t0", "t2", "t4"]);
    }

    #[test]
    fn test_x_labels_even_count_uses_ends() {
        let s = series(&[("t0", 20.0), ("t1", 21.0), ("t2", 22.0), ("t3", 23.0)]);

        assert_eq!(s.x_labels(), vec!["t0", "t3"]);
    }

    #[test]
    fn test_y_bounds_pad_wide_ranges_proportionally() {
        let s = series(&[("t0", 20.0), ("t1", 40.0)]);

        let [low, high] = s.y_bounds();

        assert!((low - 19.0).abs() < 1e-9);
        assert!((high - 41.0).abs() < 1e-9);
        assert_eq!(s.y_labels(), vec!["19.0", "30.0", "41.0"]);
    }
}
