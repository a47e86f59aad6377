//! Hold-out split and regression metrics for the downstream price model.

use crate::error::FeatureError;
use crate::pipeline::FeatureTable;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Shuffle rows with a seeded RNG and hold out `ceil(test_size * n)` of them.
///
/// Returns `(train, test)`. The same seed always produces the same split.
pub fn train_test_split(
    table: &FeatureTable,
    test_size: f64,
    seed: u64,
) -> Result<(FeatureTable, FeatureTable), FeatureError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(FeatureError::InvalidParameter(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let n = table.n_rows();
    if n < 2 {
        return Err(FeatureError::EmptyData(format!(
            "need at least 2 rows to split, got {}",
            n
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64 * test_size).ceil() as usize).clamp(1, n - 1);
    let (test, train) = indices.split_at(n_test);
    Ok((table.take(train)?, table.take(test)?))
}

/// Regression quality of a set of price predictions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Coefficient of determination.
    pub r2: f64,
    /// `mean(|y - y_hat| / y)`.
    pub mean_relative_error: f64,
}

impl RegressionMetrics {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Result<Self, FeatureError> {
        if y_true.len() != y_pred.len() {
            return Err(FeatureError::LengthMismatch {
                column: "predictions".to_string(),
                expected: y_true.len(),
                got: y_pred.len(),
            });
        }
        if y_true.is_empty() {
            return Err(FeatureError::EmptyData(
                "cannot score empty predictions".to_string(),
            ));
        }
        if y_true.iter().any(|&y| y == 0.0) {
            return Err(FeatureError::InvalidParameter(
                "relative error is undefined for a zero target".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let mean = y_true.iter().sum::<f64>() / n;
        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred)
            .map(|(y, p)| (y - p).powi(2))
            .sum();
        let ss_tot: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();
        let r2 = if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };

        let mean_relative_error = y_true
            .iter()
            .zip(y_pred)
            .map(|(y, p)| (y - p).abs() / y)
            .sum::<f64>()
            / n;

        Ok(Self {
            r2,
            mean_relative_error,
        })
    }

    /// `1 - mean_relative_error`.
    pub fn accuracy(&self) -> f64 {
        1.0 - self.mean_relative_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, Frame};
    use crate::pipeline::Target;
    use crate::schema::{FeatureColumn, FeatureKind};

    fn table(n: usize) -> FeatureTable {
        let rows: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let features = Frame::from_columns([("Rooms", Column::Numeric(rows.clone()))]).unwrap();
        FeatureTable::new(
            vec![FeatureColumn {
                name: "Rooms".to_string(),
                kind: FeatureKind::Numeric,
            }],
            features,
            Some(Target {
                name: "Price($)".to_string(),
                values: rows.iter().map(|r| 1000.0 + r).collect(),
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_split_sizes_and_disjoint() {
        let (train, test) = train_test_split(&table(10), 0.2, 42).unwrap();
        assert_eq!(train.n_rows(), 8);
        assert_eq!(test.n_rows(), 2);

        let mut all: Vec<f64> = train
            .features()
            .numeric("Rooms")
            .unwrap()
            .iter()
            .chain(test.features().numeric("Rooms").unwrap())
            .copied()
            .collect();
        all.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(all, (0..10).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_deterministic() {
        let (_, a) = train_test_split(&table(20), 0.25, 7).unwrap();
        let (_, b) = train_test_split(&table(20), 0.25, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_keeps_target_aligned() {
        let (train, _) = train_test_split(&table(10), 0.3, 1).unwrap();
        let rooms = train.features().numeric("Rooms").unwrap();
        let prices = &train.target().unwrap().values;
        for (r, p) in rooms.iter().zip(prices) {
            assert_eq!(*p, 1000.0 + r);
        }
    }

    #[test]
    fn test_split_rejects_bad_size() {
        assert!(train_test_split(&table(10), 0.0, 42).is_err());
        assert!(train_test_split(&table(1), 0.2, 42).is_err());
    }

    #[test]
    fn test_metrics_by_hand() {
        let metrics =
            RegressionMetrics::compute(&[1000.0, 2000.0, 3000.0], &[1100.0, 1900.0, 3000.0])
                .unwrap();
        // ss_res = 20000, ss_tot = 2000000
        assert!((metrics.r2 - 0.99).abs() < 1e-12);
        // (0.1 + 0.05 + 0) / 3
        assert!((metrics.mean_relative_error - 0.05).abs() < 1e-12);
        assert!((metrics.accuracy() - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_metrics_length_mismatch() {
        let result = RegressionMetrics::compute(&[1000.0], &[1000.0, 2000.0]);
        assert!(matches!(result, Err(FeatureError::LengthMismatch { .. })));
    }
}
