// Reconstruction error scoring
use super::window::Window;

/// Mean absolute error of one window against its reconstruction.
pub fn mean_absolute_error(original: &[f64], reconstruction: &[f64]) -> f64 {
    let total: f64 = original
        .iter()
        .zip(reconstruction)
        .map(|(a, b)| (a - b).abs())
        .sum();
    total / original.len() as f64
}

/// One score per (window, reconstruction) pair, in input order.
///
/// Pairs are matched positionally; shapes are checked by the inference
/// adapter before scoring.
pub fn mean_absolute_errors(windows: &[Window], reconstructions: &[Vec<f64>]) -> Vec<f64> {
    windows
        .iter()
        .zip(reconstructions)
        .map(|(window, reconstruction)| mean_absolute_error(&window.values, reconstruction))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(values: Vec<f64>) -> Window {
        Window {
            values,
            label_time: "t".to_string(),
        }
    }

    #[test]
    fn test_mean_absolute_error() {
        let score = mean_absolute_error(&[1.0, 2.0, 3.0, 4.0], &[1.5, 1.5, 3.0, 6.0]);
        assert!((score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_scores_preserve_order_and_are_non_negative() {
        let windows = vec![window(vec![0.0; 30]), window(vec![5.0; 30]), window(vec![-2.0; 30])];
        let reconstructions = vec![vec![0.0; 30], vec![4.0; 30], vec![1.0; 30]];

        let scores = mean_absolute_errors(&windows, &reconstructions);

        assert_eq!(scores, vec![0.0, 1.0, 3.0]);
        assert!(scores.iter().all(|s| *s >= 0.0));
    }

    #[test]
    fn test_nan_propagates() {
        let score = mean_absolute_error(&[f64::NAN, 1.0], &[0.0, 1.0]);
        assert!(score.is_nan());
    }
}
