// Rolling-window primitives shared by the indicator implementations.
// Every window uses however many samples are available at the start (minimum 1).
use super::ColumnValues;

/// Requested window clamped to the series length, never below one sample.
pub fn effective_window(period: usize, len: usize) -> usize {
    period.min(len).max(1)
}

fn window_start(index: usize, window: usize) -> usize {
    (index + 1).saturating_sub(window)
}

/// Each window is summed from its own slice, so a window of non-negative
/// values never comes out negative.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let slice = &values[window_start(i, window)..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Sample standard deviation; a window holding a single sample has none.
pub fn rolling_std(values: &[f64], window: usize) -> ColumnValues {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let slice = &values[window_start(i, window)..=i];
            if slice.len() < 2 {
                return None;
            }
            let mean = slice.iter().sum::<f64>() / slice.len() as f64;
            let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (slice.len() - 1) as f64;
            Some(variance.sqrt())
        })
        .collect()
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| values[window_start(i, window)..=i].iter().copied().fold(f64::INFINITY, f64::min))
        .collect()
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| values[window_start(i, window)..=i].iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .collect()
}

/// Exponential smoothing with `alpha = 2 / (span + 1)`, seeded with the first value.
pub fn ewm(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span.max(1) as f64 + 1.0);
    let mut results = Vec::with_capacity(values.len());
    let mut previous: Option<f64> = None;
    for &value in values {
        let next = match previous {
            Some(prev) => alpha * value + (1.0 - alpha) * prev,
            None => value,
        };
        results.push(next);
        previous = Some(next);
    }
    results
}

/// Non-finite results become gaps.
pub fn to_column(values: Vec<f64>) -> ColumnValues {
    values.into_iter().map(|v| if v.is_finite() { Some(v) } else { None }).collect()
}

/// Fill gaps forward, then backward. Only a column with no value at all stays empty.
pub fn fill_gaps(values: &mut ColumnValues) {
    let mut last = None;
    for value in values.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }
    let mut next = None;
    for value in values.iter_mut().rev() {
        match value {
            Some(v) => next = Some(*v),
            None => *value = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_window_clamps() {
        assert_eq!(effective_window(50, 30), 30);
        assert_eq!(effective_window(14, 100), 14);
        assert_eq!(effective_window(14, 0), 1);
    }

    #[test]
    fn test_rolling_mean_uses_partial_windows() {
        let results = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(results, vec![1.0, 1.5, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rolling_mean_of_zero_window_is_exactly_zero() {
        let results = rolling_mean(&[0.1, 0.7, 0.2, 0.0, 0.0], 2);
        assert_eq!(results[4], 0.0);
        assert!(results.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_rolling_std_sample() {
        let results = rolling_std(&[2.0, 4.0, 4.0, 4.0, 5.0], 5);
        assert_eq!(results[0], None);
        assert!((results[1].unwrap() - 2f64.sqrt()).abs() < 1e-12);
        let expected = (((2.0f64 - 3.8).powi(2) + 3.0 * (4.0f64 - 3.8).powi(2) + (5.0f64 - 3.8).powi(2)) / 4.0).sqrt();
        assert!((results[4].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_extrema() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(rolling_min(&values, 2), vec![3.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(rolling_max(&values, 2), vec![3.0, 3.0, 4.0, 4.0, 5.0]);
    }

    #[test]
    fn test_ewm_seeded_with_first_value() {
        let results = ewm(&[10.0, 11.0, 12.0], 3);
        assert_eq!(results, vec![10.0, 10.5, 11.25]);
    }

    #[test]
    fn test_fill_gaps_forward_then_backward() {
        let mut values = vec![None, None, Some(1.0), None, Some(3.0), None];
        fill_gaps(&mut values);
        assert_eq!(values, vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(3.0), Some(3.0)]);

        let mut empty: ColumnValues = vec![None, None];
        fill_gaps(&mut empty);
        assert_eq!(empty, vec![None, None]);
    }
}
