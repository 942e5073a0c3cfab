//! Least-squares price predictor.
//!
//! Fits an ordinary least-squares line over the history window, treating
//! the window position (oldest = 0) as x and the price as y, then
//! extrapolates one step past the last index.

use super::history::HistoryWindow;

/// Returned when the window is too short to fit a line.
pub const BASELINE_PRICE: f64 = 100.0;

/// Predict the next price from the window. Pure function of the snapshot.
pub fn predict_next(window: &HistoryWindow) -> f64 {
    let n = window.len();
    if n < 2 {
        return BASELINE_PRICE;
    }

    let n_f = n as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;

    for (i, y) in window.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    // Denominator is strictly positive for n >= 2 distinct indices.
    let slope = (n_f * sum_xy - sum_x * sum_y) / (n_f * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n_f;

    slope * n_f + intercept
}
