/// Ordinary least-squares slope of prices against their sample index
///
/// The independent variable is the natural index 0..n-1 of each sample,
/// regardless of the buffer's true capacity, so a positive slope means the
/// recent window trends up and a negative one means it trends down.
///
/// Returns 0.0 when the index variance is exactly zero (n < 2). That cannot
/// happen once the caller enforces its minimum-window precondition, but the
/// guard keeps the function total.
pub fn calculate_slope(prices: &[f64]) -> f64 {
    let n = prices.len();
    if n == 0 {
        return 0.0;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = prices.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &price) in prices.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (price - y_mean);
        denominator += dx * dx;
    }

    if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
