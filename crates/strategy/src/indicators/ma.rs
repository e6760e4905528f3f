/// Simple moving average of the last `period` prices.
///
/// Returns 0 ("not ready") when fewer than `period` prices exist or when
/// `period` is 0.
pub fn sma(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period {
        return 0.0;
    }
    let window = &prices[prices.len() - period..];
    window.iter().sum::<f64>() / period as f64
}
