/// Neutral value returned while there are fewer than `period + 1` prices.
pub const RSI_NEUTRAL: f64 = 50.0;

/// RSI (Relative Strength Index) over the last `period` price changes.
///
/// Uses the simple (non-smoothed) average gain and average loss of the
/// trailing window, not Wilder smoothing. Returns [`RSI_NEUTRAL`] until at
/// least `period + 1` prices exist and 100 when the window has no losses.
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if prices.len() < period + 1 {
        return RSI_NEUTRAL;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in prices.len() - period..prices.len() {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    if losses == 0.0 {
        return 100.0;
    }

    let rs = (gains / period as f64) / (losses / period as f64);
    100.0 - 100.0 / (1.0 + rs)
}
