/// Value returned when there is not enough data or the window is flat.
pub const STOCHASTIC_NEUTRAL: f64 = 50.0;

/// Stochastic oscillator %K over the trailing `period` prices.
///
/// `%K = (last - min) / (max - min) * 100`.
pub fn stochastic(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period {
        return STOCHASTIC_NEUTRAL;
    }

    let window = &prices[prices.len() - period..];
    let (low, high) = window
        .iter()
        .fold((window[0], window[0]), |(lo, hi), &p| (lo.min(p), hi.max(p)));

    if high == low {
        return STOCHASTIC_NEUTRAL;
    }

    let last = prices[prices.len() - 1];
    (last - low) / (high - low) * 100.0
}
