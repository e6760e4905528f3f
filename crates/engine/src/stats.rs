use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::PerformanceSnapshot;

/// Probability that a simulated position change counts as a win.
pub const DEFAULT_WIN_PROBABILITY: f64 = 0.6;
pub const INITIAL_EQUITY: f64 = 10_000.0;

/// Simplified trade accounting.
///
/// Wins are drawn at random on each position change rather than derived
/// from subsequent price movement, and equity never moves.
#[derive(Debug, Clone)]
pub struct TradeStats {
    trade_count: u64,
    win_count: u64,
    win_probability: f64,
    equity: f64,
    initial_equity: f64,
    rng: StdRng,
}

impl TradeStats {
    pub fn new(win_probability: f64) -> Self {
        Self::with_rng(win_probability, StdRng::from_entropy())
    }

    pub fn seeded(win_probability: f64, seed: u64) -> Self {
        Self::with_rng(win_probability, StdRng::seed_from_u64(seed))
    }

    fn with_rng(win_probability: f64, rng: StdRng) -> Self {
        Self {
            trade_count: 0,
            win_count: 0,
            win_probability: win_probability.clamp(0.0, 1.0),
            equity: INITIAL_EQUITY,
            initial_equity: INITIAL_EQUITY,
            rng,
        }
    }

    /// Count a position change and draw its outcome. Returns whether it won.
    pub fn record_position_change(&mut self) -> bool {
        self.trade_count += 1;
        let won = self.rng.gen::<f64>() > 1.0 - self.win_probability;
        if won {
            self.win_count += 1;
        }
        won
    }

    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }

    pub fn win_count(&self) -> u64 {
        self.win_count
    }

    /// Percentage of winning trades; 0 before the first trade.
    pub fn win_rate(&self) -> f64 {
        if self.trade_count == 0 {
            return 0.0;
        }
        self.win_count as f64 / self.trade_count as f64 * 100.0
    }

    pub fn profit_and_loss(&self) -> f64 {
        self.equity - self.initial_equity
    }

    pub fn snapshot(&self, current_price: f64) -> PerformanceSnapshot {
        PerformanceSnapshot {
            trade_count: self.trade_count,
            win_rate_pct: self.win_rate(),
            current_price,
            profit_and_loss: self.profit_and_loss(),
        }
    }
}

impl Default for TradeStats {
    fn default() -> Self {
        Self::new(DEFAULT_WIN_PROBABILITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_rate_is_zero_without_trades() {
        let stats = TradeStats::seeded(DEFAULT_WIN_PROBABILITY, 1);
        assert_eq!(stats.win_rate(), 0.0);
        assert_eq!(stats.snapshot(123.0).win_rate_pct, 0.0);
    }

    #[test]
    fn win_rate_is_exact_ratio() {
        let mut stats = TradeStats::seeded(DEFAULT_WIN_PROBABILITY, 3);
        for _ in 0..7 {
            stats.record_position_change();
        }
        let expected = stats.win_count() as f64 / 7.0 * 100.0;
        assert_eq!(stats.win_rate(), expected);
    }

    #[test]
    fn certain_outcomes() {
        let mut always = TradeStats::seeded(1.0, 5);
        let mut never = TradeStats::seeded(0.0, 5);
        for _ in 0..100 {
            always.record_position_change();
            never.record_position_change();
        }
        assert_eq!(always.win_count(), 100);
        assert_eq!(never.win_count(), 0);
    }

    #[test]
    fn seeded_outcomes_converge_to_win_probability() {
        const N: u64 = 10_000;
        let mut stats = TradeStats::seeded(DEFAULT_WIN_PROBABILITY, 42);
        for _ in 0..N {
            stats.record_position_change();
        }
        let p = DEFAULT_WIN_PROBABILITY;
        let observed = stats.win_count() as f64 / N as f64;
        // Four standard errors of a Bernoulli(p) mean.
        let tolerance = 4.0 * (p * (1.0 - p) / N as f64).sqrt();
        assert!(
            (observed - p).abs() < tolerance,
            "observed {observed}, expected {p} +/- {tolerance}"
        );
    }

    #[test]
    fn equity_is_flat() {
        let mut stats = TradeStats::default();
        stats.record_position_change();
        assert_eq!(stats.profit_and_loss(), 0.0);
    }
}
