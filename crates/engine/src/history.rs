/// Default number of prices retained for indicator evaluation.
pub const DEFAULT_HISTORY_CAP: usize = 200;

/// Bounded, chronological price history (oldest first).
///
/// On overflow the oldest prices are dropped. Prices are never reordered or
/// deduplicated.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    prices: Vec<f64>,
    cap: usize,
}

impl PriceHistory {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            prices: Vec::with_capacity(cap + 1),
            cap,
        }
    }

    pub fn push(&mut self, price: f64) {
        self.prices.push(price);
        if self.prices.len() > self.cap {
            let excess = self.prices.len() - self.cap;
            self.prices.drain(..excess);
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.prices
    }

    pub fn last(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}
