use common::{AlertDirection, PriceAlert};

/// Minimum move, in percent of the baseline, that raises an alert.
pub const DEFAULT_ALERT_THRESHOLD_PCT: f64 = 5.0;

/// Tracks the alert baseline across ticks.
///
/// The first observed price becomes the baseline without raising an alert.
/// The baseline only moves when an alert fires.
#[derive(Debug, Clone)]
pub struct PriceAlertTracker {
    baseline: Option<f64>,
    threshold_pct: f64,
}

impl PriceAlertTracker {
    pub fn new(threshold_pct: f64) -> Self {
        Self {
            baseline: None,
            threshold_pct,
        }
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn observe(&mut self, price: f64) -> Option<PriceAlert> {
        let baseline = match self.baseline {
            Some(b) if b > 0.0 => b,
            _ => {
                self.baseline = Some(price);
                return None;
            }
        };

        let change_pct = (price - baseline).abs() / baseline * 100.0;
        if change_pct < self.threshold_pct {
            return None;
        }

        self.baseline = Some(price);
        Some(PriceAlert {
            direction: if price < baseline {
                AlertDirection::Down
            } else {
                AlertDirection::Up
            },
            change_pct,
            from: baseline,
            to: price,
        })
    }
}

impl Default for PriceAlertTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_THRESHOLD_PCT)
    }
}
