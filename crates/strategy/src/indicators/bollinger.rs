use super::ma::sma;

/// Upper, middle and lower Bollinger band.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bollinger bands over the trailing `period` prices.
///
/// `middle` is the SMA, the bands sit `k` population standard deviations
/// away. All three are 0 when fewer than `period` prices exist.
pub fn bollinger_bands(prices: &[f64], period: usize, k: f64) -> Bands {
    if period == 0 || prices.len() < period {
        return Bands::default();
    }

    let mean = sma(prices, period);
    let variance = prices[prices.len() - period..]
        .iter()
        .map(|p| {
            let d = p - mean;
            d * d
        })
        .sum::<f64>()
        / period as f64;
    let std_dev = variance.sqrt();

    Bands {
        upper: mean + std_dev * k,
        middle: mean,
        lower: mean - std_dev * k,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_zero_when_insufficient_data() {
        assert_eq!(bollinger_bands(&[1.0, 2.0], 3, 2.0), Bands::default());
    }

    #[test]
    fn bands_use_population_std_dev() {
        // mean 5, population variance 4 -> std dev 2
        let prices = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let bands = bollinger_bands(&prices, 8, 2.0);
        assert_eq!(bands.middle, 5.0);
        assert_eq!(bands.upper, 9.0);
        assert_eq!(bands.lower, 1.0);
    }

    #[test]
    fn bands_collapse_on_flat_window() {
        let bands = bollinger_bands(&[3.0, 3.0, 3.0], 3, 2.0);
        assert_eq!(bands.upper, 3.0);
        assert_eq!(bands.middle, 3.0);
        assert_eq!(bands.lower, 3.0);
    }
}
