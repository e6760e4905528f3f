use std::collections::HashMap;

use common::{Error, Result};

/// Longest accepted window. The engine keeps 200 prices by default, so
/// anything near this bound never becomes ready.
pub const MAX_PERIOD: usize = 1_000;

/// One tunable strategy parameter with its UI default and suggested range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

/// Catalog entry for a built-in strategy.
#[derive(Debug, Clone, Copy)]
pub struct StrategyDescriptor {
    /// Configuration key, e.g. "sma_crossover".
    pub key: &'static str,
    /// Human-readable name shown in logs and the UI.
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl StrategyDescriptor {
    pub fn param(&self, key: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.key == key)
    }
}

/// Typed view over the numeric strategy parameter map.
///
/// Missing keys fall back to the descriptor default.
pub struct StrategyParams<'a> {
    descriptor: &'a StrategyDescriptor,
    values: &'a HashMap<String, f64>,
}

impl<'a> StrategyParams<'a> {
    pub fn new(descriptor: &'a StrategyDescriptor, values: &'a HashMap<String, f64>) -> Self {
        Self { descriptor, values }
    }

    pub fn f64(&self, key: &str) -> f64 {
        self.values
            .get(key)
            .copied()
            .or_else(|| self.descriptor.param(key).map(|p| p.default))
            .unwrap_or(0.0)
    }

    /// A window length. Fractional values truncate; anything outside
    /// `1..=MAX_PERIOD` is a configuration error.
    pub fn period(&self, key: &str) -> Result<usize> {
        let raw = self.f64(key);
        if !raw.is_finite() || raw < 1.0 || raw >= (MAX_PERIOD + 1) as f64 {
            return Err(Error::Config(format!(
                "{}: parameter '{key}' must be a period between 1 and {MAX_PERIOD}, got {raw}",
                self.descriptor.key
            )));
        }
        Ok(raw as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESC: StrategyDescriptor = StrategyDescriptor {
        key: "test",
        name: "Test",
        description: "",
        params: &[ParamSpec {
            key: "period",
            label: "Period",
            default: 14.0,
            min: 5.0,
            max: 50.0,
        }],
    };

    #[test]
    fn missing_key_uses_descriptor_default() {
        let values = HashMap::new();
        let params = StrategyParams::new(&DESC, &values);
        assert_eq!(params.period("period").unwrap(), 14);
    }

    #[test]
    fn fractional_period_truncates() {
        let values = HashMap::from([("period".to_string(), 9.7)]);
        let params = StrategyParams::new(&DESC, &values);
        assert_eq!(params.period("period").unwrap(), 9);
    }

    #[test]
    fn zero_period_is_config_error() {
        let values = HashMap::from([("period".to_string(), 0.0)]);
        let params = StrategyParams::new(&DESC, &values);
        assert!(matches!(params.period("period"), Err(Error::Config(_))));
    }

    #[test]
    fn oversized_period_is_config_error() {
        for raw in [1e30, f64::INFINITY, (MAX_PERIOD + 1) as f64] {
            let values = HashMap::from([("period".to_string(), raw)]);
            let params = StrategyParams::new(&DESC, &values);
            assert!(matches!(params.period("period"), Err(Error::Config(_))), "{raw}");
        }

        let values = HashMap::from([("period".to_string(), MAX_PERIOD as f64)]);
        let params = StrategyParams::new(&DESC, &values);
        assert_eq!(params.period("period").unwrap(), MAX_PERIOD);
    }
}
