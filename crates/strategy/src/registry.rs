use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use common::{Error, Result};

use crate::generators::{BollingerBand, RsiThreshold, SmaCrossover, StochasticThreshold};
use crate::params::StrategyDescriptor;
use crate::SignalGenerator;

/// Builds a generator from the numeric strategy parameter map.
pub type StrategyFactory =
    Arc<dyn Fn(&HashMap<String, f64>) -> Result<Box<dyn SignalGenerator>> + Send + Sync>;

/// Catalog of the built-in strategies.
pub fn catalog() -> [StrategyDescriptor; 4] {
    [
        SmaCrossover::DESCRIPTOR,
        RsiThreshold::DESCRIPTOR,
        StochasticThreshold::DESCRIPTOR,
        BollingerBand::DESCRIPTOR,
    ]
}

/// Maps strategy keys to generator factories.
///
/// `Default` registers the four built-ins. Additional strategies are added
/// with [`StrategyRegistry::register`] and become selectable by key.
#[derive(Clone)]
pub struct StrategyRegistry {
    factories: HashMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    /// A registry with no strategies.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(SmaCrossover::DESCRIPTOR.key, |p| {
            Ok(Box::new(SmaCrossover::from_params(p)?))
        });
        registry.register(RsiThreshold::DESCRIPTOR.key, |p| {
            Ok(Box::new(RsiThreshold::from_params(p)?))
        });
        registry.register(StochasticThreshold::DESCRIPTOR.key, |p| {
            Ok(Box::new(StochasticThreshold::from_params(p)?))
        });
        registry.register(BollingerBand::DESCRIPTOR.key, |p| {
            Ok(Box::new(BollingerBand::from_params(p)?))
        });
        registry
    }

    /// Register (or replace) the factory for `key`.
    pub fn register<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn(&HashMap<String, f64>) -> Result<Box<dyn SignalGenerator>> + Send + Sync + 'static,
    {
        let key = key.into();
        if self.factories.insert(key.clone(), Arc::new(factory)).is_some() {
            info!(strategy = %key, "Replaced strategy registration");
        }
    }

    /// Build the generator for `key`. Unknown keys and invalid parameters are
    /// configuration errors.
    pub fn build(&self, key: &str, params: &HashMap<String, f64>) -> Result<Box<dyn SignalGenerator>> {
        let factory = self
            .factories
            .get(key)
            .ok_or_else(|| Error::UnknownStrategy(key.to_string()))?;
        factory(params)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
