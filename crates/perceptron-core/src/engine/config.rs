use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid counter name: '{0}'")]
    InvalidCounterName(String),
}

/// Settings of a perception cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PerceptionConfig {
    /// Values of the loop counters referenced by `LOOPCOUNTER` circumstances.
    pub counters: BTreeMap<String, i64>,
}

impl PerceptionConfig {
    pub fn counter(&self, counter_id: &str) -> Option<i64> {
        self.counters.get(counter_id).copied()
    }
}

#[derive(Default)]
pub struct PerceptionConfigBuilder {
    counters: BTreeMap<String, i64>,
}

impl PerceptionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(mut self, counter_id: impl Into<String>, value: i64) -> Self {
        self.counters.insert(counter_id.into(), value);
        self
    }

    pub fn counters<I, S>(mut self, counters: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        self.counters
            .extend(counters.into_iter().map(|(id, value)| (id.into(), value)));
        self
    }

    pub fn build(self) -> Result<PerceptionConfig, ConfigError> {
        if let Some(bad) = self
            .counters
            .keys()
            .find(|id| id.is_empty() || id.chars().any(char::is_whitespace))
        {
            return Err(ConfigError::InvalidCounterName(bad.clone()));
        }
        Ok(PerceptionConfig {
            counters: self.counters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_counters() {
        let config = PerceptionConfigBuilder::new()
            .counter("cycles", 3)
            .counters([("restarts", 1), ("cycles", 4)])
            .build()
            .unwrap();
        assert_eq!(config.counter("cycles"), Some(4));
        assert_eq!(config.counter("restarts"), Some(1));
        assert_eq!(config.counter("absent"), None);
    }

    #[test]
    fn empty_builder_yields_default_config() {
        assert_eq!(
            PerceptionConfigBuilder::new().build().unwrap(),
            PerceptionConfig::default()
        );
    }

    #[test]
    fn counter_names_with_whitespace_are_rejected() {
        let result = PerceptionConfigBuilder::new().counter("two words", 1).build();
        assert_eq!(
            result,
            Err(ConfigError::InvalidCounterName("two words".to_string()))
        );
    }
}
