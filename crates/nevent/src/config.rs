//! Configuration for emitters and the host.

use serde::Deserialize;

/// Default threshold for the max-listeners warning.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Per-emitter settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Listener count per event above which a leak warning is logged.
    /// `0` disables the warning. Subscriptions are never refused.
    pub max_listeners: usize,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
        }
    }
}

impl EmitterConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the max-listeners warning threshold.
    pub fn max_listeners(mut self, n: usize) -> Self {
        self.max_listeners = n;
        self
    }

    /// Disable the max-listeners warning.
    pub fn unlimited() -> Self {
        Self { max_listeners: 0 }
    }
}

/// Host boundary settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Log rejected calls (wrong arity or argument types).
    pub log_misuse: bool,

    /// Settings applied to every emitter the host creates.
    pub emitter: EmitterConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_misuse: true,
            emitter: EmitterConfig::default(),
        }
    }
}

impl HostConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable misuse logging.
    pub fn log_misuse(mut self, enabled: bool) -> Self {
        self.log_misuse = enabled;
        self
    }

    /// Set the emitter settings.
    pub fn emitter(mut self, emitter: EmitterConfig) -> Self {
        self.emitter = emitter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert!(config.log_misuse);
        assert_eq!(config.emitter.max_listeners, DEFAULT_MAX_LISTENERS);
    }

    #[test]
    fn test_builder_pattern() {
        let config = HostConfig::new()
            .log_misuse(false)
            .emitter(EmitterConfig::new().max_listeners(3));
        assert!(!config.log_misuse);
        assert_eq!(config.emitter.max_listeners, 3);
        assert_eq!(EmitterConfig::unlimited().max_listeners, 0);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: HostConfig =
            serde_json::from_str(r#"{ "emitter": { "max_listeners": 0 } }"#).unwrap();
        assert!(config.log_misuse);
        assert_eq!(config.emitter, EmitterConfig::unlimited());
    }
}
