//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// How the engine treats malformed operation arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Skip the offending step, log it, and keep the chain going.
    #[default]
    Permissive,
    /// Stop at the first malformed step and report it.
    Strict,
}

/// Resampling filter used by the CPU rasterizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Nearest source pixel to the destination pixel center.
    #[default]
    Nearest,
    /// Weighted average of the four surrounding source pixels.
    Bilinear,
}

/// How a swap match filter treats a channel set to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapMatching {
    /// A zero channel matches any value, same as an absent one.
    #[default]
    Legacy,
    /// A zero channel only matches a zero sample.
    Exact,
}

/// Runtime configuration for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Treatment of malformed arguments.
    pub policy: ValidationPolicy,
    /// Resampling filter for geometric operations.
    pub interpolation: Interpolation,
    /// RGBA value written where a geometric operation has no source pixel.
    pub fill: [u8; 4],
    /// Zero handling in swap match filters.
    pub swap_matching: SwapMatching,
    /// Run color operations on the rayon pool. Needs the `parallel` feature.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: ValidationPolicy::Permissive,
            interpolation: Interpolation::Nearest,
            fill: [0, 0, 0, 0],
            swap_matching: SwapMatching::Legacy,
            parallel: false,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults overridden by `PIXELCHAIN_*` environment variables.
    ///
    /// Unrecognised values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(policy) = env_enum("PIXELCHAIN_POLICY") {
            config.policy = policy;
        }
        if let Some(interpolation) = env_enum("PIXELCHAIN_INTERPOLATION") {
            config.interpolation = interpolation;
        }
        if let Some(matching) = env_enum("PIXELCHAIN_SWAP_MATCHING") {
            config.swap_matching = matching;
        }
        if let Some(parallel) = std::env::var("PIXELCHAIN_PARALLEL")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.parallel = parallel;
        }
        config
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_fill(mut self, fill: [u8; 4]) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_swap_matching(mut self, swap_matching: SwapMatching) -> Self {
        self.swap_matching = swap_matching;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Read a snake_case enum variant from an environment variable.
fn env_enum<T: serde::de::DeserializeOwned>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    serde_json::from_value(serde_json::Value::String(raw.trim().to_ascii_lowercase())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_permissive_nearest_transparent() {
        let config = EngineConfig::default();
        assert_eq!(config.policy, ValidationPolicy::Permissive);
        assert_eq!(config.interpolation, Interpolation::Nearest);
        assert_eq!(config.fill, [0, 0, 0, 0]);
        assert_eq!(config.swap_matching, SwapMatching::Legacy);
        assert!(!config.parallel);
    }

    #[test]
    fn test_from_json_partial_document() {
        let json = r#"{ "policy": "strict", "fill": [255, 255, 255, 255] }"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.policy, ValidationPolicy::Strict);
        assert_eq!(config.fill, [255, 255, 255, 255]);
        assert_eq!(config.interpolation, Interpolation::Nearest);
    }

    #[test]
    fn test_from_json_rejects_unknown_variant() {
        let err = EngineConfig::from_json(r#"{ "interpolation": "bicubic" }"#).unwrap_err();
        assert!(matches!(err, EngineError::Json(_)));
    }

    #[test]
    #[allow(unsafe_code)]
    fn test_from_env_overrides_defaults() {
        const KEYS: [&str; 4] = [
            "PIXELCHAIN_POLICY",
            "PIXELCHAIN_INTERPOLATION",
            "PIXELCHAIN_SWAP_MATCHING",
            "PIXELCHAIN_PARALLEL",
        ];
        // SAFETY: no other test in this crate reads or writes these variables.
        unsafe {
            std::env::set_var("PIXELCHAIN_POLICY", "Strict");
            std::env::set_var("PIXELCHAIN_INTERPOLATION", "cubic");
            std::env::set_var("PIXELCHAIN_SWAP_MATCHING", " exact ");
            std::env::set_var("PIXELCHAIN_PARALLEL", "true");
        }
        let config = EngineConfig::from_env();
        unsafe {
            for key in KEYS {
                std::env::remove_var(key);
            }
        }

        assert_eq!(config.policy, ValidationPolicy::Strict);
        assert_eq!(config.interpolation, Interpolation::Nearest);
        assert_eq!(config.swap_matching, SwapMatching::Exact);
        assert!(config.parallel);
        assert_eq!(config.fill, [0, 0, 0, 0]);
    }

    #[test]
    fn test_serde_roundtrip_keeps_all_fields() {
        let config = EngineConfig::default()
            .with_interpolation(Interpolation::Bilinear)
            .with_swap_matching(SwapMatching::Exact);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }
}
