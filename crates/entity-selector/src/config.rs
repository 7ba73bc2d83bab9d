//! Evaluation settings.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Host-specific knobs for selector evaluation.
///
/// Every field has a default, so a host can deserialize a partial table:
///
/// ```
/// use entity_selector::SelectorConfig;
///
/// let config: SelectorConfig = serde_json::from_str(r#"{ "hotbar_size": 10 }"#).unwrap();
/// assert_eq!(config.hotbar_size, 10);
/// assert_eq!(config.player_type, "minecraft:player");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Type id forced by `@a`, `@p` and `@r`.
    pub player_type: String,
    /// Inventory indices below this are reported as `slot.hotbar`.
    pub hotbar_size: usize,
    /// Namespace assumed for type ids written without one (`type=pig`).
    pub default_namespace: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            player_type: "minecraft:player".to_string(),
            hotbar_size: 9,
            default_namespace: "minecraft".to_string(),
        }
    }
}

impl SelectorConfig {
    /// Prefix `id` with the default namespace unless it already has one.
    #[must_use]
    pub fn qualify<'a>(&self, id: &'a str) -> Cow<'a, str> {
        if id.contains(':') {
            Cow::Borrowed(id)
        } else {
            Cow::Owned(format!("{}:{}", self.default_namespace, id))
        }
    }

    /// Compare two type ids, treating a missing namespace as the default one.
    #[must_use]
    pub fn same_type(&self, a: &str, b: &str) -> bool {
        self.qualify(a) == self.qualify(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SelectorConfig::default();
        assert_eq!(config.player_type, "minecraft:player");
        assert_eq!(config.hotbar_size, 9);
    }

    #[test]
    fn test_qualify() {
        let config = SelectorConfig::default();
        assert_eq!(config.qualify("pig"), "minecraft:pig");
        assert_eq!(config.qualify("custom:pig"), "custom:pig");
        assert!(config.same_type("pig", "minecraft:pig"));
        assert!(!config.same_type("pig", "custom:pig"));
    }

    #[test]
    fn test_partial_deserialize() {
        let config: SelectorConfig =
            serde_json::from_str(r#"{ "player_type": "sim:agent" }"#).unwrap();
        assert_eq!(config.player_type, "sim:agent");
        assert_eq!(config.default_namespace, "minecraft");
    }
}
