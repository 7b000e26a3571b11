//! Instrumentation settings and the statistics gathered by a search.

use serde::{Deserialize, Serialize};

/// Optional instrumentation of a search.
///
/// None of these settings affects which solutions are visited or in which
/// order. The configuration can be deserialized from any serde format; keys
/// use camel case and missing keys take their default values:
///
/// ```
/// use exact_cover_search::Config;
///
/// let config: Config = serde_json::from_str(r#"{"enableProgress": true}"#).unwrap();
/// assert!(config.enable_progress);
/// assert_eq!(config.node_interval, Config::default().node_interval);
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Whether to emit progress reports.
    pub enable_progress: bool,
    /// The number of search tree nodes between two progress reports. A value
    /// of zero produces a report at every node.
    pub node_interval: u64,
    /// Whether to emit a `debug` event for every step of the search.
    pub enable_debug_trace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_progress: false,
            node_interval: 1_000_000,
            enable_debug_trace: false,
        }
    }
}

/// Counters accumulated while visiting the search tree.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// The number of nodes of the search tree, that is, the number of
    /// times a level was entered.
    pub nodes: u64,
    /// The number of solutions passed to the visitor.
    pub solutions: u64,
    /// The deepest level entered.
    pub max_level: usize,
    /// The number of times each level was entered.
    pub level_nodes: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_keys() {
        let config: Config = serde_json::from_str(
            r#"{"enableProgress": true, "nodeInterval": 50, "enableDebugTrace": true}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            Config {
                enable_progress: true,
                node_interval: 50,
                enable_debug_trace: true,
            }
        );
    }

    #[test]
    fn missing_keys_take_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn stats_serialize() {
        let stats = Stats {
            nodes: 4,
            solutions: 1,
            max_level: 2,
            level_nodes: vec![1, 2, 1],
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["nodes"], 4);
        assert_eq!(json["level_nodes"][1], 2);
    }
}
