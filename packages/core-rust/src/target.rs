//! Discovery targets and the exports announcement.
//!
//! A component announces where its metrics endpoint can be scraped exactly
//! once, at construction. The announcement is a list of [`Target`]s, each a
//! flat label set using the Prometheus reserved label names below.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Label carrying `host:port` of the scrape endpoint.
pub const ADDRESS_LABEL: &str = "__address__";
/// Label carrying the URL scheme (`http` or `https`).
pub const SCHEME_LABEL: &str = "__scheme__";
/// Label carrying the HTTP path of the metrics endpoint.
pub const METRICS_PATH_LABEL: &str = "__metrics_path__";
/// Label carrying the human-readable integration name.
pub const NAME_LABEL: &str = "name";

static LABEL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*$").expect("label name pattern is valid")
});

/// Errors produced while building targets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid label name: {name:?}")]
    InvalidLabelName { name: String },
}

/// Returns `true` if `name` is a valid Prometheus label name.
#[must_use]
pub fn is_valid_label_name(name: &str) -> bool {
    LABEL_NAME.is_match(name)
}

/// A single discovery target: an ordered set of labels.
///
/// Uses `BTreeMap` so serialization order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(BTreeMap<String, String>);

impl Target {
    /// Creates an empty target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a label, rejecting names that Prometheus would not accept.
    ///
    /// # Errors
    ///
    /// Returns `TargetError::InvalidLabelName` if `name` is not a valid label name.
    pub fn with_label(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, TargetError> {
        let name = name.into();
        if !is_valid_label_name(&name) {
            return Err(TargetError::InvalidLabelName { name });
        }
        self.0.insert(name, value.into());
        Ok(self)
    }

    /// Looks up a label value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of labels on this target.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the target carries no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The one-time announcement a component publishes at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exports {
    pub targets: Vec<Target>,
}

/// Joins a base path and a segment with exactly one `/` between them.
///
/// An empty base yields `/segment`.
#[must_use]
pub fn join_path(base: &str, segment: &str) -> String {
    let base = base.trim_end_matches('/');
    let segment = segment.trim_start_matches('/');
    if base.is_empty() {
        format!("/{segment}")
    } else {
        format!("{base}/{segment}")
    }
}

/// Builds the scrape target pointing at a component's metrics endpoint.
///
/// # Errors
///
/// Propagates `TargetError` from label validation.
pub fn scrape_target(
    listen_addr: &str,
    http_path: &str,
    name: &str,
) -> Result<Target, TargetError> {
    Target::new()
        .with_label(ADDRESS_LABEL, listen_addr)?
        .with_label(SCHEME_LABEL, "http")?
        .with_label(METRICS_PATH_LABEL, join_path(http_path, "metrics"))?
        .with_label(NAME_LABEL, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_name_validation() {
        assert!(is_valid_label_name("__address__"));
        assert!(is_valid_label_name("job"));
        assert!(is_valid_label_name("_x9"));
        assert!(!is_valid_label_name(""));
        assert!(!is_valid_label_name("9lives"));
        assert!(!is_valid_label_name("has-dash"));
        assert!(!is_valid_label_name("dotted.name"));
    }

    #[test]
    fn with_label_rejects_invalid_name() {
        let err = Target::new().with_label("bad name", "x").unwrap_err();
        assert_eq!(
            err,
            TargetError::InvalidLabelName {
                name: "bad name".to_string()
            }
        );
    }

    #[test]
    fn join_path_normalises_slashes() {
        assert_eq!(
            join_path("/integrations/heartbeat", "metrics"),
            "/integrations/heartbeat/metrics"
        );
        assert_eq!(
            join_path("/integrations/heartbeat/", "/metrics"),
            "/integrations/heartbeat/metrics"
        );
        assert_eq!(join_path("", "metrics"), "/metrics");
        assert_eq!(join_path("/", "metrics"), "/metrics");
    }

    #[test]
    fn scrape_target_carries_reserved_labels() {
        let target =
            scrape_target("127.0.0.1:12345", "/integrations/heartbeat", "heartbeat").unwrap();
        assert_eq!(target.get(ADDRESS_LABEL), Some("127.0.0.1:12345"));
        assert_eq!(target.get(SCHEME_LABEL), Some("http"));
        assert_eq!(target.get(METRICS_PATH_LABEL), Some("/integrations/heartbeat/metrics"));
        assert_eq!(target.get(NAME_LABEL), Some("heartbeat"));
        assert_eq!(target.len(), 4);
    }

    #[test]
    fn exports_serialize_as_flat_label_maps() {
        let exports = Exports {
            targets: vec![Target::new().with_label("job", "a").unwrap()],
        };
        let json = serde_json::to_value(&exports).unwrap();
        assert_eq!(json, serde_json::json!({ "targets": [{ "job": "a" }] }));
    }
}
