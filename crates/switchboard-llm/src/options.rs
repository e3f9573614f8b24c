//! Split of caller tuning options against a backend allow-list

use serde_json::{Map, Value};

/// Options partitioned into backend-recognized and unrecognized sets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedOptions {
    /// Forwarded verbatim as backend-native options
    pub known: Map<String, Value>,
    /// Not forwarded; surfaced to the caller
    pub unknown: Map<String, Value>,
}

/// Partition `raw` by membership in `allowlist`
///
/// Never fails: unrecognized keys are returned rather than rejected so that
/// newer backend parameters do not break callers.
pub fn classify_options(allowlist: &[&str], raw: Map<String, Value>) -> ClassifiedOptions {
    let mut classified = ClassifiedOptions::default();

    for (key, value) in raw {
        if allowlist.contains(&key.as_str()) {
            classified.known.insert(key, value);
        } else {
            classified.unknown.insert(key, value);
        }
    }

    classified
}
