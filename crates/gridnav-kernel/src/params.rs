//! Jobs and their parameter maps.
//!
//! A job is fully described by its parameter map (the "state point"). The
//! job id is derived from that map, never assigned, so two jobs with the same
//! canonical parameters are the same job.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// The named parameters defining one job.
pub type ParameterMap = Map<String, Value>;

/// Content-addressed identifier of a parameter map.
///
/// Shadow ids (ids of reduced parameter maps) share this type: they are
/// produced by the same addresser and compared the same way.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One unit of work: an id and the parameters it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub parameters: ParameterMap,
}

impl Job {
    pub fn new(id: JobId, parameters: ParameterMap) -> Self {
        Self { id, parameters }
    }
}

/// Copy of `parameters` with every key in `ignored` removed.
pub fn without_keys(parameters: &ParameterMap, ignored: &BTreeSet<String>) -> ParameterMap {
    parameters
        .iter()
        .filter(|(key, _)| !ignored.contains(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Copy of `parameters` with `key` set to `value`.
///
/// The input is never touched; every hypothetical map is its own allocation.
pub fn with_value(parameters: &ParameterMap, key: &str, value: &Value) -> ParameterMap {
    let mut out = parameters.clone();
    out.insert(key.to_string(), value.clone());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ParameterMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn without_keys_drops_only_ignored() {
        let params = map(json!({"a": 1, "seed": 3, "b": "x"}));
        let ignored = BTreeSet::from(["seed".to_string(), "missing".to_string()]);
        assert_eq!(without_keys(&params, &ignored), map(json!({"a": 1, "b": "x"})));
    }

    #[test]
    fn with_value_leaves_original_untouched() {
        let params = map(json!({"a": 1, "b": 2}));
        let probe = with_value(&params, "a", &json!(5));
        assert_eq!(probe, map(json!({"a": 5, "b": 2})));
        assert_eq!(params, map(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn job_id_serializes_as_plain_string() {
        let id = JobId::new("42b7b4f2921788ea14dac5566e6f06d0");
        assert_eq!(
            serde_json::to_value(&id).expect("id serializes"),
            json!("42b7b4f2921788ea14dac5566e6f06d0")
        );
    }
}
