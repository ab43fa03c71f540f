//! Schema detection: the varying keys of a job collection and their domains.
//!
//! Only top-level keys are considered. Nested objects are opaque values.
//! A key whose every observation is the same value carries no navigation
//! information and is dropped.

use crate::identity::canonical_value_json;
use crate::params::ParameterMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// How the values of a [`Domain`] are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainOrder {
    /// Ascending by value.
    Sorted,
    /// The values were not mutually comparable; first-seen order is kept.
    Insertion,
}

/// The distinct observed values of one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    values: Vec<Value>,
    order: DomainOrder,
}

impl Domain {
    /// Domain from values already in the desired order.
    pub fn new(values: Vec<Value>, order: DomainOrder) -> Self {
        Self { values, order }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn order(&self) -> DomainOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of `value` in the domain.
    ///
    /// Values match by canonical text, the same key [`Schema::detect`] uses to
    /// tell values apart, so `-0.0` and `0.0` stay distinct.
    pub fn position(&self, value: &Value) -> Option<usize> {
        let wanted = canonical_value_json(value);
        self.values
            .iter()
            .position(|candidate| canonical_value_json(candidate) == wanted)
    }

    fn from_observed(values: Vec<Value>) -> Self {
        if is_totally_comparable(&values) {
            let mut values = values;
            // Stable: numerically equal values (1 and 1.0) keep first-seen order.
            values.sort_by(|a, b| compare_values(a, b).unwrap_or(Ordering::Equal));
            Self::new(values, DomainOrder::Sorted)
        } else {
            Self::new(values, DomainOrder::Insertion)
        }
    }
}

/// Varying keys of a job collection, ordered by key name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    keys: BTreeMap<String, Domain>,
}

impl Schema {
    /// Detect the schema of `maps`, excluding keys with a single distinct value.
    pub fn detect<'a>(maps: impl IntoIterator<Item = &'a ParameterMap>) -> Self {
        let mut observed: BTreeMap<String, (BTreeSet<String>, Vec<Value>)> = BTreeMap::new();
        for parameters in maps {
            for (key, value) in parameters {
                let (seen, values) = observed.entry(key.clone()).or_default();
                if seen.insert(canonical_value_json(value)) {
                    values.push(value.clone());
                }
            }
        }

        let mut keys = BTreeMap::new();
        for (key, (_, values)) in observed {
            if values.len() < 2 {
                continue;
            }
            let domain = Domain::from_observed(values);
            if domain.order == DomainOrder::Insertion {
                tracing::debug!(
                    key = %key,
                    width = domain.len(),
                    "domain values are not mutually comparable; keeping first-seen order"
                );
            }
            keys.insert(key, domain);
        }
        Self { keys }
    }

    /// Schema from caller-supplied domains, used as given.
    pub fn from_domains(keys: BTreeMap<String, Domain>) -> Self {
        Self { keys }
    }

    /// Copy of this schema without the keys in `ignored`.
    pub fn without_keys(&self, ignored: &BTreeSet<String>) -> Self {
        Self {
            keys: self
                .keys
                .iter()
                .filter(|(key, _)| !ignored.contains(key.as_str()))
                .map(|(key, domain)| (key.clone(), domain.clone()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Domain> {
        self.keys.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Iterate `(key, domain)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Domain)> {
        self.keys.iter().map(|(key, domain)| (key.as_str(), domain))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Ordering between two values, or `None` when they are not comparable.
///
/// Numbers compare numerically, strings by code point, booleans with
/// booleans, arrays lexicographically. `null` and objects compare with
/// nothing.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                Some(x.cmp(&y))
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                Some(x.cmp(&y))
            } else {
                x.as_f64()?.partial_cmp(&y.as_f64()?)
            }
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Array(xs), Value::Array(ys)) => {
            for (x, y) in xs.iter().zip(ys) {
                match compare_values(x, y)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(xs.len().cmp(&ys.len()))
        }
        _ => None,
    }
}

fn is_totally_comparable(values: &[Value]) -> bool {
    let Some(first) = values.first() else {
        return true;
    };
    let homogeneous = values.iter().all(|value| {
        matches!(
            (first, value),
            (Value::Number(_), Value::Number(_))
                | (Value::String(_), Value::String(_))
                | (Value::Bool(_), Value::Bool(_))
                | (Value::Array(_), Value::Array(_))
        )
    });
    if !homogeneous {
        return false;
    }
    if !first.is_array() {
        return true;
    }
    values.iter().enumerate().all(|(idx, a)| {
        values[idx + 1..]
            .iter()
            .all(|b| compare_values(a, b).is_some())
    })
}
