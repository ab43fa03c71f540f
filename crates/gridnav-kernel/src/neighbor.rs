//! Nearest existing neighbors along each schema key.
//!
//! For a job `J` and key `k`, the previous neighbor is the job that agrees
//! with `J` on every other key and holds the largest domain value of `k`
//! below `J`'s. Grids are usually sparse, so the search walks outward along
//! the domain, hashing one hypothetical parameter map per probe, until a
//! probe lands on an existing substrate entry or the domain is exhausted.
//!
//! Cost is `O(ids × keys × domain width)` in the worst case. In practice a
//! hit comes within a few probes.

use crate::error::NavigatorError;
use crate::identity::{ContentAddresser, canonical_value_json};
use crate::params::{JobId, ParameterMap, with_value};
use crate::schema::{Domain, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Marker for "no neighbor in this direction".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentinel {
    Min,
    Max,
}

impl Sentinel {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentinel::Min => "min",
            Sentinel::Max => "max",
        }
    }
}

/// An existing job reached by changing one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborRef {
    pub id: JobId,
    pub value: Value,
}

/// One side of a key's neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Neighbor {
    Found(NeighborRef),
    Sentinel(Sentinel),
}

impl Neighbor {
    pub fn is_found(&self) -> bool {
        matches!(self, Neighbor::Found(_))
    }

    pub fn found(&self) -> Option<&NeighborRef> {
        match self {
            Neighbor::Found(found) => Some(found),
            Neighbor::Sentinel(_) => None,
        }
    }

    /// Neighbor id, or the sentinel text.
    pub fn id_or_sentinel(&self) -> &str {
        match self {
            Neighbor::Found(found) => found.id.as_str(),
            Neighbor::Sentinel(sentinel) => sentinel.as_str(),
        }
    }

    /// Untruncated display label: the neighbor's value, or the sentinel text.
    pub fn label(&self) -> String {
        match self {
            Neighbor::Found(found) => value_label(&found.value),
            Neighbor::Sentinel(sentinel) => sentinel.as_str().to_string(),
        }
    }
}

/// Label for a parameter value: strings bare, everything else as JSON text.
pub fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Neighborhood of one job along one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyNeighbors {
    pub key: String,
    /// The job's own value for `key`.
    pub value: Value,
    pub previous: Neighbor,
    pub next: Neighbor,
}

/// All navigable keys of one job, in schema key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeighborEntry {
    keys: Vec<KeyNeighbors>,
}

impl NeighborEntry {
    pub fn keys(&self) -> &[KeyNeighbors] {
        &self.keys
    }

    pub fn key(&self, key: &str) -> Option<&KeyNeighbors> {
        self.keys.iter().find(|entry| entry.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Immutable id → neighbors index.
///
/// Built once; not updated when jobs are added afterwards. Shared freely
/// between threads, there are no writers after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeighborIndex {
    entries: BTreeMap<JobId, NeighborEntry>,
}

impl NeighborIndex {
    /// Neighbors of `id`; `None` if `id` was not in scope or has no neighbors.
    pub fn get(&self, id: &str) -> Option<&NeighborEntry> {
        self.entries.get(id)
    }

    /// Rows for `id`, empty when unknown.
    pub fn rows(&self, id: &str) -> &[KeyNeighbors] {
        self.get(id).map(NeighborEntry::keys).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&JobId, &NeighborEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-key the index and its neighbor ids through `resolve`.
    ///
    /// Used to turn a shadow-id index into a job-id index. Ids that do not
    /// resolve are kept as they are.
    pub fn map_ids(self, resolve: impl Fn(&JobId) -> Option<JobId>) -> Self {
        let translate = |id: JobId| resolve(&id).unwrap_or(id);
        let entries = self
            .entries
            .into_iter()
            .map(|(id, entry)| {
                let keys = entry
                    .keys
                    .into_iter()
                    .map(|mut row| {
                        for side in [&mut row.previous, &mut row.next] {
                            if let Neighbor::Found(found) = side {
                                found.id = translate(found.id.clone());
                            }
                        }
                        row
                    })
                    .collect();
                (translate(id), NeighborEntry { keys })
            })
            .collect();
        Self { entries }
    }
}

/// Search inputs: schema, substrate and the shared addresser.
pub struct NeighborIndexBuilder<'a> {
    schema: &'a Schema,
    substrate: &'a BTreeMap<JobId, ParameterMap>,
    addresser: &'a dyn ContentAddresser,
}

impl<'a> NeighborIndexBuilder<'a> {
    /// `substrate` must be injective (raw job ids or a verified shadow
    /// projection) and keyed by `addresser` ids.
    pub fn new(
        schema: &'a Schema,
        substrate: &'a BTreeMap<JobId, ParameterMap>,
        addresser: &'a dyn ContentAddresser,
    ) -> Self {
        Self {
            schema,
            substrate,
            addresser,
        }
    }

    /// Build the index eagerly over every substrate entry.
    pub fn build(&self) -> Result<NeighborIndex, NavigatorError> {
        let mut entries = BTreeMap::new();
        for (id, parameters) in self.substrate {
            let entry = self.entry_for(id, parameters)?;
            if !entry.is_empty() {
                entries.insert(id.clone(), entry);
            }
        }
        Ok(NeighborIndex { entries })
    }

    fn entry_for(
        &self,
        id: &JobId,
        parameters: &ParameterMap,
    ) -> Result<NeighborEntry, NavigatorError> {
        let mut keys = Vec::new();
        for (key, domain) in self.schema.iter() {
            let Some(value) = parameters.get(key) else {
                continue;
            };
            let Some(idx) = domain.position(value) else {
                return Err(NavigatorError::ValueOutsideDomain {
                    id: id.clone(),
                    key: key.to_string(),
                    value: canonical_value_json(value),
                });
            };

            let previous = self
                .first_existing(parameters, key, domain, (0..idx).rev())
                .map_or(Neighbor::Sentinel(Sentinel::Min), Neighbor::Found);
            let next = self
                .first_existing(parameters, key, domain, idx + 1..domain.len())
                .map_or(Neighbor::Sentinel(Sentinel::Max), Neighbor::Found);

            if previous.is_found() || next.is_found() {
                keys.push(KeyNeighbors {
                    key: key.to_string(),
                    value: value.clone(),
                    previous,
                    next,
                });
            }
        }
        Ok(NeighborEntry { keys })
    }

    fn first_existing(
        &self,
        parameters: &ParameterMap,
        key: &str,
        domain: &Domain,
        probes: impl Iterator<Item = usize>,
    ) -> Option<NeighborRef> {
        let values = domain.values();
        probes.map(|idx| &values[idx]).find_map(|candidate| {
            let probe = with_value(parameters, key, candidate);
            let probe_id = self.addresser.calc_id(&probe);
            self.substrate.contains_key(&probe_id).then(|| NeighborRef {
                id: probe_id,
                value: candidate.clone(),
            })
        })
    }
}
