//! Shadow projection: navigate as if nuisance keys did not exist.
//!
//! Each job's parameters are reduced by removing the ignored keys and the
//! reduced map is addressed like any other parameter map. The projection is
//! only usable when it stays one-to-one: if two jobs reduce to the same map,
//! "the neighbor of this job" is no longer well defined and the projection
//! is rejected with every collision listed.

use crate::identity::ContentAddresser;
use crate::params::{JobId, ParameterMap, without_keys};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// One shadow id claimed by more than one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowCollision {
    pub shadow_id: JobId,
    /// The reduced parameters shared by all members.
    pub parameters: ParameterMap,
    /// Member job ids, sorted.
    pub job_ids: Vec<JobId>,
}

/// The projection is not injective.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error(
    "ambiguous shadow projection ignoring [{}]: {}",
    .ignored_keys.join(", "),
    render_collisions(.collisions)
)]
pub struct AmbiguousProjection {
    pub ignored_keys: Vec<String>,
    /// Every colliding group, ordered by shadow id.
    pub collisions: Vec<ShadowCollision>,
}

impl AmbiguousProjection {
    /// Total number of jobs involved in a collision.
    pub fn job_count(&self) -> usize {
        self.collisions.iter().map(|c| c.job_ids.len()).sum()
    }
}

fn render_collisions(collisions: &[ShadowCollision]) -> String {
    let mut out = String::new();
    for (idx, collision) in collisions.iter().enumerate() {
        if idx > 0 {
            out.push_str("; ");
        }
        let members: Vec<&str> = collision.job_ids.iter().map(JobId::as_str).collect();
        let _ = write!(
            out,
            "{} <- {{{}}}",
            collision.shadow_id,
            members.join(", ")
        );
    }
    out
}

/// Injective mapping between shadow ids and job ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowMapping {
    ignored_keys: BTreeSet<String>,
    forward: BTreeMap<JobId, JobId>,
    cache: BTreeMap<JobId, ParameterMap>,
}

impl ShadowMapping {
    /// Project `jobs` by removing `ignored` keys.
    ///
    /// Fails with every colliding group if two jobs reduce to the same map.
    pub fn project<'a>(
        jobs: impl IntoIterator<Item = (&'a JobId, &'a ParameterMap)>,
        ignored: &BTreeSet<String>,
        addresser: &dyn ContentAddresser,
    ) -> Result<Self, AmbiguousProjection> {
        let mut groups: BTreeMap<JobId, (ParameterMap, Vec<JobId>)> = BTreeMap::new();
        for (job_id, parameters) in jobs {
            let reduced = without_keys(parameters, ignored);
            let shadow_id = addresser.calc_id(&reduced);
            groups
                .entry(shadow_id)
                .or_insert_with(|| (reduced, Vec::new()))
                .1
                .push(job_id.clone());
        }

        let collisions: Vec<ShadowCollision> = groups
            .iter()
            .filter(|(_, (_, members))| members.len() > 1)
            .map(|(shadow_id, (parameters, members))| {
                let mut job_ids = members.clone();
                job_ids.sort();
                job_ids.dedup();
                ShadowCollision {
                    shadow_id: shadow_id.clone(),
                    parameters: parameters.clone(),
                    job_ids,
                }
            })
            .filter(|collision| collision.job_ids.len() > 1)
            .collect();

        if !collisions.is_empty() {
            for collision in &collisions {
                tracing::debug!(
                    shadow_id = %collision.shadow_id,
                    members = collision.job_ids.len(),
                    "shadow id claimed by multiple jobs"
                );
            }
            return Err(AmbiguousProjection {
                ignored_keys: ignored.iter().cloned().collect(),
                collisions,
            });
        }

        let mut forward = BTreeMap::new();
        let mut cache = BTreeMap::new();
        for (shadow_id, (reduced, mut members)) in groups {
            if let Some(job_id) = members.pop() {
                forward.insert(shadow_id.clone(), job_id);
                cache.insert(shadow_id, reduced);
            }
        }

        Ok(Self {
            ignored_keys: ignored.clone(),
            forward,
            cache,
        })
    }

    pub fn ignored_keys(&self) -> &BTreeSet<String> {
        &self.ignored_keys
    }

    /// Shadow id → job id.
    pub fn forward(&self) -> &BTreeMap<JobId, JobId> {
        &self.forward
    }

    /// Shadow id → reduced parameters. This is the neighbor-search substrate.
    pub fn cache(&self) -> &BTreeMap<JobId, ParameterMap> {
        &self.cache
    }

    /// The job a shadow id stands for.
    pub fn job_id(&self, shadow_id: &str) -> Option<&JobId> {
        self.forward.get(shadow_id)
    }

    /// Reduced parameters of a shadow id.
    pub fn parameters(&self, shadow_id: &str) -> Option<&ParameterMap> {
        self.cache.get(shadow_id)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
