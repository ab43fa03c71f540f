//! Canonical in-memory job collection.
//!
//! Every recorded id is recomputed with the shared addresser on load. A
//! store whose ids disagree with the addresser is refused, because neighbor
//! probes would silently miss every job.

use crate::jsonl::{JobRecord, JsonlError, read_records_from_path};
use crate::workspace::{WorkspaceError, read_workspace};
use gridnav_kernel::{
    BoxError, ContentAddresser, IdMismatch, Job, JobId, JobSource, ParameterMap, Schema,
    SignacAddresser,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Errors raised while loading or querying the job store.
#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error(transparent)]
    Jsonl(#[from] JsonlError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("{} job id(s) do not match their state points: {}", .0.len(), render_mismatches(.0))]
    IdMismatch(Vec<IdMismatch>),

    #[error("job id {0} recorded with two different state points")]
    ConflictingJob(JobId),
}

fn render_mismatches(mismatches: &[IdMismatch]) -> String {
    mismatches
        .iter()
        .map(|m| format!("{} (expected {})", m.recorded, m.computed))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Deterministic in-memory job collection keyed by id.
#[derive(Debug, Clone, Default)]
pub struct JobStore<A = SignacAddresser> {
    jobs: BTreeMap<JobId, ParameterMap>,
    addresser: A,
}

impl JobStore<SignacAddresser> {
    /// Build a store from records using the signac addresser.
    pub fn from_records(records: Vec<JobRecord>) -> Result<Self, JobStoreError> {
        Self::from_records_with(records, SignacAddresser)
    }

    /// Load a JSONL job file.
    pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Self, JobStoreError> {
        Self::from_records(read_records_from_path(path)?)
    }

    /// Load a signac-style workspace directory.
    pub fn load_workspace(root: impl AsRef<Path>) -> Result<Self, JobStoreError> {
        Self::from_records(read_workspace(root)?)
    }
}

impl<A: ContentAddresser> JobStore<A> {
    /// Build a store, computing missing ids and verifying recorded ones.
    ///
    /// The same state point recorded twice collapses to one job. Every
    /// mismatched id is reported, not just the first.
    pub fn from_records_with(records: Vec<JobRecord>, addresser: A) -> Result<Self, JobStoreError> {
        let mut jobs: BTreeMap<JobId, ParameterMap> = BTreeMap::new();
        let mut mismatches = Vec::new();

        for record in records {
            let computed = addresser.calc_id(&record.statepoint);
            if let Some(recorded) = record.id
                && recorded != computed
            {
                mismatches.push(IdMismatch { recorded, computed });
                continue;
            }
            if let Some(existing) = jobs.get(&computed) {
                if *existing != record.statepoint {
                    return Err(JobStoreError::ConflictingJob(computed));
                }
                tracing::debug!(id = %computed, "duplicate job record collapsed");
                continue;
            }
            jobs.insert(computed, record.statepoint);
        }

        if !mismatches.is_empty() {
            return Err(JobStoreError::IdMismatch(mismatches));
        }
        tracing::debug!(jobs = jobs.len(), "job store loaded");
        Ok(Self { jobs, addresser })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.jobs.contains_key(id)
    }

    /// Parameters of one job.
    pub fn job(&self, id: &str) -> Option<&ParameterMap> {
        self.jobs.get(id)
    }

    /// The job `parameters` would address, if it exists.
    pub fn open_job(&self, parameters: &ParameterMap) -> Option<Job> {
        let id = self.addresser.calc_id(parameters);
        self.jobs
            .get(id.as_str())
            .map(|found| Job::new(id.clone(), found.clone()))
    }

    /// Iterate jobs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&JobId, &ParameterMap)> {
        self.jobs.iter()
    }

    /// Jobs whose top-level values equal every entry of `filter`.
    pub fn find(&self, filter: &ParameterMap) -> Vec<Job> {
        self.jobs
            .iter()
            .filter(|(_, parameters)| {
                filter
                    .iter()
                    .all(|(key, wanted)| parameters.get(key) == Some(wanted))
            })
            .map(|(id, parameters)| Job::new(id.clone(), parameters.clone()))
            .collect()
    }

    /// Distinct values of `key` across the store.
    pub fn values_of(&self, key: &str) -> Vec<&Value> {
        let mut out: Vec<&Value> = Vec::new();
        for parameters in self.jobs.values() {
            if let Some(value) = parameters.get(key)
                && !out.contains(&value)
            {
                out.push(value);
            }
        }
        out
    }

    /// Schema of the stored jobs.
    pub fn detect_schema(&self) -> Schema {
        Schema::detect(self.jobs.values())
    }

    pub fn addresser(&self) -> &A {
        &self.addresser
    }
}

impl<A: ContentAddresser> JobSource for JobStore<A> {
    fn jobs(&self) -> Result<Vec<Job>, BoxError> {
        Ok(self
            .jobs
            .iter()
            .map(|(id, parameters)| Job::new(id.clone(), parameters.clone()))
            .collect())
    }
}
