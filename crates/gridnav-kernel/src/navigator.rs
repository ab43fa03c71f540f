//! The build pipeline: job source → schema → substrate → neighbor index.
//!
//! [`Navigator`] is the unbuilt state; [`Navigator::build`] consumes it and
//! yields a [`BuiltNavigator`]. There is no way back and no incremental
//! update: a changed job set needs a new `Navigator`.

use crate::config::{NavigatorConfig, ProjectionMode};
use crate::error::{BoxError, NavigatorError};
use crate::identity::{ContentAddresser, SignacAddresser, find_id_mismatches};
use crate::neighbor::{KeyNeighbors, NeighborIndex, NeighborIndexBuilder};
use crate::params::{Job, JobId, ParameterMap};
use crate::schema::Schema;
use crate::shadow::ShadowMapping;
use std::collections::BTreeMap;
use std::time::Instant;

/// The project collaborator: where jobs (and optionally a schema) come from.
pub trait JobSource {
    /// Every job in scope.
    fn jobs(&self) -> Result<Vec<Job>, BoxError>;

    /// A precomputed schema, if the source has one.
    fn schema(&self) -> Result<Option<Schema>, BoxError> {
        Ok(None)
    }
}

impl JobSource for [Job] {
    fn jobs(&self) -> Result<Vec<Job>, BoxError> {
        Ok(self.to_vec())
    }
}

impl JobSource for Vec<Job> {
    fn jobs(&self) -> Result<Vec<Job>, BoxError> {
        Ok(self.clone())
    }
}

/// Unbuilt navigator: configuration plus the addresser shared with the store.
#[derive(Debug, Clone)]
pub struct Navigator<A = SignacAddresser> {
    config: NavigatorConfig,
    addresser: A,
}

impl Navigator<SignacAddresser> {
    pub fn new(config: NavigatorConfig) -> Self {
        Self::with_addresser(config, SignacAddresser)
    }
}

impl<A: ContentAddresser> Navigator<A> {
    pub fn with_addresser(config: NavigatorConfig, addresser: A) -> Self {
        Self { config, addresser }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Run the full build. Blocks for the whole computation.
    pub fn build<S: JobSource + ?Sized>(
        self,
        source: &S,
    ) -> Result<BuiltNavigator, NavigatorError> {
        let started = Instant::now();
        let jobs = source.jobs().map_err(NavigatorError::Source)?;
        let projection = self.config.projection();
        let span = tracing::info_span!(
            "navigator_build",
            jobs = jobs.len(),
            shadow = matches!(projection, ProjectionMode::Shadow(_))
        );
        let _guard = span.enter();

        let by_id: BTreeMap<JobId, ParameterMap> = jobs
            .iter()
            .map(|job| (job.id.clone(), job.parameters.clone()))
            .collect();

        let schema = match source.schema().map_err(NavigatorError::Source)? {
            Some(schema) => schema,
            None => {
                tracing::info!("detecting project schema");
                Schema::detect(by_id.values())
            }
        };
        let schema = schema.without_keys(&self.config.ignored_keys);
        tracing::debug!(keys = schema.len(), "schema ready");

        let (shadow, index) = match projection {
            ProjectionMode::NoShadow => {
                let mismatches = find_id_mismatches(&jobs, &self.addresser);
                if !mismatches.is_empty() {
                    return Err(NavigatorError::IdMismatch(mismatches));
                }
                let index = NeighborIndexBuilder::new(&schema, &by_id, &self.addresser).build()?;
                (None, index)
            }
            ProjectionMode::Shadow(ignored) => {
                let mapping = ShadowMapping::project(by_id.iter(), &ignored, &self.addresser)?;
                let index = NeighborIndexBuilder::new(&schema, mapping.cache(), &self.addresser)
                    .build()?
                    .map_ids(|shadow_id| mapping.job_id(shadow_id.as_str()).cloned());
                (Some(mapping), index)
            }
        };

        tracing::info!(
            indexed = index.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "neighbor index built"
        );

        Ok(BuiltNavigator {
            config: self.config,
            schema,
            shadow,
            index,
        })
    }
}

/// Built navigator: immutable schema, projection and index.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltNavigator {
    config: NavigatorConfig,
    schema: Schema,
    shadow: Option<ShadowMapping>,
    index: NeighborIndex,
}

impl BuiltNavigator {
    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// The schema walked by the search (ignored keys removed).
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The shadow projection, when ignored keys were configured.
    pub fn shadow(&self) -> Option<&ShadowMapping> {
        self.shadow.as_ref()
    }

    /// Index keyed by real job ids, with job ids as neighbors.
    pub fn index(&self) -> &NeighborIndex {
        &self.index
    }

    pub fn into_index(self) -> NeighborIndex {
        self.index
    }

    /// Navigable keys of `id`, in key order. Empty when `id` has none.
    pub fn neighbors(&self, id: &str) -> &[KeyNeighbors] {
        self.index.rows(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbor::{Neighbor, Sentinel};
    use crate::schema::{Domain, DomainOrder};
    use serde_json::{Value, json};

    fn job(value: Value) -> Job {
        match value {
            Value::Object(map) => Job::new(SignacAddresser.calc_id(&map), map),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn raw_build_indexes_real_job_ids() {
        let jobs = vec![job(json!({"a": 1})), job(json!({"a": 2})), job(json!({"a": 3}))];
        let built = Navigator::new(NavigatorConfig::default())
            .build(&jobs)
            .expect("builds");

        assert!(built.shadow().is_none());
        let rows = built.neighbors("9f8a8e5ba8c70c774d410a9107e2a32b");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].previous.id_or_sentinel(), "42b7b4f2921788ea14dac5566e6f06d0");
        assert_eq!(rows[0].next.id_or_sentinel(), "14fb5d016557165019abaac200785048");
    }

    #[test]
    fn rebuild_is_idempotent() {
        let jobs = vec![
            job(json!({"a": 1, "b": "x"})),
            job(json!({"a": 2, "b": "x"})),
            job(json!({"a": 2, "b": "y"})),
            job(json!({"a": 4, "b": "y"})),
        ];
        let first = Navigator::new(NavigatorConfig::default()).build(&jobs).expect("builds");
        let second = Navigator::new(NavigatorConfig::default()).build(&jobs).expect("builds");
        assert_eq!(first, second);
    }

    #[test]
    fn shadow_build_links_jobs_through_reduced_maps() {
        let jobs = vec![job(json!({"a": 1, "seed": 0})), job(json!({"a": 2, "seed": 1}))];
        let config = NavigatorConfig::default().with_ignored_keys(["seed"]);
        let built = Navigator::new(config).build(&jobs).expect("injective");

        assert_eq!(built.shadow().map(ShadowMapping::len), Some(2));
        assert!(built.schema().get("seed").is_none());

        let rows = built.neighbors("7af33fa439e2c0bb69e9f865563e13bd");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "a");
        assert_eq!(rows[0].previous, Neighbor::Sentinel(Sentinel::Min));
        assert_eq!(rows[0].next.id_or_sentinel(), "53b5effad94d233cead26298d23a2832");
    }

    #[test]
    fn shadow_collision_fails_the_build() {
        let jobs = vec![job(json!({"a": 1, "seed": 0})), job(json!({"a": 1, "seed": 1}))];
        let config = NavigatorConfig::default().with_ignored_keys(["seed"]);
        let err = Navigator::new(config).build(&jobs).expect_err("ambiguous");

        let report = match err {
            NavigatorError::Ambiguous(report) => report,
            other => panic!("expected ambiguity, got {other}"),
        };
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(report.collisions[0].job_ids.len(), 2);
    }

    #[test]
    fn mismatched_ids_are_rejected_up_front() {
        let mut stale = job(json!({"a": 2}));
        stale.id = JobId::new("not-the-hash");
        let jobs = vec![job(json!({"a": 1})), stale];

        let err = Navigator::new(NavigatorConfig::default())
            .build(&jobs)
            .expect_err("id mismatch");
        assert!(matches!(err, NavigatorError::IdMismatch(ref m) if m.len() == 1));
    }

    struct FailingSource;

    #[derive(Debug, thiserror::Error)]
    #[error("store offline")]
    struct Offline;

    impl JobSource for FailingSource {
        fn jobs(&self) -> Result<Vec<Job>, BoxError> {
            Err(Box::new(Offline))
        }
    }

    #[test]
    fn source_errors_propagate_unchanged() {
        let err = Navigator::new(NavigatorConfig::default())
            .build(&FailingSource)
            .expect_err("source fails");
        assert_eq!(err.to_string(), "store offline");
        let inner = match err {
            NavigatorError::Source(inner) => inner,
            other => panic!("expected source error, got {other}"),
        };
        assert!(inner.downcast_ref::<Offline>().is_some());
    }

    struct WithSchema(Vec<Job>, Schema);

    impl JobSource for WithSchema {
        fn jobs(&self) -> Result<Vec<Job>, BoxError> {
            Ok(self.0.clone())
        }

        fn schema(&self) -> Result<Option<Schema>, BoxError> {
            Ok(Some(self.1.clone()))
        }
    }

    #[test]
    fn precomputed_schema_is_used_as_given() {
        let jobs = vec![job(json!({"a": 1})), job(json!({"a": 2})), job(json!({"a": 3}))];
        // Reversed domain: "previous" now means the larger value.
        let schema = Schema::from_domains(BTreeMap::from([(
            "a".to_string(),
            Domain::new(vec![json!(3), json!(2), json!(1)], DomainOrder::Sorted),
        )]));
        let built = Navigator::new(NavigatorConfig::default())
            .build(&WithSchema(jobs, schema))
            .expect("builds");

        let rows = built.neighbors("42b7b4f2921788ea14dac5566e6f06d0");
        assert_eq!(rows[0].previous.id_or_sentinel(), "9f8a8e5ba8c70c774d410a9107e2a32b");
        assert_eq!(rows[0].next, Neighbor::Sentinel(Sentinel::Max));
    }

    #[test]
    fn index_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NeighborIndex>();
        assert_send_sync::<BuiltNavigator>();
    }
}
