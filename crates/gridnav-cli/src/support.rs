use gridnav_kernel::{
    AmbiguousProjection, BuiltNavigator, Navigator, NavigatorConfig, NavigatorError,
};
use gridnav_store::JobStore;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "gridnav.toml";
pub const DEFAULT_JOBS_PATH: &str = "jobs.jsonl";
pub const DEFAULT_WORKSPACE_PATH: &str = "workspace";

pub fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("GRIDNAV_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| {
            if verbose {
                EnvFilter::new("gridnav=debug,gridnav_kernel=debug,gridnav_store=debug")
            } else {
                EnvFilter::new("warn")
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn load_config_or_exit(config_arg: Option<&str>) -> NavigatorConfig {
    let path = match config_arg {
        Some(path) => PathBuf::from(path),
        None if Path::new(DEFAULT_CONFIG_PATH).is_file() => PathBuf::from(DEFAULT_CONFIG_PATH),
        None => return NavigatorConfig::default(),
    };
    NavigatorConfig::load(&path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

/// Load jobs from `--jobs`, `--workspace`, or the default locations.
pub fn load_store_or_exit(jobs: Option<&str>, workspace: Option<&str>) -> (JobStore, String) {
    let (result, source) = match (jobs, workspace) {
        (Some(path), _) => (JobStore::load_jsonl(path), path.to_string()),
        (None, Some(dir)) => (JobStore::load_workspace(dir), dir.to_string()),
        (None, None) if Path::new(DEFAULT_JOBS_PATH).is_file() => (
            JobStore::load_jsonl(DEFAULT_JOBS_PATH),
            DEFAULT_JOBS_PATH.to_string(),
        ),
        (None, None) if Path::new(DEFAULT_WORKSPACE_PATH).is_dir() => (
            JobStore::load_workspace(DEFAULT_WORKSPACE_PATH),
            DEFAULT_WORKSPACE_PATH.to_string(),
        ),
        (None, None) => {
            eprintln!(
                "error: no jobs found; pass --jobs <file> or --workspace <dir> \
                 (defaults: {DEFAULT_JOBS_PATH}, {DEFAULT_WORKSPACE_PATH}/)"
            );
            std::process::exit(1);
        }
    };

    let store = result.unwrap_or_else(|e| {
        eprintln!("error: failed to load {source}: {e}");
        std::process::exit(1);
    });
    (store, source)
}

pub fn merged_config(
    mut config: NavigatorConfig,
    ignore: Vec<String>,
    max_chars: Option<usize>,
) -> NavigatorConfig {
    config = config.with_ignored_keys(ignore);
    if max_chars.is_some() {
        config = config.with_max_label_chars(max_chars);
    }
    config
}

pub fn build_or_exit(
    config: NavigatorConfig,
    store: &JobStore,
    json_output: bool,
) -> BuiltNavigator {
    Navigator::new(config)
        .build(store)
        .unwrap_or_else(|e| match e {
            NavigatorError::Ambiguous(report) => exit_ambiguous(&report, json_output),
            other => {
                eprintln!("error: {other}");
                std::process::exit(1);
            }
        })
}

/// Report every colliding group and exit with status 1.
pub fn exit_ambiguous(report: &AmbiguousProjection, json_output: bool) -> ! {
    if json_output {
        let payload = serde_json::json!({
            "ok": false,
            "ambiguous": report,
        });
        print_json(&payload);
    } else {
        eprintln!(
            "error: ignoring [{}] is ambiguous: {} shadow id(s) claimed by {} jobs",
            report.ignored_keys.join(", "),
            report.collisions.len(),
            report.job_count()
        );
        for collision in &report.collisions {
            eprintln!(
                "  {} {}",
                collision.shadow_id,
                Value::Object(collision.parameters.clone())
            );
            for job_id in &collision.job_ids {
                eprintln!("    - {job_id}");
            }
        }
    }
    std::process::exit(1);
}

pub fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("error: failed to serialize output: {e}");
            std::process::exit(1);
        }
    }
}

/// Shorten `label` to about `max` characters, keeping both ends.
pub fn ellipsis_label(label: &str, max: Option<usize>) -> String {
    let Some(max) = max else {
        return label.to_string();
    };
    let chars: Vec<char> = label.chars().collect();
    if chars.len() < max {
        return label.to_string();
    }
    let half = max / 2;
    let head: String = chars[..half].iter().collect();
    let tail: String = chars[chars.len() - half..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_labels_are_untouched() {
        assert_eq!(ellipsis_label("abc", Some(10)), "abc");
        assert_eq!(ellipsis_label("abcdefghijkl", None), "abcdefghijkl");
    }

    #[test]
    fn long_labels_keep_both_ends() {
        assert_eq!(ellipsis_label("abcdefghijkl", Some(6)), "abc...jkl");
        assert_eq!(ellipsis_label("héllo wörld", Some(4)), "hé...ld");
    }

    #[test]
    fn flags_extend_config() {
        let config = merged_config(
            NavigatorConfig::default().with_ignored_keys(["seed"]),
            vec!["replica".to_string()],
            None,
        );
        assert_eq!(config.ignored_keys.len(), 2);
        assert_eq!(config.max_label_chars, None);
    }
}
