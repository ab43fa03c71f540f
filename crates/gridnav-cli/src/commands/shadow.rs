use crate::commands::Input;
use crate::support::{
    build_or_exit, load_config_or_exit, load_store_or_exit, merged_config, print_json,
};
use serde_json::{Value, json};

pub fn run(input: Input, ignore: Vec<String>, json_output: bool) {
    let config = merged_config(load_config_or_exit(input.config.as_deref()), ignore, None);
    if config.ignored_keys.is_empty() {
        eprintln!(
            "error: shadow needs at least one key to ignore \
             (--ignore <KEY> or ignored_keys in config)"
        );
        std::process::exit(1);
    }

    let (store, source) = load_store_or_exit(input.jobs.as_deref(), input.workspace.as_deref());
    let built = build_or_exit(config, &store, json_output);
    let Some(shadow) = built.shadow() else {
        eprintln!("error: no shadow mapping was built");
        std::process::exit(1);
    };

    let ignored: Vec<&String> = shadow.ignored_keys().iter().collect();
    if json_output {
        let mapping: Vec<_> = shadow
            .forward()
            .iter()
            .map(|(shadow_id, job_id)| {
                json!({
                    "shadowId": shadow_id,
                    "jobId": job_id,
                    "parameters": shadow.parameters(shadow_id.as_str()),
                })
            })
            .collect();
        print_json(&json!({
            "ok": true,
            "source": source,
            "ignoredKeys": ignored,
            "shadowCount": shadow.len(),
            "mapping": mapping,
        }));
        return;
    }

    println!("gridnav shadow");
    println!("  Source: {source}");
    println!(
        "  Ignored keys: {}",
        ignored
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Shadow jobs: {}", shadow.len());
    for (shadow_id, job_id) in shadow.forward() {
        let parameters = shadow
            .parameters(shadow_id.as_str())
            .cloned()
            .map(Value::Object)
            .unwrap_or(Value::Null);
        println!("  - {shadow_id} -> {job_id} {parameters}");
    }
}
