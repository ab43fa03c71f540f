use crate::commands::Input;
use crate::support::{load_store_or_exit, print_json};
use gridnav_kernel::{DomainOrder, value_label};
use serde_json::json;

pub fn run(input: Input, json_output: bool) {
    let (store, source) = load_store_or_exit(input.jobs.as_deref(), input.workspace.as_deref());
    let schema = store.detect_schema();

    if json_output {
        let keys: Vec<_> = schema
            .iter()
            .map(|(key, domain)| {
                json!({
                    "key": key,
                    "order": domain.order(),
                    "values": domain.values(),
                })
            })
            .collect();
        print_json(&json!({
            "source": source,
            "jobCount": store.len(),
            "keys": keys,
        }));
        return;
    }

    println!("gridnav schema");
    println!("  Source: {source}");
    println!("  Jobs: {}", store.len());
    println!("  Varying keys: {}", schema.len());
    for (key, domain) in schema.iter() {
        let values: Vec<String> = domain.values().iter().map(value_label).collect();
        let order = match domain.order() {
            DomainOrder::Sorted => "",
            DomainOrder::Insertion => " (unordered)",
        };
        println!("  - {key}{order}: {}", values.join(", "));
    }
}
