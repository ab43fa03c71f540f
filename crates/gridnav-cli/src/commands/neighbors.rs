use crate::commands::Input;
use crate::support::{
    build_or_exit, ellipsis_label, load_config_or_exit, load_store_or_exit, merged_config,
    print_json,
};
use gridnav_kernel::{KeyNeighbors, value_label};
use serde_json::json;

pub struct Args {
    pub input: Input,
    pub id: String,
    pub ignore: Vec<String>,
    pub max_chars: Option<usize>,
    pub json: bool,
}

pub fn run(args: Args) {
    let config = merged_config(
        load_config_or_exit(args.input.config.as_deref()),
        args.ignore,
        args.max_chars,
    );
    let (store, _) = load_store_or_exit(
        args.input.jobs.as_deref(),
        args.input.workspace.as_deref(),
    );

    let ids: Vec<String> = if args.id == "all" {
        store.iter().map(|(id, _)| id.to_string()).collect()
    } else {
        if !store.contains(&args.id) {
            eprintln!("error: job not found: {}", args.id);
            std::process::exit(1);
        }
        vec![args.id.clone()]
    };

    let built = build_or_exit(config, &store, args.json);
    let max_chars = built.config().max_label_chars;

    if args.json {
        let mut jobs = ids.iter().map(|id| {
            json!({
                "jobId": id,
                "neighbors": built.neighbors(id),
            })
        });
        if args.id == "all" {
            print_json(&json!({ "jobs": jobs.collect::<Vec<_>>() }));
        } else if let Some(job) = jobs.next() {
            print_json(&job);
        }
        return;
    }

    for id in &ids {
        println!("gridnav neighbors {id}");
        let rows = built.neighbors(id);
        if rows.is_empty() {
            println!("  (no varying keys)");
        }
        for row in rows {
            print_row(row, max_chars);
        }
    }
}

fn print_row(row: &KeyNeighbors, max_chars: Option<usize>) {
    let label = |text: String| ellipsis_label(&text, max_chars);
    println!(
        "  {}: {} <- [{}] -> {}",
        row.key,
        label(row.previous.label()),
        label(value_label(&row.value)),
        label(row.next.label()),
    );
    if let Some(found) = row.previous.found() {
        println!("    prev {}", found.id);
    }
    if let Some(found) = row.next.found() {
        println!("    next {}", found.id);
    }
}
