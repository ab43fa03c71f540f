use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gridnav",
    about = "gridnav: nearest-neighbor navigation over content-addressed job grids",
    version
)]
pub struct Cli {
    /// Path to a JSONL job file
    #[arg(long, global = true, conflicts_with = "workspace")]
    pub jobs: Option<String>,

    /// Path to a signac-style workspace directory
    #[arg(long, global = true)]
    pub workspace: Option<String>,

    /// Path to a TOML config file (default: ./gridnav.toml when present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Debug logging on stderr (GRIDNAV_LOG / RUST_LOG take precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the job id of a parameter map
    CalcId {
        /// Parameter map as a JSON object
        parameters: String,
    },

    /// Print the varying keys and their sorted domains
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project ignored keys away and print the shadow mapping
    Shadow {
        /// Key to ignore (repeatable; merged with `ignored_keys` from config)
        #[arg(long = "ignore")]
        ignore: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the nearest existing neighbors of a job along every key
    Neighbors {
        /// Job ID (or `all` for every job)
        id: String,

        /// Key to ignore (repeatable; merged with `ignored_keys` from config)
        #[arg(long = "ignore")]
        ignore: Vec<String>,

        /// Truncate displayed values to this many characters
        #[arg(long)]
        max_chars: Option<usize>,

        /// Output as JSON (values are never truncated)
        #[arg(long)]
        json: bool,
    },
}
