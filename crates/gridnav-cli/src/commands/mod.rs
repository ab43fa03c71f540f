pub mod calc_id;
pub mod neighbors;
pub mod schema;
pub mod shadow;

/// Global job-source and config flags shared by every project command.
pub struct Input {
    pub jobs: Option<String>,
    pub workspace: Option<String>,
    pub config: Option<String>,
}
