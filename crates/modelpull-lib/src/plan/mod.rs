mod planner;
mod types;

pub use planner::plan_downloads;
pub use types::{DownloadTask, PlanPolicy};
