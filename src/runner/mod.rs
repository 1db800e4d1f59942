//! Run orchestration and reporting

mod coordinator;
mod summary;

pub use coordinator::Runner;
pub use summary::{print_summary, RunSummary, SourceReport};
