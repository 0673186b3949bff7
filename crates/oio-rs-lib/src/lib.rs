pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::Config;
pub use config::PrecedenceSettings;

pub mod archive;
pub mod overlap_index;
pub use overlap_index::OverlapIndex;

pub mod precedence;
pub use precedence::PrecedenceGraph;
pub use precedence::FinishedGraph;

pub mod planner;
pub use planner::DiskPlan;

pub mod report;

pub mod analysis;
pub use analysis::Analysis;
pub use analysis::AnalysisStatus;
