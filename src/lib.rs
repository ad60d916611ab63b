//! Open Medic dashboard core: fetch the medication-reimbursement extract,
//! normalize it and reduce it into the summary tables the dashboard charts.

pub mod config;
pub mod error;
pub mod fetch;
pub mod labels;
pub mod model;
pub mod pipeline;

pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use fetch::DatasetCache;
pub use labels::StaticLabels;
pub use model::{AgeBracket, GenderLabel, NormalizedRecord, RawRecord};
pub use pipeline::{summarize, AggregationOptions, DashboardSummaries};
