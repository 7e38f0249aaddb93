//! Run summary reporting
//!
//! - `text` - colored console summary
//! - `json` - machine-readable summary

mod json;
mod text;

pub use json::{JsonDiagnostic, JsonSummary, print_summary_json};
pub use text::{SummaryFormatter, print_summary};
