mod models;
mod report_key;

pub use models::*;
pub use report_key::{ReportKey, normalize_username};
