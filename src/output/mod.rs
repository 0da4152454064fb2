//! Markdown and JSON renderings of plans

pub mod report;
pub mod summary;

pub use report::{render_markdown, write_plan_report};
pub use summary::{build_summary, write_summary, AnalyzerStatus, AnalyzerSummary, PlanSummary};
