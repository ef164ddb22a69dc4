//! 도메인 모델.

pub mod analyzer;
pub mod news;
pub mod outcome;
pub mod report;
pub mod scores;

pub use analyzer::Analyzer;
pub use news::NewsItem;
pub use outcome::{AnalysisOutcome, FailureKind, SkipReason};
pub use report::{OutcomeSummary, ReportEntry, ReportStatus, StockReport};
pub use scores::FactorScores;
