//! News scoring pipeline.
//!
//! 이 crate는 뉴스 스코어링 실행 전체를 구성합니다:
//! - 뉴스 소스 (`{종목코드}.json` 디렉토리, 메모리)
//! - PROCESS_NUM 예산과 동시성 제한이 있는 작업 분배기
//! - 분배 순번 기준으로 정렬하는 결과 집계기
//! - 실행 단계와 취소를 관리하는 오케스트레이터
//! - 결과 CSV/실패 JSON 내보내기

pub mod aggregator;
pub mod budget;
pub mod dispatcher;
pub mod export;
pub mod orchestrator;
pub mod source;
pub mod stats;

pub use aggregator::ResultAggregator;
pub use budget::DispatchBudget;
pub use dispatcher::{Completion, DispatchEvent, Dispatcher, SourceEnd};
pub use export::{load_processed_codes, ExportSummary, ResultExporter};
pub use orchestrator::{Orchestrator, RunPhase, RunReport, StockResult};
pub use source::{InMemorySource, JsonDirectorySource, NewsSource, NewsStream};
pub use stats::RunStats;
