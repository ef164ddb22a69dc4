//! 결과 내보내기와 재개 지원.
//!
//! - 성공 항목은 결과 CSV에 추가합니다 (파일이 새로 생길 때만 헤더 기록).
//! - 실패/건너뜀 항목과 종목 단위 에러는 실패 작업 JSON에 기록합니다.
//! - 재시작 시 결과 CSV에 이미 있는 종목은 건너뛸 수 있습니다.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use scorer_core::{FactorScores, OutputConfig, ScorerError, ScorerResult, StockCode};

use crate::orchestrator::RunReport;

/// 결과 CSV 앞쪽 컬럼 (이후 팩터 점수 5개, `scored_at`).
const LEADING_COLUMNS: [&str; 5] = ["id", "stock_code", "stock_name", "pub_time", "seq"];

fn csv_err(err: csv::Error) -> ScorerError {
    ScorerError::Export(err.to_string())
}

/// 결과 CSV 헤더.
pub fn result_header() -> Vec<&'static str> {
    LEADING_COLUMNS
        .iter()
        .chain(FactorScores::KEYS.iter())
        .chain(std::iter::once(&"scored_at"))
        .copied()
        .collect()
}

/// 실패 작업 기록 한 건.
#[derive(Debug, Serialize)]
struct FailedTask<'a> {
    stock_code: &'a StockCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seq: Option<u64>,
    error_details: Value,
}

/// 내보내기 결과 건수.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows_appended: usize,
    pub failed_tasks: usize,
}

/// 결과 파일 내보내기.
#[derive(Debug, Clone)]
pub struct ResultExporter {
    results_path: PathBuf,
    failed_path: PathBuf,
}

impl ResultExporter {
    pub fn new(results_path: impl Into<PathBuf>, failed_path: impl Into<PathBuf>) -> Self {
        Self {
            results_path: results_path.into(),
            failed_path: failed_path.into(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.results_path(), config.failed_path())
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    pub fn failed_path(&self) -> &Path {
        &self.failed_path
    }

    /// 실행 결과를 두 파일로 내보냅니다.
    pub fn export(&self, report: &RunReport) -> ScorerResult<ExportSummary> {
        let rows_appended = self.append_results(report)?;
        let failed_tasks = self.write_failed(report)?;
        Ok(ExportSummary {
            rows_appended,
            failed_tasks,
        })
    }

    /// 성공 항목을 결과 CSV에 추가하고 추가한 행 수를 반환합니다.
    pub fn append_results(&self, report: &RunReport) -> ScorerResult<usize> {
        let rows: Vec<Vec<String>> = report
            .reports()
            .flat_map(|stock| {
                let scored_at = stock.finalized_at.to_rfc3339();
                stock.entries.iter().filter_map(move |entry| {
                    let scores = entry.outcome.scores()?;
                    let mut row = vec![
                        entry.item_id.clone(),
                        stock.stock_code.to_string(),
                        stock.stock_name.clone().unwrap_or_default(),
                        entry.pub_time.clone().unwrap_or_default(),
                        entry.seq.to_string(),
                    ];
                    row.extend(scores.values().iter().map(|v| format!("{:.4}", v)));
                    row.push(scored_at.clone());
                    Some(row)
                })
            })
            .collect();

        if rows.is_empty() {
            return Ok(0);
        }

        ensure_parent(&self.results_path)?;
        let is_new = fs::metadata(&self.results_path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.results_path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            wtr.write_record(result_header()).map_err(csv_err)?;
        }
        for row in &rows {
            wtr.write_record(row).map_err(csv_err)?;
        }
        wtr.flush()?;

        info!(
            rows = rows.len(),
            path = %self.results_path.display(),
            "결과 CSV 추가"
        );
        Ok(rows.len())
    }

    /// 실패/건너뜀 항목과 종목 에러를 JSON으로 기록합니다. 기록할 내용이 없으면 파일을 건드리지 않습니다.
    pub fn write_failed(&self, report: &RunReport) -> ScorerResult<usize> {
        let mut tasks = Vec::new();

        for result in &report.results {
            match &result.report {
                Ok(stock) => {
                    if let Some(error) = &stock.source_error {
                        tasks.push(FailedTask {
                            stock_code: &stock.stock_code,
                            id: None,
                            seq: None,
                            error_details: json!({"status": "source_failed", "error": error}),
                        });
                    }
                    for entry in stock.unsuccessful() {
                        tasks.push(FailedTask {
                            stock_code: &stock.stock_code,
                            id: Some(entry.item_id.as_str()),
                            seq: Some(entry.seq),
                            error_details: serde_json::to_value(&entry.outcome)?,
                        });
                    }
                }
                Err(e) => tasks.push(FailedTask {
                    stock_code: &result.stock_code,
                    id: None,
                    seq: None,
                    error_details: json!({"status": "error", "error": e.to_string()}),
                }),
            }
        }

        if tasks.is_empty() {
            return Ok(0);
        }

        ensure_parent(&self.failed_path)?;
        let json = serde_json::to_string_pretty(&tasks)?;
        fs::write(&self.failed_path, json)?;

        warn!(
            count = tasks.len(),
            path = %self.failed_path.display(),
            "처리 실패 항목 기록"
        );
        Ok(tasks.len())
    }
}

fn ensure_parent(path: &Path) -> ScorerResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// 결과 CSV에 이미 기록된 종목 코드.
///
/// 파일이 없으면 빈 집합을 반환합니다. 코드는 문자열 그대로 읽으므로 앞자리 0이 유지됩니다.
pub fn load_processed_codes(path: &Path) -> ScorerResult<HashSet<StockCode>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let mut rdr = csv::Reader::from_path(path).map_err(csv_err)?;
    let column = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .position(|h| h == "stock_code")
        .ok_or_else(|| {
            ScorerError::Export(format!("{}에 stock_code 컬럼이 없습니다", path.display()))
        })?;

    let mut codes = HashSet::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        if let Some(code) = record.get(column).filter(|c| !c.is_empty()) {
            codes.insert(StockCode::from(code));
        }
    }

    info!(count = codes.len(), path = %path.display(), "처리된 종목 로드");
    Ok(codes)
}
