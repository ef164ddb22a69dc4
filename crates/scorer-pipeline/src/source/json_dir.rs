//! `{종목코드}.json` 파일 디렉토리 뉴스 소스.
//!
//! 파일 형식은 레코드 배열입니다:
//!
//! ```json
//! [{"_id": "...", "stock_code": "000001", "title": "...", "content": "...",
//!   "source": "...", "pub_time": "2024-05-01 09:30:00"}]
//! ```

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use scorer_core::{NewsItem, ScorerError, ScorerResult, SourceConfig, StockCode};

use super::{NewsSource, NewsStream};

/// 원본 레코드. ID와 게시 시각은 숫자로 저장된 경우도 있어 `Value`로 받습니다.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "_id", default)]
    id: Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    pub_time: Value,
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// 디렉토리 기반 뉴스 소스.
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    directory: PathBuf,
    stock_names: HashMap<String, String>,
}

impl JsonDirectorySource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            stock_names: HashMap::new(),
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.directory.clone()).with_stock_names(config.stock_names.clone())
    }

    /// 종목 코드 → 종목명 매핑 설정.
    pub fn with_stock_names(mut self, stock_names: HashMap<String, String>) -> Self {
        self.stock_names = stock_names;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn file_path(&self, stock_code: &StockCode) -> PathBuf {
        self.directory.join(format!("{}.json", stock_code))
    }

    /// 디렉토리에 있는 종목 코드 목록 (파일명이 숫자로만 된 `*.json`).
    pub async fn list_codes(&self) -> ScorerResult<Vec<StockCode>> {
        let mut entries = tokio::fs::read_dir(&self.directory).await?;
        let mut codes = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()) {
                codes.push(StockCode::from(stem));
            }
        }

        codes.sort();
        Ok(codes)
    }

    fn parse_records(&self, stock_code: &StockCode, raw: &str) -> ScorerResult<Vec<NewsItem>> {
        let records: Vec<RawRecord> = serde_json::from_str(raw)
            .map_err(|e| ScorerError::source(stock_code, format!("잘못된 JSON: {}", e)))?;
        let stock_name = self.stock_names.get(stock_code.as_str());

        let items = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let id = value_to_string(record.id)
                    .unwrap_or_else(|| format!("{}-{}", stock_code, index));
                NewsItem {
                    stock_code: stock_code.clone(),
                    id,
                    title: record.title.unwrap_or_default(),
                    content: record.content.unwrap_or_default(),
                    source: record.source,
                    pub_time: value_to_string(record.pub_time),
                    stock_name: stock_name.cloned(),
                }
            })
            .collect();

        Ok(items)
    }
}

#[async_trait]
impl NewsSource for JsonDirectorySource {
    fn name(&self) -> &str {
        "json_dir"
    }

    async fn fetch(&self, stock_code: &StockCode) -> ScorerResult<NewsStream> {
        let path = self.file_path(stock_code);

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(stock_code = %stock_code, path = %path.display(), "뉴스 파일 없음");
                return Ok(futures::stream::empty().boxed());
            }
            Err(e) => {
                return Err(ScorerError::source(
                    stock_code,
                    format!("{} 읽기 실패: {}", path.display(), e),
                ))
            }
        };

        if raw.trim().is_empty() {
            warn!(stock_code = %stock_code, path = %path.display(), "빈 뉴스 파일");
            return Ok(futures::stream::empty().boxed());
        }

        let items = self.parse_records(stock_code, &raw)?;
        info!(stock_code = %stock_code, count = items.len(), "뉴스 로드");
        debug!(path = %path.display(), "뉴스 파일 파싱 완료");

        Ok(futures::stream::iter(items.into_iter().map(Ok)).boxed())
    }
}
