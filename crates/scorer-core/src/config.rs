//! 설정 관리.
//!
//! 기본값 → TOML 파일 → 환경 변수(`SCORER__` 접두사) 순으로 설정을 덮어씁니다.
//!
//! ```toml
//! [api]
//! model = "qwen-turbo"
//!
//! [pipeline]
//! stock_codes = ["000001", "600000"]
//! process_num = 20
//! concurrency = 5
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{ScorerError, ScorerResult, StockCode};

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/scorer.toml";

/// 실행 설정 스냅샷.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// 원격 API 설정
    pub api: ApiConfig,
    /// 파이프라인 설정
    pub pipeline: PipelineConfig,
    /// 요청 한도 설정
    pub rate_limit: RateLimitConfig,
    /// 재시도 정책
    pub retry: RetryConfig,
    /// 뉴스 소스 설정
    pub source: SourceConfig,
    /// 결과 출력 설정
    pub output: OutputConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 원격 완성(completion) API 설정.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// OpenAI 호환 엔드포인트 기본 URL
    pub base_url: String,
    /// 모델 이름
    pub model: String,
    /// Bearer 토큰. 로그에 남기지 않습니다.
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    /// 시도당 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 샘플링 온도
    pub temperature: f32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            model: "qwen-turbo".to_string(),
            api_key: None,
            request_timeout_secs: 60,
            temperature: 0.1,
        }
    }
}

impl ApiConfig {
    /// 시도당 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 비어 있지 않은 자격증명 반환.
    pub fn credential(&self) -> ScorerResult<&SecretString> {
        match &self.api_key {
            Some(key) if !key.expose_secret().trim().is_empty() => Ok(key),
            _ => Err(ScorerError::Config(
                "API 키가 설정되지 않았습니다 (API_KEY 또는 SCORER__API__API_KEY)".to_string(),
            )),
        }
    }
}

/// PROCESS_NUM 적용 범위.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetScope {
    /// 전체 종목 합산 한도
    #[default]
    Global,
    /// 종목별 한도
    PerStock,
}

/// 파이프라인 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 대상 종목 코드 (설정 순서대로 처리, 중복은 무시)
    #[serde(deserialize_with = "deserialize_codes")]
    pub stock_codes: Vec<StockCode>,
    /// 최대 처리 항목 수 (0이면 아무것도 처리하지 않음)
    pub process_num: i64,
    /// PROCESS_NUM 적용 범위
    pub budget_scope: BudgetScope,
    /// 동시 요청 수
    pub concurrency: usize,
    /// 이미 처리된 종목 건너뛰기
    pub resume: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stock_codes: vec![StockCode::from("000001")],
            process_num: 20,
            budget_scope: BudgetScope::Global,
            concurrency: 5,
            resume: true,
        }
    }
}

impl PipelineConfig {
    /// 새 파이프라인 설정 생성.
    pub fn new(stock_codes: Vec<StockCode>, process_num: i64) -> Self {
        Self {
            stock_codes,
            process_num,
            ..Default::default()
        }
    }

    /// 동시 요청 수 설정.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// PROCESS_NUM 적용 범위 설정.
    pub fn with_budget_scope(mut self, scope: BudgetScope) -> Self {
        self.budget_scope = scope;
        self
    }

    /// 순서를 유지하며 중복을 제거한 종목 코드 목록.
    pub fn unique_codes(&self) -> Vec<StockCode> {
        let mut seen = HashSet::new();
        self.stock_codes
            .iter()
            .filter(|code| seen.insert(code.as_str()))
            .cloned()
            .collect()
    }

    /// 검증된 처리 한도.
    pub fn process_limit(&self) -> ScorerResult<usize> {
        usize::try_from(self.process_num).map_err(|_| {
            ScorerError::Config(format!(
                "PROCESS_NUM은 0 이상이어야 합니다: {}",
                self.process_num
            ))
        })
    }

    /// 파이프라인 설정 검증.
    pub fn validate(&self) -> ScorerResult<()> {
        self.process_limit()?;
        if self.concurrency == 0 {
            return Err(ScorerError::Config(
                "concurrency는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.stock_codes.is_empty() {
            return Err(ScorerError::Config("대상 종목 코드가 없습니다".to_string()));
        }
        Ok(())
    }
}

/// 요청 한도 (Token Bucket) 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// 분당 최대 요청 수
    pub requests_per_minute: u32,
    /// 버스트 허용량
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    /// 새 설정 생성.
    pub fn new(requests_per_minute: u32, burst_size: u32) -> Self {
        Self {
            requests_per_minute,
            burst_size,
        }
    }
}

/// 재시도 정책 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 첫 재시도 대기 시간 (밀리초)
    pub base_delay_ms: u64,
    /// 재시도 대기 상한 (밀리초)
    pub max_delay_ms: u64,
    /// 지터 적용 여부
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 15_000,
            max_delay_ms: 120_000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// 뉴스 소스 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// `{종목코드}.json` 파일이 있는 디렉토리
    pub directory: PathBuf,
    /// 종목 코드 → 종목명
    pub stock_names: HashMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./guba_df"),
            stock_names: HashMap::new(),
        }
    }
}

/// 결과 출력 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub results_file: String,
    pub failed_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./output"),
            results_file: "scored_results.csv".to_string(),
            failed_file: "scored_failed_tasks.json".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn results_path(&self) -> PathBuf {
        self.directory.join(&self.results_file)
    }

    pub fn failed_path(&self) -> PathBuf {
        self.directory.join(&self.failed_file)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl RunConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// `path`가 `None`이면 [`DEFAULT_CONFIG_PATH`]를 선택적으로 읽습니다.
    pub fn load(path: Option<&Path>) -> ScorerResult<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("SCORER").separator("__"));

        let mut config: RunConfig = builder.build()?.try_deserialize()?;

        if config.api.api_key.is_none() {
            config.api.api_key = std::env::var("API_KEY").ok().map(secret_from);
        }

        Ok(config)
    }

    /// 작업 분배 전에 필요한 모든 설정을 검증합니다.
    pub fn validate(&self) -> ScorerResult<()> {
        self.api.credential()?;
        self.pipeline.validate()?;
        if self.rate_limit.requests_per_minute == 0 {
            return Err(ScorerError::Config(
                "requests_per_minute는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ScorerError::Config(
                "max_attempts는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

fn secret_from(value: String) -> SecretString {
    SecretString::new(value.into_boxed_str())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(secret_from))
}

/// 쉼표로 구분된 문자열 또는 문자열 배열.
#[derive(Deserialize)]
#[serde(untagged)]
enum CodeList {
    Joined(String),
    List(Vec<String>),
}

fn deserialize_codes<'de, D>(deserializer: D) -> Result<Vec<StockCode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match CodeList::deserialize(deserializer)? {
        CodeList::Joined(s) => StockCode::parse_list(&s),
        CodeList::List(list) => list.into_iter().map(StockCode::from).collect(),
    })
}
