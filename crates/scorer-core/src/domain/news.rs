//! 뉴스 항목.

use serde::{Deserialize, Serialize};

use crate::StockCode;

/// 파이프라인의 작업 단위인 뉴스 한 건.
///
/// 뉴스 소스가 생성하며, 생성된 이후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// 소속 종목 코드
    pub stock_code: StockCode,
    /// 항목 고유 ID (중복 제거용)
    pub id: String,
    /// 제목
    #[serde(default)]
    pub title: String,
    /// 본문
    #[serde(default)]
    pub content: String,
    /// 출처
    #[serde(default)]
    pub source: Option<String>,
    /// 게시 시각 (원본 문자열 그대로)
    #[serde(default)]
    pub pub_time: Option<String>,
    /// 종목명
    #[serde(default)]
    pub stock_name: Option<String>,
}

impl NewsItem {
    /// 새 뉴스 항목 생성.
    pub fn new(stock_code: StockCode, id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            stock_code,
            id: id.into(),
            title: String::new(),
            content: content.into(),
            source: None,
            pub_time: None,
            stock_name: None,
        }
    }

    /// 제목 설정.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// 게시 시각 설정.
    pub fn with_pub_time(mut self, pub_time: impl Into<String>) -> Self {
        self.pub_time = Some(pub_time.into());
        self
    }

    /// 종목명 설정.
    pub fn with_stock_name(mut self, stock_name: impl Into<String>) -> Self {
        self.stock_name = Some(stock_name.into());
        self
    }

    /// 분석 대상 텍스트 (제목 + 본문).
    pub fn analysis_text(&self) -> String {
        format!("{} {}", self.title, self.content).trim().to_string()
    }

    /// 분석할 내용이 없는지 확인.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }
}
