//! 종목 코드 타입.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 종목 코드 (예: "000001", "600000").
///
/// 그룹화 키로만 사용되며 내부 형식은 해석하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockCode(String);

impl StockCode {
    /// 새 종목 코드 생성.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// 문자열 참조 반환.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 쉼표로 구분된 목록 파싱 (예: "000001,600000").
    ///
    /// 공백은 제거하고 빈 항목은 무시합니다.
    pub fn parse_list(s: &str) -> Vec<StockCode> {
        s.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(StockCode::new)
            .collect()
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StockCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StockCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for StockCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let codes = StockCode::parse_list(" 000001, 600000,,601166 ");
        assert_eq!(
            codes,
            vec![
                StockCode::from("000001"),
                StockCode::from("600000"),
                StockCode::from("601166"),
            ]
        );
    }

    #[test]
    fn test_serde_transparent() {
        let code = StockCode::from("600519");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"600519\"");
    }
}
