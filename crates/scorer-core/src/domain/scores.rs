//! 뉴스 분석 결과 점수.

use serde::{Deserialize, Serialize};

/// 뉴스 한 건에 대한 5개 AI 팩터 점수.
///
/// 모든 값은 `[0, 1]` 범위이며, 직렬화 키는 모델 응답 형식을 그대로 따릅니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    #[serde(rename = "Fundamental_Positive")]
    pub fundamental_positive: f64,
    #[serde(rename = "Impact_Cycle_Length")]
    pub impact_cycle_length: f64,
    #[serde(rename = "Timeliness_Weight")]
    pub timeliness_weight: f64,
    #[serde(rename = "Information_Certainty")]
    pub information_certainty: f64,
    #[serde(rename = "Information_Relevance")]
    pub information_relevance: f64,
}

impl FactorScores {
    /// 응답 JSON 키 목록 (CSV 헤더 순서와 동일).
    pub const KEYS: [&'static str; 5] = [
        "Fundamental_Positive",
        "Impact_Cycle_Length",
        "Timeliness_Weight",
        "Information_Certainty",
        "Information_Relevance",
    ];

    /// 키 순서대로 값 반환.
    pub fn values(&self) -> [f64; 5] {
        [
            self.fundamental_positive,
            self.impact_cycle_length,
            self.timeliness_weight,
            self.information_certainty,
            self.information_relevance,
        ]
    }

    /// 모든 값이 `[0, 1]` 범위인지 검증합니다.
    pub fn validate(&self) -> Result<(), String> {
        for (key, value) in Self::KEYS.iter().zip(self.values()) {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(format!("{} 값이 범위를 벗어남: {}", key, value));
            }
        }
        Ok(())
    }
}
