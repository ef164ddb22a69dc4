//! 모델 응답 파싱.

use scorer_core::FactorScores;

use crate::{LlmError, LlmResult};

/// 응답 텍스트에서 [`FactorScores`]를 추출합니다.
///
/// 코드 펜스(```json ... ```)로 감싼 응답도 허용합니다. 키가 빠졌거나 값이
/// 범위를 벗어나면 `LlmError::Parse`를 반환하며, 이는 재시도하지 않습니다.
pub fn parse_scores(text: &str) -> LlmResult<FactorScores> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let scores: FactorScores = serde_json::from_str(body)?;
    scores.validate().map_err(LlmError::Parse)?;
    Ok(scores)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // 첫 줄의 언어 태그 제거
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
