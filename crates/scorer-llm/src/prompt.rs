//! 뉴스 항목 → 완성 요청 변환.

use scorer_core::{FactorScores, NewsItem};

use crate::{ChatMessage, CompletionRequest};

/// 시스템 프롬프트. 모델 응답이 [`FactorScores`] 형식의 JSON 객체가 되도록 지시합니다.
const SYSTEM_PROMPT: &str = "你是一名顶尖的中国A股市场金融分析师，擅长从文本信息中挖掘对股价有影响的信号。\n\
任务：针对给定的一条股票新闻，独立评估以下5个因子，每个取值范围0-1，保留1位小数。\n\
1. Fundamental_Positive：新闻对公司营收、利润、成本、技术壁垒、资产质量等基本面的正向影响强度（1为极端利好，0为极端利空）。\n\
2. Impact_Cycle_Length：事件影响的持续时间（1为长期，0为短期）。\n\
3. Timeliness_Weight：事件的即时性（1为突发重大即时事件，0为过时或已被市场消化的信息）。\n\
4. Information_Certainty：信息的明确性与可信度（1为官方公告或经审计数据，0为传闻或猜测）。\n\
5. Information_Relevance：新闻与目标公司自身的关联程度（1为聚焦公司核心业务，0为完全无关）。\n\
只输出一个JSON对象，键为因子名，值为浮点数，不要输出任何其他内容。";

/// 완성 요청 생성기.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    temperature: f32,
    json_mode: bool,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            json_mode: true,
        }
    }
}

impl PromptBuilder {
    /// 새 생성기.
    pub fn new(temperature: f32) -> Self {
        Self {
            temperature,
            ..Default::default()
        }
    }

    /// JSON 응답 모드 설정.
    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    /// 뉴스 항목으로부터 요청 생성.
    pub fn build(&self, item: &NewsItem) -> CompletionRequest {
        let user = format!(
            "股票名称: {name}\n股票代码: {code}\n{title}\n来源：{source}\n发布时间：{time}\n{content}\n\n输出键: {keys}",
            name = item.stock_name.as_deref().unwrap_or("N/A"),
            code = item.stock_code,
            title = item.title,
            source = item.source.as_deref().unwrap_or("unknown"),
            time = item.pub_time.as_deref().unwrap_or("unknown"),
            content = item.content,
            keys = FactorScores::KEYS.join(", "),
        );

        CompletionRequest {
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)],
            temperature: self.temperature,
            json_mode: self.json_mode,
        }
    }
}
