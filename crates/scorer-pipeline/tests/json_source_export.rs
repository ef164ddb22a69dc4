//! 디렉토리 소스 → 실행 → 결과 파일 내보내기 통합 테스트.

mod common;

use futures::StreamExt;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use common::{codes, FakeAnalyzer};
use scorer_core::{PipelineConfig, ScorerError, StockCode};
use scorer_pipeline::{
    load_processed_codes, JsonDirectorySource, NewsSource, Orchestrator, ResultExporter,
};

fn write_fixture(dir: &Path) {
    fs::write(
        dir.join("000001.json"),
        r#"[
            {"_id": "p1", "stock_code": "000001", "title": "平安银行年报", "content": "净利润同比增长", "source": "guba", "pub_time": "2024-03-15 18:00:00"},
            {"_id": "p2", "stock_code": "000001", "title": "", "content": "   ", "pub_time": "2024-03-16 09:00:00"},
            {"_id": "p3", "stock_code": "000001", "title": "分红方案", "content": "每10股派2.8元", "pub_time": "2024-03-17 09:00:00"}
        ]"#,
    )
    .unwrap();
    fs::write(dir.join("600000.json"), "[{\"_id\": \"x1\", \"content\": ").unwrap();
    fs::write(dir.join("300750.json"), "").unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();
    fs::write(dir.join("backup.json"), "[]").unwrap();
}

#[tokio::test]
async fn test_list_codes_only_numeric_json() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let source = JsonDirectorySource::new(dir.path());
    let listed = source.list_codes().await.unwrap();

    assert_eq!(listed, codes(&["000001", "300750", "600000"]));
}

#[tokio::test]
async fn test_fetch_edge_cases() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let source = JsonDirectorySource::new(dir.path()).with_stock_names(HashMap::from([(
        "000001".to_string(),
        "平安银行".to_string(),
    )]));

    let items: Vec<_> = source
        .fetch(&StockCode::from("000001"))
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(items.len(), 3);
    let first = items[0].as_ref().unwrap();
    assert_eq!(first.stock_name.as_deref(), Some("平安银行"));
    assert_eq!(first.pub_time.as_deref(), Some("2024-03-15 18:00:00"));

    // 파일 없음, 빈 파일 → 빈 스트림
    for code in ["688981", "300750"] {
        let count = source
            .fetch(&StockCode::from(code))
            .await
            .unwrap()
            .count()
            .await;
        assert_eq!(count, 0, "{}", code);
    }

    // 잘못된 JSON → 해당 종목 에러
    let err = source
        .fetch(&StockCode::from("600000"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ScorerError::Source { ref stock_code, .. } if stock_code.as_str() == "600000"));
}

#[tokio::test]
async fn test_run_and_export() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_fixture(data.path());

    let source = Arc::new(JsonDirectorySource::new(data.path()));
    let analyzer = Arc::new(FakeAnalyzer::new());
    let pipeline = PipelineConfig::new(codes(&["000001", "600000"]), 20);

    let report = Orchestrator::new(analyzer, source, pipeline)
        .run()
        .await
        .unwrap();

    let stock = report.get("000001").unwrap().report.as_ref().unwrap();
    assert_eq!(stock.entries.len(), 3);
    assert_eq!(stock.summary.succeeded, 2);
    assert_eq!(stock.summary.skipped, 1);
    assert!(report.get("600000").unwrap().report.is_err());

    let results = out.path().join("results").join("scored.csv");
    let failed = out.path().join("failed.json");
    let exporter = ResultExporter::new(&results, &failed);

    let summary = exporter.export(&report).unwrap();
    assert_eq!(summary.rows_appended, 2);
    assert_eq!(summary.failed_tasks, 2);

    // 두 번째 내보내기는 헤더 없이 이어서 기록
    exporter.export(&report).unwrap();
    let csv = fs::read_to_string(&results).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 1 + 4);
    assert!(lines[0].starts_with("id,stock_code,stock_name,pub_time,seq,Fundamental_Positive"));
    assert_eq!(csv.matches("scored_at").count(), 1);
    assert!(lines[1].starts_with("p1,000001,"));

    let processed = load_processed_codes(&results).unwrap();
    assert_eq!(processed.len(), 1);
    assert!(processed.contains(&StockCode::from("000001")));

    let failed_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&failed).unwrap()).unwrap();
    assert_eq!(failed_json[0]["id"], "p2");
    assert_eq!(failed_json[0]["error_details"]["status"], "skipped");
    assert_eq!(failed_json[1]["stock_code"], "600000");
    assert_eq!(failed_json[1]["error_details"]["status"], "error");
}
