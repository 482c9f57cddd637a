use super::*;

#[tokio::test]
async fn noop_scanner_always_admits() {
    let verdict = NoOpScanner.scan(b"print('hi')", false).await;
    assert_eq!(verdict, ScanVerdict::Admit);
    let verdict_quick = NoOpScanner.scan(b"", true).await;
    assert_eq!(verdict_quick, ScanVerdict::Admit);
}
