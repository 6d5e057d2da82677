use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;

use reelbench::backend::RawPayload;
use reelbench::core::{BackendError, BackendTag, ErrorKind, NormalizationError};
use reelbench::query::{QueryDescriptor, QueryKind};
use reelbench::testutil::{ManualClock, MockBackend, Response};
use reelbench::timing::measure;

fn descriptor() -> QueryDescriptor {
    QueryDescriptor::new(QueryKind::SearchMovies, 20).unwrap()
}

#[tokio::test]
async fn test_success_is_timed_and_normalized() {
    let clock = Arc::new(ManualClock::new());
    let backend = MockBackend::new(BackendTag::Sql, clock.clone())
        .with_latencies(vec![Duration::from_millis(7)]);

    let m = measure(&backend, &descriptor(), clock.as_ref()).await.unwrap();

    assert!(m.sample.succeeded);
    assert_eq!(m.sample.backend, BackendTag::Sql);
    assert_eq!(m.sample.duration_ms, 7.0);
    assert_eq!(m.sample.error_kind, None);
    assert_eq!(m.rows.unwrap().len(), 3);
}

#[rstest]
#[case(BackendError::Connection("refused".into()), ErrorKind::Connection)]
#[case(BackendError::Query("syntax error".into()), ErrorKind::Query)]
#[case(BackendError::Timeout(Duration::from_secs(5)), ErrorKind::Timeout)]
#[tokio::test]
async fn test_adapter_errors_become_failed_samples(
    #[case] err: BackendError,
    #[case] kind: ErrorKind,
) {
    let clock = Arc::new(ManualClock::new());
    let backend =
        MockBackend::new(BackendTag::Nosql, clock.clone()).with_response(Response::Fail(err));

    let m = measure(&backend, &descriptor(), clock.as_ref()).await.unwrap();

    assert!(!m.sample.succeeded);
    assert_eq!(m.sample.error_kind, Some(kind));
    assert_eq!(m.rows, None);
}

#[tokio::test]
async fn test_normalization_failure_is_returned() {
    let clock = Arc::new(ManualClock::new());
    let backend = MockBackend::new(BackendTag::Nosql, clock.clone())
        .with_response(Response::Payload(RawPayload::Rows(vec![])));

    let result = measure(&backend, &descriptor(), clock.as_ref()).await;
    assert_eq!(
        result,
        Err(NormalizationError::PayloadMismatch {
            backend: BackendTag::Nosql,
            found: "rows",
        })
    );
}
