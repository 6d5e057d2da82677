use std::sync::{Arc, Mutex};
use std::time::Duration;

use rstest::rstest;

use reelbench::bench::{BenchmarkRunner, LatencyOutcome};
use reelbench::conf::ExecutionOrder;
use reelbench::core::{BackendError, BackendTag, ErrorKind, ReelError, ValidationError};
use reelbench::query::{QueryDescriptor, QueryKind};
use reelbench::testutil::{ManualClock, MockBackend, Response, mock_backends};

fn trending() -> QueryDescriptor {
    QueryDescriptor::new(QueryKind::TrendingMovies, 10)
        .unwrap()
        .with_window_days(7)
        .unwrap()
}

struct Fixture {
    sql: Arc<MockBackend>,
    nosql: Arc<MockBackend>,
    runner: BenchmarkRunner,
}

fn fixture(sql: MockBackend, nosql: MockBackend, clock: Arc<ManualClock>, warmup: u32) -> Fixture {
    let sql = Arc::new(sql);
    let nosql = Arc::new(nosql);
    let runner = BenchmarkRunner::new(
        mock_backends(sql.clone(), nosql.clone()),
        clock,
        ExecutionOrder::SqlFirst,
        warmup,
        1000,
    );
    Fixture { sql, nosql, runner }
}

#[rstest]
#[case(0)]
#[case(-1)]
#[case(1001)]
#[tokio::test]
async fn test_invalid_iterations_never_reach_backends(#[case] iterations: i64) {
    let clock = Arc::new(ManualClock::new());
    let f = fixture(
        MockBackend::new(BackendTag::Sql, clock.clone()),
        MockBackend::new(BackendTag::Nosql, clock.clone()),
        clock,
        0,
    );

    let result = f.runner.run(&trending(), iterations).await;
    assert_eq!(
        result,
        Err(ReelError::Validation(ValidationError::Iterations {
            got: iterations,
            max: 1000
        }))
    );
    assert_eq!(f.sql.calls(), 0);
    assert_eq!(f.nosql.calls(), 0);
}

#[tokio::test]
async fn test_document_timeouts_reported_as_all_failed() {
    let clock = Arc::new(ManualClock::new());
    let f = fixture(
        MockBackend::new(BackendTag::Sql, clock.clone()).with_latencies(vec![
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(30),
        ]),
        MockBackend::new(BackendTag::Nosql, clock.clone())
            .with_response(Response::Fail(BackendError::Timeout(Duration::from_secs(5))))
            .with_latencies(vec![Duration::from_secs(5)]),
        clock,
        0,
    );

    let report = f.runner.run(&trending(), 5).await.unwrap();

    assert_eq!(report.iterations, 5);
    assert_eq!(report.sql.successes, 5);
    let sql = report.sql.latency.distribution().unwrap();
    assert_eq!(sql.min, 10.0);
    assert_eq!(sql.max, 30.0);
    assert_eq!(sql.avg, 18.0);
    assert_eq!(sql.p50, 20.0);

    assert_eq!(report.nosql.successes, 0);
    assert_eq!(report.nosql.failures, 5);
    assert_eq!(report.nosql.failure_kinds[&ErrorKind::Timeout], 5);
    assert_eq!(report.nosql.latency, LatencyOutcome::AllIterationsFailed);
    assert_eq!(report.comparison.sql_faster_on_avg, None);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["nosql"]["status"], "all_iterations_failed");
    assert_eq!(json["sql"]["status"], "measured");
    assert_eq!(json["order"], "sql_first");
    assert_eq!(json["query_type"], "trending_movies");
}

#[tokio::test]
async fn test_first_backend_finishes_before_second_starts() {
    let clock = Arc::new(ManualClock::new());
    let journal = Arc::new(Mutex::new(Vec::new()));
    let f = fixture(
        MockBackend::new(BackendTag::Sql, clock.clone()).with_journal(journal.clone()),
        MockBackend::new(BackendTag::Nosql, clock.clone()).with_journal(journal.clone()),
        clock,
        0,
    );

    f.runner.run(&trending(), 3).await.unwrap();

    let calls = journal.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            BackendTag::Sql,
            BackendTag::Sql,
            BackendTag::Sql,
            BackendTag::Nosql,
            BackendTag::Nosql,
            BackendTag::Nosql,
        ]
    );
}

#[tokio::test]
async fn test_warmup_is_executed_and_discarded() {
    let clock = Arc::new(ManualClock::new());
    let f = fixture(
        MockBackend::new(BackendTag::Sql, clock.clone())
            .with_latencies(vec![Duration::from_millis(100), Duration::from_millis(5)]),
        MockBackend::new(BackendTag::Nosql, clock.clone()),
        clock,
        1,
    );

    let report = f.runner.run(&trending(), 1).await.unwrap();

    assert_eq!(f.sql.calls(), 2);
    assert_eq!(f.nosql.calls(), 2);
    assert_eq!(report.warmup_iterations, 1);
    assert_eq!(report.sql.successes, 1);
    assert_eq!(report.sql.latency.distribution().unwrap().max, 5.0);
}

#[tokio::test]
async fn test_both_measured_comparison() {
    let clock = Arc::new(ManualClock::new());
    let f = fixture(
        MockBackend::new(BackendTag::Sql, clock.clone())
            .with_latencies(vec![Duration::from_millis(8)]),
        MockBackend::new(BackendTag::Nosql, clock.clone()).with_latencies(vec![
            Duration::from_millis(4),
            Duration::from_millis(16),
        ]),
        clock,
        0,
    );

    let report = f.runner.run(&trending(), 4).await.unwrap();

    assert_eq!(report.comparison.sql_faster_on_avg, Some(true));
    assert_eq!(report.comparison.avg_difference_ms, Some(2.0));
    assert_eq!(report.comparison.sql_more_consistent, Some(true));
}
