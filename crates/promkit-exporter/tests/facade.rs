#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::thread;
use std::time::{Duration, Instant};

use promkit_core::{ErrorCode, LabelSet, TimeUnit};
use promkit_exporter::config::MetricsConfig;
use promkit_exporter::Metrics;

fn metrics() -> Metrics {
    Metrics::new(MetricsConfig::new("Svc", "test").with_listen("127.0.0.1", 0)).unwrap()
}

fn line_for(m: &Metrics, prefix: &str) -> Option<String> {
    m.exposition_text()
        .unwrap()
        .lines()
        .find(|l| l.starts_with(prefix))
        .map(str::to_string)
}

#[test]
fn counter_increments_are_exposed_with_service_tags() {
    let m = metrics();
    let labels = LabelSet::from([("path", "/a")]);
    for _ in 0..3 {
        m.counter("requests", &labels, 1.0).unwrap();
    }

    let text = m.exposition_text().unwrap();
    assert!(text.contains("requests{app=\"Svc\",env=\"test\",path=\"/a\"} 3"), "{text}");
    assert_eq!(text.matches("# TYPE requests counter").count(), 1);
    assert!(text.contains("# HELP requests Counter for: requests"));
}

#[test]
fn caller_labels_are_not_mutated() {
    let m = metrics();
    let labels = LabelSet::from([("path", "/a")]);
    m.counter("requests", &labels, 1.0).unwrap();
    assert_eq!(labels.names(), vec!["path"]);
}

#[test]
fn repeated_calls_reuse_one_instrument() {
    let m = metrics();
    m.counter("hits", &LabelSet::from([("k", "a")]), 1.0).unwrap();
    m.counter("hits", &LabelSet::from([("k", "b")]), 2.0).unwrap();

    let (counters, gauges, histograms) = m.registered();
    assert_eq!(counters, vec!["hits"]);
    assert!(gauges.is_empty() && histograms.is_empty());

    let hits = m.get_metrics("hits{").unwrap();
    assert_eq!(hits.lines().count(), 2, "{hits}");
}

#[test]
fn gauge_first_write_adds_then_sets() {
    let m = metrics();
    let room_a = LabelSet::from([("room", "a")]);
    let room_b = LabelSet::from([("room", "b")]);

    m.gauge("temp", &room_a, 5.0).unwrap();
    m.gauge("temp", &room_a, 3.0).unwrap();
    m.gauge("temp", &room_b, 7.0).unwrap();
    m.gauge("temp", &room_b, 7.0).unwrap();

    assert_eq!(
        line_for(&m, "temp{app=\"Svc\",env=\"test\",room=\"a\"}").unwrap(),
        "temp{app=\"Svc\",env=\"test\",room=\"a\"} 3"
    );
    assert_eq!(
        line_for(&m, "temp{app=\"Svc\",env=\"test\",room=\"b\"}").unwrap(),
        "temp{app=\"Svc\",env=\"test\",room=\"b\"} 7"
    );
}

#[test]
fn histogram_uses_creation_buckets() {
    let m = metrics();
    let labels = LabelSet::from([("op", "read")]);
    m.histogram("lat", &labels, 2.0, &[1.0, 2.0, 5.0]).unwrap();
    // Later buckets are ignored.
    m.histogram("lat", &labels, 4.0, &[100.0]).unwrap();

    let series = "app=\"Svc\",env=\"test\",op=\"read\"";
    let expect = |suffix: &str, value: &str| {
        let line = format!("lat_{suffix} {value}");
        let text = m.exposition_text().unwrap();
        assert!(text.lines().any(|l| l == line), "missing `{line}` in\n{text}");
    };
    expect(&format!("bucket{{{series},le=\"1\"}}"), "0");
    expect(&format!("bucket{{{series},le=\"2\"}}"), "1");
    expect(&format!("bucket{{{series},le=\"5\"}}"), "2");
    expect(&format!("bucket{{{series},le=\"+Inf\"}}"), "2");
    expect(&format!("sum{{{series}}}"), "6");
    expect(&format!("count{{{series}}}"), "2");
    assert!(m.get_metrics("le=\"100\"").unwrap().is_empty());
}

#[test]
fn histogram_without_buckets_gets_linear_defaults() {
    let m = metrics();
    m.histogram("size", &LabelSet::new(), 0.7, &[]).unwrap();

    let buckets = m.get_metrics("size_bucket").unwrap();
    // 20 linear bounds plus +Inf.
    assert_eq!(buckets.lines().count(), 21, "{buckets}");
    assert!(buckets.contains("le=\"0.5\"} 0"));
    assert!(buckets.contains("le=\"1\"} 1"));
    assert!(buckets.contains("le=\"10\"} 1"));
}

#[test]
fn schema_mismatch_reports_input_and_registered_names() {
    let m = metrics();
    m.counter("jobs", &LabelSet::from([("a", "1"), ("b", "2")]), 1.0)
        .unwrap();

    let err = m
        .counter("jobs", &LabelSet::from([("a", "1")]), 1.0)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LabelMismatch);

    let msg = err.to_string();
    assert!(msg.starts_with("metric: 'jobs', error: '"), "{msg}");
    assert!(
        msg.ends_with("input label names: 'a', correct label names: 'a, b'"),
        "{msg}"
    );

    let failure = err.as_update().unwrap();
    assert_eq!(failure.metric, "jobs");
    assert_eq!(failure.input_label_names, vec!["a"]);
    assert_eq!(failure.correct_label_names, vec!["a", "b"]);
}

#[test]
fn mismatch_before_any_series_omits_correct_names() {
    let m = metrics();
    let err = m
        .gauge("fresh", &LabelSet::from([("bad-name", "x")]), 1.0)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "metric: 'fresh', error: ''bad-name' is not a valid label name', input label names: 'bad-name'"
    );
}

#[test]
fn same_arity_different_names_is_a_mismatch() {
    let m = metrics();
    m.gauge("depth", &LabelSet::from([("queue", "q1")]), 1.0).unwrap();

    let err = m
        .gauge("depth", &LabelSet::from([("topic", "q1")]), 1.0)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LabelMismatch);
    assert!(err
        .to_string()
        .ends_with("input label names: 'topic', correct label names: 'queue'"));
}

#[test]
fn reserved_labels_are_rejected() {
    let m = metrics();
    let err = m
        .counter("requests", &LabelSet::from([("app", "other"), ("k", "v")]), 1.0)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ReservedLabel);
    assert!(err.to_string().ends_with("input label names: 'app, k'"));
    assert!(m.registered().0.is_empty());
}

#[test]
fn invalid_label_name_is_rejected_before_creation() {
    let m = metrics();
    let err = m
        .histogram("lat", &LabelSet::from([("bad-name", "x")]), 1.0, &[])
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidLabelName);
    assert!(!err.to_string().contains("correct label names"));
    assert!(m.registered().2.is_empty());
}

#[test]
fn negative_counter_delta_is_rejected() {
    let m = metrics();
    let labels = LabelSet::from([("k", "v")]);
    m.counter("total", &labels, 2.0).unwrap();

    let err = m.counter("total", &labels, -1.0).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Validation);
    assert!(err.to_string().contains("input label names: 'k'"));
    assert!(m.get_metrics("total{").unwrap().trim_end().ends_with(" 2"));
}

#[test]
fn rejected_first_delta_does_not_create_the_counter() {
    let m = metrics();
    for bad in [-1.0, f64::NAN] {
        let err = m
            .counter("late", &LabelSet::from([("a", "1")]), bad)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
    }
    assert!(m.registered().0.is_empty());

    // The schema is still open: the first valid call decides it.
    m.counter("late", &LabelSet::from([("b", "1")]), 1.0).unwrap();
    assert!(m.get_metrics("late{").unwrap().contains("late{app=\"Svc\",b=\"1\",env=\"test\"} 1"));
}

#[test]
fn name_reuse_across_kinds_is_a_registration_error() {
    let m = metrics();
    m.counter("dup", &LabelSet::new(), 1.0).unwrap();

    let err = m.gauge("dup", &LabelSet::new(), 1.0).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Registration);
    assert!(m.registered().1.is_empty());
    // The counter is untouched.
    m.counter("dup", &LabelSet::new(), 1.0).unwrap();
}

#[test]
fn concurrent_counter_updates_all_land() {
    let m = metrics();
    thread::scope(|s| {
        for t in 0..8 {
            let m = m.clone();
            s.spawn(move || {
                let labels = LabelSet::from([("shard", if t % 2 == 0 { "even" } else { "odd" })]);
                for _ in 0..1000 {
                    m.counter("ops", &labels, 1.0).unwrap();
                }
            });
        }
    });

    let ops = m.get_metrics("ops{").unwrap();
    assert!(ops.contains("shard=\"even\"} 4000"), "{ops}");
    assert!(ops.contains("shard=\"odd\"} 4000"), "{ops}");
    assert_eq!(m.exposition_text().unwrap().matches("# TYPE ops counter").count(), 1);
}

#[test]
fn measure_exec_time_records_one_observation() {
    let m = metrics();
    let timer = m.start_measure_exec_time(
        "exec",
        LabelSet::from([("job", "x")]),
        vec![1.0, 1000.0],
        TimeUnit::parse("ms"),
    );
    assert_eq!(timer.unit(), TimeUnit::Millisecond);
    thread::sleep(Duration::from_millis(5));
    assert!(timer.elapsed() >= 5.0);
    timer.stop().unwrap();

    let exec = m.get_metrics("exec_").unwrap();
    assert!(exec.contains("exec_count{app=\"Svc\",env=\"test\",job=\"x\"} 1"), "{exec}");
    assert!(exec.contains("le=\"1\"} 0"), "{exec}");
    assert!(exec.contains("le=\"1000\"} 1"), "{exec}");
}

#[test]
fn unknown_unit_falls_back_to_milliseconds() {
    let m = metrics();
    let timer = m.start_measure_exec_time("exec", LabelSet::new(), vec![], TimeUnit::parse("fortnights"));
    assert_eq!(timer.unit(), TimeUnit::Millisecond);
    timer.stop().unwrap();
}

#[test]
fn elapsed_time_observes_seconds() {
    let m = metrics();
    let since = Instant::now() - Duration::from_millis(1500);
    m.elapsed_time("phase", &LabelSet::from([("p", "load")]), since, &[1.0, 2.0])
        .unwrap();

    let phase = m.get_metrics("phase_").unwrap();
    assert!(phase.contains("le=\"1\"} 0"), "{phase}");
    assert!(phase.contains("le=\"2\"} 1"), "{phase}");
}

#[test]
fn get_metrics_filters_case_insensitively() {
    let m = metrics();
    m.counter("Upper_Requests", &LabelSet::new(), 1.0).unwrap();
    m.counter("other", &LabelSet::new(), 1.0).unwrap();

    let found = m.get_metrics("upper_requests").unwrap();
    assert!(found.contains("Upper_Requests{app=\"Svc\",env=\"test\"} 1"), "{found}");
    assert!(!found.contains("other"));
    assert!(m.get_metrics("nothing-matches").unwrap().is_empty());
}

#[test]
fn new_rejects_invalid_config() {
    let err = Metrics::new(MetricsConfig::new("", "test")).err().unwrap();
    assert_eq!(err.code(), ErrorCode::Config);
}
