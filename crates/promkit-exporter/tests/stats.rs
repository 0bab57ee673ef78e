#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use promkit_exporter::config::MetricsConfig;
use promkit_exporter::stats::{self, Sampler};
use promkit_exporter::Metrics;

fn cfg(threads: bool, memory: bool, cpu: bool) -> MetricsConfig {
    let mut c = MetricsConfig::new("Stats", "test").with_listen("127.0.0.1", 0);
    c.stats.thread_count = threads;
    c.stats.memory_usage = memory;
    c.stats.cpu_usage = cpu;
    c.stats.interval_ms = 100;
    c.stats.cpu_window_ms = 20;
    c
}

#[test]
fn each_toggle_enables_its_own_sampler() {
    let only_cpu = Metrics::new(cfg(false, false, true)).unwrap();
    assert_eq!(
        stats::enabled(&only_cpu),
        vec![Sampler::Cpu {
            window: Duration::from_millis(20)
        }]
    );

    let threads_memory = Metrics::new(cfg(true, true, false)).unwrap();
    assert_eq!(
        stats::enabled(&threads_memory),
        vec![Sampler::Threads, Sampler::Memory]
    );

    assert!(stats::enabled(&Metrics::new(cfg(false, false, false)).unwrap()).is_empty());
}

#[test]
fn no_runtime_starts_nothing() {
    let m = Metrics::new(cfg(true, true, true)).unwrap();
    assert_eq!(m.start_stat_reporters(), 0);
}

#[tokio::test]
async fn nothing_enabled_starts_nothing() {
    let m = Metrics::new(cfg(false, false, false)).unwrap();
    assert_eq!(m.start_stat_reporters(), 0);
}

#[cfg(target_os = "linux")]
async fn wait_for(m: &Metrics, filter: &str) -> String {
    for _ in 0..50 {
        let found = m.get_metrics(filter).unwrap();
        if !found.is_empty() {
            return found;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("no `{filter}` series reported");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn samplers_report_gauges() {
    let m = Metrics::new(cfg(true, true, true)).unwrap();
    assert_eq!(m.start_stat_reporters(), 3);

    let threads = wait_for(&m, "stat_threads:count{").await;
    assert!(threads.starts_with("stat_threads:count{app=\"Stats\",env=\"test\"} "), "{threads}");

    let used = wait_for(&m, "stat_memory_usage:used_percent{").await;
    let pct: f64 = used.trim_end().rsplit(' ').next().unwrap().parse().unwrap();
    assert!((0.0..=100.0).contains(&pct), "{used}");
    for gauge in ["total", "avail", "used", "free"] {
        wait_for(&m, &format!("stat_memory_usage:{gauge}{{")).await;
    }

    let cpu = wait_for(&m, "stat_cpu_usage:percent{").await;
    let pct: f64 = cpu.trim_end().rsplit(' ').next().unwrap().parse().unwrap();
    assert!((0.0..=100.0).contains(&pct), "{cpu}");

    m.shutdown().await.unwrap();
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn samplers_stop_on_shutdown() {
    let m = Metrics::new(cfg(true, false, false)).unwrap();
    m.start_stat_reporters();
    wait_for(&m, "stat_threads:count{").await;
    m.shutdown().await.unwrap();

    // A sampler still running would overwrite this within one interval.
    m.gauge("stat_threads:count", &promkit_core::LabelSet::new(), -1.0)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(m
        .get_metrics("stat_threads:count{")
        .unwrap()
        .trim_end()
        .ends_with(" -1"));
}
