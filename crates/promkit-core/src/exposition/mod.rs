//! Prometheus text exposition helpers.
//!
//! The exporter never builds exposition text itself (the metrics backend
//! encodes it); these helpers only read it back:
//! - `grep_lines`: case-insensitive line filter, used to scope text to one family.
//! - `parse_exposition_text`: text -> metric families.
//! - `labels_of`: label recovery for one family, used by error reporting.
//!
//! Like the rest of this crate the parser is panic-free: malformed lines are
//! reported as `MetricsError::Parse`.

mod parse;

use std::collections::BTreeMap;

use crate::error::Result;
use crate::labels::LabelSet;

pub use parse::parse_exposition_text;

/// Family type as declared by a `# TYPE` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
    Summary,
    #[default]
    Untyped,
}

impl MetricType {
    pub fn parse(s: &str) -> Self {
        match s {
            "counter" => MetricType::Counter,
            "gauge" => MetricType::Gauge,
            "histogram" => MetricType::Histogram,
            "summary" => MetricType::Summary,
            _ => MetricType::Untyped,
        }
    }

    /// Suffixes under which this type emits samples besides its bare name.
    fn sample_suffixes(self) -> &'static [&'static str] {
        match self {
            MetricType::Histogram => &["_bucket", "_sum", "_count"],
            MetricType::Summary => &["_sum", "_count"],
            _ => &[],
        }
    }

    /// Label the encoder adds per sample rather than per series.
    fn synthetic_label(self) -> Option<&'static str> {
        match self {
            MetricType::Histogram => Some("le"),
            MetricType::Summary => Some("quantile"),
            _ => None,
        }
    }
}

/// One sample line.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: LabelSet,
    pub value: f64,
    pub timestamp_ms: Option<i64>,
}

/// All lines belonging to one metric name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: Option<String>,
    pub metric_type: MetricType,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    /// Union of the series labels across samples. Histogram `le` and summary
    /// `quantile` are excluded; on conflicting values the last sample wins.
    pub fn labels(&self) -> LabelSet {
        let skip = self.metric_type.synthetic_label();
        let mut out = LabelSet::new();
        for s in &self.samples {
            for (k, v) in s.labels.iter() {
                if Some(k) != skip {
                    out.insert(k, v);
                }
            }
        }
        out
    }

    /// Sorted series label names.
    pub fn label_names(&self) -> Vec<String> {
        self.labels().names()
    }
}

/// Parsed exposition text keyed by family name.
pub type Families = BTreeMap<String, MetricFamily>;

/// Lines of `text` containing `find`, compared case-insensitively.
/// Each kept line is newline-terminated.
pub fn grep_lines(find: &str, text: &str) -> String {
    let needle = find.to_lowercase();
    let mut out = String::new();
    for line in text.lines() {
        if line.to_lowercase().contains(&needle) {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Labels recorded for `metric` in `text`. Unparseable text or an unknown
/// metric yields an empty set.
pub fn labels_of(text: &str, metric: &str) -> LabelSet {
    match parse_exposition_text(text) {
        Ok(families) => families
            .get(metric)
            .map(MetricFamily::labels)
            .unwrap_or_default(),
        Err(e) => {
            tracing::debug!(metric, error = %e, "exposition text not parseable");
            LabelSet::new()
        }
    }
}

/// Family lookup that strips the per-type sample suffixes.
pub(crate) fn family_for<'a>(families: &'a Families, sample_name: &str) -> Option<&'a str> {
    if let Some((k, _)) = families.get_key_value(sample_name) {
        return Some(k.as_str());
    }
    families.iter().find_map(|(name, fam)| {
        let rest = sample_name.strip_prefix(name.as_str())?;
        fam.metric_type
            .sample_suffixes()
            .contains(&rest)
            .then_some(name.as_str())
    })
}

/// Parse, then look up one family.
pub fn family(text: &str, metric: &str) -> Result<Option<MetricFamily>> {
    let mut families = parse_exposition_text(text)?;
    Ok(families.remove(metric))
}
