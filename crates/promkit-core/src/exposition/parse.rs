//! Text format parser (panic-free).
//!
//! Parsing rules:
//! - Never index into the line; walk it with a `Peekable<Chars>` cursor.
//! - `# HELP` / `# TYPE` declare a family; other comments are skipped.
//! - Samples attach to a declared family by exact name or by the type's
//!   suffix (`_bucket`, `_sum`, `_count`); otherwise they form an untyped family.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{MetricsError, Result};
use crate::labels::LabelSet;

use super::{family_for, Families, MetricFamily, MetricType, Sample};

/// Parse exposition text into families keyed by name.
pub fn parse_exposition_text(text: &str) -> Result<Families> {
    let mut families = Families::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let lineno = idx + 1;

        if let Some(comment) = line.strip_prefix('#') {
            parse_comment(comment.trim_start(), &mut families);
            continue;
        }

        let sample = parse_sample(line)
            .map_err(|e| MetricsError::Parse(format!("line {lineno}: {e}")))?;
        let family_name = family_for(&families, &sample.name)
            .map(str::to_owned)
            .unwrap_or_else(|| sample.name.clone());
        families
            .entry(family_name.clone())
            .or_insert_with(|| MetricFamily {
                name: family_name,
                ..MetricFamily::default()
            })
            .samples
            .push(sample);
    }

    Ok(families)
}

fn parse_comment(comment: &str, families: &mut Families) {
    let mut parts = comment.splitn(3, ' ');
    let keyword = parts.next().unwrap_or_default();
    let (Some(name), rest) = (parts.next(), parts.next()) else {
        return;
    };
    let rest = rest.unwrap_or_default();

    let family = || MetricFamily {
        name: name.to_string(),
        ..MetricFamily::default()
    };
    match keyword {
        "HELP" => {
            families.entry(name.to_string()).or_insert_with(family).help = Some(unescape_help(rest));
        }
        "TYPE" => {
            families.entry(name.to_string()).or_insert_with(family).metric_type =
                MetricType::parse(rest.trim());
        }
        _ => {}
    }
}

fn unescape_help(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

type Cursor<'a> = Peekable<Chars<'a>>;

fn parse_sample(line: &str) -> std::result::Result<Sample, String> {
    let mut cur = line.chars().peekable();

    let name = take_while(&mut cur, is_metric_char);
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(format!("invalid metric name in {line:?}"));
    }

    let labels = if cur.peek() == Some(&'{') {
        cur.next();
        parse_labels(&mut cur)?
    } else {
        LabelSet::new()
    };

    skip_ws(&mut cur);
    let value = take_while(&mut cur, |c| !c.is_whitespace());
    let value = parse_value(&value)?;

    skip_ws(&mut cur);
    let ts = take_while(&mut cur, |c| !c.is_whitespace());
    let timestamp_ms = if ts.is_empty() {
        None
    } else {
        Some(ts.parse::<i64>().map_err(|_| format!("invalid timestamp {ts:?}"))?)
    };

    skip_ws(&mut cur);
    if cur.peek().is_some() {
        return Err("trailing characters after sample".into());
    }

    Ok(Sample {
        name,
        labels,
        value,
        timestamp_ms,
    })
}

fn parse_labels(cur: &mut Cursor<'_>) -> std::result::Result<LabelSet, String> {
    let mut labels = LabelSet::new();
    loop {
        skip_ws(cur);
        if cur.peek() == Some(&'}') {
            cur.next();
            return Ok(labels);
        }

        let name = take_while(cur, |c| c.is_ascii_alphanumeric() || c == '_');
        if name.is_empty() {
            return Err("expected label name".into());
        }
        skip_ws(cur);
        expect(cur, '=')?;
        skip_ws(cur);
        expect(cur, '"')?;
        let value = parse_label_value(cur)?;
        labels.insert(name, value);

        skip_ws(cur);
        match cur.next() {
            Some(',') => continue,
            Some('}') => return Ok(labels),
            Some(c) => return Err(format!("unexpected {c:?} in label set")),
            None => return Err("unterminated label set".into()),
        }
    }
}

/// Reads up to and including the closing quote.
fn parse_label_value(cur: &mut Cursor<'_>) -> std::result::Result<String, String> {
    let mut out = String::new();
    loop {
        match cur.next() {
            Some('"') => return Ok(out),
            Some('\\') => match cur.next() {
                Some('n') => out.push('\n'),
                Some(c @ ('\\' | '"')) => out.push(c),
                Some(c) => {
                    out.push('\\');
                    out.push(c);
                }
                None => return Err("unterminated escape".into()),
            },
            Some(c) => out.push(c),
            None => return Err("unterminated label value".into()),
        }
    }
}

fn parse_value(s: &str) -> std::result::Result<f64, String> {
    match s {
        "" => Err("missing sample value".into()),
        "+Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ => s.parse::<f64>().map_err(|_| format!("invalid sample value {s:?}")),
    }
}

fn is_metric_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

fn take_while(cur: &mut Cursor<'_>, pred: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(&c) = cur.peek() {
        if !pred(c) {
            break;
        }
        out.push(c);
        cur.next();
    }
    out
}

fn skip_ws(cur: &mut Cursor<'_>) {
    while cur.peek().is_some_and(|c| c.is_whitespace()) {
        cur.next();
    }
}

fn expect(cur: &mut Cursor<'_>, want: char) -> std::result::Result<(), String> {
    match cur.next() {
        Some(c) if c == want => Ok(()),
        Some(c) => Err(format!("expected {want:?}, found {c:?}")),
        None => Err(format!("expected {want:?}, found end of line")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_value_escapes() {
        let s = parse_sample(r#"m{path="a\"b\\c\nd"} 1"#);
        assert_eq!(
            s.map(|s| s.labels.get("path").map(str::to_owned)),
            Ok(Some("a\"b\\c\nd".to_string()))
        );
    }

    #[test]
    fn special_values_and_timestamp() {
        let s = parse_sample("m_bucket{le=\"+Inf\"} +Inf 1700000000000");
        assert!(matches!(
            s,
            Ok(Sample { value, timestamp_ms: Some(1_700_000_000_000), .. }) if value.is_infinite()
        ));
    }

    #[test]
    fn rejects_unterminated_labels() {
        assert!(parse_sample("m{a=\"1\" 1").is_err());
        assert!(parse_sample("m{a=1} 1").is_err());
        assert!(parse_sample("m").is_err());
    }
}
