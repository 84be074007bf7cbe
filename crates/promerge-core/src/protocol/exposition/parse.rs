//! Exposition text parser (format 0.0.4).
//!
//! Parsing rules:
//! - Never slice raw lines by byte offset; walk `chars()` instead.
//! - Every malformed line is a `BadRequest` carrying its line number.

use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{MergeError, Result};
use crate::identity::SeriesId;
use crate::model::{MetricFamily, MetricType, Sample};

type LineResult<T> = std::result::Result<T, String>;

fn bad_line(lineno: usize, msg: impl AsRef<str>) -> MergeError {
    MergeError::BadRequest(format!("line {lineno}: {}", msg.as_ref()))
}

/// Parse exposition text into families, in the order they appear.
pub fn parse_text(text: &str) -> Result<Vec<MetricFamily>> {
    let mut builder = FamilyBuilder::default();

    for (idx, raw) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            parse_comment(comment, lineno, &mut builder)?;
        } else {
            let sample = parse_sample(line).map_err(|e| bad_line(lineno, e))?;
            builder.push_sample(sample, lineno)?;
        }
    }

    Ok(builder.finish())
}

fn parse_comment(comment: &str, lineno: usize, builder: &mut FamilyBuilder) -> Result<()> {
    let body = comment.trim_start();
    let (keyword, rest) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
    let rest = rest.trim_start();

    match keyword {
        "HELP" => {
            let (name, doc) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if !is_valid_metric_name(name) {
                return Err(bad_line(lineno, format!("invalid metric name {name:?}")));
            }
            let family = builder.open(name, lineno)?;
            family.help = unescape_help(doc.trim_start());
        }
        "TYPE" => {
            let mut fields = rest.split_whitespace();
            let (Some(name), Some(tag)) = (fields.next(), fields.next()) else {
                return Err(bad_line(lineno, "TYPE needs a name and a type"));
            };
            if fields.next().is_some() {
                return Err(bad_line(lineno, "unexpected fields after TYPE"));
            }
            if !is_valid_metric_name(name) {
                return Err(bad_line(lineno, format!("invalid metric name {name:?}")));
            }
            let family = builder.open(name, lineno)?;
            if family.typed {
                return Err(bad_line(lineno, format!("duplicate TYPE for {name}")));
            }
            if !family.samples.is_empty() {
                return Err(bad_line(lineno, format!("TYPE for {name} after its samples")));
            }
            family.metric_type = MetricType::from_tag(tag);
            family.typed = true;
        }
        // Plain comments.
        _ => {}
    }
    Ok(())
}

struct PendingFamily {
    name: String,
    help: String,
    metric_type: MetricType,
    typed: bool,
    samples: Vec<Sample>,
    series: HashSet<SeriesId>,
}

impl PendingFamily {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            help: String::new(),
            metric_type: MetricType::Other("untyped".into()),
            typed: false,
            samples: Vec::new(),
            series: HashSet::new(),
        }
    }

    fn push(&mut self, sample: Sample, lineno: usize) -> Result<()> {
        let mut id = SeriesId::of(&sample);
        // `x` and `x_total` are the same series of a bare counter.
        if self.metric_type == MetricType::Counter && id.name == self.name {
            id.name.push_str("_total");
        }
        if !self.series.insert(id) {
            return Err(bad_line(lineno, format!("duplicate series in {}", self.name)));
        }
        self.samples.push(sample);
        Ok(())
    }

    fn accepts(&self, sample_name: &str) -> bool {
        let suffixes: &[&str] = match self.metric_type.as_str() {
            "counter" if !self.name.ends_with("_total") => &["", "_total"],
            "summary" => &["", "_count", "_sum"],
            "histogram" => &["_count", "_sum", "_bucket"],
            _ => &[""],
        };
        let tail = sample_name.strip_prefix(self.name.as_str());
        suffixes.iter().any(|s| tail == Some(*s))
    }

    /// Counters are keyed without `_total`; their samples always carry it.
    fn into_family(self) -> MetricFamily {
        let mut name = self.name;
        let mut samples = self.samples;

        if self.metric_type == MetricType::Counter {
            if let Some(base) = name.strip_suffix("_total").map(str::to_string) {
                name = base;
            } else {
                for s in samples.iter_mut().filter(|s| s.name == name) {
                    s.name.push_str("_total");
                }
            }
        }

        MetricFamily {
            name,
            help: self.help,
            metric_type: self.metric_type,
            samples,
        }
    }
}

#[derive(Default)]
struct FamilyBuilder {
    current: Option<PendingFamily>,
    done: Vec<MetricFamily>,
    seen: HashSet<String>,
}

impl FamilyBuilder {
    fn close_current(&mut self) {
        if let Some(pending) = self.current.take() {
            self.seen.insert(pending.name.clone());
            let family = pending.into_family();
            self.seen.insert(family.name.clone());
            self.done.push(family);
        }
    }

    /// Current family if it has this name, else a freshly opened one.
    fn open(&mut self, name: &str, lineno: usize) -> Result<&mut PendingFamily> {
        let same = self.current.as_ref().is_some_and(|p| p.name == name);
        if !same {
            self.close_current();
            if self.seen.contains(name) {
                return Err(bad_line(lineno, format!("duplicate family {name}")));
            }
        }
        Ok(self.current.get_or_insert_with(|| PendingFamily::new(name)))
    }

    fn push_sample(&mut self, sample: Sample, lineno: usize) -> Result<()> {
        if let Some(pending) = self.current.as_mut() {
            if pending.accepts(&sample.name) {
                return pending.push(sample, lineno);
            }
        }

        let name = sample.name.clone();
        self.open(&name, lineno)?.push(sample, lineno)
    }

    fn finish(mut self) -> Vec<MetricFamily> {
        self.close_current();
        self.done
    }
}

fn parse_sample(line: &str) -> LineResult<Sample> {
    let mut chars = line.chars().peekable();

    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '{' || c.is_whitespace() {
            break;
        }
        name.push(c);
        chars.next();
    }
    if !is_valid_metric_name(&name) {
        return Err(format!("invalid metric name {name:?}"));
    }

    let mut labels = Vec::new();
    if chars.peek() == Some(&'{') {
        chars.next();
        labels = parse_labels(&mut chars)?;
    }

    let rest: String = chars.collect();
    let mut fields = rest.split_whitespace();
    let value = parse_value(fields.next().ok_or("missing sample value")?)?;
    if let Some(ts) = fields.next() {
        ts.parse::<i64>()
            .map_err(|e| format!("invalid timestamp {ts:?}: {e}"))?;
    }
    if fields.next().is_some() {
        return Err("unexpected trailing fields".into());
    }

    Ok(Sample { name, labels, value })
}

fn skip_ws(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn parse_labels(chars: &mut Peekable<Chars<'_>>) -> LineResult<Vec<(String, String)>> {
    let mut labels: Vec<(String, String)> = Vec::new();

    loop {
        skip_ws(chars);
        match chars.peek() {
            Some('}') => {
                chars.next();
                return Ok(labels);
            }
            None => return Err("unterminated label set".into()),
            _ => {}
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ',' || c == '}' || c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }
        if !is_valid_label_name(&key) {
            return Err(format!("invalid label name {key:?}"));
        }

        skip_ws(chars);
        if chars.next() != Some('=') {
            return Err(format!("expected '=' after label {key}"));
        }
        skip_ws(chars);
        if chars.next() != Some('"') {
            return Err(format!("expected quoted value for label {key}"));
        }

        let mut value = String::new();
        loop {
            match chars.next() {
                Some('"') => break,
                Some('\\') => match chars.next() {
                    Some('n') => value.push('\n'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err("unterminated label value".into()),
                },
                Some(c) => value.push(c),
                None => return Err("unterminated label value".into()),
            }
        }

        if labels.iter().any(|(k, _)| *k == key) {
            return Err(format!("duplicate label {key}"));
        }
        labels.push((key, value));

        skip_ws(chars);
        match chars.next() {
            Some(',') => continue,
            Some('}') => return Ok(labels),
            _ => return Err("expected ',' or '}' in label set".into()),
        }
    }
}

fn parse_value(s: &str) -> LineResult<f64> {
    match s {
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ => s
            .parse::<f64>()
            .map_err(|e| format!("invalid sample value {s:?}: {e}")),
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
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
