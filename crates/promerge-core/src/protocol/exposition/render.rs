//! Exposition text serializer.

use std::fmt::Write;

use crate::model::MetricFamily;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a sample value the way scrapers expect it.
///
/// Integral values keep one decimal (`2.0`), infinities are `+Inf`/`-Inf`.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

/// Render families in the order given, one `# HELP`/`# TYPE` preamble each.
pub fn render_text(families: &[MetricFamily]) -> String {
    let mut out = String::new();
    for family in families {
        render_family(family, &mut out);
    }
    out
}

fn render_family(family: &MetricFamily, out: &mut String) {
    let header = family.exposed_name();

    let _ = writeln!(out, "# HELP {} {}", header, escape_help(&family.help));
    let _ = writeln!(out, "# TYPE {} {}", header, family.metric_type);

    for s in &family.samples {
        if s.labels.is_empty() {
            let _ = writeln!(out, "{} {}", s.name, format_value(s.value));
            continue;
        }
        let label_str = s
            .labels
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(out, "{}{{{}}} {}", s.name, label_str, format_value(s.value));
    }
}
