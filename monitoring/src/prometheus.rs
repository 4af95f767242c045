//! Prometheus text format exporter.
//!
//! Encodes a [`MetricsSnapshot`] into the [Prometheus exposition format](https://prometheus.io/docs/instrumenting/exposition_formats/)
//! (text/plain; version=0.0.4).

use {
    crate::{MetricsSnapshot, Sample},
    std::fmt::Write,
};

/// Encode a metrics snapshot into Prometheus text exposition format.
pub fn encode(snap: &MetricsSnapshot) -> String {
    let mut out = String::with_capacity(2048);
    for sample in &snap.samples {
        match sample {
            Sample::Counter { name, help, value } => {
                write_header(&mut out, name, help, "counter");
                let _ = writeln!(out, "{name} {value}\n");
            }
            Sample::Gauge { name, help, value } => {
                write_header(&mut out, name, help, "gauge");
                let _ = writeln!(out, "{name} {value}\n");
            }
            Sample::Histogram {
                name,
                help,
                buckets,
                sum,
                count,
            } => {
                write_header(&mut out, name, help, "histogram");
                for (bound, cumulative) in buckets {
                    let _ = writeln!(out, "{name}_bucket{{le=\"{bound}\"}} {cumulative}");
                }
                let _ = writeln!(out, "{name}_bucket{{le=\"+Inf\"}} {count}");
                let _ = writeln!(out, "{name}_sum {sum}");
                let _ = writeln!(out, "{name}_count {count}\n");
            }
        }
    }
    out
}

fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}
