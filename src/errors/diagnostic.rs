//! Pretty diagnostic rendering using ariadne
//!
//! Renders reports with source context, a caret-underlined excerpt, and the
//! `module:line:column` location header.

use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, sources};
use std::ops::Range;

use super::{Severity, SourceSpan};

fn kind_for(severity: Severity) -> (ReportKind<'static>, Color) {
    match severity {
        Severity::Warning => (ReportKind::Warning, Color::Yellow),
        Severity::Error => (ReportKind::Error, Color::Red),
        Severity::RuntimeError => (ReportKind::Custom("runtime error", Color::Magenta), Color::Magenta),
    }
}

/// Render one report into bytes
///
/// The span is clamped to the source so that end-of-file anchors still
/// render instead of tripping ariadne's bounds handling.
pub(super) fn render_report(
    severity: Severity,
    message: &str,
    span: Option<SourceSpan>,
    module_name: &str,
    source: &str,
    colored: bool,
) -> Vec<u8> {
    let (kind, color) = kind_for(severity);
    let module = if module_name.is_empty() {
        "<source>"
    } else {
        module_name
    };

    let clamp = |span: SourceSpan| -> Range<usize> {
        span.start.min(source.len())..span.end.min(source.len())
    };
    let anchor = span.map(clamp).unwrap_or(0..0);

    let mut report = Report::build(kind, (module.to_string(), anchor))
        .with_config(Config::default().with_color(colored))
        .with_message(format!("{} in {}", severity.name(), module));

    if let Some(s) = span {
        report = report.with_label(
            Label::new((module.to_string(), clamp(s)))
                .with_message(message)
                .with_color(color),
        );
    }

    let mut output = Vec::new();
    report
        .finish()
        .write(
            sources([(module.to_string(), source.to_string())]),
            &mut output,
        )
        .expect("diagnostic rendering should not fail");
    output
}

/// Render a note line attached to the preceding report
pub(super) fn render_note(message: &str, colored: bool) -> Vec<u8> {
    let text = if colored {
        format!("  {}: {}\n", "note".fg(Color::Cyan), message)
    } else {
        format!("  note: {}\n", message)
    };
    text.into_bytes()
}
