//! Terminal rendering of syntax errors.

use ariadne::{Color, Label, Report, ReportKind, Source};
use lama_parse::SyntaxError;

/// Print `err` against `source` with the offending span underlined.
pub fn report_syntax_error(origin: &str, source: &str, err: &SyntaxError) {
    let start = (err.span.start as usize).min(source.len());
    let end = (err.span.end as usize).clamp(start, source.len());

    let report = Report::build(ReportKind::Error, origin, start)
        .with_message("syntax error")
        .with_label(
            Label::new((origin, start..end))
                .with_message(&err.message)
                .with_color(Color::Red),
        )
        .finish();

    if report.eprint((origin, Source::from(source))).is_err() {
        // Fall back to the plain message when stderr is unusable.
        eprintln!("{origin}:{err}");
    }
}
