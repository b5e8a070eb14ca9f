//! Plain-text rendering of completion reports.

use crate::board::domain::{CompletionReport, PeriodKind, Priority};
use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

const REPORT_TEMPLATE: &str = "\
{{ heading }} report, {{ start }} to {{ end }}
{% if empty -%}
No tasks were completed in this period.
{%- else -%}
Completed: {{ total }}
{%- for group in groups %}{% if group.entries %}

{{ group.label }} ({{ group.entries | length }})
{%- for entry in group.entries %}
- {{ entry.title }} ({{ entry.completed_at }})
{%- endfor %}{% endif %}{% endfor %}
{%- endif %}
";

/// Report rendering failed.
#[derive(Debug, Error)]
#[error("failed to render report: {0}")]
pub struct ReportRenderError(#[from] minijinja::Error);

#[derive(Serialize)]
struct ReportView {
    heading: &'static str,
    start: String,
    end: String,
    empty: bool,
    total: usize,
    groups: Vec<GroupView>,
}

#[derive(Serialize)]
struct GroupView {
    label: &'static str,
    entries: Vec<EntryView>,
}

#[derive(Serialize)]
struct EntryView {
    title: String,
    completed_at: String,
}

const fn heading(kind: PeriodKind) -> &'static str {
    match kind {
        PeriodKind::Day => "Daily",
        PeriodKind::Week => "Weekly",
    }
}

fn view(report: &CompletionReport) -> ReportView {
    let offset = report.start().timezone();
    let groups = Priority::ALL
        .into_iter()
        .map(|priority| GroupView {
            label: priority.label_name(),
            entries: report
                .entries()
                .iter()
                .filter(|entry| entry.priority == priority)
                .map(|entry| EntryView {
                    title: entry.title.clone(),
                    completed_at: entry
                        .completed_at
                        .with_timezone(&offset)
                        .format(TIME_FORMAT)
                        .to_string(),
                })
                .collect(),
        })
        .collect();
    ReportView {
        heading: heading(report.kind()),
        start: report.start().format(TIME_FORMAT).to_string(),
        end: report.end().format(TIME_FORMAT).to_string(),
        empty: report.is_empty(),
        total: report.counts().total(),
        groups,
    }
}

/// Renders `report` as chat-ready plain text.
///
/// # Errors
///
/// Returns [`ReportRenderError`] when the template fails to render.
pub fn render_report(report: &CompletionReport) -> Result<String, ReportRenderError> {
    let environment = Environment::new();
    Ok(environment.render_str(REPORT_TEMPLATE, view(report))?)
}
