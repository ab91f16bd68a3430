//! Markdown snippets for content appended to pages.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// A daily report: a dated heading, the completed tasks as a checked list,
/// free-form notes, and the generation timestamp.
pub fn daily_report(tasks: &[&str], notes: &str, now: DateTime<Utc>) -> String {
    let task_list = tasks
        .iter()
        .map(|task| format!("- [x] {task}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\n## Daily Report - {date}\n\n### Completed Tasks\n{task_list}\n\n### Notes\n{notes}\n\n### Generated at\n{stamp}\n",
        date = now.format("%Y-%m-%d"),
        stamp = now.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

pub fn code_snippet(code: &str, language: &str) -> String {
    format!("```{language}\n{code}\n```")
}

/// A pipe table. Rows shorter than `headers` are rendered as given. With no
/// rows the separator line keeps its trailing newline.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let header_row = format!("| {} |", headers.join(" | "));
    let separator_row = format!("| {} |", vec!["---"; headers.len()].join(" | "));
    let data_rows = rows
        .iter()
        .map(|row| format!("| {} |", row.join(" | ")))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{header_row}\n{separator_row}\n{data_rows}")
}

pub fn checklist(items: &[(&str, bool)]) -> String {
    items
        .iter()
        .map(|(item, done)| format!("- [{}] {item}", if *done { "x" } else { " " }))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Size figures for a page's Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageStats {
    pub characters: usize,
    pub lines: usize,
    pub words: usize,
}

/// `lines` counts newline characters, so a single line without a trailing
/// newline reports zero.
pub fn page_stats(markdown: &str) -> PageStats {
    PageStats {
        characters: markdown.chars().count(),
        lines: markdown.matches('\n').count(),
        words: markdown.split_whitespace().count(),
    }
}
