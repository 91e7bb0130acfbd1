use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use crate::executor::ResultSet;
use crate::response::ChartSpec;

/// One item shown to the user in response to a question.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Sql(Vec<String>),
    Table(ResultSet),
    Chart(ChartSpec),
    /// The model answered with something that failed validation.
    BadResponse { reason: String, raw: String },
}

pub fn render(reply: &Reply, chart_width: usize) -> String {
    match reply {
        Reply::Text(text) => text.clone(),
        Reply::Sql(statements) => statements
            .iter()
            .map(|s| format!("  {s}"))
            .collect::<Vec<_>>()
            .join("\n"),
        Reply::Table(result) => table(result),
        Reply::Chart(chart) => bar_chart(chart, chart_width),
        Reply::BadResponse { reason, raw } => {
            format!("Bad model response ({reason}):\n{raw}")
        }
    }
}

pub fn table(result: &ResultSet) -> String {
    if result.columns.is_empty() {
        return "(no rows)".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(result.columns.clone());
    for row in &result.rows {
        table.add_row(row.clone());
    }
    table.to_string()
}

/// Pipe-separated rendering used when feeding results back to the model.
pub fn plain_table(result: &ResultSet) -> String {
    let mut lines = Vec::with_capacity(result.rows.len() + 1);
    lines.push(result.columns.join(" | "));
    lines.extend(result.rows.iter().map(|row| row.join(" | ")));
    lines.join("\n")
}

pub fn bar_chart(chart: &ChartSpec, width: usize) -> String {
    let label_width = chart
        .labels
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(chart.xlabel.chars().count()))
        .max()
        .unwrap_or(0);
    let max = chart.data.iter().cloned().fold(0.0_f64, f64::max);

    let mut out = vec![
        chart.title.clone(),
        format!("{:<label_width$} | {}", chart.xlabel, chart.ylabel),
    ];
    for (label, value) in chart.labels.iter().zip(&chart.data) {
        let len = if max > 0.0 && *value > 0.0 {
            ((value / max) * width as f64).round() as usize
        } else {
            0
        };
        out.push(format!(
            "{:<label_width$} | {} {}",
            label,
            "█".repeat(len),
            value
        ));
    }
    out.join("\n")
}
