use synthvae_core::{Table, Value};

use crate::model::{ComparatorEntry, EvaluationBundle, MetricResult, Outcome, PerformanceMetrics};

const FIGURE_LEGEND: &str = "real data in blue, synthetic data in red";

/// Render a deterministic markdown report from an evaluation bundle.
///
/// Images are summarised by size; the HTML report embeds them.
pub fn render_markdown(
    bundle: &EvaluationBundle,
    performance: &PerformanceMetrics,
    max_table_rows: usize,
) -> String {
    let mut lines = Vec::new();

    lines.push("# Synthetic Data Evaluation Report".to_string());
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    lines.push(format!("- run_id: {}", bundle.run_id));
    lines.push(format!("- bundle_version: {}", bundle.bundle_version));
    lines.push(format!("- real_rows: {}", bundle.real_rows));
    lines.push(format!("- synthetic_rows: {}", bundle.synthetic_rows));
    lines.push(format!("- entries: {}", bundle.entries.len()));
    lines.push(format!("- skipped: {}", bundle.skipped().count()));
    lines.push(String::new());

    let scalars: Vec<(&str, f64)> = bundle
        .entries
        .iter()
        .flat_map(|entry| entry.results())
        .filter_map(|named| named.result.as_scalar().map(|value| (named.name.as_str(), value)))
        .collect();
    if !scalars.is_empty() {
        lines.push("## Scalar metrics".to_string());
        lines.push("| metric | value |".to_string());
        lines.push("| --- | --- |".to_string());
        for (name, value) in scalars {
            lines.push(format!("| {name} | {} |", format_scalar(value)));
        }
        lines.push(String::new());
    }

    lines.push("## Comparators".to_string());
    for entry in &bundle.entries {
        push_entry(&mut lines, entry, max_table_rows);
    }

    let skipped: Vec<&ComparatorEntry> = bundle.skipped().collect();
    if !skipped.is_empty() {
        lines.push("## Skipped".to_string());
        for entry in skipped {
            lines.push(format!(
                "- {}: {}",
                entry.name,
                entry.skip_reason().unwrap_or_default()
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Performance".to_string());
    lines.push(format!("- load_ms: {}", performance.load_ms));
    lines.push(format!("- align_ms: {}", performance.align_ms));
    lines.push(format!("- metrics_ms: {}", performance.metrics_ms));
    lines.push(format!("- total_ms: {}", performance.total_ms));

    lines.join("\n")
}

fn push_entry(lines: &mut Vec<String>, entry: &ComparatorEntry, max_table_rows: usize) {
    lines.push(format!("### {}", entry.name));
    match &entry.outcome {
        Outcome::Skipped { reason } => {
            lines.push(format!("- skipped: {reason}"));
        }
        Outcome::Completed { results } => {
            for named in results {
                match &named.result {
                    MetricResult::Scalar(value) => {
                        lines.push(format!("- {}: {}", named.name, format_scalar(*value)));
                    }
                    MetricResult::Image(image) => {
                        lines.push(format!(
                            "- {}: {}x{} PNG ({FIGURE_LEGEND})",
                            named.name, image.width, image.height
                        ));
                    }
                    MetricResult::Table(table) => {
                        lines.push(format!("- {}:", named.name));
                        lines.push(String::new());
                        push_markdown_table(lines, table, max_table_rows);
                    }
                }
            }
        }
    }
    lines.push(String::new());
}

fn push_markdown_table(lines: &mut Vec<String>, table: &Table, max_rows: usize) {
    let names = table.column_names();
    lines.push(format!("| {} |", names.join(" | ")));
    lines.push(format!("|{}", " --- |".repeat(names.len())));
    for row in 0..table.row_count().min(max_rows) {
        let cells: Vec<String> = table
            .row(row)
            .into_iter()
            .map(|value| format_cell(value).replace('|', "\\|"))
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    if table.row_count() > max_rows {
        lines.push(format!(
            "\n_{} of {} rows shown_",
            max_rows,
            table.row_count()
        ));
    }
}

/// Render a standalone HTML document with one section per bundle entry.
pub fn render_html(bundle: &EvaluationBundle, max_table_rows: usize) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Synthetic Data Evaluation Report</title>\n");
    out.push_str(
        "<style>body{font-family:sans-serif;margin:2em}table{border-collapse:collapse}\
         td,th{border:1px solid #ccc;padding:2px 8px;text-align:right}\
         .skipped{color:#a33}</style>\n",
    );
    out.push_str("</head>\n<body>\n");
    out.push_str("<h1>Synthetic Data Evaluation Report</h1>\n");
    out.push_str(&format!(
        "<p>run_id: {} &middot; real rows: {} &middot; synthetic rows: {}</p>\n",
        escape(&bundle.run_id),
        bundle.real_rows,
        bundle.synthetic_rows
    ));
    out.push_str(&format!("<p>{FIGURE_LEGEND}</p>\n"));

    for entry in &bundle.entries {
        out.push_str(&format!(
            "<section id=\"{0}\">\n<h2>{0}</h2>\n",
            escape(&entry.name)
        ));
        match &entry.outcome {
            Outcome::Skipped { reason } => {
                out.push_str(&format!(
                    "<p class=\"skipped\">skipped: {}</p>\n",
                    escape(reason)
                ));
            }
            Outcome::Completed { results } => {
                for named in results {
                    let name = escape(&named.name);
                    match &named.result {
                        MetricResult::Scalar(value) => {
                            out.push_str(&format!("<p>{name}: {}</p>\n", format_scalar(*value)));
                        }
                        MetricResult::Image(image) => {
                            out.push_str(&format!(
                                "<img alt=\"{name}\" width=\"{}\" height=\"{}\" src=\"data:image/png;base64,{}\">\n",
                                image.width, image.height, image.png_base64
                            ));
                        }
                        MetricResult::Table(table) => {
                            out.push_str(&html_table(table, max_table_rows));
                        }
                    }
                }
            }
        }
        out.push_str("</section>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn html_table(table: &Table, max_rows: usize) -> String {
    let mut out = String::from("<table>\n<thead><tr>");
    for name in table.column_names() {
        out.push_str(&format!("<th>{}</th>", escape(name)));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in 0..table.row_count().min(max_rows) {
        out.push_str("<tr>");
        for value in table.row(row) {
            out.push_str(&format!("<td>{}</td>", escape(&format_cell(value))));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

fn format_scalar(value: f64) -> String {
    format!("{value:.6}")
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Float(value) if !value.is_nan() && value.fract() != 0.0 => format!("{value:.4}"),
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageArtifact, NamedResult};
    use synthvae_core::Column;

    fn bundle() -> EvaluationBundle {
        let mut bundle = EvaluationBundle::new("run-1", 3, 4);
        bundle
            .push(ComparatorEntry {
                name: "voas_williams_statistic".to_string(),
                comparator: "voas_williams_statistic".to_string(),
                column: None,
                duration_ms: 1,
                outcome: Outcome::Completed {
                    results: vec![NamedResult::new("pMSE", MetricResult::Scalar(0.125))],
                },
            })
            .unwrap();
        let table = Table::new(vec![
            Column::new("statistic", vec![Value::text("a<b"), Value::text("c")]),
            Column::new("real_data", vec![Value::Float(1.23456), Value::Missing]),
        ])
        .unwrap();
        bundle
            .push(ComparatorEntry {
                name: "x_description".to_string(),
                comparator: "description".to_string(),
                column: Some("x".to_string()),
                duration_ms: 0,
                outcome: Outcome::Completed {
                    results: vec![NamedResult::new("x_description", MetricResult::Table(table))],
                },
            })
            .unwrap();
        bundle
            .push(ComparatorEntry {
                name: "x_figure".to_string(),
                comparator: "distribution".to_string(),
                column: Some("x".to_string()),
                duration_ms: 0,
                outcome: Outcome::Completed {
                    results: vec![NamedResult::new(
                        "x_figure",
                        MetricResult::Image(ImageArtifact {
                            width: 2,
                            height: 1,
                            png_base64: "AAAA".to_string(),
                        }),
                    )],
                },
            })
            .unwrap();
        bundle
            .push(ComparatorEntry {
                name: "pca_evaluation".to_string(),
                comparator: "pca_evaluation".to_string(),
                column: None,
                duration_ms: 0,
                outcome: Outcome::Skipped {
                    reason: "disabled by configuration".to_string(),
                },
            })
            .unwrap();
        bundle
    }

    #[test]
    fn markdown_lists_scalars_tables_and_skips() {
        let report = render_markdown(&bundle(), &PerformanceMetrics::default(), 1);
        assert!(report.contains("| pMSE | 0.125000 |"));
        assert!(report.contains("| statistic | real_data |"));
        assert!(report.contains("| a<b | 1.2346 |"));
        assert!(report.contains("_1 of 2 rows shown_"));
        assert!(report.contains("- x_figure: 2x1 PNG"));
        assert!(report.contains("- pca_evaluation: disabled by configuration"));
    }

    #[test]
    fn html_embeds_images_and_escapes_text() {
        let html = render_html(&bundle(), 20);
        assert!(html.contains("src=\"data:image/png;base64,AAAA\""));
        assert!(html.contains("<td>a&lt;b</td>"));
        assert!(html.contains("<td>NaN</td>"));
        assert!(html.contains("<p>pMSE: 0.125000</p>"));
        assert!(html.contains("<p class=\"skipped\">skipped: disabled by configuration</p>"));
    }
}
