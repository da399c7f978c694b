//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of harvest runs,
//! including the stop reason, per-category counts, faults, and the accepted
//! documents.

use crate::output::summary::{HarvestSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary of a harvest run
///
/// # Arguments
///
/// * `summary` - The harvest summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &HarvestSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a harvest summary as markdown
pub fn format_markdown_summary(summary: &HarvestSummary) -> String {
    let mut md = String::new();

    md.push_str("# Hub-Harvester Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!(
        "- **Stop Reason**: {}\n",
        summary.stop_reason.as_deref().unwrap_or("aborted")
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Documents**: {}\n", summary.documents.len()));
    md.push_str(&format!("- **Native**: {}\n", summary.native_documents()));
    md.push_str(&format!("- **File**: {}\n", summary.file_documents()));
    md.push_str(&format!("- **Abandoned Categories**: {}\n\n", summary.faults.len()));

    let by_category = summary.documents_by_category();
    if !by_category.is_empty() {
        md.push_str("## Documents by Category\n\n");
        md.push_str("| Category | Documents |\n");
        md.push_str("|----------|-----------|\n");
        for (category, count) in &by_category {
            md.push_str(&format!("| {} | {} |\n", escape_cell(category), count));
        }
        md.push('\n');
    }

    if !summary.faults.is_empty() {
        md.push_str("## Faults\n\n");
        md.push_str("| Category | Kind | URL | Message |\n");
        md.push_str("|----------|------|-----|---------|\n");
        for fault in &summary.faults {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                escape_cell(&fault.category),
                fault.kind,
                fault.url,
                escape_cell(&fault.message)
            ));
        }
        md.push('\n');
    }

    if !summary.documents.is_empty() {
        md.push_str("## Documents\n\n");
        md.push_str("| # | Title | Category | Published | Link |\n");
        md.push_str("|---|-------|----------|-----------|------|\n");
        for (position, doc) in summary.documents.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                position + 1,
                escape_cell(&doc.title),
                escape_cell(doc.category().unwrap_or("")),
                doc.pub_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                doc.web_link
            ));
        }
        md.push('\n');
    }

    md
}

/// Keeps table cells on one line and escapes column separators
fn escape_cell(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}
