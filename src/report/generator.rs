//! Report generation.
//!
//! This module renders the contradictions of a session as a Markdown or
//! JSON report.

use crate::analysis::{average_confidence, group_by_pair, most_conflicted_documents};
use crate::models::{ContradictionRecord, ContradictionSummary, Report, ReportMetadata, Severity};
use anyhow::Result;

/// Markdown rendering options.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownOptions {
    /// Include the conflicting sentences for every contradiction.
    pub include_sentences: bool,
    /// Rows in the most-conflicted documents table.
    pub top_documents: usize,
}

impl From<&crate::config::ReportConfig> for MarkdownOptions {
    fn from(config: &crate::config::ReportConfig) -> Self {
        Self {
            include_sentences: config.include_sentences,
            top_documents: config.top_documents,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: MarkdownOptions) -> String {
    let mut output = String::new();

    output.push_str("# Document Contradiction Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(
        &report.summary,
        &report.contradictions,
        options.top_documents,
    ));
    output.push_str(&generate_contradictions_section(
        &report.contradictions,
        options.include_sentences,
    ));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Server:** {}\n", metadata.server_url));
    if let Some(ref session_id) = metadata.session_id {
        section.push_str(&format!("- **Session:** `{}`\n", session_id));
    }
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Documents:** {} ({})\n",
        metadata.documents.len(),
        metadata.documents.join(", ")
    ));
    section.push_str(&format!("- **Final Status:** {}\n", metadata.final_status));
    section.push_str(&format!(
        "- **Contradictions Received:** {}\n",
        metadata.total_received
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    if !metadata.complete {
        section.push_str(
            "> ⚠️ The analysis did not finish. This report only contains the contradictions received before the stream ended.\n\n",
        );
    }

    section
}

/// Generate the summary section.
fn generate_summary_section(
    summary: &ContradictionSummary,
    records: &[ContradictionRecord],
    top_documents: usize,
) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    section.push_str("### Severity Breakdown\n\n");
    section.push_str(&format!(
        "| {} High | {} Medium | {} Low | **Total** |\n",
        Severity::High.emoji(),
        Severity::Medium.emoji(),
        Severity::Low.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        summary.high, summary.medium, summary.low, summary.total
    ));

    if let Some(avg) = average_confidence(records) {
        section.push_str(&format!("Average confidence: **{:.1}%**\n\n", avg));
    }

    if !summary.by_pair.is_empty() {
        section.push_str("### Contradictions by Document Pair\n\n");
        section.push_str("| Documents | Count |\n");
        section.push_str("|:---|:---:|\n");

        let mut pairs: Vec<_> = summary.by_pair.iter().collect();
        pairs.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (pair, count) in pairs {
            section.push_str(&format!("| {} | {} |\n", pair, count));
        }
        section.push('\n');
    }

    let conflicted = most_conflicted_documents(records, top_documents);
    if !conflicted.is_empty() {
        section.push_str("### Most Conflicted Documents\n\n");
        section.push_str("| Document | Contradictions |\n");
        section.push_str("|:---|:---:|\n");

        for (document, count) in conflicted {
            section.push_str(&format!("| `{}` | {} |\n", document, count));
        }
        section.push('\n');
    }

    section
}

/// Generate the contradictions section, grouped by document pair.
fn generate_contradictions_section(records: &[ContradictionRecord], include_sentences: bool) -> String {
    let mut section = String::new();

    section.push_str("## Contradictions\n\n");

    if records.is_empty() {
        section.push_str("No contradictions were found between the documents.\n\n");
        return section;
    }

    for (pair, group) in group_by_pair(records) {
        section.push_str(&format!("### {}\n\n", pair));
        for record in group {
            section.push_str(&generate_contradiction_block(record, include_sentences));
        }
    }

    section
}

/// Generate a single contradiction block.
fn generate_contradiction_block(record: &ContradictionRecord, include_sentences: bool) -> String {
    let mut block = String::new();

    let severity_badge = match record.severity {
        Severity::High => "🔴 **HIGH**",
        Severity::Medium => "🟡 **MEDIUM**",
        Severity::Low => "🟢 **LOW**",
    };

    block.push_str(&format!(
        "#### {} confidence {:.1}% | similarity {:.3}\n\n",
        severity_badge, record.confidence, record.similarity
    ));

    if include_sentences {
        block.push_str(&format!("> **{}:** {}\n>\n", record.doc1, record.sentence1));
        block.push_str(&format!("> **{}:** {}\n\n", record.doc2, record.sentence2));
    }

    block.push_str("---\n\n");

    block
}

/// Generate the footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Generated by DocChecker. Contradictions are detected automatically ");
    footer.push_str("and should be reviewed by a person before acting on them.*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn options() -> MarkdownOptions {
        MarkdownOptions::from(&crate::config::ReportConfig::default())
    }

    fn create_test_record(severity: Severity) -> ContradictionRecord {
        ContradictionRecord {
            doc1: "policy.pdf".to_string(),
            doc2: "handbook.docx".to_string(),
            sentence1: "Employees may work remotely.".to_string(),
            sentence2: "Remote work is not permitted.".to_string(),
            severity,
            confidence: 92.0,
            similarity: 0.81,
        }
    }

    fn create_test_metadata(complete: bool) -> ReportMetadata {
        ReportMetadata {
            server_url: "http://localhost:8000".to_string(),
            session_id: Some("abc".to_string()),
            analysis_date: Utc::now(),
            documents: vec!["policy.pdf".to_string(), "handbook.docx".to_string()],
            final_status: if complete { "Done" } else { "WebSocket error" }.to_string(),
            complete,
            total_received: 1,
            duration_seconds: 12.5,
        }
    }

    fn create_test_report(complete: bool) -> Report {
        let contradictions = vec![create_test_record(Severity::High)];
        Report {
            metadata: create_test_metadata(complete),
            summary: ContradictionSummary::from_records(&contradictions),
            contradictions,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(true);
        let markdown = generate_markdown_report(&report, options());

        assert!(markdown.contains("# Document Contradiction Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("## Contradictions"));
        assert!(markdown.contains("### policy.pdf ↔ handbook.docx"));
        assert!(markdown.contains("Remote work is not permitted."));
        assert!(markdown.contains("Average confidence: **92.0%**"));
        assert!(!markdown.contains("did not finish"));
    }

    #[test]
    fn test_incomplete_report_is_flagged() {
        let report = create_test_report(false);
        let markdown = generate_markdown_report(&report, options());

        assert!(markdown.contains("did not finish"));
        assert!(markdown.contains("WebSocket error"));
    }

    #[test]
    fn test_sentences_can_be_omitted() {
        let report = create_test_report(true);
        let markdown = generate_markdown_report(
            &report,
            MarkdownOptions {
                include_sentences: false,
                top_documents: 5,
            },
        );

        assert!(!markdown.contains("Remote work is not permitted."));
        assert!(markdown.contains("🔴 **HIGH**"));
    }

    #[test]
    fn test_empty_report() {
        let report = Report {
            metadata: create_test_metadata(true),
            contradictions: vec![],
            summary: ContradictionSummary::default(),
        };
        let markdown = generate_markdown_report(&report, options());

        assert!(markdown.contains("No contradictions were found"));
        assert!(!markdown.contains("Most Conflicted Documents"));
    }

    #[test]
    fn test_generate_contradiction_block() {
        let block = generate_contradiction_block(&create_test_record(Severity::Medium), true);

        assert!(block.contains("MEDIUM"));
        assert!(block.contains("92.0%"));
        assert!(block.contains("0.810"));
        assert!(block.contains("**policy.pdf:** Employees may work remotely."));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(true);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"session_id\": \"abc\""));
        assert!(json.contains("\"contradictions\""));
        assert!(json.contains("\"severity\": \"High\""));
    }
}
