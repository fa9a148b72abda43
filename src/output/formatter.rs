//! Console, JSON and Markdown renderings of a ranking report

use crate::config::OutputFormat;
use crate::error::{Result, RankerError};
use crate::output::report::{RankedEntry, RankingReport};
use crate::processing::document::MatchTier;
use colored::{Color, Colorize};
use std::path::Path;

/// Which slice of the ranking to render
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}

pub trait OutputFormatter {
    fn format_report(&self, report: &RankingReport, page: PageRequest) -> Result<String>;
}

pub struct ConsoleFormatter {
    use_colors: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

fn tier_color(tier: MatchTier) -> Color {
    match tier {
        MatchTier::High => Color::Green,
        MatchTier::Good => Color::BrightGreen,
        MatchTier::Medium => Color::Yellow,
        MatchTier::Low => Color::Red,
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{} {}\n", "█".blue().bold(), title.blue().bold())
        } else {
            format!("\n█ {}\n", title)
        }
    }

    fn format_tier_badge(&self, tier: MatchTier) -> String {
        let badge = format!("[{}]", tier.to_string().to_uppercase());
        if self.use_colors {
            badge.color(tier_color(tier)).bold().to_string()
        } else {
            badge
        }
    }

    fn format_entry(&self, entry: &RankedEntry) -> String {
        let mut line = format!(
            "{:>3}. {} {} {}",
            entry.rank,
            self.colorize(&format!("{:>6}", entry.display_score()), tier_color(entry.tier)),
            self.format_tier_badge(entry.tier),
            entry.candidate_name
        );
        if entry.candidate_name != entry.display_name {
            line.push_str(&self.colorize(&format!(" ({})", entry.display_name), Color::BrightBlack));
        }
        line.push('\n');
        line
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &RankingReport, page: PageRequest) -> Result<String> {
        let mut output = String::new();
        let metadata = &report.metadata;

        output.push_str(&self.format_header(&format!("RESUME RANKING: {}", metadata.job_role)));
        output.push_str(&format!(
            "Generated: {} | Model: {} ({}d) | Processing time: {}ms\n",
            metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            metadata.model_name,
            metadata.embedding_dimension,
            metadata.processing_time_ms
        ));
        output.push_str(&format!(
            "Ranked {} of {} resumes\n",
            metadata.resumes_ranked, metadata.resumes_submitted
        ));
        output.push_str(&format!("{}\n", report.tier_summary()));

        let total_pages = report.total_pages(page.per_page);
        let current = page.page.clamp(1, total_pages);
        output.push_str(&self.format_header(&format!("Results (page {} of {})", current, total_pages)));

        let entries = report.page(current, page.per_page);
        if entries.is_empty() {
            output.push_str("No resumes to show.\n");
        }
        for entry in entries {
            output.push_str(&self.format_entry(entry));
        }

        if !report.failures.is_empty() {
            output.push_str(&self.format_header("Skipped"));
            for failure in &report.failures {
                output.push_str(&format!(
                    "  • {} {}\n",
                    failure.display_name,
                    self.colorize(&format!("({})", failure.reason), Color::BrightBlack)
                ));
            }
        }

        Ok(output)
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    /// The full ranking is always emitted; paging only applies to human-readable output
    fn format_report(&self, report: &RankingReport, _page: PageRequest) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn escape_cell(text: &str) -> String {
        text.replace('|', "\\|")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &RankingReport, page: PageRequest) -> Result<String> {
        let mut output = String::new();
        let metadata = &report.metadata;

        output.push_str(&format!("# Resume Ranking: {}\n\n", metadata.job_role));

        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Model:** `{}` | **Processing Time:** {}ms\n\n",
                metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                metadata.model_name,
                metadata.processing_time_ms
            ));
            output.push_str(&format!(
                "**Ranked:** {} of {} resumes\n\n",
                metadata.resumes_ranked, metadata.resumes_submitted
            ));
            output.push_str(&format!("**Tiers:** {}\n\n", report.tier_summary()));
        }

        let total_pages = report.total_pages(page.per_page);
        let current = page.page.clamp(1, total_pages);
        if total_pages > 1 {
            output.push_str(&format!("## Results (page {} of {})\n\n", current, total_pages));
        } else {
            output.push_str("## Results\n\n");
        }

        output.push_str("| Rank | Candidate | File | Score | Match |\n");
        output.push_str("|-----:|-----------|------|------:|-------|\n");
        for entry in report.page(current, page.per_page) {
            output.push_str(&format!(
                "| {} | {} | `{}` | {} | {} |\n",
                entry.rank,
                Self::escape_cell(&entry.candidate_name),
                Self::escape_cell(&entry.display_name),
                entry.display_score(),
                entry.tier
            ));
        }

        if !report.failures.is_empty() {
            output.push_str("\n## Skipped Resumes\n\n");
            for failure in &report.failures {
                output.push_str(&format!("- `{}`: {}\n", failure.display_name, failure.reason));
            }
        }

        Ok(output)
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, true, true)
    }

    pub fn with_options(use_colors: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    pub fn generate_report(&self, report: &RankingReport, format: OutputFormat, page: PageRequest) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report, page),
            OutputFormat::Json => self.json_formatter.format_report(report, page),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report, page),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(file_path, content)
        .map_err(|e| RankerError::OutputFormatting(format!("cannot write {}: {}", file_path.display(), e)))
}

/// Pick an output format from a file extension, falling back to the given default
pub fn format_for_path(path: &Path, fallback: OutputFormat) -> OutputFormat {
    match path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase).as_deref() {
        Some("json") => OutputFormat::Json,
        Some("md") | Some("markdown") => OutputFormat::Markdown,
        Some("txt") => OutputFormat::Console,
        _ => fallback,
    }
}
