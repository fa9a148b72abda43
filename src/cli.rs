//! CLI interface for the resume ranker

use crate::config::OutputFormat;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resume-ranker")]
#[command(about = "Rank resumes against a job description by semantic similarity")]
#[command(long_about = "Extract text from PDF, Markdown and plain-text resumes, embed them with a local static embedding model and rank them by cosine similarity to a job description")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank resumes against a job description
    #[command(group(ArgGroup::new("job_text").required(true).args(["description", "description_file"])))]
    Rank {
        /// Job role title
        #[arg(short, long)]
        role: String,

        /// Job description text
        #[arg(short, long)]
        description: Option<String>,

        /// Read the job description from a file (TXT, MD, PDF)
        #[arg(long)]
        description_file: Option<PathBuf>,

        /// Resume files or directories containing resumes
        #[arg(long = "resumes", required = true, num_args = 1..)]
        resumes: Vec<PathBuf>,

        /// Embedding model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Results page to show
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Model management commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available and downloaded models
    List,

    /// Download a model
    Download {
        /// Model name or Hugging Face repo ID
        model: String,

        /// Force re-download if model exists
        #[arg(short, long)]
        force: bool,
    },

    /// Remove a downloaded model
    Remove {
        /// Model name to remove
        model: String,
    },

    /// Show model information
    Info {
        /// Model name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown",
            format
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_rank_arguments() {
        let cli = Cli::try_parse_from([
            "resume-ranker",
            "rank",
            "--role",
            "Data Engineer",
            "--description",
            "Spark and Airflow",
            "--resumes",
            "a.pdf",
            "cvs/",
            "--page",
            "2",
        ])
        .unwrap();

        match cli.command {
            Commands::Rank { role, resumes, page, description, .. } => {
                assert_eq!(role, "Data Engineer");
                assert_eq!(description.as_deref(), Some("Spark and Airflow"));
                assert_eq!(resumes, vec![PathBuf::from("a.pdf"), PathBuf::from("cvs/")]);
                assert_eq!(page, 2);
            }
            _ => panic!("expected rank command"),
        }
    }

    #[test]
    fn test_rank_requires_a_description() {
        let result = Cli::try_parse_from(["resume-ranker", "rank", "--role", "x", "--resumes", "a.pdf"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("MD"), Ok(OutputFormat::Markdown));
        assert_eq!(parse_output_format("json"), Ok(OutputFormat::Json));
        assert!(parse_output_format("html").is_err());
    }
}
