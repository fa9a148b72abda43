//! Resume ranker: rank resumes against a job description by semantic similarity

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use resume_ranker::cli::{self, Cli, Commands, ConfigAction, ModelAction};
use resume_ranker::config::{Config, OutputFormat};
use resume_ranker::error::{RankerError, Result};
use resume_ranker::input::{collect_resume_paths, InputManager};
use resume_ranker::output::formatter::{format_for_path, save_report_to_file, PageRequest, ReportGenerator};
use resume_ranker::output::RankingReport;
use resume_ranker::pipeline::{PipelineEvent, ProgressReporter, RankingPipeline, RankingRequest};
use resume_ranker::processing::document::JobSpec;
use resume_ranker::processing::embedding_manager::{global_registry, HubModelSource};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Resolution of the progress bar
const PROGRESS_TICKS: u64 = 1000;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("{} {}", "error:".red().bold(), e);
            process::exit(1);
        }
    };

    if !config.output.color_output {
        colored::control::set_override(false);
    }

    if let Err(e) = run_command(cli.command, config, cli.config).await {
        error!("Command failed: {}", e);
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Rank {
            role,
            description,
            description_file,
            resumes,
            model,
            output,
            save,
            page,
        } => {
            let description = match (description, description_file) {
                (Some(text), _) => text,
                (None, Some(path)) => InputManager::new().with_cache(false).extract_text(&path).await?,
                (None, None) => {
                    return Err(RankerError::InvalidInput(
                        "a job description is required".to_string(),
                    ))
                }
            };
            let job = JobSpec::new(role, description);
            job.validate()?;

            let output_format = match output {
                Some(format) => cli::parse_output_format(&format).map_err(RankerError::InvalidInput)?,
                None => config.output.format,
            };

            let inputs = collect_resume_paths(&resumes, &config.processing.supported_extensions)?;
            info!("Ranking {} resumes for role '{}'", inputs.len(), job.role);

            let mut request = RankingRequest::from_config(job.clone(), inputs, &config);
            if let Some(model) = model {
                request = request.with_model(model);
            }

            let outcome = run_with_progress_bar(request).await?;
            let report = RankingReport::from_outcome(&job, &outcome);

            let page_request = PageRequest {
                page,
                per_page: config.output.results_per_page,
            };
            let generator = ReportGenerator::with_options(config.output.color_output, true, true);
            let rendered = generator.generate_report(&report, output_format, page_request)?;
            println!("{}", rendered);

            if let Some(save_path) = save {
                let save_format = format_for_path(&save_path, output_format);
                let plain = ReportGenerator::with_options(false, true, true);
                // Saved files get every entry on one page
                let all = PageRequest {
                    page: 1,
                    per_page: report.entries.len().max(1),
                };
                let content = plain.generate_report(&report, save_format, all)?;
                save_report_to_file(&content, &save_path)?;
                println!("💾 Report saved to {}", save_path.display());
            }
        }

        Commands::Models { action } => {
            let registry = global_registry();
            let models_dir = config.models_dir().clone();

            match action {
                ModelAction::List => {
                    let cached = registry.list_cached_models(&models_dir).await?;

                    println!("🧠 Embedding Models\n");
                    for (id, model) in registry.catalog().list_available_models() {
                        let status = if cached.iter().any(|c| c == id) {
                            "✅ Downloaded".green().to_string()
                        } else {
                            "⬇️  Available".to_string()
                        };
                        let default_marker = if id == config.models.default_embedding_model {
                            " (default)"
                        } else {
                            ""
                        };
                        println!(
                            "  • {}{} - {} ({} MB, {}d) [{}]",
                            id, default_marker, model.repo_id, model.size_mb, model.dimensions, status
                        );
                        println!("    {}", model.description);
                    }

                    let custom: Vec<_> = cached
                        .iter()
                        .filter(|id| registry.catalog().get_model_info(id).is_none())
                        .collect();
                    if !custom.is_empty() {
                        println!("\n📦 Other downloaded models:");
                        for id in custom {
                            println!("  • {}", id.replacen("--", "/", 1));
                        }
                    }
                    println!("\n📁 Models directory: {}", models_dir.display());
                }

                ModelAction::Download { model, force } => {
                    if registry.is_model_cached(&model, &models_dir).await? {
                        if !force {
                            println!("✅ Model '{}' is already downloaded!", model);
                            println!("💡 Use --force to re-download");
                            return Ok(());
                        }
                        registry.remove_model(&model, &models_dir).await?;
                    }

                    let bar = progress_bar();
                    let reporter = bar_reporter(bar.clone());
                    let handle = registry.ensure_model(&model, &models_dir, &reporter).await;
                    bar.finish_and_clear();

                    let handle = handle?;
                    println!(
                        "✅ Model '{}' ready ({} dimensions)",
                        handle.model_name(),
                        handle.dimension()
                    );
                    println!("📁 Location: {}", registry.model_dir(&model, &models_dir)?.display());
                }

                ModelAction::Remove { model } => {
                    if registry.remove_model(&model, &models_dir).await? {
                        println!("✅ Model '{}' removed successfully!", model);
                    } else {
                        println!("⚠️  Model '{}' is not downloaded", model);
                    }
                }

                ModelAction::Info { model } => {
                    let resolved = registry.catalog().resolve(&model)?;
                    let info = &resolved.info;
                    let downloaded = registry.is_model_cached(&model, &models_dir).await?;

                    println!("📋 Model Information for '{}'\n", model);
                    println!("Name: {}", info.name);
                    println!("Repository: {}", info.repo_id);
                    println!("Type: {:?}", info.model_type);
                    if info.size_mb > 0 {
                        println!("Size: {} MB", info.size_mb);
                    }
                    if info.dimensions > 0 {
                        println!("Dimensions: {}", info.dimensions);
                    }
                    println!("Description: {}", info.description);
                    println!(
                        "Status: {}",
                        if downloaded { "✅ Downloaded" } else { "⬇️  Available for download" }
                    );
                    if downloaded {
                        println!("Location: {}", models_dir.join(&resolved.id).display());
                    } else {
                        println!("\n💡 To download this model, run:");
                        println!("   resume-ranker models download {}", model);
                    }
                }
            }
        }

        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);

            match action {
                Some(ConfigAction::Show) | None => {
                    println!("⚙️  Current Configuration\n");
                    println!("Models Directory: {}", config.models_dir().display());
                    println!("Default Embedding Model: {}", config.models.default_embedding_model);
                    println!("Batch Size: {}", config.processing.batch_size);
                    println!("Supported Extensions: {}", config.processing.supported_extensions.join(", "));
                    println!("Output Format: {}", format_name(config.output.format));
                    println!("Color Output: {}", config.output.color_output);
                    println!("Results Per Page: {}", config.output.results_per_page);
                }

                Some(ConfigAction::Reset) => {
                    Config::default().save_to(&path)?;
                    println!("✅ Configuration reset to defaults at {}", path.display());
                }

                Some(ConfigAction::Path) => {
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}

/// Run the pipeline on a background task and drive a progress bar from its events
async fn run_with_progress_bar(request: RankingRequest) -> Result<resume_ranker::pipeline::RankingOutcome> {
    let pipeline = Arc::new(RankingPipeline::<HubModelSource>::default());
    let mut handle = pipeline.spawn(request);
    let bar = progress_bar();

    while let Some(event) = handle.next_event().await {
        match event {
            PipelineEvent::Progress { fraction, message } => {
                bar.set_position((fraction * PROGRESS_TICKS as f32).round() as u64);
                bar.set_message(message);
            }
            PipelineEvent::Completed(outcome) => {
                bar.finish_and_clear();
                for failure in &outcome.failures {
                    eprintln!(
                        "{} skipped {}: {}",
                        "warning:".yellow().bold(),
                        failure.display_name,
                        failure.reason
                    );
                }
                return Ok(outcome);
            }
            PipelineEvent::Failed(err) => {
                bar.abandon();
                return Err(err);
            }
        }
    }

    bar.abandon();
    Err(RankerError::Interrupted("ranking stopped before completing".to_string()))
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(PROGRESS_TICKS);
    let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    bar.set_style(style);
    bar
}

fn bar_reporter(bar: ProgressBar) -> ProgressReporter {
    ProgressReporter::new(move |fraction, message: &str| {
        bar.set_position((fraction * PROGRESS_TICKS as f32).round() as u64);
        bar.set_message(message.to_string());
    })
}

fn format_name(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Console => "console",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "markdown",
    }
}
