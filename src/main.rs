// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use broker_import::pipeline::ParserDispatch;
use broker_import::utils::logging::{
    format_count, format_error, format_info, format_success, format_warning,
};
use broker_import::{
    BrokerStore, BrokerValidator, CandidateFile, Config, ImportPipeline, JsonBrokerStore,
    PipelineResult, RecordValidator, Validator,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "broker-import")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Import scraped broker reviews into a normalized broker store", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full import over the source directory
    Import(ImportArgs),

    /// List the files an import would process, batch by batch
    Discover,

    /// Parse and validate a single file without importing it
    Check {
        file: PathBuf,
    },

    /// Show what the broker store currently holds
    Stats,
}

#[derive(Args, Debug, Default)]
struct ImportArgs {
    #[arg(short, long, value_name = "DIR")]
    source: Option<PathBuf>,

    /// Replaces the configured patterns; repeat for several
    #[arg(short, long = "pattern", value_name = "GLOB")]
    patterns: Vec<String>,

    #[arg(long, value_name = "NUM")]
    batch_size: Option<usize>,

    #[arg(long, value_name = "NUM")]
    max_retries: Option<u32>,

    #[arg(long)]
    strict: bool,

    #[arg(long)]
    no_skip_existing: bool,

    #[arg(long)]
    no_log: bool,

    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl ImportArgs {
    fn apply(self, config: &mut Config) {
        let pipeline = &mut config.pipeline;
        if let Some(source) = self.source {
            pipeline.source_directory = source;
        }
        if !self.patterns.is_empty() {
            pipeline.file_patterns = self.patterns;
        }
        if let Some(batch_size) = self.batch_size {
            pipeline.batch_size = batch_size;
        }
        if let Some(max_retries) = self.max_retries {
            pipeline.max_retries = max_retries;
        }
        if self.strict {
            pipeline.validation_strict = true;
        }
        if self.no_skip_existing {
            pipeline.skip_existing = false;
        }
        if self.no_log {
            pipeline.enable_logging = false;
        }
        if self.log_file.is_some() {
            config.output.log_export_path = self.log_file;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    broker_import::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("Loading configuration from: {}", cli.config.display());

    let mut config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Import(args) => {
            args.apply(&mut config);
            config.validate().context("Invalid import settings")?;
            cmd_import(&config, cli.color).await?;
        }
        Commands::Discover => {
            cmd_discover(&config)?;
        }
        Commands::Check { file } => {
            cmd_check(file).await?;
        }
        Commands::Stats => {
            cmd_stats(&config).await?;
        }
    }

    Ok(())
}

async fn open_store(config: &Config) -> Result<Arc<JsonBrokerStore>> {
    let store = JsonBrokerStore::open(&config.store.path)
        .await
        .with_context(|| format!("Failed to open broker store {}", config.store.path.display()))?;
    Ok(Arc::new(store))
}

async fn cmd_import(config: &Config, color: bool) -> Result<()> {
    info!(
        "Importing from {} into {}",
        config.pipeline.source_directory.display(),
        config.store.path.display()
    );

    let store = open_store(config).await?;
    let pipeline = ImportPipeline::new(config.pipeline.clone(), store)?
        .with_progress(true, color && config.output.colored);

    let run = pipeline.run().await;

    if let Some(path) = &config.output.log_export_path {
        if run.log.is_enabled() {
            run.log
                .export(path)
                .await
                .with_context(|| format!("Failed to export log to {}", path.display()))?;
            println!("{}", format_info(&format!("Log written to {}", path.display())));
        }
    }

    print_summary(&run.result);

    if !run.result.success {
        anyhow::bail!("Import finished without importing any broker");
    }

    Ok(())
}

fn print_summary(result: &PipelineResult) {
    println!();
    let headline = format!(
        "Imported {} brokers from {} files in {:.2}s",
        result.imported_brokers,
        result.processed_files,
        result.processing_time as f64 / 1000.0
    );
    if result.success {
        println!("{}", format_success(&headline));
    } else {
        println!("{}", format_error(&headline));
    }

    println!("{}", format_count("discovered files", result.discovered_files));
    println!("{}", format_count("processed files", result.processed_files));
    println!("{}", format_count("failed files", result.failed_files));
    println!("{}", format_count("skipped files", result.skipped_files));
    println!("  {:<20} {:.1}%", "success rate", result.success_rate());

    if !result.stats.is_empty() {
        println!();
        println!("{}", format_info("Imported entities"));
        for (label, count) in result.stats.entries() {
            if count > 0 {
                println!("{}", format_count(label, count));
            }
        }
    }

    if !result.warnings.is_empty() {
        println!();
        println!(
            "{}",
            format_warning(&format!("{} warnings", result.warnings.len()))
        );
        for warning in &result.warnings {
            println!("  - {}", Validator::truncate_text(warning, 160));
        }
    }

    if !result.errors.is_empty() {
        println!();
        println!("{}", format_error(&format!("{} errors", result.errors.len())));
        for error in &result.errors {
            println!("  - {}", Validator::truncate_text(error, 160));
        }
    }
}

fn cmd_discover(config: &Config) -> Result<()> {
    let store = Arc::new(JsonBrokerStore::in_memory());
    let pipeline = ImportPipeline::new(config.pipeline.clone(), store)?;
    let plan = pipeline.plan();

    for warning in &plan.discovery.warnings {
        println!("{}", format_warning(warning));
    }

    let total = plan.batches.len();
    for (index, batch) in plan.batches.iter().enumerate() {
        println!(
            "{}",
            broker_import::utils::logging::format_batch(
                index + 1,
                total,
                &format!("{} files", batch.len())
            )
        );
        for file in batch {
            let kind = file.kind.map(|k| k.as_str()).unwrap_or("unsupported");
            println!("  {:<8} {}", kind, file.path.display());
        }
    }

    println!(
        "{}",
        format_info(&format!(
            "{} files in {} batches",
            plan.discovery.files.len(),
            total
        ))
    );
    Ok(())
}

async fn cmd_check(path: PathBuf) -> Result<()> {
    let file = CandidateFile::new(path);
    let content = tokio::fs::read_to_string(&file.path)
        .await
        .with_context(|| format!("Failed to read {}", file.path.display()))?;
    Validator::validate_content_not_empty(&content)?;

    let records = ParserDispatch::default().dispatch(&file, &content)?;
    let validator = BrokerValidator::new();

    println!(
        "{}",
        format_info(&format!("{}: {} brokers", file.file_name(), records.len()))
    );

    for record in &records {
        let outcome = validator.validate(record);
        let name = record.display_name().unwrap_or("<unnamed>");

        if outcome.is_valid {
            println!("{}", format_success(name));
        } else {
            println!("{}", format_error(name));
        }
        for error in &outcome.errors {
            println!("  error: {}", error);
        }
        for warning in &outcome.warnings {
            println!("  warning: {}", warning);
        }

        println!("{}", serde_json::to_string_pretty(record)?);
    }

    Ok(())
}

async fn cmd_stats(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let summary = store.summary().await?;

    println!(
        "{}",
        format_info(&format!("Broker store {}", config.store.path.display()))
    );
    println!("{}", format_count("brokers", summary.brokers));
    for (label, count) in summary.stats.entries() {
        println!("{}", format_count(label, count));
    }

    Ok(())
}
