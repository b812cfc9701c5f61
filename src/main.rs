use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use question_explorer::clients::{OpenAiQuestionGenerator, PerplexityClient};
use question_explorer::config::{find_config_file, load_config, load_env_config, Config};
use question_explorer::explorer::{throttle_from_config, Explorer};
use question_explorer::models::History;
use question_explorer::transcript::TranscriptWriter;
use question_explorer::utils::HttpClient;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Question Explorer - expand a question into a researched tree of follow-up questions
#[derive(Parser, Debug)]
#[command(name = "question-explorer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Expand a question into a researched tree of follow-up questions", long_about = None)]
struct Cli {
    /// The seed question ("-" or omitted reads it from stdin)
    #[arg(value_name = "QUESTION", conflicts_with = "file")]
    question: Option<String>,

    /// Read the seed question from a file
    #[arg(long, short)]
    file: Option<PathBuf>,

    /// Maximum depth of the question tree (root is depth 0)
    #[arg(long, short)]
    depth: Option<usize>,

    /// Transcript file to append to
    #[arg(long, short)]
    transcript: Option<PathBuf>,

    /// Output format for the combined transcript
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Plain)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Related Question / Research / Citations blocks
    Plain,
    /// JSON array of answers
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("question_explorer={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = resolve_config(&cli)?;

    if cli.print_config {
        println!("{}", redacted_toml(&config)?);
        return Ok(());
    }

    let question = read_question(&cli)?;

    // Returned errors are reported once, by the anyhow handler.
    run(&config, question, cli.output).await
}

/// Load configuration and apply command-line overrides
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else {
        load_env_config().context("Failed to read configuration from environment")?
    };

    if let Some(depth) = cli.depth {
        config.exploration.depth = depth;
    }
    if let Some(path) = &cli.transcript {
        config.transcript.path = path.clone();
    }

    config.validate()?;
    Ok(config)
}

fn read_question(cli: &Cli) -> Result<String> {
    let question = match (&cli.question, &cli.file) {
        (_, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read question file {}", path.display()))?,
        (Some(question), None) if question != "-" => question.clone(),
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read question from stdin")?;
            buffer
        }
    };

    if question.trim().is_empty() {
        bail!("The seed question must not be empty");
    }
    Ok(question)
}

async fn run(config: &Config, question: String, output: OutputFormat) -> Result<()> {
    let http = HttpClient::from_config(&config.http)?;
    let researcher = PerplexityClient::from_config(http.clone(), config)?;
    let generator = OpenAiQuestionGenerator::from_config(http, config)?;
    let transcript = TranscriptWriter::new(&config.transcript.path);

    tracing::info!(
        depth = config.exploration.depth,
        transcript = %transcript.path().display(),
        "Starting exploration"
    );

    let explorer = Explorer::new(
        question,
        config.exploration.depth,
        Arc::new(researcher),
        Arc::new(generator),
        Arc::new(transcript),
    )
    .with_throttle(throttle_from_config(&config.exploration));

    let history = explorer.run().await?;
    tracing::info!(entries = history.len(), "Exploration finished");

    print_history(&history, output)
}

fn print_history(history: &History, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Plain => println!("{}", history.render_combined()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(history)?),
    }
    Ok(())
}

/// Render the configuration as TOML with API keys masked
fn redacted_toml(config: &Config) -> Result<String> {
    let mut config = config.clone();
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("********".to_string());
        }
    };
    mask(&mut config.api_keys.perplexity);
    mask(&mut config.api_keys.openai);

    Ok(toml::to_string_pretty(&config)?)
}
