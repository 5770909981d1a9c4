// Wistro Coder: Main Entry Point
// Command-line front end for the script agent and the workflow steps

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wistro_coder::steps::vision_evaluate::DEFAULT_PROMPT;
use wistro_coder::vision::DEFAULT_IMAGE_PATH;
use wistro_coder::{
    ComplexityReport, ImageFetcher, ScriptAgent, Settings, Step, StepEvent, VisionEvaluateStep,
    VisionModel, WistroGenerateStep,
};

#[derive(Parser)]
#[command(name = "wistro-coder", version, about = "Generate event-driven step scripts with an LLM")]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a step script from a task description
    Generate {
        #[arg(short, long)]
        task: String,

        #[arg(short, long, default_value = "python")]
        language: String,

        /// Overrides the provider from settings
        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        input_event: Option<String>,

        #[arg(long)]
        output_event: Option<String>,

        #[arg(long)]
        workflow: Option<String>,

        /// Write the script here instead of stdout; a directory gets `<name>.<ext>`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the complexity breakdown of a file (or stdin)
    Score { file: Option<PathBuf> },
    /// Download an image and ask the vision model about it
    EvaluateImage {
        #[arg(long)]
        url: String,

        #[arg(long)]
        prompt: Option<String>,

        #[arg(long, default_value = DEFAULT_IMAGE_PATH)]
        save_path: PathBuf,
    },
    /// Run a workflow step once and print the events it emits
    RunStep {
        #[arg(value_enum)]
        step: StepKind,

        /// Event payload as JSON
        #[arg(long)]
        input: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StepKind {
    Wistro,
    Vision,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("wistro_coder=debug")
    } else {
        EnvFilter::new("wistro_coder=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            task,
            language,
            provider,
            input_event,
            output_event,
            workflow,
            output,
        } => {
            if let Some(provider) = provider {
                settings.provider = provider;
            }
            if let Some(event) = input_event {
                settings.input_event = event;
            }
            if let Some(event) = output_event {
                settings.output_event = event;
            }
            if let Some(workflow) = workflow {
                settings.workflow = workflow;
            }
            cmd_generate(&settings, &task, &language, output.as_deref()).await
        }
        Commands::Score { file } => cmd_score(file.as_deref()),
        Commands::EvaluateImage {
            url,
            prompt,
            save_path,
        } => cmd_evaluate_image(&settings, &url, prompt.as_deref(), &save_path).await,
        Commands::RunStep { step, input } => cmd_run_step(&settings, step, input.as_deref()).await,
    }
}

async fn cmd_generate(
    settings: &Settings,
    task: &str,
    language: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let agent = ScriptAgent::from_config(settings.provider_config()?);
    let request = settings.script_request(task, language);
    let report = agent.generate_report(&request).await?;

    match output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(report.file_name()?)
            } else {
                path.to_path_buf()
            };
            std::fs::write(&path, &report.script)
                .with_context(|| format!("Failed to write script: {}", path.display()))?;
            println!("✅ Script written to {}", path.display());
        }
        None => println!("{}", report.script),
    }

    Ok(())
}

fn cmd_score(file: Option<&Path>) -> anyhow::Result<()> {
    let logic = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let report = ComplexityReport::analyze(&logic);
    println!("Length:     {:6.2}", report.length);
    println!("Branching:  {:6.2}", report.branching);
    println!("Nesting:    {:6.2}", report.nesting);
    println!("Calls:      {:6.2}", report.calls);
    println!("Complexity Score: {}/100", report.score());

    Ok(())
}

fn vision_model(settings: &Settings) -> anyhow::Result<VisionModel> {
    let api_key = settings
        .vision
        .resolve_api_key()
        .ok_or_else(|| anyhow!("No vision API key configured; set ANTHROPIC_API_KEY"))?;
    Ok(VisionModel::from_settings(&settings.vision, &api_key))
}

async fn cmd_evaluate_image(
    settings: &Settings,
    url: &str,
    prompt: Option<&str>,
    save_path: &Path,
) -> anyhow::Result<()> {
    let model = vision_model(settings)?;
    let image = ImageFetcher::new().download(url, save_path).await?;
    if image.is_none() {
        eprintln!("⚠️  Image could not be fetched, asking without it");
    }

    let answer = model
        .describe(prompt.unwrap_or(DEFAULT_PROMPT), image.as_ref())
        .await?;
    println!("{}", answer);

    Ok(())
}

async fn cmd_run_step(settings: &Settings, kind: StepKind, input: Option<&str>) -> anyhow::Result<()> {
    let input: Value = match input {
        Some(json) => serde_json::from_str(json).context("--input is not valid JSON")?,
        None => Value::Null,
    };

    let step: Box<dyn Step> = match kind {
        StepKind::Wistro => {
            let agent = ScriptAgent::from_config(settings.provider_config()?);
            Box::new(WistroGenerateStep::new(agent))
        }
        StepKind::Vision => Box::new(VisionEvaluateStep::new(vision_model(settings)?)),
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<StepEvent>();
    step.execute(input, &tx).await?;
    drop(tx);

    while let Some(event) = rx.recv().await {
        println!("📤 {}", event.topic);
        println!("{}", serde_json::to_string_pretty(&event.data)?);
    }

    Ok(())
}
