use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stego_scan_rs::logger::{self, info};
use stego_scan_rs::server;
use stego_scan_rs::steganalysis::{
    AnalysisConfig, AnalysisResponse, CancellationToken, ImageAnalyzer, ImageNormalizer,
    PipelineTimings, StegoAnalysisPipeline,
};

/// Grayscale steganalysis with explained verdicts
#[derive(Parser, Debug)]
#[command(name = "stego_scan", version)]
#[command(about = "Classifies grayscale images as COVER or STEGO")]
struct Cli {
    /// Directory holding scaler.json, log_model.json and rf_model.json
    /// (overrides STEGO_MODEL_DIR)
    #[arg(long, global = true)]
    models: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one image and print the JSON envelope
    Analyze {
        image: PathBuf,

        /// Skip the natural-language explanation
        #[arg(long)]
        no_explain: bool,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,

        /// Print per-step timings to stderr
        #[arg(long)]
        timings: bool,
    },
    /// Start the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
}

fn main() -> Result<ExitCode> {
    logger::init();
    let cli = Cli::parse();

    let mut config = AnalysisConfig::from_env().context("Invalid environment configuration")?;
    if let Some(models) = cli.models {
        config.model_dir = models;
    }

    match cli.command {
        Command::Analyze {
            image,
            no_explain,
            pretty,
            timings,
        } => {
            config.explain = !no_explain;
            analyze(config, image, pretty, timings)
        }
        Command::Serve { addr } => {
            serve(config, addr)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn analyze(config: AnalysisConfig, image: PathBuf, pretty: bool, show_timings: bool) -> Result<ExitCode> {
    let pipeline = StegoAnalysisPipeline::new(config).context("Failed to initialize analysis pipeline")?;

    let (response, timings) = match ImageNormalizer::read_file(&image) {
        Ok(data) => pipeline.analyze_bytes_with_timings(&data, &CancellationToken::new()),
        Err(e) => (AnalysisResponse::from(e), PipelineTimings::new()),
    };

    if show_timings {
        eprint!("{}", timings.summary());
    }

    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn serve(config: AnalysisConfig, addr: SocketAddr) -> Result<()> {
    info!(models = %config.model_dir.display(), llm = %config.llm_model, "Starting stego detection API");

    // The blocking HTTP client panics if built or dropped inside the runtime.
    let pipeline = Arc::new(
        StegoAnalysisPipeline::new(config).context("Failed to initialize analysis pipeline")?,
    );
    let analyzer: Arc<dyn ImageAnalyzer> = pipeline.clone();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let result = runtime.block_on(server::serve(addr, analyzer));
    drop(runtime);
    drop(pipeline);

    result.with_context(|| format!("Server on {addr} failed"))
}
