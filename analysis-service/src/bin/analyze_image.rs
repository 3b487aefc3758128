//! One-shot analysis of a local image file, printed to stdout.

use analysis_service::config::AnalysisConfig;
use analysis_service::models::InventoryReport;
use analysis_service::services::providers::gemini::GeminiVisionProvider;
use analysis_service::services::AnalysisRelay;
use anyhow::Context;
use clap::Parser;
use service_core::observability::init_tracing;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "analyze-image", version, about = "Analyze an inventory photo with Gemini")]
struct Args {
    /// JPEG image to analyze.
    #[arg(default_value = "inventory.jpg")]
    path: PathBuf,

    /// Print the analysis on one line instead of pretty-printed.
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AnalysisConfig::load().context("Failed to load configuration")?;
    init_tracing("analyze-image", &config.logging.level, None);

    let provider = GeminiVisionProvider::new(config.gemini_config())?;
    let relay = AnalysisRelay::new(Arc::new(provider));
    if !relay.is_configured() {
        anyhow::bail!("GEMINI_API_KEY not found. Set it in the environment or a .env file.");
    }

    let image = tokio::fs::read(&args.path)
        .await
        .with_context(|| format!("Failed to read image {}", args.path.display()))?;

    tracing::info!(path = %args.path.display(), size = image.len(), "Analyzing image");
    let analysis = relay.analyze(&image).await?;

    if args.compact {
        println!("{}", serde_json::to_string(&analysis)?);
    } else {
        println!("\n--- INVENTORY ANALYSIS ---");
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        println!("--------------------------");
    }

    if let Some(report) = InventoryReport::from_value(&analysis) {
        println!("{}", report.summary());
    }

    Ok(())
}
